mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::{capture_logs, journaled_player, session_on, Journal};
use remu_audio_bridge::{
    BridgeError, Command, MediaMessage, NativeEvent, Platform, PlaybackControl, StatusOutcome,
};

fn status(id: &str, msg_type: i64, value: serde_json::Value) -> serde_json::Value {
    json!({ "action": "status", "status": { "id": id, "msgType": msg_type, "value": value } })
}

#[test]
fn duration_is_unknown_until_reported() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    assert_eq!(player.duration(), -1.0);
    assert_eq!(
        session.on_status(player.id(), 2, json!(215.25)),
        StatusOutcome::Applied(MediaMessage::Duration)
    );
    assert_eq!(player.duration(), 215.25);
    session.on_status(player.id(), 2, json!(30));
    assert_eq!(player.duration(), 30.0);
    assert!(journal.entries().is_empty());
}

#[test]
fn stopped_state_invokes_status_then_success() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    session.on_status(player.id(), 1, json!(4));
    assert_eq!(journal.entries(), vec!["status 4", "success"]);
}

#[test]
fn stopped_state_as_string_still_completes() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    session.on_status(player.id(), 1, json!("4"));
    assert_eq!(journal.entries(), vec!["status 4", "success"]);
}

#[test]
fn other_states_only_invoke_status() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    for state in 0..4 {
        session.on_status(player.id(), 1, json!(state));
    }
    assert_eq!(
        journal.entries(),
        vec!["status 0", "status 1", "status 2", "status 3"]
    );
}

#[test]
fn success_fires_without_status_callback() {
    let (session, _) = session_on(Platform::Ios);
    let journal = Journal::default();
    let on_success = journal.clone();
    let player = session
        .player("song.mp3")
        .with_success(move || on_success.push("success"))
        .build()
        .unwrap();

    session.on_status(player.id(), 1, json!(4));
    session.on_status(player.id(), 9, json!({ "code": 1 }));
    assert_eq!(journal.entries(), vec!["success"]);
}

#[test]
fn error_status_invokes_error_callback() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    session.on_status(player.id(), 9, json!({ "code": 2 }));
    session.on_status(player.id(), 9, json!(3));
    assert_eq!(journal.entries(), vec!["error 2", "error 3"]);
}

#[test]
fn position_status_is_coerced() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    session.on_status(player.id(), 3, json!("12.75"));
    assert_eq!(player.position(), 12.75);
    session.on_status(player.id(), 3, json!("later"));
    assert!(player.position().is_nan());
    assert!(journal.entries().is_empty());
}

#[test]
fn unknown_handle_is_logged_not_raised() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let _player = journaled_player(&session, &journal);

    let (outcome, logs) = capture_logs(|| session.on_status("missing", 1, json!(4)));
    assert_eq!(outcome, StatusOutcome::UnknownHandle);
    assert!(journal.entries().is_empty());
    assert!(logs.contains("unknown media"), "logs: {logs}");
    assert!(logs.contains("missing"), "logs: {logs}");
}

#[test]
fn unknown_message_type_changes_nothing() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    let (outcome, logs) = capture_logs(|| session.on_status(player.id(), 7, json!(4)));
    assert_eq!(outcome, StatusOutcome::Unhandled);
    assert_eq!(player.duration(), -1.0);
    assert_eq!(player.position(), -1.0);
    assert!(journal.entries().is_empty());
    assert!(logs.contains("Unhandled AudioPlayer.onStatus"), "logs: {logs}");
}

#[test]
fn channel_messages_route_to_dispatcher() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    let outcome = session.on_message(&status(player.id(), 2, json!(61))).unwrap();
    assert_eq!(outcome, StatusOutcome::Applied(MediaMessage::Duration));
    assert_eq!(player.duration(), 61.0);
}

#[test]
fn loosely_typed_message_type_is_not_fatal() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    for msg_type in [json!("7"), json!("1"), json!(1.5)] {
        let message = json!({
            "action": "status",
            "status": { "id": player.id(), "msgType": msg_type, "value": 4 }
        });
        let (outcome, logs) = capture_logs(|| session.on_message(&message));
        assert_eq!(outcome.unwrap(), StatusOutcome::Unhandled);
        assert!(logs.contains("Unhandled AudioPlayer.onStatus"), "logs: {logs}");
    }

    let missing = json!({ "action": "status", "status": { "id": player.id(), "value": 4 } });
    assert_eq!(session.on_message(&missing).unwrap(), StatusOutcome::Unhandled);

    assert_eq!(player.duration(), -1.0);
    assert_eq!(player.position(), -1.0);
    assert!(journal.entries().is_empty());
}

#[test]
fn missing_or_non_string_id_is_unknown_handle() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let _player = journaled_player(&session, &journal);

    let missing = json!({ "action": "status", "status": { "msgType": 1, "value": 4 } });
    let numeric = json!({ "action": "status", "status": { "id": 12, "msgType": 1, "value": 4 } });
    let (outcomes, logs) =
        capture_logs(|| (session.on_message(&missing), session.on_message(&numeric)));
    assert_eq!(outcomes.0.unwrap(), StatusOutcome::UnknownHandle);
    assert_eq!(outcomes.1.unwrap(), StatusOutcome::UnknownHandle);
    assert!(logs.contains("unknown media"), "logs: {logs}");
    assert!(journal.entries().is_empty());
}

#[test]
fn dispatch_pending_drains_past_unhandled_message_types() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    let events = session.event_sender();
    events
        .send(NativeEvent::Message(json!({
            "action": "status",
            "status": { "id": player.id(), "msgType": "7", "value": 4 }
        })))
        .unwrap();
    events
        .send(NativeEvent::Message(json!({
            "action": "status",
            "status": { "id": player.id(), "value": 4 }
        })))
        .unwrap();
    events
        .send(NativeEvent::Message(status(player.id(), 1, json!(2))))
        .unwrap();

    assert_eq!(session.dispatch_pending().unwrap(), 3);
    assert_eq!(journal.entries(), vec!["status 2"]);
}

#[test]
fn unknown_channel_action_is_an_error() {
    let (session, _) = session_on(Platform::Android);
    let err = session
        .on_message(&json!({ "action": "recording", "status": {} }))
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnknownAction(action) if action == "recording"));
}

#[test]
fn dispatch_pending_drains_queue_in_order() {
    let (session, bridge) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);
    player.seek_to(1000).unwrap();
    let seek = bridge.last(Command::SeekToAudio);

    let events = session.event_sender();
    events
        .send(NativeEvent::Message(status(player.id(), 1, json!(2))))
        .unwrap();
    events
        .send(NativeEvent::success(seek.seq, json!(998)))
        .unwrap();
    events
        .send(NativeEvent::Message(status(player.id(), 1, json!(4))))
        .unwrap();

    assert_eq!(session.dispatch_pending().unwrap(), 3);
    assert_eq!(journal.entries(), vec!["status 2", "status 4", "success"]);
    assert_eq!(player.position(), 998.0);
    assert_eq!(session.dispatch_pending().unwrap(), 0);
}

#[test]
fn dispatch_pending_stops_at_unknown_action() {
    let (session, _) = session_on(Platform::Android);
    let journal = Journal::default();
    let player = journaled_player(&session, &journal);

    let events = session.event_sender();
    events
        .send(NativeEvent::Message(json!({ "action": "bogus" })))
        .unwrap();
    events
        .send(NativeEvent::Message(status(player.id(), 1, json!(3))))
        .unwrap();

    assert!(matches!(
        session.dispatch_pending(),
        Err(BridgeError::UnknownAction(_))
    ));
    assert!(journal.entries().is_empty());
    assert_eq!(session.dispatch_pending().unwrap(), 1);
    assert_eq!(journal.entries(), vec!["status 3"]);
}

#[test]
fn dispatch_next_times_out_when_idle() {
    let (session, _) = session_on(Platform::Ios);
    assert!(!session.dispatch_next(Duration::from_millis(5)).unwrap());
}

#[test]
fn callbacks_may_reenter_the_player() {
    let (session, bridge) = session_on(Platform::Android);
    let session = Arc::new(session);
    let journal = Journal::default();
    let on_status = journal.clone();
    let lookup = Arc::clone(&session);
    let id_slot: Arc<parking_lot::Mutex<Option<String>>> = Arc::default();
    let slot = id_slot.clone();
    let player = session
        .player("song.mp3")
        .with_success(|| {})
        .with_status(move |state| {
            on_status.push(format!("status {state}"));
            // 暂停后立即恢复播放
            if state == 3 {
                let id = slot.lock().clone();
                if let Some(player) = id.and_then(|id| lookup.get(&id)) {
                    player.play(None).unwrap();
                }
            }
        })
        .build()
        .unwrap();
    *id_slot.lock() = Some(player.id().to_string());

    session.on_status(player.id(), 1, json!(3));
    assert_eq!(journal.entries(), vec!["status 3"]);
    assert!(bridge.commands().contains(&Command::StartPlayingAudio));
}

#[test]
fn start_subscribes_on_message_channel_platforms() {
    let (session, bridge) = session_on(Platform::Android);
    assert!(!session.ready_gate().is_complete());

    session.start().unwrap();
    session.start().unwrap();

    let calls = bridge.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].command, Command::MessageChannel);
    assert_eq!(calls[0].service, "Media");
    assert!(calls[0].args.is_empty());
    assert!(session.ready_gate().is_complete());
}

#[test]
fn start_only_completes_gate_elsewhere() {
    let (session, bridge) = session_on(Platform::Ios);
    session.start().unwrap();
    assert!(bridge.calls().is_empty());
    assert!(session.ready_gate().is_complete());
}

#[tokio::test]
async fn startup_code_can_wait_for_readiness() {
    let (session, _) = session_on(Platform::WindowsPhone);
    let gate = session.ready_gate().clone();
    let waiter = tokio::spawn(async move { gate.wait().await });

    session.start().unwrap();
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("gate completes")
        .unwrap();
}

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use remu_audio_bridge::{
    AudioSession, BridgeError, Command, MediaMessage, MediaState, NativeCall, NativeEvent,
    PlayOptions, PlaybackControl, SessionConfig,
};

/// 模拟的原生层：按命令回送应答与状态消息
fn simulate_native(
    calls: Receiver<NativeCall>,
    events: Sender<NativeEvent>,
    token: CancellationToken,
) {
    let status = |id: &str, msg: MediaMessage, value: Value| {
        let _ = events.send(NativeEvent::Message(json!({
            "action": "status",
            "status": { "id": id, "msgType": msg.code(), "value": value }
        })));
    };

    while !token.is_cancelled() {
        let Ok(call) = calls.recv_timeout(Duration::from_millis(50)) else {
            continue;
        };
        let id = call.handle_id().unwrap_or_default().to_string();
        match call.command {
            Command::StartPlayingAudio => {
                status(&id, MediaMessage::State, json!(MediaState::Starting.code()));
                status(&id, MediaMessage::Duration, json!(215.3));
                status(&id, MediaMessage::State, json!(MediaState::Running.code()));
            }
            Command::PausePlayingAudio => {
                status(&id, MediaMessage::State, json!(MediaState::Paused.code()));
            }
            Command::SeekToAudio => {
                // 原生层只能落在最近的帧上
                let target = call.args.get(1).and_then(Value::as_i64).unwrap_or(0);
                let _ = events.send(NativeEvent::success(call.seq, json!(target - 2)));
                status(&id, MediaMessage::Position, json!((target - 2) as f64 / 1000.0));
            }
            Command::StopPlayingAudio => {
                let _ = events.send(NativeEvent::success(call.seq, Value::Null));
                status(&id, MediaMessage::State, json!(MediaState::Stopped.code()));
            }
            Command::GetCurrentPositionAudio => {
                let _ = events.send(NativeEvent::success(call.seq, json!(12.5)));
            }
            Command::GetCurrentAmplitudeAudio => {
                let _ = events.send(NativeEvent::success(call.seq, json!(0.42)));
            }
            Command::Release => {
                let _ = events.send(NativeEvent::success(call.seq, Value::Null));
            }
            Command::SetRate => {
                println!("原生层: 播放速率 {}", call.args.get(1).cloned().unwrap_or_default());
            }
            _ => {}
        }
    }
}

/// 在当前线程处理原生事件，持续 `duration`
fn pump(session: &AudioSession, duration: Duration) -> Result<()> {
    let deadline = Instant::now() + duration;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        session.dispatch_next(left.min(Duration::from_millis(20)))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config = SessionConfig::from_env();
    println!("平台: {}", config.platform);

    let (calls_tx, calls_rx) = crossbeam_channel::unbounded::<NativeCall>();
    let bridge = move |call: NativeCall| -> Result<(), BridgeError> {
        calls_tx
            .send(call)
            .map_err(|e| BridgeError::Transport(e.to_string()))
    };
    let session = AudioSession::new(Arc::new(bridge), config);

    let token = CancellationToken::new();
    let native = {
        let events = session.event_sender();
        let token = token.clone();
        thread::spawn(move || simulate_native(calls_rx, events, token))
    };

    // 其他启动逻辑可以等待插件就绪
    let gate = session.ready_gate().clone();
    let waiter = tokio::spawn(async move {
        gate.wait().await;
        println!("插件已就绪: {}", gate.name());
    });
    session.start()?;
    waiter.await?;

    let player = session
        .player("https://download.samplelib.com/mp3/sample-15s.mp3")
        .with_success(|| println!("[@Success] 播放完成"))
        .with_error(|e| println!("[@Error] 错误: {}", e))
        .with_status(|state| {
            let label = MediaState::from_code(state).map(MediaState::label);
            println!("[@Status] 状态: {}", label.unwrap_or("未知"));
        })
        .build()?;
    println!("句柄 id: {}", player.id());

    player.set_volume(0.5)?;
    player.play(Some(&PlayOptions {
        number_of_loops: Some(1),
        ..Default::default()
    }))?;
    pump(&session, Duration::from_millis(200))?;
    println!("时长: {:.1} 秒", player.duration());

    println!("测试暂停");
    player.pause()?;
    pump(&session, Duration::from_millis(200))?;

    println!("测试跳转");
    player.seek_to(5000)?;
    pump(&session, Duration::from_millis(200))?;
    println!("位置: {}", player.position());

    player.get_current_position(
        |p| println!("当前位置: {} 秒", p),
        |e| println!("获取位置失败: {}", e),
    )?;
    player.get_current_amplitude(
        |a| println!("当前振幅: {:.2}", a),
        |e| println!("获取振幅失败: {}", e),
    )?;
    player.set_rate(1.5)?;
    pump(&session, Duration::from_millis(200))?;

    println!("测试停止");
    player.stop()?;
    pump(&session, Duration::from_millis(200))?;
    println!("位置: {}", player.position());

    player.release()?;
    pump(&session, Duration::from_millis(100))?;
    println!(
        "释放后仍可查询: {}",
        session.get(player.id()).is_some()
    );

    token.cancel();
    let _ = native.join();
    println!("测试完成！");

    Ok(())
}

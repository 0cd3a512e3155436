#![allow(dead_code)]

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use remu_audio_bridge::{
    AudioPlayer, AudioSession, BridgeError, Command, NativeBridge, NativeCall, Platform,
    SessionConfig,
};

/// 记录所有出站调用的原生层替身
#[derive(Clone, Default)]
pub struct RecordingBridge {
    calls: Arc<Mutex<Vec<NativeCall>>>,
}

impl RecordingBridge {
    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.lock().clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.calls.lock().iter().map(|c| c.command).collect()
    }

    pub fn last(&self, command: Command) -> NativeCall {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|c| c.command == command)
            .cloned()
            .unwrap_or_else(|| panic!("no {command} call recorded"))
    }
}

impl NativeBridge for RecordingBridge {
    fn exec(&self, call: NativeCall) -> Result<(), BridgeError> {
        self.calls.lock().push(call);
        Ok(())
    }
}

pub fn session_on(platform: Platform) -> (AudioSession, RecordingBridge) {
    session_with(SessionConfig::new(platform))
}

pub fn session_with(config: SessionConfig) -> (AudioSession, RecordingBridge) {
    let bridge = RecordingBridge::default();
    let session = AudioSession::new(Arc::new(bridge.clone()), config);
    (session, bridge)
}

/// 回调调用记录
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// 创建一个把全部回调写入 journal 的句柄
pub fn journaled_player(session: &AudioSession, journal: &Journal) -> Arc<AudioPlayer> {
    let on_success = journal.clone();
    let on_error = journal.clone();
    let on_status = journal.clone();
    session
        .player("file:///android_asset/beep.mp3")
        .with_success(move || on_success.push("success"))
        .with_error(move |e| on_error.push(format!("error {}", e.code().code())))
        .with_status(move |state| on_status.push(format!("status {state}")))
        .build()
        .expect("player")
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 执行 `f` 并收集期间输出的日志
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
    (out, logs)
}

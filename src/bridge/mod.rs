//! 与原生层之间的调用边界。
//!
//! 每个出站调用是一条 [`NativeCall`]：服务名、命令、有序参数，以及会话内单调递增的 `seq`。
//! 原生层通过会话的事件队列回送 [`NativeEvent::Reply`](crate::events::NativeEvent::Reply)，
//! 以 `seq` 与调用对应。

mod exec;
mod gate;

pub use exec::Exec;
pub(crate) use exec::Continuation;
pub use gate::ReadyGate;

use std::fmt;

use serde_json::Value;

use crate::error::BridgeError;

/// messageChannel 订阅所在的原生服务
pub const CHANNEL_SERVICE: &str = "Media";

/// 原生命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Create,
    StartPlayingAudio,
    StopPlayingAudio,
    SeekToAudio,
    PausePlayingAudio,
    GetCurrentPositionAudio,
    Release,
    SetVolume,
    SetRate,
    GetCurrentAmplitudeAudio,
    MessageChannel,
}

impl Command {
    /// 原生层识别的命令名
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::StartPlayingAudio => "startPlayingAudio",
            Command::StopPlayingAudio => "stopPlayingAudio",
            Command::SeekToAudio => "seekToAudio",
            Command::PausePlayingAudio => "pausePlayingAudio",
            Command::GetCurrentPositionAudio => "getCurrentPositionAudio",
            Command::Release => "release",
            Command::SetVolume => "setVolume",
            Command::SetRate => "setRate",
            Command::GetCurrentAmplitudeAudio => "getCurrentAmplitudeAudio",
            Command::MessageChannel => "messageChannel",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次出站调用
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCall {
    pub seq: u64,
    pub service: String,
    pub command: Command,
    pub args: Vec<Value>,
}

impl NativeCall {
    /// 句柄命令的第一个参数总是句柄 id
    pub fn handle_id(&self) -> Option<&str> {
        self.args.first().and_then(Value::as_str)
    }
}

/// 原生层的调用入口
///
/// 实现方只负责把调用送出去，不应在 `exec` 内同步回调；应答一律经事件队列回送。
pub trait NativeBridge: Send + Sync {
    fn exec(&self, call: NativeCall) -> Result<(), BridgeError>;
}

impl<F> NativeBridge for F
where
    F: Fn(NativeCall) -> Result<(), BridgeError> + Send + Sync,
{
    fn exec(&self, call: NativeCall) -> Result<(), BridgeError> {
        self(call)
    }
}

use serde::Deserialize;
use serde_json::Value;

use crate::error::BridgeError;

/// 状态通知的消息类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMessage {
    /// 播放状态变化
    State = 1,
    /// 时长已知
    Duration = 2,
    /// 播放位置更新
    Position = 3,
    /// 原生层错误
    Error = 9,
}

impl MediaMessage {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(MediaMessage::State),
            2 => Some(MediaMessage::Duration),
            3 => Some(MediaMessage::Position),
            9 => Some(MediaMessage::Error),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// 原生层报告的播放状态
///
/// 仅供参考：状态完全由原生通知驱动，这一层不校验状态转移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    None = 0,
    Starting = 1,
    Running = 2,
    Paused = 3,
    Stopped = 4,
}

impl MediaState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MediaState::None),
            1 => Some(MediaState::Starting),
            2 => Some(MediaState::Running),
            3 => Some(MediaState::Paused),
            4 => Some(MediaState::Stopped),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaState::None => "None",
            MediaState::Starting => "Starting",
            MediaState::Running => "Running",
            MediaState::Paused => "Paused",
            MediaState::Stopped => "Stopped",
        }
    }
}

/// 原生层推送给会话的事件
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    /// 某次调用的应答，`seq` 对应 `NativeCall::seq`
    Reply { seq: u64, result: Result<Value, Value> },
    /// messageChannel 上的一条消息
    Message(Value),
}

impl NativeEvent {
    pub fn success(seq: u64, value: Value) -> Self {
        NativeEvent::Reply {
            seq,
            result: Ok(value),
        }
    }

    pub fn failure(seq: u64, error: Value) -> Self {
        NativeEvent::Reply {
            seq,
            result: Err(error),
        }
    }
}

/// 一条状态通知
///
/// `id` 和 `msgType` 原样保留，类型不对的通知在分发时记录日志并忽略，
/// 不会中断事件队列。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub id: Value,
    #[serde(rename = "msgType", default)]
    pub msg_type: Value,
    #[serde(default)]
    pub value: Value,
}

impl StatusUpdate {
    pub fn id(&self) -> Option<&str> {
        self.id.as_str()
    }

    /// 只有数值类型的 1/2/3/9 才是已知消息，`"1"` 之类的字符串不算
    pub fn message(&self) -> Option<MediaMessage> {
        let code = self.msg_type.as_f64()?;
        if code.fract() != 0.0 {
            return None;
        }
        MediaMessage::from_code(code as i64)
    }
}

#[derive(Debug, Deserialize)]
struct ChannelMessage {
    action: String,
    #[serde(default)]
    status: Option<Value>,
}

/// 解析 messageChannel 消息，只接受 `status` 动作
pub fn parse_channel_message(message: &Value) -> Result<StatusUpdate, BridgeError> {
    let envelope: ChannelMessage = serde_json::from_value(message.clone())
        .map_err(|e| BridgeError::MalformedMessage(e.to_string()))?;
    if envelope.action != "status" {
        return Err(BridgeError::UnknownAction(envelope.action));
    }
    let status = envelope
        .status
        .ok_or_else(|| BridgeError::MalformedMessage("missing status payload".to_string()))?;
    serde_json::from_value(status).map_err(|e| BridgeError::MalformedMessage(e.to_string()))
}

/// 按 JavaScript `Number(...)` 的规则把任意值转成数字
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

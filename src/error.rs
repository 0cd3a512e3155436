//! 错误类型：原生层上报的媒体错误，以及桥接层自身的错误。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::events::coerce_number;

/// 媒体错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaErrorCode(pub i64);

impl MediaErrorCode {
    pub const MEDIA_ERR_NONE_ACTIVE: Self = Self(0);
    pub const MEDIA_ERR_ABORTED: Self = Self(1);
    pub const MEDIA_ERR_NETWORK: Self = Self(2);
    pub const MEDIA_ERR_DECODE: Self = Self(3);
    pub const MEDIA_ERR_SRC_NOT_SUPPORTED: Self = Self(4);
    /// 旧名称，与 `MEDIA_ERR_SRC_NOT_SUPPORTED` 同值
    pub const MEDIA_ERR_NONE_SUPPORTED: Self = Self::MEDIA_ERR_SRC_NOT_SUPPORTED;

    pub fn code(self) -> i64 {
        self.0
    }

    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("MEDIA_ERR_NONE_ACTIVE"),
            1 => Some("MEDIA_ERR_ABORTED"),
            2 => Some("MEDIA_ERR_NETWORK"),
            3 => Some("MEDIA_ERR_DECODE"),
            4 => Some("MEDIA_ERR_SRC_NOT_SUPPORTED"),
            _ => None,
        }
    }
}

impl fmt::Display for MediaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// 原生层上报的媒体错误，构造后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaError {
    code: MediaErrorCode,
    #[serde(default)]
    message: String,
}

impl MediaError {
    pub fn new(code: MediaErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> MediaErrorCode {
        self.code
    }

    /// 非标准字段，仅用于诊断
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 解析原生层传来的错误值
    ///
    /// 支持 `{code, message}` 对象与裸数字；其他形式保留原始 JSON 作为消息。
    pub fn from_value(value: &Value) -> Self {
        if let Value::Object(map) = value {
            if let Some(code) = map.get("code").map(coerce_number).filter(|c| c.is_finite()) {
                let message = match map.get("message") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                return Self::new(MediaErrorCode(code as i64), message);
            }
        }
        let code = coerce_number(value);
        if value.is_number() || (value.is_string() && code.is_finite()) {
            return Self::new(MediaErrorCode(code as i64), "");
        }
        Self::new(MediaErrorCode::MEDIA_ERR_NONE_ACTIVE, value.to_string())
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "media error {}", self.code)
        } else {
            write!(f, "media error {}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for MediaError {}

/// 桥接层错误
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown media action: {0}")]
    UnknownAction(String),

    #[error("Malformed native message: {0}")]
    MalformedMessage(String),

    #[error("Native transport error: {0}")]
    Transport(String),
}

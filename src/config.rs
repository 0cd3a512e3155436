use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 宿主平台标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    Ios,
    Android,
    AmazonFireOs,
    WindowsPhone,
    #[default]
    Browser,
    /// 其他未列出的平台，保留原始标识
    Other(String),
}

impl Platform {
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::AmazonFireOs => "amazon-fireos",
            Platform::WindowsPhone => "windowsphone",
            Platform::Browser => "browser",
            Platform::Other(id) => id,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Platform::from(s.to_string()))
    }
}

impl From<String> for Platform {
    fn from(id: String) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "ios" => Platform::Ios,
            "android" => Platform::Android,
            "amazon-fireos" => Platform::AmazonFireOs,
            "windowsphone" => Platform::WindowsPhone,
            "browser" => Platform::Browser,
            _ => Platform::Other(id),
        }
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

/// 会话创建时根据平台确定的能力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// 原生层是否实现了 setRate
    pub supports_playback_rate: bool,
    /// 状态通知是否经由 messageChannel 订阅送达
    pub uses_message_channel: bool,
}

impl Capabilities {
    pub fn for_platform(platform: &Platform) -> Self {
        Self {
            supports_playback_rate: matches!(platform, Platform::Ios),
            uses_message_channel: matches!(
                platform,
                Platform::Android | Platform::AmazonFireOs | Platform::WindowsPhone
            ),
        }
    }
}

pub const DEFAULT_SERVICE: &str = "AudioPlayer";

const PLATFORM_ENV: &str = "REMU_BRIDGE_PLATFORM";
const REJECT_STALE_ENV: &str = "REMU_BRIDGE_REJECT_STALE";

/// 会话配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub platform: Platform,
    /// 丢弃比已应用写入更旧的位置应答（默认关闭，即后写者胜）
    pub reject_stale_replies: bool,
    /// 播放命令发往的原生服务名
    pub service: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            reject_stale_replies: false,
            service: DEFAULT_SERVICE.to_string(),
        }
    }
}

impl SessionConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    pub fn with_reject_stale_replies(mut self, reject: bool) -> Self {
        self.reject_stale_replies = reject;
        self
    }

    /// 从环境变量读取配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(platform) = std::env::var(PLATFORM_ENV) {
            config.platform = Platform::from(platform);
        }
        if let Ok(flag) = std::env::var(REJECT_STALE_ENV) {
            config.reject_stale_replies = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        config
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_platform(&self.platform)
    }
}

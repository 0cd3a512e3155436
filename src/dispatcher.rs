use std::sync::Arc;

use serde_json::Value;

use crate::error::MediaError;
use crate::events::{coerce_number, MediaMessage, MediaState, StatusUpdate};
use crate::player::AudioPlayer;
use crate::registry::Registry;

/// 一次状态分发的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Applied(MediaMessage),
    /// 没有对应 id 的句柄
    UnknownHandle,
    /// 无法识别的消息类型
    Unhandled,
}

/// 把原生层的状态通知路由到对应句柄
///
/// 整个分发过程同步完成，回调执行时不持有任何锁。
pub struct StatusDispatcher {
    registry: Arc<Registry>,
}

impl StatusDispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// 分发通道上收到的通知；`id` 或 `msgType` 类型不对时只记录日志
    pub fn dispatch(&self, update: StatusUpdate) -> StatusOutcome {
        let Some(player) = update.id().and_then(|id| self.registry.lookup(id)) else {
            tracing::error!(
                id = %update.id,
                "Received AudioPlayer.onStatus callback for unknown media"
            );
            return StatusOutcome::UnknownHandle;
        };
        let Some(message) = update.message() else {
            tracing::error!(
                id = player.id(),
                msg_type = %update.msg_type,
                "Unhandled AudioPlayer.onStatus"
            );
            return StatusOutcome::Unhandled;
        };
        Self::apply(&player, message, update.value)
    }

    pub fn on_status(&self, id: &str, msg_type: i64, value: Value) -> StatusOutcome {
        let Some(player) = self.registry.lookup(id) else {
            tracing::error!(id, "Received AudioPlayer.onStatus callback for unknown media");
            return StatusOutcome::UnknownHandle;
        };

        let Some(message) = MediaMessage::from_code(msg_type) else {
            tracing::error!(id, msg_type, "Unhandled AudioPlayer.onStatus");
            return StatusOutcome::Unhandled;
        };

        Self::apply(&player, message, value)
    }

    fn apply(player: &AudioPlayer, message: MediaMessage, value: Value) -> StatusOutcome {
        let id = player.id();
        match message {
            MediaMessage::State => {
                let state = coerce_number(&value);
                let code = if state.is_finite() { state as i64 } else { -1 };
                tracing::trace!(
                    id,
                    state = MediaState::from_code(code).map(MediaState::label).unwrap_or("?"),
                    "status"
                );
                player.notify_status(code);
                // 自然播放结束与主动停止都以 STOPPED 上报
                if state == MediaState::Stopped.code() as f64 {
                    player.notify_success();
                }
            }
            MediaMessage::Duration => player.set_duration(coerce_number(&value)),
            MediaMessage::Position => player.set_position(coerce_number(&value)),
            MediaMessage::Error => player.notify_error(MediaError::from_value(&value)),
        }
        StatusOutcome::Applied(message)
    }
}

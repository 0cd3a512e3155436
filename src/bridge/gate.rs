use std::sync::Arc;

use tokio::sync::watch;

/// 具名的一次性就绪闸门
///
/// 完成后保持完成状态，之后的等待立即返回。
#[derive(Debug, Clone)]
pub struct ReadyGate {
    name: Arc<str>,
    state: Arc<watch::Sender<bool>>,
}

impl ReadyGate {
    pub const MEDIA_PLUGIN_READY: &'static str = "onMediaPluginReady";

    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let (state, _) = watch::channel(false);
        Self {
            name: name.into(),
            state: Arc::new(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_complete(&self) -> bool {
        *self.state.borrow()
    }

    /// 标记完成，返回本次调用是否改变了状态
    pub fn complete(&self) -> bool {
        let changed = self.state.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        });
        if changed {
            tracing::debug!(gate = %self.name, "initialization complete");
        }
        changed
    }

    /// 等待闸门完成
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // Sender 由自身持有，不会出现通道关闭
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

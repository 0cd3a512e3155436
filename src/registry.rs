use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::player::AudioPlayer;

/// id 到播放句柄的映射
///
/// 不提供删除操作：句柄登记后一直可查，`release` 之后亦然。
#[derive(Default)]
pub struct Registry {
    players: RwLock<HashMap<String, Arc<AudioPlayer>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记句柄，同 id 覆盖
    pub fn register(&self, id: impl Into<String>, player: Arc<AudioPlayer>) {
        self.players.write().insert(id.into(), player);
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<AudioPlayer>> {
        self.players.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.read().is_empty()
    }
}

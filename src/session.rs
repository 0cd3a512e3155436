use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use serde_json::Value;

use crate::bridge::{Command, Continuation, Exec, NativeBridge, ReadyGate, CHANNEL_SERVICE};
use crate::config::{Capabilities, SessionConfig};
use crate::dispatcher::{StatusDispatcher, StatusOutcome};
use crate::error::BridgeError;
use crate::events::{parse_channel_message, NativeEvent};
use crate::player::{AudioPlayer, PlayerBuilder};
use crate::registry::Registry;

/// 音频会话：持有全部句柄、出站调用和入站事件队列
///
/// 入站事件只在调用 [`dispatch_pending`](Self::dispatch_pending) 或
/// [`dispatch_next`](Self::dispatch_next) 的线程上处理。
pub struct AudioSession {
    config: SessionConfig,
    capabilities: Capabilities,
    registry: Arc<Registry>,
    dispatcher: StatusDispatcher,
    exec: Arc<Exec>,
    events_tx: Sender<NativeEvent>,
    events_rx: Receiver<NativeEvent>,
    ready: ReadyGate,
    started: AtomicBool,
}

impl AudioSession {
    pub fn new(bridge: Arc<dyn NativeBridge>, config: SessionConfig) -> Self {
        let capabilities = config.capabilities();
        let registry = Arc::new(Registry::new());
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            exec: Arc::new(Exec::new(bridge, config.service.clone())),
            dispatcher: StatusDispatcher::new(registry.clone()),
            registry,
            capabilities,
            config,
            events_tx,
            events_rx,
            ready: ReadyGate::new(ReadyGate::MEDIA_PLUGIN_READY),
            started: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// 交给原生层用于回送应答和通道消息
    pub fn event_sender(&self) -> Sender<NativeEvent> {
        self.events_tx.clone()
    }

    pub fn ready_gate(&self) -> &ReadyGate {
        &self.ready
    }

    /// 订阅 messageChannel（仅限需要订阅的平台）并标记就绪，重复调用无效果
    pub fn start(&self) -> Result<(), BridgeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if self.capabilities.uses_message_channel {
            // 订阅之后的状态消息由原生层以 NativeEvent::Message 推送
            let seq = self.exec.reserve_seq();
            if let Err(e) = self.exec.send(
                seq,
                CHANNEL_SERVICE.to_string(),
                Command::MessageChannel,
                Vec::new(),
                Continuation::new(),
            ) {
                self.started.store(false, Ordering::SeqCst);
                return Err(e);
            }
            tracing::debug!(platform = %self.config.platform, "subscribed to media message channel");
        }
        self.ready.complete();
        Ok(())
    }

    /// 创建播放句柄
    pub fn player(&self, source: impl Into<String>) -> PlayerBuilder<'_> {
        PlayerBuilder::new(self, source)
    }

    /// 按 id 查找句柄
    pub fn get(&self, id: &str) -> Option<Arc<AudioPlayer>> {
        self.registry.lookup(id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// 仍在等待原生应答的调用数
    pub fn pending_calls(&self) -> usize {
        self.exec.pending_len()
    }

    /// 状态通知入口
    pub fn on_status(&self, id: &str, msg_type: i64, value: Value) -> StatusOutcome {
        self.dispatcher.on_status(id, msg_type, value)
    }

    /// 处理一条 messageChannel 消息；未知动作视为错误
    pub fn on_message(&self, message: &Value) -> Result<StatusOutcome, BridgeError> {
        let update = parse_channel_message(message)?;
        Ok(self.dispatcher.dispatch(update))
    }

    pub fn handle_event(&self, event: NativeEvent) -> Result<(), BridgeError> {
        match event {
            NativeEvent::Reply { seq, result } => {
                self.exec.complete(seq, result);
                Ok(())
            }
            NativeEvent::Message(message) => self.on_message(&message).map(drop),
        }
    }

    /// 处理队列中已有的全部事件，不阻塞
    ///
    /// 遇到无法处理的消息时立即返回错误，其余事件留待下次处理。
    pub fn dispatch_pending(&self) -> Result<usize, BridgeError> {
        let mut handled = 0;
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event)?;
                    handled += 1;
                }
                // 会话自己持有 events_tx，队列不会断开
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(handled),
            }
        }
    }

    /// 最多等待 `timeout` 处理一条事件，返回是否处理了事件
    pub fn dispatch_next(&self, timeout: Duration) -> Result<bool, BridgeError> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => self.handle_event(event).map(|_| true),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Ok(false),
        }
    }

    pub(crate) fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub(crate) fn exec(&self) -> &Arc<Exec> {
        &self.exec
    }
}

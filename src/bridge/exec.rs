use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::{Command, NativeBridge, NativeCall};
use crate::error::BridgeError;

type SuccessFn = Box<dyn FnOnce(Value) + Send + 'static>;
type FailureFn = Box<dyn FnOnce(Value) + Send + 'static>;

/// 一次调用的后续处理，应答到达时最多执行其中一个
#[derive(Default)]
pub(crate) struct Continuation {
    on_success: Option<SuccessFn>,
    on_failure: Option<FailureFn>,
}

impl Continuation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    pub(crate) fn on_failure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.on_failure = Some(Box::new(f));
        self
    }

    fn is_empty(&self) -> bool {
        self.on_success.is_none() && self.on_failure.is_none()
    }
}

/// 出站调用与应答关联
///
/// 带后续处理的调用会一直留在 `pending` 中，直到对应 seq 的应答到达；没有超时。
/// 原生层对 create、pause、release 等命令通常只在失败时应答，句柄带错误回调时
/// 这些条目会随调用次数增长。没有错误回调的句柄不登记这类条目，
/// 可用 [`pending_len`](Self::pending_len) 观察当前数量。
pub struct Exec {
    bridge: Arc<dyn NativeBridge>,
    service: String,
    next_seq: AtomicU64,
    /// 等待应答的调用，只在应答到达或发送失败时移除
    pending: Mutex<HashMap<u64, Continuation>>,
}

impl Exec {
    pub fn new(bridge: Arc<dyn NativeBridge>, service: impl Into<String>) -> Self {
        Self {
            bridge,
            service: service.into(),
            next_seq: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// 预留一个 seq，供需要在发出前知道 seq 的调用使用
    pub fn reserve_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    /// 尚未收到应答的调用数
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    pub(crate) fn call(
        &self,
        command: Command,
        args: Vec<Value>,
        continuation: Continuation,
    ) -> Result<u64, BridgeError> {
        let seq = self.reserve_seq();
        let service = self.service.clone();
        self.send(seq, service, command, args, continuation)?;
        Ok(seq)
    }

    pub(crate) fn send(
        &self,
        seq: u64,
        service: String,
        command: Command,
        args: Vec<Value>,
        continuation: Continuation,
    ) -> Result<(), BridgeError> {
        // 先登记再发出，原生层可能在 exec 返回前就已回送应答
        let registered = !continuation.is_empty();
        if registered {
            self.pending.lock().insert(seq, continuation);
        }

        tracing::trace!(seq, %service, %command, "exec");
        let call = NativeCall {
            seq,
            service,
            command,
            args,
        };
        if let Err(e) = self.bridge.exec(call) {
            if registered {
                self.pending.lock().remove(&seq);
            }
            return Err(e);
        }
        Ok(())
    }

    /// 处理一条应答，返回是否找到对应的调用
    pub fn complete(&self, seq: u64, result: Result<Value, Value>) -> bool {
        // 取出后立即释放锁，回调中可能再次发起调用
        let continuation = self.pending.lock().remove(&seq);
        let Some(continuation) = continuation else {
            tracing::debug!(seq, "reply without pending call");
            return false;
        };

        match result {
            Ok(value) => {
                if let Some(f) = continuation.on_success {
                    f(value);
                }
            }
            Err(error) => {
                if let Some(f) = continuation.on_failure {
                    f(error);
                }
            }
        }
        true
    }
}

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

use crate::bridge::{Command, Continuation, Exec};
use crate::config::{Capabilities, Platform};
use crate::error::{BridgeError, MediaError};
use crate::events::coerce_number;
use crate::session::AudioSession;

pub type SuccessCallback = Arc<dyn Fn() + Send + Sync + 'static>;
pub type ErrorCallback = Arc<dyn Fn(MediaError) + Send + Sync + 'static>;
pub type StatusCallback = Arc<dyn Fn(i64) + Send + Sync + 'static>;

/// 传给原生层的播放选项
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_loops: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_audio_when_screen_is_locked: Option<bool>,
}

pub trait PlaybackControl {
    fn play(&self, options: Option<&PlayOptions>) -> Result<(), BridgeError>;
    fn pause(&self) -> Result<(), BridgeError>;
    fn stop(&self) -> Result<(), BridgeError>;
    fn seek_to(&self, milliseconds: i64) -> Result<(), BridgeError>;
    fn set_volume(&self, volume: f64) -> Result<(), BridgeError>;
    fn set_rate(&self, rate: f64) -> Result<(), BridgeError>;

    /// 缓存的时长，未知时为 -1
    fn duration(&self) -> f64;
    /// 缓存的位置，未知时为 -1
    fn position(&self) -> f64;
}

/// 句柄本地缓存的状态
#[derive(Debug)]
struct PlayerState {
    duration: f64,
    position: f64,
    /// 最近一次已应用的位置写入对应的 seq
    position_seq: u64,
}

impl PlayerState {
    fn new() -> Self {
        Self {
            duration: -1.0,
            position: -1.0,
            position_seq: 0,
        }
    }
}

/// 由调用应答写入位置
///
/// 开启 `reject_stale` 时，比已应用写入更旧的应答不会覆盖缓存。
fn apply_acknowledged_position(
    state: &Mutex<PlayerState>,
    seq: u64,
    position: f64,
    reject_stale: bool,
) -> bool {
    let mut state = state.lock();
    if reject_stale && seq < state.position_seq {
        tracing::debug!(seq, latest = state.position_seq, "dropping stale position reply");
        return false;
    }
    state.position = position;
    state.position_seq = state.position_seq.max(seq);
    true
}

/// 一个音频源对应的播放句柄
pub struct AudioPlayer {
    id: String,
    source: String,
    on_success: SuccessCallback,
    on_error: Option<ErrorCallback>,
    on_status: Option<StatusCallback>,
    state: Arc<Mutex<PlayerState>>,
    exec: Arc<Exec>,
    platform: Platform,
    capabilities: Capabilities,
    reject_stale: bool,
}

impl fmt::Debug for AudioPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AudioPlayer")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("duration", &state.duration)
            .field("position", &state.position)
            .finish_non_exhaustive()
    }
}

impl PlaybackControl for AudioPlayer {
    /// 开始或继续播放；错误只会经由状态通知送达
    fn play(&self, options: Option<&PlayOptions>) -> Result<(), BridgeError> {
        let options = match options {
            Some(options) => serde_json::to_value(options)
                .map_err(|e| BridgeError::InvalidArgument(e.to_string()))?,
            None => Value::Null,
        };
        self.exec
            .call(
                Command::StartPlayingAudio,
                vec![json!(self.id), json!(self.source), options],
                Continuation::new(),
            )
            .map(drop)
    }

    fn pause(&self) -> Result<(), BridgeError> {
        self.exec
            .call(
                Command::PausePlayingAudio,
                vec![json!(self.id)],
                self.error_continuation(),
            )
            .map(drop)
    }

    /// 停止播放，原生层确认后位置归零
    fn stop(&self) -> Result<(), BridgeError> {
        let seq = self.exec.reserve_seq();
        let state = self.state.clone();
        let reject_stale = self.reject_stale;
        let continuation = self.error_continuation().on_success(move |_| {
            apply_acknowledged_position(&state, seq, 0.0, reject_stale);
        });
        self.send(seq, Command::StopPlayingAudio, vec![json!(self.id)], continuation)
    }

    /// 跳转到指定毫秒，以原生层确认的位置为准
    fn seek_to(&self, milliseconds: i64) -> Result<(), BridgeError> {
        let seq = self.exec.reserve_seq();
        let state = self.state.clone();
        let reject_stale = self.reject_stale;
        let continuation = self.error_continuation().on_success(move |position| {
            apply_acknowledged_position(&state, seq, coerce_number(&position), reject_stale);
        });
        self.send(
            seq,
            Command::SeekToAudio,
            vec![json!(self.id), json!(milliseconds)],
            continuation,
        )
    }

    fn set_volume(&self, volume: f64) -> Result<(), BridgeError> {
        self.exec
            .call(
                Command::SetVolume,
                vec![json!(self.id), json!(volume)],
                Continuation::new(),
            )
            .map(drop)
    }

    fn set_rate(&self, rate: f64) -> Result<(), BridgeError> {
        if !self.capabilities.supports_playback_rate {
            tracing::warn!(
                platform = %self.platform,
                "AudioPlayer.setRate method is currently not supported for {} platform.",
                self.platform
            );
            return Ok(());
        }
        self.exec
            .call(
                Command::SetRate,
                vec![json!(self.id), json!(rate)],
                Continuation::new(),
            )
            .map(drop)
    }

    /// 只读缓存，不会调用原生层
    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }
}

impl AudioPlayer {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 向原生层查询当前位置，成功时同时更新缓存
    pub fn get_current_position<S, F>(&self, success: S, fail: F) -> Result<(), BridgeError>
    where
        S: FnOnce(f64) + Send + 'static,
        F: FnOnce(MediaError) + Send + 'static,
    {
        let seq = self.exec.reserve_seq();
        let state = self.state.clone();
        let reject_stale = self.reject_stale;
        let continuation = Continuation::new()
            .on_success(move |value| {
                let position = coerce_number(&value);
                apply_acknowledged_position(&state, seq, position, reject_stale);
                success(position);
            })
            .on_failure(move |error| fail(MediaError::from_value(&error)));
        self.send(
            seq,
            Command::GetCurrentPositionAudio,
            vec![json!(self.id)],
            continuation,
        )
    }

    pub fn get_current_amplitude<S, F>(&self, success: S, fail: F) -> Result<(), BridgeError>
    where
        S: FnOnce(f64) + Send + 'static,
        F: FnOnce(MediaError) + Send + 'static,
    {
        let continuation = Continuation::new()
            .on_success(move |value| success(coerce_number(&value)))
            .on_failure(move |error| fail(MediaError::from_value(&error)));
        self.exec
            .call(
                Command::GetCurrentAmplitudeAudio,
                vec![json!(self.id)],
                continuation,
            )
            .map(drop)
    }

    /// 释放原生资源；句柄仍保留在登记表中
    pub fn release(&self) -> Result<(), BridgeError> {
        self.exec
            .call(Command::Release, vec![json!(self.id)], self.error_continuation())
            .map(drop)
    }

    fn send(
        &self,
        seq: u64,
        command: Command,
        args: Vec<Value>,
        continuation: Continuation,
    ) -> Result<(), BridgeError> {
        let service = self.exec.service().to_string();
        self.exec.send(seq, service, command, args, continuation)
    }

    /// 原生调用失败时转交错误回调
    fn error_continuation(&self) -> Continuation {
        match self.on_error.clone() {
            Some(on_error) => {
                Continuation::new().on_failure(move |error| on_error(MediaError::from_value(&error)))
            }
            None => Continuation::new(),
        }
    }

    pub(crate) fn notify_status(&self, state: i64) {
        if let Some(ref cb) = self.on_status {
            cb(state);
        }
    }

    pub(crate) fn notify_success(&self) {
        (self.on_success)();
    }

    pub(crate) fn notify_error(&self, error: MediaError) {
        if let Some(ref cb) = self.on_error {
            cb(error);
        }
    }

    pub(crate) fn set_duration(&self, duration: f64) {
        self.state.lock().duration = duration;
    }

    /// 状态通知携带的位置，不参与 seq 比较
    pub(crate) fn set_position(&self, position: f64) {
        self.state.lock().position = position;
    }
}

/// 播放句柄构建器
pub struct PlayerBuilder<'a> {
    session: &'a AudioSession,
    source: String,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    on_status: Option<StatusCallback>,
}

impl<'a> PlayerBuilder<'a> {
    pub(crate) fn new(session: &'a AudioSession, source: impl Into<String>) -> Self {
        Self {
            session,
            source: source.into(),
            on_success: None,
            on_error: None,
            on_status: None,
        }
    }

    /// 播放结束或停止时调用（必需）
    pub fn with_success<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn with_error<F>(mut self, f: F) -> Self
    where
        F: Fn(MediaError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn with_status<F>(mut self, f: F) -> Self
    where
        F: Fn(i64) + Send + Sync + 'static,
    {
        self.on_status = Some(Arc::new(f));
        self
    }

    /// 校验参数，登记句柄并向原生层发出 create
    pub fn build(self) -> Result<Arc<AudioPlayer>, BridgeError> {
        if self.source.is_empty() {
            return Err(BridgeError::InvalidArgument(
                "source must be a non-empty string".to_string(),
            ));
        }
        let Some(on_success) = self.on_success else {
            return Err(BridgeError::InvalidArgument(
                "successCallback is required".to_string(),
            ));
        };

        let config = self.session.config();
        let player = Arc::new(AudioPlayer {
            id: uuid::Uuid::new_v4().to_string(),
            source: self.source,
            on_success,
            on_error: self.on_error,
            on_status: self.on_status,
            state: Arc::new(Mutex::new(PlayerState::new())),
            exec: self.session.exec().clone(),
            platform: config.platform.clone(),
            capabilities: self.session.capabilities(),
            reject_stale: config.reject_stale_replies,
        });

        self.session
            .registry()
            .register(player.id.clone(), player.clone());
        tracing::debug!(id = %player.id, source = %player.source, "created audio player");

        player.exec.call(
            Command::Create,
            vec![json!(player.id), json!(player.source)],
            player.error_continuation(),
        )?;
        Ok(player)
    }
}

// Remu Audio Bridge Library

pub mod bridge;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod player;
pub mod registry;
pub mod session;

pub use bridge::{Command, NativeBridge, NativeCall, ReadyGate};
pub use config::{Capabilities, Platform, SessionConfig};
pub use dispatcher::StatusOutcome;
pub use error::{BridgeError, MediaError, MediaErrorCode};
pub use events::{MediaMessage, MediaState, NativeEvent};
pub use player::{AudioPlayer, PlayOptions, PlaybackControl};
pub use session::AudioSession;

//! LifeOS focus timer library
//!
//! This library provides the core functionality for the `focus` CLI.
//! It includes:
//! - Countdown engine and focus/break mode state machine
//! - Auto-chaining of the next countdown after a completion
//! - Session logging of completed focus countdowns
//! - Ambient sound playback and the completion alarm
//! - IPC server/client for daemon-CLI communication
//! - Settings file loading and path resolution

pub mod cli;
pub mod config;
pub mod daemon;
pub mod session;
pub mod sound;
pub mod surface;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    AudioState, ConfigParams, CountdownStatus, IpcRequest, IpcResponse, ResponseData,
    SessionRecord, TimerConfig, TimerMode, TimerState,
};

pub use config::{Settings, SettingsError};

pub use daemon::{AutoChain, RequestHandler, TimerDriver, TimerEngine, TimerEvent};

pub use session::{
    JsonFileSessionStore, MemorySessionStore, SessionError, SessionRecorder, SessionStore,
    StaticIdentity,
};

pub use sound::{AudioCoordinator, AudioOutput, MockAudioOutput, NullAudioOutput, SoundError};

pub use surface::{CountdownSurface, NullSurface, RecordingSurface, TerminalTitleSurface};

//! Core data types for the focus timer.
//!
//! This module defines the data structures used for:
//! - Timer modes, configuration and validation
//! - Countdown state and the completion sub-state
//! - Session records and audio state
//! - IPC request/response serialization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Limits
// ============================================================================

/// Upper bound for any configured duration, in minutes.
pub const MAX_MINUTES: u32 = 240;

/// Upper bound for the long-break interval, in focus cycles.
pub const MAX_LONG_BREAK_INTERVAL: u32 = 24;

/// Label stored for focus sessions completed without a task name.
pub const DEFAULT_SESSION_LABEL: &str = "Focus session";

// ============================================================================
// TimerMode
// ============================================================================

/// The three countdown modes of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Focused work
    #[default]
    Focus,
    /// Short break between focus sessions
    ShortBreak,
    /// Long break after every `long_break_interval` focus sessions
    LongBreak,
}

impl TimerMode {
    /// Returns the wire representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        }
    }

    /// Returns a human-readable name for the mode.
    pub fn display_name(&self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::ShortBreak => "Short break",
            TimerMode::LongBreak => "Long break",
        }
    }

    /// Returns true for either break mode.
    pub fn is_break(&self) -> bool {
        matches!(self, TimerMode::ShortBreak | TimerMode::LongBreak)
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Errors raised when a configuration edit is out of range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration is zero or above [`MAX_MINUTES`].
    #[error("{field} must be between 1 and {max} minutes (got {value})")]
    MinutesOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// The long-break interval is zero or above [`MAX_LONG_BREAK_INTERVAL`].
    #[error("long break interval must be between 1 and {max} cycles (got {value})")]
    IntervalOutOfRange { value: u32, max: u32 },
}

fn default_focus_minutes() -> u32 {
    25
}

fn default_short_break_minutes() -> u32 {
    5
}

fn default_long_break_minutes() -> u32 {
    15
}

fn default_long_break_interval() -> u32 {
    4
}

/// User-tunable durations and cadence of the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerConfig {
    /// Focus duration in minutes
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    /// Short break duration in minutes
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    /// Long break duration in minutes
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Number of focus sessions before a long break
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    /// Whether the next countdown starts on its own after a transition
    #[serde(default)]
    pub auto_start: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            long_break_interval: default_long_break_interval(),
            auto_start: false,
        }
    }
}

impl TimerConfig {
    /// Sets the focus duration.
    pub fn with_focus_minutes(mut self, minutes: u32) -> Self {
        self.focus_minutes = minutes;
        self
    }

    /// Sets the short break duration.
    pub fn with_short_break_minutes(mut self, minutes: u32) -> Self {
        self.short_break_minutes = minutes;
        self
    }

    /// Sets the long break duration.
    pub fn with_long_break_minutes(mut self, minutes: u32) -> Self {
        self.long_break_minutes = minutes;
        self
    }

    /// Sets the long-break interval.
    pub fn with_long_break_interval(mut self, cycles: u32) -> Self {
        self.long_break_interval = cycles;
        self
    }

    /// Sets the auto-start flag.
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Returns the configured minutes for `mode`.
    pub fn minutes(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::ShortBreak => self.short_break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        }
    }

    /// Returns the full countdown length for `mode` in seconds.
    pub fn duration_seconds(&self, mode: TimerMode) -> u32 {
        self.minutes(mode) * 60
    }

    /// Validates the configuration.
    ///
    /// The timer core assumes every applied configuration passed this check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("focus duration", self.focus_minutes),
            ("short break duration", self.short_break_minutes),
            ("long break duration", self.long_break_minutes),
        ];
        for (field, value) in durations {
            if value == 0 || value > MAX_MINUTES {
                return Err(ConfigError::MinutesOutOfRange {
                    field,
                    value,
                    max: MAX_MINUTES,
                });
            }
        }
        if self.long_break_interval == 0 || self.long_break_interval > MAX_LONG_BREAK_INTERVAL {
            return Err(ConfigError::IntervalOutOfRange {
                value: self.long_break_interval,
                max: MAX_LONG_BREAK_INTERVAL,
            });
        }
        Ok(())
    }
}

// ============================================================================
// CountdownStatus
// ============================================================================

/// Run status of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownStatus {
    /// Not counting down (fresh, paused or reset)
    #[default]
    Idle,
    /// Counting down once per second
    Running,
    /// Reached zero; the mode transition has not been applied yet
    Completing,
}

impl CountdownStatus {
    /// Returns the wire representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownStatus::Idle => "idle",
            CountdownStatus::Running => "running",
            CountdownStatus::Completing => "completing",
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Current state of the timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Current mode
    pub mode: TimerMode,
    /// Seconds left in the loaded countdown
    pub remaining_seconds: u32,
    /// Full length of the loaded countdown
    pub duration_seconds: u32,
    /// Run status
    pub status: CountdownStatus,
    /// Free-text task name
    pub label: String,
    /// Focus sessions completed since the timer was created
    pub cycle_count: u32,
    /// Active configuration
    pub config: TimerConfig,
}

impl TimerState {
    /// Creates a new idle state loaded with a full focus countdown.
    pub fn new(config: TimerConfig) -> Self {
        let duration_seconds = config.duration_seconds(TimerMode::Focus);
        Self {
            mode: TimerMode::Focus,
            remaining_seconds: duration_seconds,
            duration_seconds,
            status: CountdownStatus::Idle,
            label: String::new(),
            cycle_count: 0,
            config,
        }
    }

    /// Loads the full countdown for `mode` and goes idle.
    pub fn load_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
        self.duration_seconds = self.config.duration_seconds(mode);
        self.remaining_seconds = self.duration_seconds;
        self.status = CountdownStatus::Idle;
    }

    /// Decrements the countdown by one second.
    ///
    /// Returns true exactly when this tick brought a running countdown to
    /// zero; the state is then `Completing`. Ticks outside `Running` are
    /// ignored.
    pub fn tick(&mut self) -> bool {
        if self.status != CountdownStatus::Running {
            return false;
        }
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
        }
        if self.remaining_seconds == 0 {
            self.status = CountdownStatus::Completing;
            return true;
        }
        false
    }

    /// Returns true if the countdown is running.
    pub fn is_running(&self) -> bool {
        self.status == CountdownStatus::Running
    }

    /// Returns true while a completion is being handled.
    pub fn is_completing(&self) -> bool {
        self.status == CountdownStatus::Completing
    }

    /// Returns true if the countdown is idle.
    pub fn is_idle(&self) -> bool {
        self.status == CountdownStatus::Idle
    }

    /// Formats the remaining time as `MM:SS`.
    pub fn formatted_remaining(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

/// Formats seconds as a zero-padded `MM:SS` clock.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// SessionRecord
// ============================================================================

/// A completed focus session, as stored in the row store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Record id
    pub id: String,
    /// Owning user
    pub owner_id: String,
    /// Focus length in whole minutes
    pub duration_minutes: u32,
    /// Task name
    pub label: String,
    /// Completion time
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a record completed now.
    ///
    /// A blank label is replaced with [`DEFAULT_SESSION_LABEL`].
    pub fn new(owner_id: impl Into<String>, duration_minutes: u32, label: &str) -> Self {
        let label = label.trim();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            duration_minutes,
            label: if label.is_empty() {
                DEFAULT_SESSION_LABEL.to_string()
            } else {
                label.to_string()
            },
            completed_at: Utc::now(),
        }
    }
}

// ============================================================================
// AudioState
// ============================================================================

/// Ambient audio state, independent of the countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioState {
    /// Index into the ambient track catalog
    pub track_index: usize,
    /// Name of the selected track
    pub track_name: String,
    /// Whether the ambient track is playing
    pub is_playing: bool,
    /// Output volume (0.0-1.0)
    pub volume: f32,
}

// ============================================================================
// IPC Types
// ============================================================================

/// Partial configuration edit sent by the `configure` command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
}

impl ConfigParams {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Returns `base` with every set field overridden.
    pub fn apply_to(&self, base: &TimerConfig) -> TimerConfig {
        TimerConfig {
            focus_minutes: self.focus_minutes.unwrap_or(base.focus_minutes),
            short_break_minutes: self.short_break_minutes.unwrap_or(base.short_break_minutes),
            long_break_minutes: self.long_break_minutes.unwrap_or(base.long_break_minutes),
            long_break_interval: self.long_break_interval.unwrap_or(base.long_break_interval),
            auto_start: self.auto_start.unwrap_or(base.auto_start),
        }
    }
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Start (or resume) the countdown
    Start {
        /// Task name to attach to the session
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// Pause the countdown
    Pause,
    /// Reload the full countdown for a mode (current mode when omitted)
    Reset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<TimerMode>,
    },
    /// Switch to another mode
    Switch { mode: TimerMode },
    /// Query the current status
    Status,
    /// Edit the timer configuration
    Configure {
        #[serde(flatten)]
        params: ConfigParams,
    },
    /// Play or pause the ambient track
    SoundToggle,
    /// Select an ambient track and start it
    SoundTrack { index: usize },
    /// Set the ambient volume
    SoundVolume { volume: f32 },
    /// List the ambient track catalog
    SoundList,
    /// Fetch the most recent focus sessions
    History,
}

/// Catalog entry as sent over IPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub index: usize,
    pub name: String,
    pub category: String,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TimerMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CountdownStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<TimerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<SessionRecord>>,
}

impl ResponseData {
    /// Creates response data from timer state.
    pub fn from_timer_state(state: &TimerState) -> Self {
        Self {
            mode: Some(state.mode),
            status: Some(state.status),
            remaining_seconds: Some(state.remaining_seconds),
            cycle_count: Some(state.cycle_count),
            label: (!state.label.is_empty()).then(|| state.label.clone()),
            config: Some(state.config.clone()),
            ..Self::default()
        }
    }

    /// Attaches the audio state.
    pub fn with_audio(mut self, audio: AudioState) -> Self {
        self.audio = Some(audio);
        self
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for success responses.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================

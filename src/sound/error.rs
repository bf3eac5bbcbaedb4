//! Sound system error types.
//!
//! Playback errors never reach the timer: the coordinator logs them and
//! falls back to a paused state.

use thiserror::Error;

/// Errors that can occur in the audio subsystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Sound file was not found at the specified path.
    #[error("sound file not found: {0}")]
    FileNotFound(String),

    /// Failed to decode the audio file.
    #[error("failed to decode sound file: {0}")]
    DecodeError(String),

    /// Failed to create an output sink or reach the audio thread.
    #[error("audio stream error: {0}")]
    StreamError(String),

    /// Playback could not start.
    #[error("playback failed: {0}")]
    PlaybackError(String),

    /// Track index outside the ambient catalog.
    #[error("no ambient track at index {0}")]
    UnknownTrack(usize),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to the audio file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }

    /// Returns a user-facing hint for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "Connect an audio output device",
            Self::FileNotFound(_) => "Place the track in the sounds directory",
            Self::DecodeError(_) => "The sound file may be corrupt or in an unsupported format",
            Self::StreamError(_) => "Check the system audio settings",
            Self::PlaybackError(_) => "Try toggling playback again",
            Self::UnknownTrack(_) => "Run `focus sound list` to see available tracks",
        }
    }
}

//! Ambient sound and completion alarm.
//!
//! This module provides:
//!
//! - A fixed catalog of looping ambient tracks
//! - The [`AudioCoordinator`], which owns the selected track, play state and
//!   volume
//! - The completion alarm (an `alarm.wav` file or a synthesized chime)
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ AudioCoordinator │ ← track / playing / volume
//! └────────┬─────────┘
//!          │ Box<dyn AudioOutput>
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ RodioAudioOutput │────▶│   audio thread   │
//! ├──────────────────┤     │ (OutputStream)   │
//! │ NullAudioOutput  │     └──────────────────┘
//! │ MockAudioOutput  │
//! └──────────────────┘
//! ```
//!
//! Audio failures never propagate to the timer: the coordinator logs them
//! and reports the ambient track as paused.

mod catalog;
mod chime;
mod error;
mod player;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

pub use catalog::{
    track, track_infos, AmbientTrack, TrackCategory, ALARM_FILE, ALARM_VOLUME, TRACK_CATALOG,
};
pub use error::SoundError;
pub use player::{try_create_output, RodioAudioOutput};

use crate::types::{AudioState, TrackInfo};

/// Default ambient volume.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Audio backend used by the coordinator.
///
/// Implementations must not block for long; they are called while the
/// coordinator lock is held.
pub trait AudioOutput: Send + Sync {
    /// Loads `path` as the looping ambient source, paused.
    fn load(&self, path: &Path) -> Result<(), SoundError>;

    /// Resumes the loaded ambient source.
    fn play(&self) -> Result<(), SoundError>;

    /// Pauses the ambient source.
    fn pause(&self);

    /// Sets the ambient volume in `0.0..=1.0`.
    fn set_volume(&self, volume: f32);

    /// Plays the alarm once, independent of the ambient source.
    fn play_alarm(&self, path: &Path, volume: f32) -> Result<(), SoundError>;

    /// Returns true if an output device is present.
    fn is_available(&self) -> bool;
}

impl<T: AudioOutput + ?Sized> AudioOutput for Arc<T> {
    fn load(&self, path: &Path) -> Result<(), SoundError> {
        (**self).load(path)
    }

    fn play(&self) -> Result<(), SoundError> {
        (**self).play()
    }

    fn pause(&self) {
        (**self).pause()
    }

    fn set_volume(&self, volume: f32) {
        (**self).set_volume(volume)
    }

    fn play_alarm(&self, path: &Path, volume: f32) -> Result<(), SoundError> {
        (**self).play_alarm(path, volume)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

/// Output used when no audio device could be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudioOutput;

impl AudioOutput for NullAudioOutput {
    fn load(&self, _path: &Path) -> Result<(), SoundError> {
        Ok(())
    }

    fn play(&self) -> Result<(), SoundError> {
        Err(SoundError::DeviceNotAvailable("audio disabled".to_string()))
    }

    fn pause(&self) {}

    fn set_volume(&self, _volume: f32) {}

    fn play_alarm(&self, _path: &Path, _volume: f32) -> Result<(), SoundError> {
        Err(SoundError::DeviceNotAvailable("audio disabled".to_string()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Returns the rodio output, or [`NullAudioOutput`] if there is no device.
#[must_use]
pub fn default_output() -> Box<dyn AudioOutput> {
    match try_create_output() {
        Some(output) => Box::new(output),
        None => Box::new(NullAudioOutput),
    }
}

/// A call recorded by [`MockAudioOutput`].
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Load(PathBuf),
    Play,
    Pause,
    SetVolume(f32),
    Alarm { path: PathBuf, volume: f32 },
}

/// Mock audio output for testing.
#[derive(Debug, Default)]
pub struct MockAudioOutput {
    calls: Mutex<Vec<AudioCall>>,
    fail_load: AtomicBool,
    fail_play: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockAudioOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_load(&self, should_fail: bool) {
        self.fail_load.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_fail_play(&self, should_fail: bool) {
        self.fail_play.store(should_fail, Ordering::SeqCst);
    }

    /// Makes `load`, `play` and `play_alarm` block for `delay`, like a slow
    /// decoder or a stuck device.
    pub fn set_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms.store(millis, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn alarm_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, AudioCall::Alarm { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn wait(&self) {
        let millis = self.delay_ms.load(Ordering::SeqCst);
        if millis > 0 {
            std::thread::sleep(Duration::from_millis(millis));
        }
    }

    fn push(&self, call: AudioCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl AudioOutput for MockAudioOutput {
    fn load(&self, path: &Path) -> Result<(), SoundError> {
        self.wait();
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(SoundError::FileNotFound(path.display().to_string()));
        }
        self.push(AudioCall::Load(path.to_path_buf()));
        Ok(())
    }

    fn play(&self) -> Result<(), SoundError> {
        self.wait();
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        self.push(AudioCall::Play);
        Ok(())
    }

    fn pause(&self) {
        self.push(AudioCall::Pause);
    }

    fn set_volume(&self, volume: f32) {
        self.push(AudioCall::SetVolume(volume));
    }

    fn play_alarm(&self, path: &Path, volume: f32) -> Result<(), SoundError> {
        self.wait();
        self.push(AudioCall::Alarm {
            path: path.to_path_buf(),
            volume,
        });
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Clamps a requested volume into `0.0..=1.0`; NaN becomes silence.
#[must_use]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Owns ambient playback state and the alarm.
pub struct AudioCoordinator {
    output: Box<dyn AudioOutput>,
    sounds_dir: PathBuf,
    track_index: usize,
    loaded: Option<usize>,
    is_playing: bool,
    volume: f32,
    last_error: Option<SoundError>,
}

impl AudioCoordinator {
    /// Creates a coordinator in the paused state.
    ///
    /// An out-of-range `track_index` falls back to the first track.
    pub fn new(
        output: Box<dyn AudioOutput>,
        sounds_dir: impl Into<PathBuf>,
        track_index: usize,
        volume: f32,
    ) -> Self {
        let track_index = if track(track_index).is_some() {
            track_index
        } else {
            warn!("Unknown ambient track {}, using track 0", track_index);
            0
        };
        let volume = clamp_volume(volume);
        output.set_volume(volume);

        Self {
            output,
            sounds_dir: sounds_dir.into(),
            track_index,
            loaded: None,
            is_playing: false,
            volume,
            last_error: None,
        }
    }

    /// Returns the current playback state.
    #[must_use]
    pub fn state(&self) -> AudioState {
        AudioState {
            track_index: self.track_index,
            track_name: self.current_track().name.to_string(),
            is_playing: self.is_playing,
            volume: self.volume,
        }
    }

    /// Returns the ambient catalog.
    #[must_use]
    pub fn tracks(&self) -> Vec<TrackInfo> {
        track_infos()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.output.is_available()
    }

    /// Flips ambient playback between playing and paused.
    pub fn toggle(&mut self) -> AudioState {
        if self.is_playing {
            self.output.pause();
            self.is_playing = false;
            debug!("Ambient track paused");
        } else {
            self.start_playback();
        }
        self.state()
    }

    /// Selects a track and starts playing it.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::UnknownTrack` if `index` is outside the catalog;
    /// the current state is left untouched.
    pub fn change_track(&mut self, index: usize) -> Result<AudioState, SoundError> {
        if track(index).is_none() {
            return Err(SoundError::UnknownTrack(index));
        }
        if self.is_playing {
            self.output.pause();
            self.is_playing = false;
        }
        self.track_index = index;
        self.loaded = None;
        self.start_playback();
        Ok(self.state())
    }

    /// Sets the ambient volume, clamped into `0.0..=1.0`.
    pub fn set_volume(&mut self, volume: f32) -> AudioState {
        self.volume = clamp_volume(volume);
        self.output.set_volume(self.volume);
        self.state()
    }

    /// Plays the completion alarm at its fixed volume.
    pub fn play_alarm(&self) {
        let path = self.sounds_dir.join(ALARM_FILE);
        if let Err(e) = self.output.play_alarm(&path, ALARM_VOLUME) {
            warn!("Failed to play alarm: {}", e);
        }
    }

    /// Returns why the last attempt to start playback failed, if it did.
    #[must_use]
    pub fn last_error(&self) -> Option<&SoundError> {
        self.last_error.as_ref()
    }

    fn current_track(&self) -> &'static AmbientTrack {
        &TRACK_CATALOG[self.track_index]
    }

    fn start_playback(&mut self) {
        let track = self.current_track();

        if self.loaded != Some(self.track_index) {
            if let Err(e) = self.output.load(&track.path_in(&self.sounds_dir)) {
                warn!("Failed to load ambient track '{}': {}", track.name, e);
                self.loaded = None;
                self.is_playing = false;
                self.last_error = Some(e);
                return;
            }
            self.loaded = Some(self.track_index);
        }

        match self.output.play() {
            Ok(()) => {
                self.is_playing = true;
                self.last_error = None;
                info!("Playing ambient track '{}'", track.name);
            }
            Err(e) => {
                warn!("Failed to play ambient track '{}': {}", track.name, e);
                self.is_playing = false;
                self.last_error = Some(e);
            }
        }
    }
}

impl std::fmt::Debug for AudioCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCoordinator")
            .field("sounds_dir", &self.sounds_dir)
            .field("track_index", &self.track_index)
            .field("is_playing", &self.is_playing)
            .field("volume", &self.volume)
            .finish_non_exhaustive()
    }
}

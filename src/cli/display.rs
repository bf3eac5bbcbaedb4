//! Display utilities for the focus CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Status display
//! - Ambient track list
//! - Session history

use crate::types::{
    format_clock, AudioState, CountdownStatus, IpcResponse, ResponseData, SessionRecord,
    TimerConfig, TimerMode, TrackInfo,
};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message followed by the countdown line.
    pub fn show_result(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("{}", response.message);
        }
        if let Some(line) = response.data.as_ref().and_then(Self::countdown_line) {
            println!("  {}", line);
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        let Some(data) = &response.data else {
            println!("The daemon returned no status");
            return;
        };

        println!("Focus timer");
        println!("───────────");
        for line in Self::status_lines(data) {
            println!("{}", line);
        }
    }

    /// Shows the configuration after an update.
    pub fn show_config(response: &IpcResponse) {
        Self::show_result(response);
        if let Some(config) = response.data.as_ref().and_then(|d| d.config.as_ref()) {
            println!("  {}", Self::config_line(config));
        }
    }

    /// Shows the ambient sound state after a sound command.
    pub fn show_sound(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("{}", response.message);
        }
        if let Some(audio) = response.data.as_ref().and_then(|d| d.audio.as_ref()) {
            println!("  {}", Self::audio_line(audio));
        }
    }

    /// Shows the ambient track catalog, marking the selected track.
    pub fn show_tracks(response: &IpcResponse) {
        let Some(data) = &response.data else {
            return;
        };
        let selected = data.audio.as_ref().map(|a| a.track_index);
        for track in data.tracks.iter().flatten() {
            println!("{}", Self::track_line(track, selected == Some(track.index)));
        }
    }

    /// Shows the recent focus sessions.
    pub fn show_history(response: &IpcResponse) {
        let sessions = response
            .data
            .as_ref()
            .and_then(|d| d.sessions.as_deref())
            .unwrap_or_default();

        if sessions.is_empty() {
            println!("No focus sessions logged yet");
            return;
        }

        println!("Recent focus sessions");
        for session in sessions {
            println!("  {}", Self::session_line(session));
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    // ------------------------------------------------------------------------
    // Line formatting
    // ------------------------------------------------------------------------

    fn mode_name(mode: TimerMode) -> &'static str {
        mode.display_name()
    }

    fn status_name(status: CountdownStatus) -> &'static str {
        match status {
            CountdownStatus::Idle => "paused",
            CountdownStatus::Running => "running",
            CountdownStatus::Completing => "finishing",
        }
    }

    /// Formats e.g. "Focus 24:59 (running)".
    fn countdown_line(data: &ResponseData) -> Option<String> {
        let mode = data.mode?;
        let remaining = data.remaining_seconds?;
        let status = data.status.map(Self::status_name).unwrap_or("unknown");
        Some(format!(
            "{} {} ({})",
            Self::mode_name(mode),
            format_clock(remaining),
            status
        ))
    }

    fn status_lines(data: &ResponseData) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(line) = Self::countdown_line(data) {
            lines.push(line);
        }
        if let Some(count) = data.cycle_count {
            lines.push(format!("Completed focus sessions: {}", count));
        }
        if let Some(label) = &data.label {
            lines.push(format!("Task: {}", label));
        }
        if let Some(config) = &data.config {
            lines.push(Self::config_line(config));
        }
        if let Some(audio) = &data.audio {
            lines.push(Self::audio_line(audio));
        }
        lines
    }

    fn config_line(config: &TimerConfig) -> String {
        format!(
            "Focus {} min, short break {} min, long break {} min every {} sessions, auto-start {}",
            config.focus_minutes,
            config.short_break_minutes,
            config.long_break_minutes,
            config.long_break_interval,
            if config.auto_start { "on" } else { "off" }
        )
    }

    fn audio_line(audio: &AudioState) -> String {
        format!(
            "Sound: {} ({}, volume {:.0}%)",
            audio.track_name,
            if audio.is_playing { "playing" } else { "paused" },
            audio.volume * 100.0
        )
    }

    fn track_line(track: &TrackInfo, selected: bool) -> String {
        format!(
            "{} {:>2}  {:<14} {}",
            if selected { "*" } else { " " },
            track.index,
            track.name,
            track.category
        )
    }

    fn session_line(session: &SessionRecord) -> String {
        format!(
            "{}  {:>3} min  {}",
            session.completed_at.format("%Y-%m-%d %H:%M"),
            session.duration_minutes,
            session.label
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

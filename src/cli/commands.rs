//! Command definitions for the focus CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{ConfigParams, TimerMode, MAX_LONG_BREAK_INTERVAL, MAX_MINUTES};

// ============================================================================
// CLI Structure
// ============================================================================

/// LifeOS focus timer
#[derive(Parser, Debug)]
#[command(
    name = "focus",
    version,
    about = "Pomodoro-style focus timer with ambient sound",
    long_about = "A focus timer that alternates focus sessions with short and long breaks.\n\
                  A background daemon keeps time, plays ambient sound and logs completed sessions.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start or resume the countdown
    Start(StartArgs),

    /// Pause the countdown
    Pause,

    /// Stop and reload the full countdown
    Reset {
        /// Mode to reset to (defaults to the current mode)
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Switch to another mode
    Switch {
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Show the current timer status
    Status,

    /// Change durations and cadence
    Config(ConfigArgs),

    /// Control ambient sound
    #[command(subcommand)]
    Sound(SoundCommand),

    /// Show recent focus sessions
    History,

    /// Run the background daemon
    Daemon {
        /// Settings file (defaults to ~/.lifeos/focus.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Timer mode as given on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Focus,
    ShortBreak,
    LongBreak,
}

impl From<ModeArg> for TimerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Focus => TimerMode::Focus,
            ModeArg::ShortBreak => TimerMode::ShortBreak,
            ModeArg::LongBreak => TimerMode::LongBreak,
        }
    }
}

// ============================================================================
// Start Command Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Task name for this session
    #[arg(short, long, value_parser = validate_label)]
    pub label: Option<String>,
}

// ============================================================================
// Config Command Arguments
// ============================================================================

/// Arguments for the config command
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Focus duration in minutes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_MINUTES)))]
    pub focus: Option<u32>,

    /// Short break duration in minutes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_MINUTES)))]
    pub short_break: Option<u32>,

    /// Long break duration in minutes
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_MINUTES)))]
    pub long_break: Option<u32>,

    /// Focus sessions before a long break
    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LONG_BREAK_INTERVAL))
    )]
    pub interval: Option<u32>,

    /// Start the next countdown automatically
    #[arg(long, conflicts_with = "no_auto_start")]
    pub auto_start: bool,

    /// Wait for a manual start after each transition
    #[arg(long)]
    pub no_auto_start: bool,
}

impl ConfigArgs {
    /// Converts the arguments into a partial configuration edit.
    pub fn to_params(&self) -> ConfigParams {
        let auto_start = if self.auto_start {
            Some(true)
        } else if self.no_auto_start {
            Some(false)
        } else {
            None
        };

        ConfigParams {
            focus_minutes: self.focus,
            short_break_minutes: self.short_break,
            long_break_minutes: self.long_break,
            long_break_interval: self.interval,
            auto_start,
        }
    }
}

// ============================================================================
// Sound Subcommands
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum SoundCommand {
    /// Play or pause the ambient track
    Toggle,

    /// Select an ambient track and play it
    Track {
        /// Catalog index (see `focus sound list`)
        index: usize,
    },

    /// Set the ambient volume (0.0 - 1.0)
    Volume {
        #[arg(value_parser = parse_volume)]
        volume: f32,
    },

    /// List the ambient tracks
    List,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the task name.
///
/// - Must not exceed 100 characters
fn validate_label(s: &str) -> Result<String, String> {
    if s.chars().count() > 100 {
        return Err("Task name must be at most 100 characters".to_string());
    }
    Ok(s.to_string())
}

/// Parses a volume in `0.0..=1.0`.
fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if !(0.0..=1.0).contains(&volume) {
        return Err("Volume must be between 0.0 and 1.0".to_string());
    }
    Ok(volume)
}

// ============================================================================
// Tests
// ============================================================================

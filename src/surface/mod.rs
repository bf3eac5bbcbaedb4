//! Visible countdown surface.
//!
//! This module handles:
//! - Generating the display title (e.g., "🍅 15:30")
//! - Pushing the title to wherever the countdown is shown
//!
//! The title logic is platform-independent and fully testable. The daemon
//! shows it as the terminal window title.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::types::{format_clock, TimerMode, TimerState};

// ============================================================================
// Constants
// ============================================================================

/// Indicator for focus countdowns
const FOCUS_EMOJI: &str = "🍅";

/// Indicator for short breaks
const SHORT_BREAK_EMOJI: &str = "☕";

/// Indicator for long breaks
const LONG_BREAK_EMOJI: &str = "🌴";

// ============================================================================
// Title generation
// ============================================================================

/// Returns the indicator shown in front of the clock.
pub fn mode_indicator(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Focus => FOCUS_EMOJI,
        TimerMode::ShortBreak => SHORT_BREAK_EMOJI,
        TimerMode::LongBreak => LONG_BREAK_EMOJI,
    }
}

/// Generates the surface title.
///
/// # Examples
///
/// ```
/// use lifeos_focus::surface::title_for;
/// use lifeos_focus::types::TimerMode;
///
/// assert_eq!(title_for(TimerMode::Focus, 930), "🍅 15:30");
/// assert_eq!(title_for(TimerMode::LongBreak, 900), "🌴 15:00");
/// ```
pub fn title_for(mode: TimerMode, remaining_seconds: u32) -> String {
    format!("{} {}", mode_indicator(mode), format_clock(remaining_seconds))
}

/// Generates the surface title for a timer snapshot.
pub fn title_for_state(state: &TimerState) -> String {
    title_for(state.mode, state.remaining_seconds)
}

// ============================================================================
// CountdownSurface
// ============================================================================

/// Destination for the countdown title.
pub trait CountdownSurface: Send + Sync {
    fn render(&self, title: &str);
}

/// Writes the title as an OSC 0 window-title escape to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalTitleSurface;

impl TerminalTitleSurface {
    /// Returns the escape sequence for `title`.
    pub fn escape(title: &str) -> String {
        format!("\x1b]0;{}\x07", title)
    }
}

impl CountdownSurface for TerminalTitleSurface {
    fn render(&self, title: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(Self::escape(title).as_bytes());
        let _ = stderr.flush();
    }
}

/// Surface that discards every title.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl CountdownSurface for NullSurface {
    fn render(&self, _title: &str) {}
}

/// Surface that keeps every rendered title, for tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    titles: Mutex<Vec<String>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titles(&self) -> Vec<String> {
        self.titles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.titles().pop()
    }
}

impl CountdownSurface for RecordingSurface {
    fn render(&self, title: &str) {
        self.titles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(title.to_string());
    }
}

impl<T: CountdownSurface + ?Sized> CountdownSurface for std::sync::Arc<T> {
    fn render(&self, title: &str) {
        (**self).render(title)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimerConfig;

    mod title_tests {
        use super::*;

        #[test]
        fn test_focus_title() {
            assert_eq!(title_for(TimerMode::Focus, 25 * 60), "🍅 25:00");
        }

        #[test]
        fn test_short_break_title() {
            assert_eq!(title_for(TimerMode::ShortBreak, 299), "☕ 04:59");
        }

        #[test]
        fn test_long_break_title() {
            assert_eq!(title_for(TimerMode::LongBreak, 15 * 60), "🌴 15:00");
        }

        #[test]
        fn test_zero_remaining() {
            assert_eq!(title_for(TimerMode::Focus, 0), "🍅 00:00");
        }

        #[test]
        fn test_title_over_an_hour() {
            assert_eq!(title_for(TimerMode::Focus, 240 * 60), "🍅 240:00");
        }

        #[test]
        fn test_title_for_state() {
            let state = TimerState::new(TimerConfig::default());
            assert_eq!(title_for_state(&state), "🍅 25:00");
        }
    }

    mod surface_tests {
        use super::*;

        #[test]
        fn test_terminal_escape() {
            assert_eq!(
                TerminalTitleSurface::escape("🍅 01:00"),
                "\x1b]0;🍅 01:00\x07"
            );
        }

        #[test]
        fn test_recording_surface() {
            let surface = RecordingSurface::new();
            surface.render("🍅 25:00");
            surface.render("🍅 24:59");

            assert_eq!(surface.titles(), vec!["🍅 25:00", "🍅 24:59"]);
            assert_eq!(surface.last(), Some("🍅 24:59".to_string()));
        }

        #[test]
        fn test_null_surface_no_panic() {
            NullSurface.render("anything");
        }
    }
}

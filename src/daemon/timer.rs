//! Timer engine for the focus timer.
//!
//! This module provides the countdown and mode state machine:
//! - Countdown ticks with an explicit `Completing` sub-state
//! - Transitions focus → short/long break → focus
//! - Manual start, pause, reset and mode switches
//! - Restart tokens that let a delayed auto-start detect intervening
//!   manual actions
//!
//! The engine never performs I/O. Side effects (session logging, alarm,
//! auto-start) are described by the returned [`Transition`] and carried out
//! by the driver.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{CountdownStatus, TimerConfig, TimerMode, TimerState};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for logging and external observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started
    Started {
        mode: TimerMode,
        remaining_seconds: u32,
    },
    /// Countdown paused
    Paused {
        mode: TimerMode,
        remaining_seconds: u32,
    },
    /// Countdown reloaded for a mode
    Reset { mode: TimerMode },
    /// Mode switched by the user
    ModeSwitched { from: TimerMode, to: TimerMode },
    /// One second elapsed
    Tick {
        mode: TimerMode,
        remaining_seconds: u32,
    },
    /// A focus countdown reached zero
    FocusCompleted {
        cycle_count: u32,
        duration_minutes: u32,
        label: String,
    },
    /// A break countdown reached zero
    BreakCompleted { mode: TimerMode },
    /// Mode changed after a completion
    Transitioned { from: TimerMode, to: TimerMode },
    /// Configuration replaced
    ConfigUpdated,
}

// ============================================================================
// Transition
// ============================================================================

/// Token identifying the engine epoch an auto-start was scheduled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartToken(u64);

/// A finished focus countdown that should be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedFocus {
    pub duration_minutes: u32,
    pub label: String,
}

/// Outcome of a completed countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Mode that just completed
    pub from: TimerMode,
    /// Mode now loaded (idle)
    pub to: TimerMode,
    /// Cycle count after the transition
    pub cycle_count: u32,
    /// Present only when leaving focus mode
    pub completed_focus: Option<CompletedFocus>,
    /// Present only when auto-start is enabled
    pub auto_restart: Option<RestartToken>,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Countdown not running; nothing changed
    Idle,
    /// Countdown decremented
    Ticked { mode: TimerMode, remaining_seconds: u32 },
    /// Countdown reached zero and is now `Completing`
    Completed,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the timer state.
pub struct TimerEngine {
    /// Current timer state
    state: TimerState,
    /// Bumped by every manual action and transition
    epoch: u64,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates a new engine loaded with a full focus countdown.
    pub fn new(config: TimerConfig, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            state: TimerState::new(config),
            epoch: 0,
            event_tx,
        }
    }

    fn emit(&self, event: TimerEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .context("Failed to send timer event")
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if !self.state.is_running() {
            return Ok(TickOutcome::Idle);
        }

        let completed = self.state.tick();

        self.emit(TimerEvent::Tick {
            mode: self.state.mode,
            remaining_seconds: self.state.remaining_seconds,
        })?;

        if completed {
            Ok(TickOutcome::Completed)
        } else {
            Ok(TickOutcome::Ticked {
                mode: self.state.mode,
                remaining_seconds: self.state.remaining_seconds,
            })
        }
    }

    /// Applies the mode transition for a countdown in `Completing`.
    ///
    /// Returns `None` when no completion is pending, so repeated calls
    /// handle a completion at most once.
    pub fn complete(&mut self) -> Result<Option<Transition>> {
        if !self.state.is_completing() {
            return Ok(None);
        }

        let from = self.state.mode;
        let (to, completed_focus) = match from {
            TimerMode::Focus => {
                // Increment before the modulo test: the Nth completion with
                // N a multiple of the interval earns the long break.
                self.state.cycle_count += 1;
                let to = if self.state.cycle_count % self.state.config.long_break_interval == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                };
                let completed = CompletedFocus {
                    duration_minutes: self.state.duration_seconds / 60,
                    label: self.state.label.clone(),
                };
                self.emit(TimerEvent::FocusCompleted {
                    cycle_count: self.state.cycle_count,
                    duration_minutes: completed.duration_minutes,
                    label: completed.label.clone(),
                })?;
                (to, Some(completed))
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => {
                self.emit(TimerEvent::BreakCompleted { mode: from })?;
                (TimerMode::Focus, None)
            }
        };

        self.state.load_mode(to);
        self.epoch += 1;

        self.emit(TimerEvent::Transitioned { from, to })?;

        Ok(Some(Transition {
            from,
            to,
            cycle_count: self.state.cycle_count,
            completed_focus,
            auto_restart: self
                .state
                .config
                .auto_start
                .then_some(RestartToken(self.epoch)),
        }))
    }

    /// Starts (or resumes) the countdown. No-op unless idle.
    pub fn start(&mut self) -> Result<()> {
        if !self.state.is_idle() {
            return Ok(());
        }
        self.begin()
    }

    fn begin(&mut self) -> Result<()> {
        if self.state.remaining_seconds == 0 {
            self.state.load_mode(self.state.mode);
        }
        self.state.status = CountdownStatus::Running;
        self.epoch += 1;

        self.emit(TimerEvent::Started {
            mode: self.state.mode,
            remaining_seconds: self.state.remaining_seconds,
        })
    }

    /// Starts the countdown on behalf of the auto-chain.
    ///
    /// Returns false without changing anything if another action or
    /// transition happened since `token` was issued.
    pub fn auto_start(&mut self, token: RestartToken) -> Result<bool> {
        if token.0 != self.epoch || !self.state.is_idle() {
            debug!(
                "Stale auto-start ignored (token {}, epoch {})",
                token.0, self.epoch
            );
            return Ok(false);
        }
        self.begin()?;
        Ok(true)
    }

    /// Pauses a running countdown, keeping the remaining time.
    ///
    /// The remaining time is clamped to the configured duration of the
    /// current mode, which may have shrunk while the countdown ran.
    /// Also cancels a pending auto-start, even when nothing is running.
    pub fn pause(&mut self) -> Result<()> {
        self.epoch += 1;
        if !self.state.is_running() {
            return Ok(());
        }

        self.state.status = CountdownStatus::Idle;

        let configured = self.state.config.duration_seconds(self.state.mode);
        if self.state.remaining_seconds > configured {
            self.state.remaining_seconds = configured;
            self.state.duration_seconds = configured;
        }

        self.emit(TimerEvent::Paused {
            mode: self.state.mode,
            remaining_seconds: self.state.remaining_seconds,
        })
    }

    /// Stops the countdown and reloads the full duration of `mode`
    /// (the current mode when `None`).
    pub fn reset(&mut self, mode: Option<TimerMode>) -> Result<()> {
        let mode = mode.unwrap_or(self.state.mode);
        self.state.load_mode(mode);
        self.epoch += 1;

        self.emit(TimerEvent::Reset { mode })
    }

    /// Switches to `target`, stopping the countdown.
    pub fn switch_mode(&mut self, target: TimerMode) -> Result<()> {
        let from = self.state.mode;
        self.state.load_mode(target);
        self.epoch += 1;

        self.emit(TimerEvent::ModeSwitched { from, to: target })
    }

    /// Sets the task name attached to the next logged session.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.state.label = label.into();
    }

    /// Replaces the configuration.
    ///
    /// An idle countdown is reloaded with the new duration for the current
    /// mode; a running countdown keeps its remaining time.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn update_config(&mut self, config: TimerConfig) -> Result<()> {
        config.validate()?;

        self.state.config = config;
        if self.state.is_idle() {
            self.state.load_mode(self.state.mode);
        }

        self.emit(TimerEvent::ConfigUpdated)
    }

    /// Returns a reference to the current timer state.
    pub fn get_state(&self) -> &TimerState {
        &self.state
    }

    /// Returns a mutable reference to the timer state (for testing).
    #[cfg(test)]
    pub fn get_state_mut(&mut self) -> &mut TimerState {
        &mut self.state
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Tick loop and transition side effects.
//!
//! The driver is the only caller of [`TimerEngine::tick`] and
//! [`TimerEngine::complete`]. Both run under one engine lock, so a
//! completion is applied once no matter how ticks arrive. Side effects of
//! a transition run in this order:
//!
//! 1. the alarm plays
//! 2. the completed focus session is logged (best-effort)
//! 3. the auto-chain restart is scheduled
//!
//! None of them can undo or block the transition itself. Audio backends
//! may block, so every coordinator call goes through [`with_audio`] on the
//! blocking pool.

use std::sync::{Arc, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::session::{SessionRecorder, SessionStore};
use crate::sound::AudioCoordinator;
use crate::surface::{title_for_state, CountdownSurface};

use super::auto_chain::AutoChain;
use super::timer::{TickOutcome, TimerEngine, Transition};

/// Tick period of the countdown.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Audio coordinator shared between the driver and request handler.
pub type SharedAudio = Arc<std::sync::Mutex<AudioCoordinator>>;

/// Locks the shared coordinator, recovering from a poisoned lock.
fn lock_audio(audio: &SharedAudio) -> MutexGuard<'_, AudioCoordinator> {
    audio.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs `f` on the shared coordinator from the blocking pool, so a slow
/// decoder or a stuck device never stalls the tick loop or IPC.
pub async fn with_audio<R, F>(audio: &SharedAudio, f: F) -> Result<R>
where
    F: FnOnce(&mut AudioCoordinator) -> R + Send + 'static,
    R: Send + 'static,
{
    let audio = Arc::clone(audio);
    tokio::task::spawn_blocking(move || f(&mut lock_audio(&audio)))
        .await
        .context("Audio task failed")
}

/// Result of one driver step.
#[derive(Debug)]
pub struct StepOutcome {
    pub tick: TickOutcome,
    /// Session logging and auto-chain task of a transition.
    pub effects: Option<JoinHandle<()>>,
}

pub struct TimerDriver<S: SessionStore> {
    engine: Arc<Mutex<TimerEngine>>,
    recorder: Arc<SessionRecorder<S>>,
    audio: SharedAudio,
    surface: Arc<dyn CountdownSurface>,
    auto_chain: AutoChain,
    last_title: Option<String>,
}

impl<S: SessionStore> TimerDriver<S> {
    pub fn new(
        engine: Arc<Mutex<TimerEngine>>,
        recorder: Arc<SessionRecorder<S>>,
        audio: SharedAudio,
        surface: Arc<dyn CountdownSurface>,
    ) -> Self {
        Self {
            engine,
            recorder,
            audio,
            surface,
            auto_chain: AutoChain::default(),
            last_title: None,
        }
    }

    pub fn with_auto_chain(mut self, auto_chain: AutoChain) -> Self {
        self.auto_chain = auto_chain;
        self
    }

    pub fn engine(&self) -> &Arc<Mutex<TimerEngine>> {
        &self.engine
    }

    pub fn recorder(&self) -> &Arc<SessionRecorder<S>> {
        &self.recorder
    }

    /// Runs the tick loop forever.
    ///
    /// Ticks while the countdown is not running are no-ops, so the loop is
    /// started once for the lifetime of the daemon. Missed ticks are
    /// delivered in a burst so the countdown keeps pace with the wall clock.
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        // The first tick completes immediately.
        ticker.tick().await;
        self.refresh_surface().await;

        loop {
            ticker.tick().await;
            self.step().await?;
        }
    }

    /// Delivers one tick and applies any resulting transition.
    pub async fn step(&mut self) -> Result<StepOutcome> {
        let (tick, transition, title) = {
            let mut engine = self.engine.lock().await;
            let tick = engine.tick()?;
            let transition = match tick {
                TickOutcome::Completed => engine.complete()?,
                _ => None,
            };
            (tick, transition, title_for_state(engine.get_state()))
        };

        self.render(title);
        let effects = transition.map(|transition| self.dispatch(transition));

        Ok(StepOutcome { tick, effects })
    }

    /// Renders the current title, e.g. after a manual action.
    pub async fn refresh_surface(&mut self) {
        let title = title_for_state(self.engine.lock().await.get_state());
        self.render(title);
    }

    fn render(&mut self, title: String) {
        if self.last_title.as_deref() == Some(title.as_str()) {
            return;
        }
        self.surface.render(&title);
        self.last_title = Some(title);
    }

    fn dispatch(&self, transition: Transition) -> JoinHandle<()> {
        info!(
            "{} complete, switching to {} (cycle {})",
            transition.from.display_name(),
            transition.to.display_name(),
            transition.cycle_count
        );

        let audio = Arc::clone(&self.audio);
        let recorder = Arc::clone(&self.recorder);
        let engine = Arc::clone(&self.engine);
        let auto_chain = self.auto_chain;

        tokio::spawn(async move {
            if let Err(e) = with_audio(&audio, |audio| audio.play_alarm()).await {
                warn!("{:#}", e);
            }
            if let Some(focus) = transition.completed_focus {
                recorder
                    .record_completion(focus.duration_minutes, &focus.label)
                    .await;
            }
            if let Some(token) = transition.auto_restart {
                auto_chain.restart_after(&engine, token).await;
            }
        })
    }
}

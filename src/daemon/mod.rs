//! Daemon module for the focus timer.
//!
//! This module contains the core daemon functionality:
//! - `timer`: countdown engine and mode state machine
//! - `driver`: tick loop and transition side effects
//! - `auto_chain`: delayed automatic start of the next countdown
//! - `ipc`: Unix socket server and request handling
//!
//! [`run`] wires them together and serves until Ctrl-C.

pub mod auto_chain;
pub mod driver;
pub mod ipc;
pub mod timer;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::config::Settings;
use crate::session::{JsonFileSessionStore, SessionRecorder, StaticIdentity};
use crate::sound::{default_output, AudioCoordinator};
use crate::surface::{CountdownSurface, NullSurface, TerminalTitleSurface};

pub use auto_chain::{AutoChain, AUTO_START_DELAY};
pub use driver::{with_audio, SharedAudio, StepOutcome, TimerDriver, TICK_INTERVAL};
pub use ipc::{IpcError, IpcServer, RequestHandler, MAX_REQUEST_SIZE};
pub use timer::{RestartToken, TickOutcome, TimerEngine, TimerEvent, Transition};

/// Logs timer events until the engine is dropped.
async fn log_events(mut rx: mpsc::UnboundedReceiver<TimerEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            TimerEvent::Tick { .. } => {}
            TimerEvent::FocusCompleted {
                cycle_count,
                duration_minutes,
                label,
            } => info!(
                "Focus session #{} complete ({} min, '{}')",
                cycle_count, duration_minutes, label
            ),
            other => debug!("Timer event: {:?}", other),
        }
    }
}

/// Runs the daemon until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the socket can't be bound, a path can't be
/// resolved, or the tick loop fails.
pub async fn run(settings: Settings) -> Result<()> {
    let socket_path = settings.socket_path()?;
    let sessions_path = settings.sessions_path()?;
    let sounds_dir = settings.sounds_dir()?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(Mutex::new(TimerEngine::new(
        settings.timer.clone(),
        event_tx,
    )));

    let identity = StaticIdentity::new(settings.owner_id());
    if identity.is_guest() {
        info!("No owner configured, focus sessions will not be logged");
    }
    let recorder = Arc::new(SessionRecorder::new(
        JsonFileSessionStore::new(&sessions_path),
        Arc::new(identity),
    ));
    recorder.refresh_recent().await;

    let audio: SharedAudio = Arc::new(std::sync::Mutex::new(AudioCoordinator::new(
        default_output(),
        sounds_dir,
        settings.track_index,
        settings.volume,
    )));

    let surface: Arc<dyn CountdownSurface> = if settings.window_title {
        Arc::new(TerminalTitleSurface)
    } else {
        Arc::new(NullSurface)
    };

    let server = IpcServer::new(&socket_path)?;
    let handler = Arc::new(RequestHandler::new(
        Arc::clone(&engine),
        Arc::clone(&audio),
        Arc::clone(&recorder),
    ));
    let driver = TimerDriver::new(engine, recorder, audio, surface);

    info!("Focus daemon listening on {}", socket_path.display());

    tokio::spawn(log_events(event_rx));

    tokio::select! {
        result = driver.run() => result.context("Timer loop stopped")?,
        result = server.serve(handler) => result.context("IPC server stopped")?,
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
    }

    Ok(())
}

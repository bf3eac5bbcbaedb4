//! Delayed automatic start of the next countdown.
//!
//! After a transition the next countdown starts on its own when
//! `auto_start` is on. The restart waits [`AUTO_START_DELAY`] and is
//! dropped if any manual action touched the timer in the meantime.

use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{info, warn};

use super::timer::{RestartToken, TimerEngine};

/// Pause between a transition and the automatic start.
pub const AUTO_START_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoChain {
    delay: Duration,
}

impl Default for AutoChain {
    fn default() -> Self {
        Self::new(AUTO_START_DELAY)
    }
}

impl AutoChain {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits out the delay, then starts the countdown if `token` is still
    /// current. Returns whether the countdown was started.
    pub async fn restart_after(&self, engine: &Mutex<TimerEngine>, token: RestartToken) -> bool {
        tokio::time::sleep(self.delay).await;

        let mut engine = engine.lock().await;
        match engine.auto_start(token) {
            Ok(true) => {
                info!(
                    "Auto-started {} countdown",
                    engine.get_state().mode.display_name()
                );
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("Auto-start failed: {:#}", e);
                false
            }
        }
    }
}

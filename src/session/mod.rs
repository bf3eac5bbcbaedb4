//! Session logging for completed focus sessions.
//!
//! The recorder appends one immutable [`SessionRecord`] per completed focus
//! countdown and keeps a small cache of the most recent records.
//!
//! # Failure semantics
//!
//! Logging is best-effort. A missing identity (guest) skips the write
//! silently; store failures are logged and swallowed. Nothing here can
//! fail or block a mode transition.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lifeos_focus::session::{MemorySessionStore, SessionRecorder, StaticIdentity};
//!
//! # async fn example() {
//! let recorder = SessionRecorder::new(
//!     MemorySessionStore::new(),
//!     Arc::new(StaticIdentity::user("user-1")),
//! );
//! recorder.record_completion(25, "Write report").await;
//! assert_eq!(recorder.recent().len(), 1);
//! # }
//! ```

mod error;
mod identity;
mod store;

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

pub use error::SessionError;
pub use identity::{IdentityProvider, StaticIdentity};
pub use store::{JsonFileSessionStore, MemorySessionStore};

use crate::types::SessionRecord;

/// Number of records kept in the recent-history view.
pub const RECENT_SESSION_LIMIT: usize = 5;

/// Persistence collaborator for session records.
pub trait SessionStore: Send + Sync + 'static {
    /// Appends one record.
    fn insert(
        &self,
        record: &SessionRecord,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Returns up to `limit` records of `owner_id`, newest first.
    fn recent(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SessionRecord>, SessionError>> + Send;
}

/// Logs completed focus sessions to a [`SessionStore`].
pub struct SessionRecorder<S> {
    store: S,
    identity: Arc<dyn IdentityProvider>,
    recent: RwLock<Vec<SessionRecord>>,
}

impl<S: SessionStore> SessionRecorder<S> {
    pub fn new(store: S, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            recent: RwLock::new(Vec::new()),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Logs a completed focus session for the current owner.
    ///
    /// Returns the stored record, or `None` if the user is a guest or the
    /// store rejected the write.
    pub async fn record_completion(&self, duration_minutes: u32, label: &str) -> Option<SessionRecord> {
        let Some(owner_id) = self.identity.owner_id() else {
            debug!("No signed-in owner, focus session not logged");
            return None;
        };

        let record = SessionRecord::new(owner_id, duration_minutes, label);
        if let Err(e) = self.store.insert(&record).await {
            warn!("Failed to log focus session: {}", e);
            return None;
        }
        info!(
            "Logged focus session '{}' ({} min)",
            record.label, record.duration_minutes
        );

        self.refresh_recent().await;
        Some(record)
    }

    /// Reloads the recent-history view from the store.
    ///
    /// On failure the previous view is kept and returned.
    pub async fn refresh_recent(&self) -> Vec<SessionRecord> {
        let Some(owner_id) = self.identity.owner_id() else {
            return Vec::new();
        };

        match self.store.recent(&owner_id, RECENT_SESSION_LIMIT).await {
            Ok(records) => {
                *self.recent.write().unwrap_or_else(PoisonError::into_inner) = records.clone();
                records
            }
            Err(e) => {
                warn!("Failed to load recent focus sessions: {}", e);
                self.recent()
            }
        }
    }

    /// Returns the cached recent-history view, newest first.
    pub fn recent(&self) -> Vec<SessionRecord> {
        self.recent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

//! Row-store implementations for session records.
//!
//! - [`MemorySessionStore`]: in-process rows, with a failure switch for tests
//! - [`JsonFileSessionStore`]: rows kept as a JSON array in a local file

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::debug;

use super::error::SessionError;
use super::SessionStore;
use crate::types::SessionRecord;

/// Returns the newest `limit` rows of `owner_id`, newest first.
fn select_recent(rows: &[SessionRecord], owner_id: &str, limit: usize) -> Vec<SessionRecord> {
    let mut owned: Vec<SessionRecord> = rows
        .iter()
        .filter(|row| row.owner_id == owner_id)
        .cloned()
        .collect();
    owned.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    owned.truncate(limit);
    owned
}

// ============================================================================
// MemorySessionStore
// ============================================================================

/// Session store kept in memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    rows: Mutex<Vec<SessionRecord>>,
    should_fail: AtomicBool,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `SessionError::Unavailable`.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Returns a copy of all stored rows in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<SessionRecord> {
        self.rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn check_available(&self) -> Result<(), SessionError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SessionError::Unavailable("simulated network error".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: &SessionRecord) -> Result<(), SessionError> {
        self.check_available()?;
        self.rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn recent(&self, owner_id: &str, limit: usize) -> Result<Vec<SessionRecord>, SessionError> {
        self.check_available()?;
        let rows = self
            .rows
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(select_recent(&rows, owner_id, limit))
    }
}

// ============================================================================
// JsonFileSessionStore
// ============================================================================

/// Session store backed by a JSON file.
///
/// The whole table is rewritten on every insert; writes are serialized by
/// an async lock.
#[derive(Debug)]
pub struct JsonFileSessionStore {
    path: PathBuf,
    lock: tokio::sync::Mutex<()>,
}

impl JsonFileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<SessionRecord>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Sibling file the table is written to before it replaces `path`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Writes the table to a temp file and renames it over `path`, so an
    /// interrupted write never leaves a truncated table behind.
    async fn save(&self, rows: &[SessionRecord]) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(rows)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

impl SessionStore for JsonFileSessionStore {
    async fn insert(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let mut rows = self.load().await?;
        rows.push(record.clone());
        self.save(&rows).await?;
        debug!("Stored session {} in {}", record.id, self.path.display());
        Ok(())
    }

    async fn recent(&self, owner_id: &str, limit: usize) -> Result<Vec<SessionRecord>, SessionError> {
        let _guard = self.lock.lock().await;
        let rows = self.load().await?;
        Ok(select_recent(&rows, owner_id, limit))
    }
}

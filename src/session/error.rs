//! Session store error types.
//!
//! Every variant is recoverable: the recorder logs it and the timer keeps
//! going.

use thiserror::Error;

/// Errors that can occur while reading or writing session records.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing file could not be read or written.
    #[error("session store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The stored rows could not be (de)serialized.
    #[error("session store data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refused or could not reach the request.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

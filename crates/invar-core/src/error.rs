//! Engine-wide error taxonomy.
//!
//! One closed set of failure categories shared by every component;
//! crate-local errors (connector, store) convert into these at the seam.

use thiserror::Error;

use crate::types::SourceType;

/// Errors surfaced by the synchronization engine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Caller-supplied input failed validation.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// The source adapter could not be reached.
    #[error("source {source_type} unavailable: {message}")]
    SourceUnavailable {
        source_type: SourceType,
        message: String,
    },

    /// A sync cycle is already in flight for this source.
    #[error("sync already running for source {source_type}")]
    ConcurrentSync { source_type: SourceType },

    /// No adapter registered for the source.
    #[error("no adapter registered for source {source_type}")]
    SourceNotRegistered { source_type: SourceType },

    /// Canonical store read or write failure.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl SyncError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        SyncError::Validation {
            message: message.into(),
        }
    }
}

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

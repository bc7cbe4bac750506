//! Sync engine error types.
//!
//! Remote-call failures are deliberately NOT represented here: they are
//! recovered inline (logged, counted, skipped) and self-heal on the next
//! pass. Only conditions that invalidate a whole run surface as errors.

use thiserror::Error;

use courselink_core::StoreError;

/// Errors that can abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A store port failed; local data could not be read or written.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The configured username exclusion pattern is not a valid regex.
    #[error("invalid username exclusion pattern '{pattern}': {message}")]
    InvalidExclusionPattern { pattern: String, message: String },
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

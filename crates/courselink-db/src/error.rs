//! Persistence error type.

use thiserror::Error;

/// Errors raised by the persistence layer itself (outside the store ports,
/// which use `courselink_core::StoreError`).
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying sqlx error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Schema bootstrap failure.
    #[error("migration failed: {0}")]
    Migration(String),
}

/// Result type for persistence operations.
pub type DbResult<T> = Result<T, DbError>;

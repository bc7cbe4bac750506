//! Standardized store error type.

use thiserror::Error;

use crate::ids::{CourseId, RemoteCourseRef};

/// Error returned by the store ports in [`crate::traits`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(String),

    /// An enabled link already exists for this (course, remote course) pair.
    #[error("an enabled link for course {course} to remote course {remote} already exists")]
    DuplicateLink {
        course: CourseId,
        remote: RemoteCourseRef,
    },

    /// A record required by the operation does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

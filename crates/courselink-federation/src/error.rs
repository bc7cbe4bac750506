//! Federation error types
//!
//! Error definitions with transient/permanent classification. The sync
//! engine never retries within a pass; classification exists so callers and
//! logs can tell an unreachable host from a remote-side rejection.

use thiserror::Error;

use courselink_core::{HostId, RemoteCourseId};

/// Error that can occur while talking to a remote host.
#[derive(Debug, Error)]
pub enum FederationError {
    // Transport errors (usually transient)
    /// Failed to establish a connection to the remote host.
    #[error("connection to host {host} failed: {message}")]
    ConnectionFailed { host: HostId, message: String },

    /// The remote call timed out.
    #[error("call to host {host} timed out after {timeout_secs} seconds")]
    Timeout { host: HostId, timeout_secs: u64 },

    /// The remote host is temporarily unavailable.
    #[error("host {host} unavailable: {message}")]
    HostUnavailable { host: HostId, message: String },

    // Remote-side errors (usually permanent for this payload)
    /// The remote host processed the call and reported a fault.
    #[error("host {host} rejected the request: {code}: {message}")]
    RemoteFault {
        host: HostId,
        code: String,
        message: String,
    },

    /// The remote host does not offer the requested course.
    #[error("host {host} does not offer remote course {course}")]
    UnknownRemoteCourse { host: HostId, course: RemoteCourseId },

    /// The response could not be decoded.
    #[error("invalid response from host {host}: {message}")]
    InvalidResponse { host: HostId, message: String },
}

impl FederationError {
    /// Whether a later, identical call could plausibly succeed.
    ///
    /// Transient errors self-heal through the periodic re-sync: the
    /// discrepancy stays in the diff and the call is reissued next pass.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::HostUnavailable { .. }
        )
    }

    /// The host the failed call was addressed to.
    #[must_use]
    pub fn host(&self) -> HostId {
        match self {
            Self::ConnectionFailed { host, .. }
            | Self::Timeout { host, .. }
            | Self::HostUnavailable { host, .. }
            | Self::RemoteFault { host, .. }
            | Self::UnknownRemoteCourse { host, .. }
            | Self::InvalidResponse { host, .. } => *host,
        }
    }
}

/// Result type for remote host operations.
pub type FederationResult<T> = Result<T, FederationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let host = HostId::new(1);
        assert!(FederationError::Timeout {
            host,
            timeout_secs: 30
        }
        .is_transient());
        assert!(FederationError::ConnectionFailed {
            host,
            message: "refused".into()
        }
        .is_transient());
        assert!(!FederationError::RemoteFault {
            host,
            code: "enrol/denied".into(),
            message: "capacity reached".into()
        }
        .is_transient());
    }

    #[test]
    fn test_error_formatting_carries_host_and_detail() {
        let err = FederationError::RemoteFault {
            host: HostId::new(4),
            code: "enrol/denied".into(),
            message: "capacity reached".into(),
        };
        let text = err.to_string();
        assert!(text.contains('4'));
        assert!(text.contains("enrol/denied"));
        assert!(text.contains("capacity reached"));
        assert_eq!(err.host(), HostId::new(4));
    }
}

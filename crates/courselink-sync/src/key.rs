//! Composite enrolment identity used for diffing.

use serde::{Deserialize, Serialize};
use std::fmt;

use courselink_core::{HostId, RemoteCourseId, UserId};
use courselink_federation::RemoteEnrolmentRecord;

/// The composite identity of one remote enrolment:
/// (host, user, remote course).
///
/// This triple is the ONLY identity used when diffing desired against
/// actual state. Link id and the notify flag are not part of identity, so
/// toggling notification on a link never shows up as a remove-and-re-add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SyncKey {
    pub host_id: HostId,
    pub user_id: UserId,
    pub remote_course_id: RemoteCourseId,
}

impl SyncKey {
    /// Build a key from its parts.
    #[must_use]
    pub const fn new(host_id: HostId, user_id: UserId, remote_course_id: RemoteCourseId) -> Self {
        Self {
            host_id,
            user_id,
            remote_course_id,
        }
    }

    /// The (host, remote course) pair the enrolment lives under; this is
    /// also the remote state cache's key.
    #[must_use]
    pub const fn course_pair(&self) -> (HostId, RemoteCourseId) {
        (self.host_id, self.remote_course_id)
    }
}

impl From<&RemoteEnrolmentRecord> for SyncKey {
    fn from(record: &RemoteEnrolmentRecord) -> Self {
        Self::new(record.host_id, record.user_id, record.remote_course_id)
    }
}

impl fmt::Display for SyncKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.host_id, self.user_id, self.remote_course_id
        )
    }
}

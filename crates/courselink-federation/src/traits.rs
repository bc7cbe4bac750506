//! Remote enrolment service trait
//!
//! The capability a remote-host transport must provide: place an enrolment,
//! remove an enrolment, and list a course's current enrolments. Remote hosts
//! are expected to treat enrolling an already-enrolled user as a no-op, not
//! an error.

use async_trait::async_trait;

use courselink_core::{HostId, RemoteCourse, RemoteCourseId, UserAccount, UserId};

use crate::error::FederationResult;

/// One enrolment as it exists on a remote host, keyed by the local user id
/// the remote host tracks for federated members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEnrolmentRecord {
    /// Host the enrolment lives on.
    pub host_id: HostId,
    /// The course's id on that host.
    pub remote_course_id: RemoteCourseId,
    /// The local user the enrolment belongs to.
    pub user_id: UserId,
}

/// Client interface to remote course hosts.
#[async_trait]
pub trait RemoteEnrolmentService: Send + Sync {
    /// Enrol a user in a course on its remote host.
    ///
    /// Must succeed (as a no-op) when the user is already enrolled.
    async fn request_enrol(
        &self,
        user: &UserAccount,
        course: &RemoteCourse,
    ) -> FederationResult<()>;

    /// Remove a user's enrolment from a course on its remote host.
    async fn request_unenrol(
        &self,
        user: &UserAccount,
        course: &RemoteCourse,
    ) -> FederationResult<()>;

    /// Fetch the complete current enrolment list of one remote course.
    ///
    /// The returned set replaces any cached records for the
    /// (host, remote course) pair wholesale.
    async fn fetch_course_enrolments(
        &self,
        host: HostId,
        course: RemoteCourseId,
    ) -> FederationResult<Vec<RemoteEnrolmentRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FederationError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Minimal in-memory service used to exercise the trait surface.
    struct FixedService {
        host: HostId,
        enrolled: Vec<RemoteEnrolmentRecord>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl RemoteEnrolmentService for FixedService {
        async fn request_enrol(
            &self,
            _user: &UserAccount,
            course: &RemoteCourse,
        ) -> FederationResult<()> {
            if course.host_id == self.host {
                Ok(())
            } else {
                Err(FederationError::HostUnavailable {
                    host: course.host_id,
                    message: "unknown host".into(),
                })
            }
        }

        async fn request_unenrol(
            &self,
            _user: &UserAccount,
            _course: &RemoteCourse,
        ) -> FederationResult<()> {
            Ok(())
        }

        async fn fetch_course_enrolments(
            &self,
            host: HostId,
            course: RemoteCourseId,
        ) -> FederationResult<Vec<RemoteEnrolmentRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .enrolled
                .iter()
                .filter(|r| r.host_id == host && r.remote_course_id == course)
                .cloned()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_fetch_filters_by_course() {
        let host = HostId::new(1);
        let service = FixedService {
            host,
            enrolled: vec![
                RemoteEnrolmentRecord {
                    host_id: host,
                    remote_course_id: RemoteCourseId::new(100),
                    user_id: UserId::new(7),
                },
                RemoteEnrolmentRecord {
                    host_id: host,
                    remote_course_id: RemoteCourseId::new(200),
                    user_id: UserId::new(7),
                },
            ],
            fetches: AtomicUsize::new(0),
        };

        let records = service
            .fetch_course_enrolments(host, RemoteCourseId::new(100))
            .await
            .expect("fetch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, UserId::new(7));
        assert_eq!(service.fetches.load(Ordering::SeqCst), 1);
    }
}

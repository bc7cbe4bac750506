//! Store ports consumed by the sync engine.
//!
//! The engine never touches a database handle directly; it is constructed
//! from these interfaces, and the persistence crate provides the Postgres
//! implementations.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::ids::{CourseId, HostId, LinkId, RemoteCourseId, RemoteCourseRef, UserId};
use crate::records::{
    EnrolmentLink, LinkStatus, LocalEnrolment, NewEnrolmentLink, RemoteCourse, RemoteHost,
    UserAccount,
};

/// Access to configured enrolment links.
#[async_trait]
pub trait LinkRegistry: Send + Sync {
    /// All links with status enabled, across all courses.
    async fn enabled_links(&self) -> StoreResult<Vec<EnrolmentLink>>;

    /// Every configured link regardless of status. Disabled links still
    /// identify remote courses that may hold leftover enrolments.
    async fn all_links(&self) -> StoreResult<Vec<EnrolmentLink>>;

    /// All links (any status) configured for one course.
    async fn links_for_course(&self, course: CourseId) -> StoreResult<Vec<EnrolmentLink>>;

    /// Look up a single link.
    async fn find_link(&self, link: LinkId) -> StoreResult<Option<EnrolmentLink>>;

    /// Create a link.
    ///
    /// Returns [`crate::StoreError::DuplicateLink`] when an enabled link for
    /// the same (course, remote course) pair already exists.
    async fn create_link(&self, link: NewEnrolmentLink) -> StoreResult<EnrolmentLink>;

    /// Soft-enable or soft-disable a link.
    async fn set_status(&self, link: LinkId, status: LinkStatus) -> StoreResult<()>;
}

/// Read access to the host platform's enrolment records.
#[async_trait]
pub trait EnrolmentStore: Send + Sync {
    /// Active enrolments in a course, through any enrolment method,
    /// optionally restricted to one user.
    async fn active_enrolments(
        &self,
        course: CourseId,
        user: Option<UserId>,
    ) -> StoreResult<Vec<LocalEnrolment>>;
}

/// Read access to local user accounts.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up one user.
    async fn find_user(&self, user: UserId) -> StoreResult<Option<UserAccount>>;

    /// Batch lookup. Ids with no matching account are simply absent from
    /// the result.
    async fn users_by_ids(&self, users: &[UserId]) -> StoreResult<Vec<UserAccount>>;
}

/// Read access to the directory of federated hosts and their offered courses.
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Resolve an opaque remote-course reference.
    async fn resolve_course(&self, reference: RemoteCourseRef)
        -> StoreResult<Option<RemoteCourse>>;

    /// Find the directory entry for a course by its (host, remote course)
    /// pair. Used when only the composite enrolment key is known, e.g. when
    /// removing a remote enrolment whose link has since been deleted.
    async fn find_course_on_host(
        &self,
        host: HostId,
        course: RemoteCourseId,
    ) -> StoreResult<Option<RemoteCourse>>;

    /// Look up a remote host.
    async fn find_host(&self, host: HostId) -> StoreResult<Option<RemoteHost>>;
}

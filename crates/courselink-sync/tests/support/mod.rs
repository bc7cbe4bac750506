//! In-memory test doubles for the store ports and the remote host.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courselink_core::{
    CourseId, EnrolmentLink, EnrolmentStatus, EnrolmentStore, HostId, InstanceId, LinkId,
    LinkRegistry, LinkStatus, LocalEnrolment, NewEnrolmentLink, RemoteCourse, RemoteCourseId,
    RemoteCourseRef, RemoteDirectory, RemoteHost, StoreError, StoreResult, UserAccount,
    UserDirectory, UserId,
};
use courselink_federation::{
    EnrolmentNotifier, FederationError, FederationResult, NotificationResult,
    RemoteEnrolmentRecord, RemoteEnrolmentService,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// One in-memory store implementing all four ports.
#[derive(Default)]
pub struct InMemoryStore {
    links: Mutex<Vec<EnrolmentLink>>,
    enrolments: Mutex<Vec<LocalEnrolment>>,
    users: Mutex<Vec<UserAccount>>,
    hosts: Mutex<Vec<RemoteHost>>,
    courses: Mutex<Vec<RemoteCourse>>,
    next_link_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            next_link_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    pub fn add_host(&self, id: i64, base_url: &str) {
        self.hosts.lock().unwrap().push(RemoteHost {
            id: HostId::new(id),
            name: format!("host-{id}"),
            base_url: base_url.to_string(),
        });
    }

    pub fn add_remote_course(&self, reference: i64, host: i64, remote_course: i64, name: &str) {
        self.courses.lock().unwrap().push(RemoteCourse {
            reference: RemoteCourseRef::new(reference),
            host_id: HostId::new(host),
            remote_course_id: RemoteCourseId::new(remote_course),
            full_name: name.to_string(),
            summary: String::new(),
        });
    }

    pub fn add_user(&self, id: i64, username: &str) {
        self.users.lock().unwrap().push(UserAccount {
            id: UserId::new(id),
            username: username.to_string(),
            email: format!("{username}@example.edu"),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
            deleted: false,
        });
    }

    pub fn add_link(
        &self,
        course: i64,
        reference: i64,
        notify: bool,
        active_from: DateTime<Utc>,
    ) -> LinkId {
        let id = LinkId::new(self.next_link_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        self.links.lock().unwrap().push(EnrolmentLink {
            id,
            course_id: CourseId::new(course),
            remote_course_ref: RemoteCourseRef::new(reference),
            status: LinkStatus::Enabled,
            notify,
            active_from,
            name: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn enrol_local(&self, user: i64, course: i64, created_at: DateTime<Utc>) {
        self.enrolments.lock().unwrap().push(LocalEnrolment {
            user_id: UserId::new(user),
            instance_id: InstanceId::new(course * 100),
            course_id: CourseId::new(course),
            status: EnrolmentStatus::Active,
            created_at,
        });
    }

    pub fn remove_local(&self, user: i64, course: i64) {
        self.enrolments.lock().unwrap().retain(|e| {
            !(e.user_id == UserId::new(user) && e.course_id == CourseId::new(course))
        });
    }

    pub fn link_status(&self, link: LinkId) -> Option<LinkStatus> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == link)
            .map(|l| l.status)
    }
}

#[async_trait]
impl LinkRegistry for InMemoryStore {
    async fn enabled_links(&self) -> StoreResult<Vec<EnrolmentLink>> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.is_enabled())
            .cloned()
            .collect())
    }

    async fn all_links(&self) -> StoreResult<Vec<EnrolmentLink>> {
        Ok(self.links.lock().unwrap().clone())
    }

    async fn links_for_course(&self, course: CourseId) -> StoreResult<Vec<EnrolmentLink>> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.course_id == course)
            .cloned()
            .collect())
    }

    async fn find_link(&self, link: LinkId) -> StoreResult<Option<EnrolmentLink>> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == link)
            .cloned())
    }

    async fn create_link(&self, link: NewEnrolmentLink) -> StoreResult<EnrolmentLink> {
        let mut links = self.links.lock().unwrap();
        if links.iter().any(|l| {
            l.is_enabled()
                && l.course_id == link.course_id
                && l.remote_course_ref == link.remote_course_ref
        }) {
            return Err(StoreError::DuplicateLink {
                course: link.course_id,
                remote: link.remote_course_ref,
            });
        }
        let now = Utc::now();
        let record = EnrolmentLink {
            id: LinkId::new(self.next_link_id.fetch_add(1, Ordering::SeqCst)),
            course_id: link.course_id,
            remote_course_ref: link.remote_course_ref,
            status: LinkStatus::Enabled,
            notify: link.notify,
            active_from: link
                .active_from
                .unwrap_or_else(|| NewEnrolmentLink::default_active_from(now)),
            name: link.name,
            created_at: now,
            updated_at: now,
        };
        links.push(record.clone());
        Ok(record)
    }

    async fn set_status(&self, link: LinkId, status: LinkStatus) -> StoreResult<()> {
        let mut links = self.links.lock().unwrap();
        match links.iter_mut().find(|l| l.id == link) {
            Some(record) => {
                record.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("enrolment link {link}"))),
        }
    }
}

#[async_trait]
impl EnrolmentStore for InMemoryStore {
    async fn active_enrolments(
        &self,
        course: CourseId,
        user: Option<UserId>,
    ) -> StoreResult<Vec<LocalEnrolment>> {
        Ok(self
            .enrolments
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.course_id == course
                    && e.is_active()
                    && user.map_or(true, |u| e.user_id == u)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_user(&self, user: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user)
            .cloned())
    }

    async fn users_by_ids(&self, users: &[UserId]) -> StoreResult<Vec<UserAccount>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| users.contains(&u.id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RemoteDirectory for InMemoryStore {
    async fn resolve_course(
        &self,
        reference: RemoteCourseRef,
    ) -> StoreResult<Option<RemoteCourse>> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.reference == reference)
            .cloned())
    }

    async fn find_course_on_host(
        &self,
        host: HostId,
        course: RemoteCourseId,
    ) -> StoreResult<Option<RemoteCourse>> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.host_id == host && c.remote_course_id == course)
            .cloned())
    }

    async fn find_host(&self, host: HostId) -> StoreResult<Option<RemoteHost>> {
        Ok(self
            .hosts
            .lock()
            .unwrap()
            .iter()
            .find(|h| h.id == host)
            .cloned())
    }
}

/// In-memory stand-in for the remote hosts: holds the authoritative remote
/// enrolment set and counts every call.
#[derive(Default)]
pub struct MockRemoteHost {
    state: Mutex<HashSet<(HostId, RemoteCourseId, UserId)>>,
    pub enrol_calls: AtomicUsize,
    pub unenrol_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    fail_enrol_for: Mutex<Option<UserId>>,
    fail_fetches: AtomicBool,
}

impl MockRemoteHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pre-existing remote enrolment.
    pub fn seed(&self, host: i64, course: i64, user: i64) {
        self.state.lock().unwrap().insert((
            HostId::new(host),
            RemoteCourseId::new(course),
            UserId::new(user),
        ));
    }

    pub fn is_enrolled(&self, host: i64, course: i64, user: i64) -> bool {
        self.state.lock().unwrap().contains(&(
            HostId::new(host),
            RemoteCourseId::new(course),
            UserId::new(user),
        ))
    }

    pub fn enrolment_count(&self) -> usize {
        self.state.lock().unwrap().len()
    }

    /// Make enrol calls fail for one user.
    pub fn fail_enrol_for(&self, user: Option<i64>) {
        *self.fail_enrol_for.lock().unwrap() = user.map(UserId::new);
    }

    /// Make every fetch fail (host unreachable).
    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteEnrolmentService for MockRemoteHost {
    async fn request_enrol(
        &self,
        user: &UserAccount,
        course: &RemoteCourse,
    ) -> FederationResult<()> {
        self.enrol_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_enrol_for.lock().unwrap() == Some(user.id) {
            return Err(FederationError::RemoteFault {
                host: course.host_id,
                code: "enrol/denied".into(),
                message: "capacity reached".into(),
            });
        }
        // Enrolling an already-enrolled user is a no-op, per the contract.
        self.state
            .lock()
            .unwrap()
            .insert((course.host_id, course.remote_course_id, user.id));
        Ok(())
    }

    async fn request_unenrol(
        &self,
        user: &UserAccount,
        course: &RemoteCourse,
    ) -> FederationResult<()> {
        self.unenrol_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .remove(&(course.host_id, course.remote_course_id, user.id));
        Ok(())
    }

    async fn fetch_course_enrolments(
        &self,
        host: HostId,
        course: RemoteCourseId,
    ) -> FederationResult<Vec<RemoteEnrolmentRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(FederationError::HostUnavailable {
                host,
                message: "connection refused".into(),
            });
        }
        Ok(self
            .state
            .lock()
            .unwrap()
            .iter()
            .filter(|(h, c, _)| *h == host && *c == course)
            .map(|(h, c, u)| RemoteEnrolmentRecord {
                host_id: *h,
                remote_course_id: *c,
                user_id: *u,
            })
            .collect())
    }
}

/// Notifier that records every notification it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(UserId, RemoteCourseId)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EnrolmentNotifier for RecordingNotifier {
    async fn notify_enrolled(
        &self,
        user: &UserAccount,
        _host: &RemoteHost,
        course: &RemoteCourse,
    ) -> NotificationResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((user.id, course.remote_course_id));
        Ok(())
    }
}

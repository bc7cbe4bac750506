//! Domain records shared across the courselink crates.
//!
//! These are explicit typed records, not loosely-typed rows: the persistence
//! layer maps its rows into these types at the boundary.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{CourseId, HostId, InstanceId, LinkId, RemoteCourseId, RemoteCourseRef, UserId};

/// Status of an enrolment link.
///
/// Links are soft-disabled, never hard-deleted; a disabled link keeps its
/// configuration but is invisible to the sync engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Link participates in synchronisation.
    #[default]
    Enabled,
    /// Link is retained but ignored by synchronisation.
    Disabled,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl std::str::FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            _ => Err(format!("unknown link status: {s}")),
        }
    }
}

/// Status of a local user enrolment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrolmentStatus {
    /// The enrolment is active.
    Active,
    /// The enrolment exists but is suspended.
    Suspended,
}

impl fmt::Display for EnrolmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for EnrolmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            _ => Err(format!("unknown enrolment status: {s}")),
        }
    }
}

/// One configured binding of a local course to one remote course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolmentLink {
    /// Link id.
    pub id: LinkId,
    /// The local course whose members are mirrored.
    pub course_id: CourseId,
    /// Reference into the remote course directory.
    pub remote_course_ref: RemoteCourseRef,
    /// Enabled/disabled soft flag.
    pub status: LinkStatus,
    /// Whether newly enrolled users receive a notification email.
    pub notify: bool,
    /// Cutover guard: local enrolments created before this instant are
    /// never synced through this link.
    pub active_from: DateTime<Utc>,
    /// Optional admin-assigned display name.
    pub name: Option<String>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl EnrolmentLink {
    /// Whether the link participates in synchronisation.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status == LinkStatus::Enabled
    }

    /// Whether a local enrolment created at `created_at` falls after the
    /// link's cutover guard and is therefore eligible for sync.
    #[must_use]
    pub fn covers(&self, created_at: DateTime<Utc>) -> bool {
        created_at >= self.active_from
    }

    /// Display name for admin surfaces: the assigned name when present,
    /// otherwise the linked remote course's full name.
    #[must_use]
    pub fn display_name(&self, remote_course: Option<&RemoteCourse>) -> String {
        if let Some(name) = &self.name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        match remote_course {
            Some(course) => course.full_name.clone(),
            None => format!("link {}", self.id),
        }
    }
}

/// Payload for creating a new enrolment link.
#[derive(Debug, Clone)]
pub struct NewEnrolmentLink {
    pub course_id: CourseId,
    pub remote_course_ref: RemoteCourseRef,
    pub notify: bool,
    /// When absent, the registry applies [`NewEnrolmentLink::default_active_from`].
    pub active_from: Option<DateTime<Utc>>,
    pub name: Option<String>,
}

impl NewEnrolmentLink {
    /// Default cutover guard for a freshly created link: 24 hours in the
    /// future, so pre-existing members are not retroactively enrolled while
    /// the admin is still setting the link up.
    #[must_use]
    pub fn default_active_from(now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::hours(24)
    }
}

/// A (user, enrolment-instance) membership record on the local platform.
///
/// Owned by the host platform; courselink only reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalEnrolment {
    pub user_id: UserId,
    pub instance_id: InstanceId,
    pub course_id: CourseId,
    pub status: EnrolmentStatus,
    pub created_at: DateTime<Utc>,
}

impl LocalEnrolment {
    /// Whether the enrolment currently grants membership.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EnrolmentStatus::Active
    }
}

/// A local user account, as needed by the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Deleted accounts are never synced.
    pub deleted: bool,
}

impl UserAccount {
    /// Full display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A federated remote host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteHost {
    pub id: HostId,
    pub name: String,
    /// Root URL of the remote platform, used to build course links.
    pub base_url: String,
}

/// A course offered for federated enrolment by a remote host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCourse {
    /// Directory reference id; what enrolment links point at.
    pub reference: RemoteCourseRef,
    /// Host offering the course.
    pub host_id: HostId,
    /// The course's id on the remote host.
    pub remote_course_id: RemoteCourseId,
    pub full_name: String,
    pub summary: String,
}

impl RemoteCourse {
    /// Direct URL of the course on its remote host.
    #[must_use]
    pub fn course_url(&self, host: &RemoteHost) -> String {
        format!(
            "{}/course/view/{}",
            host.base_url.trim_end_matches('/'),
            self.remote_course_id
        )
    }
}

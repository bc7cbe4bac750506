//! Row structs and their mappings into the core records.
//!
//! Status strings that fail to parse fall back to the safe side
//! (disabled links, suspended enrolments) rather than failing the query.

use chrono::{DateTime, Utc};

use courselink_core::{
    CourseId, EnrolmentLink, EnrolmentStatus, HostId, InstanceId, LinkId, LinkStatus,
    LocalEnrolment, RemoteCourse, RemoteCourseId, RemoteCourseRef, RemoteHost, UserAccount, UserId,
};

/// Row from the enrolment_links table.
#[derive(Debug, sqlx::FromRow)]
pub struct EnrolmentLinkRow {
    pub id: i64,
    pub course_id: i64,
    pub remote_course_ref: i64,
    pub status: String,
    pub notify: bool,
    pub active_from: DateTime<Utc>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnrolmentLinkRow {
    pub fn into_record(self) -> EnrolmentLink {
        EnrolmentLink {
            id: LinkId::new(self.id),
            course_id: CourseId::new(self.course_id),
            remote_course_ref: RemoteCourseRef::new(self.remote_course_ref),
            status: self.status.parse().unwrap_or(LinkStatus::Disabled),
            notify: self.notify,
            active_from: self.active_from,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row from the local_enrolments table.
#[derive(Debug, sqlx::FromRow)]
pub struct LocalEnrolmentRow {
    pub user_id: i64,
    pub instance_id: i64,
    pub course_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl LocalEnrolmentRow {
    pub fn into_record(self) -> LocalEnrolment {
        LocalEnrolment {
            user_id: UserId::new(self.user_id),
            instance_id: InstanceId::new(self.instance_id),
            course_id: CourseId::new(self.course_id),
            status: self.status.parse().unwrap_or(EnrolmentStatus::Suspended),
            created_at: self.created_at,
        }
    }
}

/// Row from the user_accounts table.
#[derive(Debug, sqlx::FromRow)]
pub struct UserAccountRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub deleted: bool,
}

impl UserAccountRow {
    pub fn into_record(self) -> UserAccount {
        UserAccount {
            id: UserId::new(self.id),
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            deleted: self.deleted,
        }
    }
}

/// Row from the remote_hosts table.
#[derive(Debug, sqlx::FromRow)]
pub struct RemoteHostRow {
    pub id: i64,
    pub name: String,
    pub base_url: String,
}

impl RemoteHostRow {
    pub fn into_record(self) -> RemoteHost {
        RemoteHost {
            id: HostId::new(self.id),
            name: self.name,
            base_url: self.base_url,
        }
    }
}

/// Row from the remote_courses table.
#[derive(Debug, sqlx::FromRow)]
pub struct RemoteCourseRow {
    pub id: i64,
    pub host_id: i64,
    pub remote_course_id: i64,
    pub full_name: String,
    pub summary: String,
}

impl RemoteCourseRow {
    pub fn into_record(self) -> RemoteCourse {
        RemoteCourse {
            reference: RemoteCourseRef::new(self.id),
            host_id: HostId::new(self.host_id),
            remote_course_id: RemoteCourseId::new(self.remote_course_id),
            full_name: self.full_name,
            summary: self.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_row_maps_into_record() {
        let now = Utc::now();
        let row = EnrolmentLinkRow {
            id: 1,
            course_id: 10,
            remote_course_ref: 5,
            status: "enabled".into(),
            notify: true,
            active_from: now,
            name: None,
            created_at: now,
            updated_at: now,
        };
        let record = row.into_record();
        assert_eq!(record.id, LinkId::new(1));
        assert!(record.is_enabled());
        assert!(record.notify);
    }

    #[test]
    fn test_unknown_link_status_falls_back_to_disabled() {
        let now = Utc::now();
        let row = EnrolmentLinkRow {
            id: 1,
            course_id: 10,
            remote_course_ref: 5,
            status: "archived".into(),
            notify: false,
            active_from: now,
            name: None,
            created_at: now,
            updated_at: now,
        };
        assert!(!row.into_record().is_enabled());
    }

    #[test]
    fn test_unknown_enrolment_status_falls_back_to_suspended() {
        let row = LocalEnrolmentRow {
            user_id: 7,
            instance_id: 3,
            course_id: 10,
            status: "limbo".into(),
            created_at: Utc::now(),
        };
        assert!(!row.into_record().is_active());
    }
}

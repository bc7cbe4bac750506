//! Sync engine orchestrator.
//!
//! Three entry points, one algorithm: event-triggered per-user/course sync,
//! per-link sync, and the global periodic reconciliation that acts as the
//! correctness backstop. All state flows in through injected ports; the
//! engine holds no ambient handles.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use courselink_core::{
    CourseId, EnrolmentStore, LinkId, LinkRegistry, LinkStatus, RemoteDirectory, UserDirectory,
    UserId,
};
use courselink_federation::{EnrolmentNotifier, RemoteEnrolmentService};

use crate::cache::{CoursePair, RemoteStateCache};
use crate::config::SyncConfig;
use crate::desired::{DesiredRemoteEnrolment, DesiredStateCalculator};
use crate::diff::diff;
use crate::error::SyncResult;
use crate::executor::RemoteActionExecutor;
use crate::fetcher::ActualStateFetcher;
use crate::key::SyncKey;
use crate::report::{SyncOutcome, SyncReport};

/// The reconciliation engine.
///
/// Safe to invoke from overlapping triggers: every run recomputes desired
/// state, fetches fresh-enough actual state and applies an exact set
/// difference, so re-runs converge instead of compounding.
pub struct SyncEngine {
    links: Arc<dyn LinkRegistry>,
    enrolments: Arc<dyn EnrolmentStore>,
    users: Arc<dyn UserDirectory>,
    directory: Arc<dyn RemoteDirectory>,
    client: Arc<dyn RemoteEnrolmentService>,
    cache: Arc<RemoteStateCache>,
    calculator: DesiredStateCalculator,
    fetcher: ActualStateFetcher,
    executor: RemoteActionExecutor,
    config: SyncConfig,
}

impl SyncEngine {
    /// Build an engine from its collaborators.
    ///
    /// Fails when the configured username exclusion pattern is invalid.
    pub fn new(
        links: Arc<dyn LinkRegistry>,
        enrolments: Arc<dyn EnrolmentStore>,
        users: Arc<dyn UserDirectory>,
        directory: Arc<dyn RemoteDirectory>,
        client: Arc<dyn RemoteEnrolmentService>,
        notifier: Arc<dyn EnrolmentNotifier>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        let cache = Arc::new(RemoteStateCache::new(config.cache_ttl_secs));
        let calculator = DesiredStateCalculator::new(
            Arc::clone(&links),
            Arc::clone(&enrolments),
            Arc::clone(&users),
            Arc::clone(&directory),
            config.username_exclusion.as_deref(),
        )?;
        let fetcher = ActualStateFetcher::new(Arc::clone(&cache), Arc::clone(&client));
        let executor = RemoteActionExecutor::new(
            Arc::clone(&users),
            Arc::clone(&directory),
            Arc::clone(&client),
            notifier,
            Arc::clone(&cache),
        );

        Ok(Self {
            links,
            enrolments,
            users,
            directory,
            client,
            cache,
            calculator,
            fetcher,
            executor,
            config,
        })
    }

    /// The shared remote state cache, for forced invalidation by admin
    /// surfaces.
    #[must_use]
    pub fn cache(&self) -> &RemoteStateCache {
        &self.cache
    }

    /// Global reconciliation across all links, optionally restricted to one
    /// user (the login-hook variant). Idempotent: once converged, re-runs
    /// compute an empty diff and issue no remote calls.
    #[instrument(skip(self))]
    pub async fn sync_instances(&self, user: Option<UserId>) -> SyncResult<SyncOutcome> {
        if !self.config.enabled {
            debug!("Sync is disabled, skipping");
            return Ok(SyncOutcome::Disabled);
        }

        let mut report = SyncReport::new();
        self.reconcile(user, &mut report).await?;

        info!(
            run = %report.run_id,
            enrolled = report.enrolled,
            unenrolled = report.unenrolled,
            notified = report.notified,
            skipped = report.skipped,
            failed = report.failed,
            "Sync run completed"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// Sync triggered by creating or editing one link: reconciles every
    /// user currently enrolled (through any method) in the link's course,
    /// each through the full desired-vs-actual diff.
    #[instrument(skip(self))]
    pub async fn sync_instance(&self, link: LinkId) -> SyncResult<SyncOutcome> {
        if !self.config.enabled {
            debug!("Sync is disabled, skipping");
            return Ok(SyncOutcome::Disabled);
        }

        let mut report = SyncReport::new();
        let Some(link_record) = self.links.find_link(link).await? else {
            warn!(link = %link, "Link not found, nothing to sync");
            return Ok(SyncOutcome::Completed(report));
        };

        let enrolments = self
            .enrolments
            .active_enrolments(link_record.course_id, None)
            .await?;
        let mut users: Vec<UserId> = enrolments.iter().map(|e| e.user_id).collect();
        users.sort_unstable();
        users.dedup();

        for user in users {
            self.reconcile(Some(user), &mut report).await?;
        }

        info!(
            run = %report.run_id,
            link = %link,
            enrolled = report.enrolled,
            unenrolled = report.unenrolled,
            "Link sync completed"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// Event-triggered fast path for one user in one course.
    ///
    /// A direct two-branch state transition rather than a diff: with no
    /// active local enrolment the user is unenrolled from every enabled
    /// link of the course; with one they are enrolled on every enabled link
    /// whose cutover guard their enrolment passes. Excluded and deleted
    /// accounts take the unenrol branch.
    #[instrument(skip(self))]
    pub async fn sync_user_in_course(
        &self,
        course: CourseId,
        user: UserId,
    ) -> SyncResult<SyncOutcome> {
        if !self.config.enabled {
            debug!("Sync is disabled, skipping");
            return Ok(SyncOutcome::Disabled);
        }

        let mut report = SyncReport::new();
        let links: Vec<_> = self
            .links
            .links_for_course(course)
            .await?
            .into_iter()
            .filter(|link| link.is_enabled())
            .collect();
        if links.is_empty() {
            return Ok(SyncOutcome::Completed(report));
        }

        let enrolments = self.enrolments.active_enrolments(course, Some(user)).await?;
        let account = self.users.find_user(user).await?;
        let effectively_enrolled = match &account {
            Some(account) if !self.calculator.excludes(account) => !enrolments.is_empty(),
            _ => false,
        };

        for link in &links {
            let Some(remote) = self.directory.resolve_course(link.remote_course_ref).await? else {
                warn!(
                    run = %report.run_id,
                    link = %link.id,
                    reference = %link.remote_course_ref,
                    "Link references an unknown remote course, skipping"
                );
                report.skipped += 1;
                continue;
            };
            let key = SyncKey::new(remote.host_id, user, remote.remote_course_id);

            if effectively_enrolled {
                if !enrolments.iter().any(|e| link.covers(e.created_at)) {
                    continue;
                }
                // Already present per the cache: nothing to place, and no
                // notification to repeat.
                if self.cache.contains(key).await {
                    continue;
                }
                let entry = DesiredRemoteEnrolment {
                    key,
                    notify: link.notify,
                };
                self.executor.enrol(&entry, &mut report).await?;
            } else {
                self.executor.unenrol(key, &mut report).await?;
            }
        }

        info!(
            run = %report.run_id,
            course = %course,
            user = %user,
            enrolled = report.enrolled,
            unenrolled = report.unenrolled,
            "Course-scoped sync completed"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// Cleanup when a local course is deleted: unenrol everything its links
    /// placed remotely, then disable the links.
    #[instrument(skip(self))]
    pub async fn sync_course_removed(&self, course: CourseId) -> SyncResult<SyncOutcome> {
        if !self.config.enabled {
            debug!("Sync is disabled, skipping");
            return Ok(SyncOutcome::Disabled);
        }

        let mut report = SyncReport::new();
        let links = self.links.links_for_course(course).await?;

        for link in links.iter().filter(|link| link.is_enabled()) {
            let Some(remote) = self.directory.resolve_course(link.remote_course_ref).await? else {
                warn!(
                    run = %report.run_id,
                    link = %link.id,
                    "Link references an unknown remote course, disabling without cleanup"
                );
                self.links.set_status(link.id, LinkStatus::Disabled).await?;
                continue;
            };

            // Force a refresh so the cleanup sees what actually exists.
            self.cache
                .check_and_refresh(
                    self.client.as_ref(),
                    remote.host_id,
                    remote.remote_course_id,
                    Utc::now(),
                    true,
                )
                .await;

            for record in self
                .cache
                .records(remote.host_id, remote.remote_course_id)
                .await
            {
                self.executor
                    .unenrol(SyncKey::from(&record), &mut report)
                    .await?;
            }
            self.links.set_status(link.id, LinkStatus::Disabled).await?;
        }

        info!(
            run = %report.run_id,
            course = %course,
            unenrolled = report.unenrolled,
            "Course removal cleanup completed"
        );
        Ok(SyncOutcome::Completed(report))
    }

    /// One full reconciliation pass (desired, actual, diff, apply),
    /// optionally user-scoped.
    async fn reconcile(&self, user: Option<UserId>, report: &mut SyncReport) -> SyncResult<()> {
        let desired = self.calculator.calculate(user).await?;

        // Every linked remote course is implicated, enabled or not: a
        // disabled link's remote leftovers still need discovering after a
        // cold start, and a brand-new link has no cache entry yet.
        let mut pairs: HashSet<CoursePair> =
            desired.keys().map(SyncKey::course_pair).collect();
        for link in self.links.all_links().await? {
            if let Some(remote) = self.directory.resolve_course(link.remote_course_ref).await? {
                pairs.insert((remote.host_id, remote.remote_course_id));
            }
        }

        let actual = self.fetcher.fetch(&pairs, user, Utc::now()).await;
        let changes = diff(&desired, &actual);
        if changes.is_empty() {
            debug!(run = %report.run_id, "Desired and actual state already match");
            return Ok(());
        }

        info!(
            run = %report.run_id,
            to_add = changes.to_add.len(),
            to_remove = changes.to_remove.len(),
            "Applying enrolment diff"
        );
        self.executor.apply(&changes, report).await
    }
}

//! Desired-state calculator.
//!
//! Computes, from local data alone, the complete set of enrolments that
//! should exist on remote hosts: enabled links joined to active local
//! enrolments in the linked course, filtered by the link's cutover guard
//! and the username exclusion policy, deduplicated by [`SyncKey`].

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use courselink_core::{
    CourseId, EnrolmentLink, EnrolmentStore, LinkRegistry, RemoteCourse, RemoteCourseRef,
    RemoteDirectory, UserAccount, UserDirectory, UserId,
};

use crate::error::{SyncError, SyncResult};
use crate::key::SyncKey;

/// One enrolment that should exist remotely. Derived fresh on every sync,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRemoteEnrolment {
    /// Composite identity of the enrolment.
    pub key: SyncKey,
    /// Whether placing this enrolment should trigger a notification email.
    pub notify: bool,
}

/// Username-based exclusion policy.
///
/// Accounts whose username matches the configured pattern (and deleted
/// accounts) are invisible to synchronisation.
#[derive(Debug)]
pub(crate) struct ExclusionFilter {
    pattern: Option<Regex>,
}

impl ExclusionFilter {
    pub(crate) fn compile(pattern: Option<&str>) -> SyncResult<Self> {
        let pattern = match pattern {
            None => None,
            Some(raw) => Some(Regex::new(raw).map_err(|e| SyncError::InvalidExclusionPattern {
                pattern: raw.to_string(),
                message: e.to_string(),
            })?),
        };
        Ok(Self { pattern })
    }

    pub(crate) fn excludes(&self, user: &UserAccount) -> bool {
        if user.deleted {
            return true;
        }
        self.pattern
            .as_ref()
            .is_some_and(|p| p.is_match(&user.username))
    }
}

/// Computes the desired remote enrolment set from local data.
pub struct DesiredStateCalculator {
    links: Arc<dyn LinkRegistry>,
    enrolments: Arc<dyn EnrolmentStore>,
    users: Arc<dyn UserDirectory>,
    directory: Arc<dyn RemoteDirectory>,
    exclusion: ExclusionFilter,
}

impl DesiredStateCalculator {
    /// Create a calculator. Fails when the exclusion pattern is not a
    /// valid regex.
    pub fn new(
        links: Arc<dyn LinkRegistry>,
        enrolments: Arc<dyn EnrolmentStore>,
        users: Arc<dyn UserDirectory>,
        directory: Arc<dyn RemoteDirectory>,
        exclusion_pattern: Option<&str>,
    ) -> SyncResult<Self> {
        Ok(Self {
            links,
            enrolments,
            users,
            directory,
            exclusion: ExclusionFilter::compile(exclusion_pattern)?,
        })
    }

    /// Whether an account is excluded from synchronisation.
    #[must_use]
    pub fn excludes(&self, user: &UserAccount) -> bool {
        self.exclusion.excludes(user)
    }

    /// Compute the full desired set, optionally restricted to one user.
    ///
    /// Deterministic: the same local data always yields the same map. An
    /// empty map simply means there is nothing to sync. Links whose remote
    /// course reference cannot be resolved are logged and skipped.
    pub async fn calculate(
        &self,
        user: Option<UserId>,
    ) -> SyncResult<HashMap<SyncKey, DesiredRemoteEnrolment>> {
        let links = self.links.enabled_links().await?;
        if links.is_empty() {
            return Ok(HashMap::new());
        }

        let mut by_course: HashMap<CourseId, Vec<EnrolmentLink>> = HashMap::new();
        for link in links {
            by_course.entry(link.course_id).or_default().push(link);
        }

        // Remote references resolve once each; a dangling reference drops
        // its link from this pass only.
        let mut resolved: HashMap<RemoteCourseRef, Option<RemoteCourse>> = HashMap::new();

        // (user, key, notify) candidates before the account-level filters.
        let mut candidates: Vec<(UserId, SyncKey, bool)> = Vec::new();

        for (course_id, course_links) in by_course {
            let enrolments = self.enrolments.active_enrolments(course_id, user).await?;
            if enrolments.is_empty() {
                continue;
            }

            for link in course_links {
                let reference = link.remote_course_ref;
                if !resolved.contains_key(&reference) {
                    let course = self.directory.resolve_course(reference).await?;
                    if course.is_none() {
                        warn!(
                            link = %link.id,
                            reference = %reference,
                            "Enrolment link references an unknown remote course, skipping"
                        );
                    }
                    resolved.insert(reference, course);
                }
                let Some(remote) = resolved.get(&reference).and_then(|c| c.clone()) else {
                    continue;
                };

                for enrolment in &enrolments {
                    if !link.covers(enrolment.created_at) {
                        continue;
                    }
                    candidates.push((
                        enrolment.user_id,
                        SyncKey::new(remote.host_id, enrolment.user_id, remote.remote_course_id),
                        link.notify,
                    ));
                }
            }
        }

        if candidates.is_empty() {
            return Ok(HashMap::new());
        }

        let mut user_ids: Vec<UserId> = candidates.iter().map(|(id, _, _)| *id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let accounts: HashMap<UserId, UserAccount> = self
            .users
            .users_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|account| (account.id, account))
            .collect();

        let mut desired: HashMap<SyncKey, DesiredRemoteEnrolment> = HashMap::new();
        for (user_id, key, notify) in candidates {
            let Some(account) = accounts.get(&user_id) else {
                debug!(user = %user_id, "Enrolled user has no account, skipping");
                continue;
            };
            if self.exclusion.excludes(account) {
                debug!(user = %user_id, "User matches exclusion policy, skipping");
                continue;
            }
            desired
                .entry(key)
                .and_modify(|existing| existing.notify |= notify)
                .or_insert(DesiredRemoteEnrolment { key, notify });
        }

        Ok(desired)
    }
}

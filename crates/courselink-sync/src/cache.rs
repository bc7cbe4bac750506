//! Remote state cache.
//!
//! Time-bounded cache of remote enrolment records, keyed by
//! (host, remote course). A fetch replaces the whole entry for its pair;
//! entries older than the TTL (or explicitly marked stale) are refreshed on
//! the next read. When a refresh fails the previous records are kept and
//! the sync proceeds optimistically with them.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use courselink_core::{HostId, RemoteCourseId, UserId};
use courselink_federation::{RemoteEnrolmentRecord, RemoteEnrolmentService};

use crate::key::SyncKey;

/// Cache key: the (host, remote course) pair an enrolment list belongs to.
pub type CoursePair = (HostId, RemoteCourseId);

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<RemoteEnrolmentRecord>,
    fetched_at: DateTime<Utc>,
    stale: bool,
}

/// In-memory TTL cache of remote enrolment state.
pub struct RemoteStateCache {
    ttl: Duration,
    entries: RwLock<HashMap<CoursePair, CacheEntry>>,
}

impl RemoteStateCache {
    /// Create a cache whose entries stay fresh for `ttl_secs` seconds.
    #[must_use]
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Whether an entry needs refreshing: forced, absent, marked stale, or
    /// older than the TTL.
    fn needs_refresh(
        entry: Option<&CacheEntry>,
        now: DateTime<Utc>,
        ttl: Duration,
        force: bool,
    ) -> bool {
        if force {
            return true;
        }
        match entry {
            None => true,
            Some(entry) => entry.stale || now - entry.fetched_at >= ttl,
        }
    }

    /// Ensure the entry for (host, course) is fresh enough, fetching from
    /// the remote host when it is not.
    ///
    /// A failed fetch is logged and leaves whatever was cached (possibly
    /// nothing) in place; one unreachable host never blocks a sync.
    pub async fn check_and_refresh(
        &self,
        client: &dyn RemoteEnrolmentService,
        host: HostId,
        course: RemoteCourseId,
        now: DateTime<Utc>,
        force: bool,
    ) {
        {
            let entries = self.entries.read().await;
            if !Self::needs_refresh(entries.get(&(host, course)), now, self.ttl, force) {
                return;
            }
        }

        match client.fetch_course_enrolments(host, course).await {
            Ok(records) => {
                debug!(
                    host = %host,
                    course = %course,
                    count = records.len(),
                    "Refreshed remote enrolment cache"
                );
                let mut entries = self.entries.write().await;
                entries.insert(
                    (host, course),
                    CacheEntry {
                        records,
                        fetched_at: now,
                        stale: false,
                    },
                );
            }
            Err(e) => {
                warn!(
                    host = %host,
                    course = %course,
                    error = %e,
                    "Remote enrolment fetch failed, proceeding with cached records"
                );
            }
        }
    }

    /// Mark one pair's entry stale so the next read refetches regardless of
    /// age.
    pub async fn mark_stale(&self, host: HostId, course: RemoteCourseId) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&(host, course)) {
            entry.stale = true;
        }
    }

    /// All (host, course) pairs the cache currently has records for.
    pub async fn known_pairs(&self) -> HashSet<CoursePair> {
        self.entries.read().await.keys().copied().collect()
    }

    /// Cached records for one pair.
    pub async fn records(&self, host: HostId, course: RemoteCourseId) -> Vec<RemoteEnrolmentRecord> {
        self.entries
            .read()
            .await
            .get(&(host, course))
            .map(|entry| entry.records.clone())
            .unwrap_or_default()
    }

    /// All cached records, optionally restricted to one user.
    pub async fn all_records(&self, user: Option<UserId>) -> Vec<RemoteEnrolmentRecord> {
        self.entries
            .read()
            .await
            .values()
            .flat_map(|entry| entry.records.iter())
            .filter(|record| user.map_or(true, |u| record.user_id == u))
            .cloned()
            .collect()
    }

    /// Whether the cache currently holds a record for this exact key.
    pub async fn contains(&self, key: SyncKey) -> bool {
        self.entries
            .read()
            .await
            .get(&key.course_pair())
            .is_some_and(|entry| entry.records.iter().any(|record| SyncKey::from(record) == key))
    }

    /// Record a remote enrolment this process just placed successfully, so
    /// follow-up diffs inside the TTL window see it without refetching.
    pub async fn note_enrolled(&self, record: RemoteEnrolmentRecord) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&(record.host_id, record.remote_course_id)) {
            if !entry.records.contains(&record) {
                entry.records.push(record);
            }
        }
    }

    /// Record a remote unenrolment this process just performed successfully.
    pub async fn note_unenrolled(&self, key: SyncKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&key.course_pair()) {
            entry.records.retain(|record| SyncKey::from(record) != key);
        }
    }
}

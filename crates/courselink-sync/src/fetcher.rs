//! Actual-state fetcher.
//!
//! Assembles the current remote enrolment picture from the cache,
//! refreshing stale entries on the way.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use courselink_core::UserId;
use courselink_federation::{RemoteEnrolmentRecord, RemoteEnrolmentService};

use crate::cache::{CoursePair, RemoteStateCache};
use crate::key::SyncKey;

/// Fetches the actual remote enrolment state through the cache.
pub struct ActualStateFetcher {
    cache: Arc<RemoteStateCache>,
    client: Arc<dyn RemoteEnrolmentService>,
}

impl ActualStateFetcher {
    /// Create a fetcher over the shared cache and remote client.
    #[must_use]
    pub fn new(cache: Arc<RemoteStateCache>, client: Arc<dyn RemoteEnrolmentService>) -> Self {
        Self { cache, client }
    }

    /// Return all remote enrolment records relevant to the given desired
    /// pairs, keyed by [`SyncKey`] and optionally restricted to one user.
    ///
    /// The implicated (host, course) pairs are the union of the desired
    /// set's pairs and whatever the cache already knows about. Taking the
    /// desired pairs guarantees a brand-new link's first sync fetches even
    /// though nothing is cached yet; taking the cache's pairs keeps
    /// remote-only leftovers visible so they can be unenrolled.
    pub async fn fetch(
        &self,
        desired_pairs: &HashSet<CoursePair>,
        user: Option<UserId>,
        now: DateTime<Utc>,
    ) -> HashMap<SyncKey, RemoteEnrolmentRecord> {
        let mut pairs = self.cache.known_pairs().await;
        pairs.extend(desired_pairs.iter().copied());

        for (host, course) in pairs {
            self.cache
                .check_and_refresh(self.client.as_ref(), host, course, now, false)
                .await;
        }

        self.cache
            .all_records(user)
            .await
            .into_iter()
            .map(|record| (SyncKey::from(&record), record))
            .collect()
    }
}

//! Run outcome and statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary statistics from one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    /// Correlation id for this run, carried in every log line.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Remote enrolments placed.
    pub enrolled: u32,
    /// Remote enrolments removed.
    pub unenrolled: u32,
    /// Notification emails handed to the mail service.
    pub notified: u32,
    /// Entries skipped because a required entity could not be resolved.
    pub skipped: u32,
    /// Remote calls that failed and were left for the next pass.
    pub failed: u32,
}

impl SyncReport {
    /// Start a fresh report for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            enrolled: 0,
            unenrolled: 0,
            notified: 0,
            skipped: 0,
            failed: 0,
        }
    }

    /// Whether the run performed or attempted any remote action.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enrolled == 0
            && self.unenrolled == 0
            && self.skipped == 0
            && self.failed == 0
    }
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of invoking a sync entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// The engine is disabled; nothing was done.
    Disabled,
    /// The run completed; the report may be empty (nothing to do).
    Completed(SyncReport),
}

impl SyncOutcome {
    /// Whether the engine refused the run because it is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// The run report, when the run happened.
    #[must_use]
    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Disabled => None,
            Self::Completed(report) => Some(report),
        }
    }
}

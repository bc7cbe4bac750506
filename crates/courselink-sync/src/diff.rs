//! Diff engine.
//!
//! Pure set difference of desired against actual remote enrolments, by
//! [`SyncKey`] only.

use std::collections::HashMap;

use courselink_federation::RemoteEnrolmentRecord;

use crate::desired::DesiredRemoteEnrolment;
use crate::key::SyncKey;

/// The minimal set of remote actions that reconciles actual state with
/// desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrolmentDiff {
    /// Desired enrolments missing remotely.
    pub to_add: Vec<DesiredRemoteEnrolment>,
    /// Remote enrolments no longer desired.
    pub to_remove: Vec<SyncKey>,
}

impl EnrolmentDiff {
    /// Whether nothing needs doing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Total number of remote actions in the diff.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// Compute the diff between desired and actual state.
///
/// `to_add` holds every desired entry whose key is absent from `actual`;
/// `to_remove` every actual key absent from `desired`. The inputs are maps
/// keyed by [`SyncKey`], so neither side can contain duplicates. Iteration
/// order of the result is unspecified.
#[must_use]
pub fn diff(
    desired: &HashMap<SyncKey, DesiredRemoteEnrolment>,
    actual: &HashMap<SyncKey, RemoteEnrolmentRecord>,
) -> EnrolmentDiff {
    let to_add = desired
        .iter()
        .filter(|(key, _)| !actual.contains_key(key))
        .map(|(_, entry)| entry.clone())
        .collect();

    let to_remove = actual
        .keys()
        .filter(|key| !desired.contains_key(key))
        .copied()
        .collect();

    EnrolmentDiff { to_add, to_remove }
}

//! Strongly Typed Identifiers
//!
//! Newtype wrappers around the host platform's integer row ids. Using
//! distinct types prevents accidental misuse of different id kinds at
//! compile time: a `UserId` cannot be passed where a `CourseId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error type for id parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of id that failed to parse.
    pub id_type: &'static str,
    /// The underlying parse error message.
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to define a strongly-typed id over an i64 row id.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps an existing row id.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the underlying row id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse::<i64>().map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    message: e.to_string(),
                })
            }
        }
    };
}

define_id!(
    /// Identifier of a user account on the local platform.
    UserId
);

define_id!(
    /// Identifier of a course on the local platform.
    CourseId
);

define_id!(
    /// Identifier of an enrolment link instance.
    LinkId
);

define_id!(
    /// Identifier of an enrolment-method instance on the local platform.
    ///
    /// Local enrolments always hang off an instance; the link itself is one
    /// of possibly many instances attached to a course.
    InstanceId
);

define_id!(
    /// Identifier of a federated remote host.
    HostId
);

define_id!(
    /// Identifier of a course *on its remote host*.
    ///
    /// Only meaningful together with a [`HostId`]; two hosts may both have a
    /// course 100.
    RemoteCourseId
);

define_id!(
    /// Opaque reference to an entry in the remote course directory.
    ///
    /// Resolvable through the directory to a ([`HostId`], [`RemoteCourseId`])
    /// pair plus display metadata. Enrolment links store this reference, not
    /// the host/course pair itself.
    RemoteCourseRef
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct_types() {
        fn requires_user(id: UserId) -> i64 {
            id.get()
        }
        let user = UserId::new(7);
        assert_eq!(requires_user(user), 7);
        // requires_user(CourseId::new(7)); // would not compile
    }

    #[test]
    fn test_display_and_parse_round_trip() {
        let host = HostId::new(3);
        assert_eq!(host.to_string(), "3");
        let parsed: HostId = "3".parse().expect("parse host id");
        assert_eq!(parsed, host);
    }

    #[test]
    fn test_parse_failure_names_the_type() {
        let err = "not-a-number".parse::<CourseId>().unwrap_err();
        assert_eq!(err.id_type, "CourseId");
    }
}

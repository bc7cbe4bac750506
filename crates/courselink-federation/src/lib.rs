//! courselink federation layer
//!
//! The seam between the sync engine and remote course hosts: the
//! [`RemoteEnrolmentService`] trait a transport implements, the
//! [`FederationError`] taxonomy with transient/permanent classification,
//! and the enrolment notification service.
//!
//! No concrete transport ships here; remote-procedure plumbing is owned by
//! the host platform and plugged in behind the trait.

pub mod error;
pub mod notify;
pub mod traits;

pub use error::{FederationError, FederationResult};
pub use notify::{EmailNotifier, EnrolmentNotifier, NotificationConfig, NotificationError,
    NotificationResult};
pub use traits::{RemoteEnrolmentRecord, RemoteEnrolmentService};

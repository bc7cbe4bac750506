//! courselink persistence layer
//!
//! Postgres-backed implementations of the store ports defined in
//! `courselink-core`, plus schema bootstrap for development setups.
//!
//! Rows are mapped into the core records at this boundary; nothing above
//! this crate sees a database handle.

pub mod error;
pub mod migrations;
pub mod models;
pub mod stores;

pub use error::{DbError, DbResult};
pub use stores::{PgEnrolmentStore, PgLinkRegistry, PgRemoteDirectory, PgUserDirectory};

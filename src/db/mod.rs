//! SQLite-backed implementation of the remote overtime store.
//!
//! Hosts that talk to the HTTP API bring their own [`crate::remote::OvertimeStore`];
//! this one backs the desktop build and the integration tests.

mod connection;
pub mod helpers;
mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
pub use models::{EmbeddedPerson, OvertimeRecord, OvertimeWrite, Person, RecordStatus};

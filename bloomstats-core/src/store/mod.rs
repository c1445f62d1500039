//! Storage layer for bloomstats
//!
//! SQLite reference backend for the [`EventLog`](crate::events::EventLog)
//! query contract, with:
//! - Schema migrations
//! - Repository pattern for queries
//! - A write path for recording registrations and actions

pub mod repo;
pub mod schema;

pub use repo::Database;

//! # bloomstats-core
//!
//! Core library for bloomstats - product-usage metrics for the Bloom
//! plant-care app.
//!
//! This library provides:
//! - The cohort retention and time-series aggregation engine
//! - An abstract [`events::EventLog`] query contract, with a SQLite
//!   reference backend
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Every report is a pure function of (request parameters, event log):
//! the calendar bucketer enumerates bucket boundaries, the event log is
//! queried per bucket, and the builders reduce raw counts into ordered,
//! JSON-ready records. No state survives a request and no cache sits
//! between the engine and the store.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bloomstats_core::analytics::build_retention_series;
//! use bloomstats_core::types::{Granularity, RetentionType};
//! use bloomstats_core::{Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&config.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let today = chrono::Utc::now().date_naive();
//! let series = build_retention_series(
//!     &db,
//!     RetentionType::Functional,
//!     Granularity::Week,
//!     2,
//!     today,
//! )
//! .expect("failed to build retention series");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use events::EventLog;
pub use store::Database;
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod store;
pub mod types;

//! Event log access
//!
//! The engine never talks to storage directly. Every builder takes an
//! [`EventLog`] — an explicitly injected, read-only capability — and asks it
//! range and membership questions. Any backend that can answer these six
//! queries (SQL, columnar, in-memory) can drive the engine; the bundled
//! SQLite store in [`crate::store`] is the reference implementation.
//!
//! Queries that are sensitive to cohort membership take an optional
//! `registered_in` window restricting the user population to those who
//! registered inside it.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{ActionKind, DateRange, UserId};

/// Read-only query contract against the underlying store.
///
/// All windows are closed calendar intervals. Implementations should treat
/// connectivity or timeout failures as [`Error::Unavailable`]
/// (or [`Error::Database`] for the bundled store); the engine propagates
/// the first failure and never returns a partial series.
///
/// [`Error::Unavailable`]: crate::error::Error::Unavailable
/// [`Error::Database`]: crate::error::Error::Database
pub trait EventLog {
    /// Users whose registration date falls inside `window`.
    fn count_registered(&self, window: DateRange) -> Result<i64>;

    /// Users registered on or before `end` ("total users as of date").
    fn count_registered_through(&self, end: NaiveDate) -> Result<i64>;

    /// Distinct users who performed `kind` inside `window`.
    fn count_distinct_actors(&self, kind: ActionKind, window: DateRange) -> Result<i64>;

    /// Distinct ids of users who performed `kind` inside `window`,
    /// optionally restricted to users registered inside `registered_in`.
    ///
    /// Functional retention unions these sets across its three signals.
    fn actor_ids(
        &self,
        kind: ActionKind,
        window: DateRange,
        registered_in: Option<DateRange>,
    ) -> Result<HashSet<UserId>>;

    /// Users whose `last_activity` date falls inside `window`, optionally
    /// restricted to users registered inside `registered_in`.
    fn count_last_activity(
        &self,
        window: DateRange,
        registered_in: Option<DateRange>,
    ) -> Result<i64>;

    /// Raw event count for `kind` inside `window` (not deduplicated).
    fn count_events(&self, kind: ActionKind, window: DateRange) -> Result<i64>;
}

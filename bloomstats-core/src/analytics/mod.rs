//! Analytics module for bloomstats
//!
//! The cohort retention and time-series aggregation engine:
//! - [`calendar`] — bucket boundaries and bucket arithmetic
//! - [`retention`] — retention predicate evaluator and cohort series builder
//! - [`timeseries`] — gap-free activity trend series
//! - [`window`] — single-window snapshots and the activity summary
//!
//! All builders are pure functions over an injected [`EventLog`]
//! capability; the engine holds no state between requests and every request
//! recomputes from current data.
//!
//! [`EventLog`]: crate::events::EventLog

pub mod calendar;
pub mod retention;
pub mod timeseries;
pub mod window;

pub use retention::{build_retention_series, RetentionResult};
pub use timeseries::{build_timeseries, TrendBucket};
pub use window::{activity_summary, window_snapshot, ActivitySummary, Share, WindowStats};

/// Percentage of `part` in `whole`, rounded to one decimal place.
///
/// Division by zero is defined, not an error: an empty population yields 0.
pub(crate) fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

//! Activity trend series
//!
//! Buckets a date range into fixed-size windows and computes independent
//! activity counts per window: registrations, distinct users per action
//! kind, and users whose `last_activity` falls in-bucket.
//!
//! Unlike the cohort retention series, every bucket in the requested range
//! is emitted, zero-filled when empty — this series draws a continuous
//! trend line, not a sparse cohort table.

use chrono::NaiveDate;
use serde::Serialize;

use super::calendar::{advance, bucket_containing};
use crate::error::{Error, Result};
use crate::events::EventLog;
use crate::types::{ActionKind, DateRange, Granularity};

/// One bucket in an activity trend series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendBucket {
    /// ISO date of the bucket start (presentation key for charting)
    pub date: NaiveDate,
    /// The actual window covered; the trailing bucket may be shorter than
    /// a full granularity unit when clamped to the requested range
    pub window: DateRange,
    /// Users who registered in-bucket
    pub new_users: i64,
    /// Distinct users who watered a plant in-bucket
    pub watered: i64,
    /// Distinct users who added a plant in-bucket
    pub added_plants: i64,
    /// Distinct users who asked a question in-bucket
    pub asked_questions: i64,
    /// Users whose `last_activity` falls in-bucket
    pub active: i64,
}

/// Build an activity trend series over `[date_from, date_to]`.
///
/// The first bucket is the bucket *containing* `date_from` (a mid-week
/// start aligns back to the preceding Monday); the walk then advances one
/// granularity unit at a time and the final bucket's end clamps to
/// `date_to` rather than overshooting the requested range.
///
/// Buckets come back oldest first.
pub fn build_timeseries(
    log: &dyn EventLog,
    granularity: Granularity,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<TrendBucket>> {
    if date_from > date_to {
        return Err(Error::InvalidRange(format!(
            "date_from {} is after date_to {}",
            date_from, date_to
        )));
    }

    tracing::debug!(
        granularity = %granularity,
        %date_from,
        %date_to,
        "Building trend series"
    );

    let mut buckets = Vec::new();
    let mut cursor = bucket_containing(granularity, date_from).start;
    while cursor <= date_to {
        let nominal = bucket_containing(granularity, cursor);
        let window = DateRange {
            start: nominal.start,
            end: nominal.end.min(date_to),
        };

        buckets.push(TrendBucket {
            date: window.start,
            window,
            new_users: log.count_registered(window)?,
            watered: log.count_distinct_actors(ActionKind::Watered, window)?,
            added_plants: log.count_distinct_actors(ActionKind::AddedPlant, window)?,
            asked_questions: log.count_distinct_actors(ActionKind::AskedQuestion, window)?,
            active: log.count_last_activity(window, None)?,
        });

        cursor = advance(granularity, cursor, 1);
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use crate::types::{ActionEvent, User};
    use chrono::{TimeZone, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ts(date: NaiveDate) -> chrono::DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(9, 30, 0).unwrap())
    }

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.migrate().expect("migrate schema");
        db
    }

    #[test]
    fn test_day_series_is_zero_filled() {
        let db = seeded_db();
        let series =
            build_timeseries(&db, Granularity::Day, d(2024, 1, 1), d(2024, 1, 3)).unwrap();

        assert_eq!(series.len(), 3);
        for (i, bucket) in series.iter().enumerate() {
            assert_eq!(bucket.date, d(2024, 1, 1 + i as u32));
            assert_eq!(bucket.new_users, 0);
            assert_eq!(bucket.watered, 0);
            assert_eq!(bucket.added_plants, 0);
            assert_eq!(bucket.asked_questions, 0);
            assert_eq!(bucket.active, 0);
        }
    }

    #[test]
    fn test_day_series_counts_distinct_users_not_events() {
        let db = seeded_db();
        db.insert_user(&User {
            id: 1,
            registered_at: ts(d(2024, 1, 1)),
            last_activity: None,
        })
        .unwrap();
        // Two waterings by the same user on the same day count once.
        for _ in 0..2 {
            db.record_action(&ActionEvent {
                user_id: 1,
                kind: ActionKind::Watered,
                occurred_at: ts(d(2024, 1, 2)),
            })
            .unwrap();
        }

        let series =
            build_timeseries(&db, Granularity::Day, d(2024, 1, 1), d(2024, 1, 2)).unwrap();
        assert_eq!(series[0].new_users, 1);
        assert_eq!(series[1].watered, 1);
        // Recording the action advanced the user's last_activity.
        assert_eq!(series[1].active, 1);
    }

    #[test]
    fn test_week_series_aligns_and_clamps() {
        let db = seeded_db();
        // 2024-03-06 is a Wednesday; 2024-03-19 is a Tuesday.
        let series =
            build_timeseries(&db, Granularity::Week, d(2024, 3, 6), d(2024, 3, 19)).unwrap();

        assert_eq!(series.len(), 3);
        // First bucket aligned back to Monday of the containing week.
        assert_eq!(series[0].window.start, d(2024, 3, 4));
        assert_eq!(series[0].window.end, d(2024, 3, 10));
        assert_eq!(series[1].window.start, d(2024, 3, 11));
        // Trailing bucket clamped to date_to instead of running to Sunday.
        assert_eq!(series[2].window.start, d(2024, 3, 18));
        assert_eq!(series[2].window.end, d(2024, 3, 19));
    }

    #[test]
    fn test_month_series_walks_calendar_months() {
        let db = seeded_db();
        let series =
            build_timeseries(&db, Granularity::Month, d(2024, 1, 15), d(2024, 3, 10)).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].window.start, d(2024, 1, 1));
        assert_eq!(series[0].window.end, d(2024, 1, 31));
        assert_eq!(series[1].window.end, d(2024, 2, 29));
        assert_eq!(series[2].window.start, d(2024, 3, 1));
        assert_eq!(series[2].window.end, d(2024, 3, 10));
    }

    #[test]
    fn test_inverted_range_is_a_client_error() {
        let db = seeded_db();
        let err =
            build_timeseries(&db, Granularity::Day, d(2024, 1, 2), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidRange(_)));
    }
}

//! Cohort retention
//!
//! Partitions users into registration cohorts by a [`Granularity`], then
//! measures how many members of each cohort "returned" within a target
//! window offset from the cohort window. Three return predicates exist
//! (see [`RetentionType`]); the series builder drives the scan, skips
//! empty cohorts, and normalizes counts to percentages.
//!
//! The builder takes `today` explicitly rather than reading the clock, so
//! the whole series is a deterministic function of (request, event log).

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::calendar::{advance, bucket_containing, shift};
use super::percent;
use crate::error::{Error, Result};
use crate::events::EventLog;
use crate::types::{ActionKind, DateRange, Granularity, RetentionType};

/// Largest accepted period, in granularity units.
pub const MAX_PERIOD: u32 = 365;

/// One cohort row in a retention series.
#[derive(Debug, Clone, Serialize)]
pub struct RetentionResult {
    /// Presentation label for the cohort window. Never parse this back;
    /// use `cohort_window` for computation.
    pub cohort_label: String,
    /// Presentation label for the target window
    pub target_label: String,
    /// The cohort's registration window
    pub cohort_window: DateRange,
    /// The window the return predicate was tested against (cumulative for
    /// rolling retention)
    pub target_window: DateRange,
    /// Users who registered in the cohort window
    pub cohort_size: i64,
    /// Cohort members who satisfied the return predicate
    pub returned: i64,
    /// `returned / cohort_size * 100`, rounded to one decimal
    pub retention_percent: f64,
}

/// Count cohort members who satisfy the return predicate in the target
/// window.
///
/// The caller is expected to have short-circuited empty cohorts already;
/// this function always issues target-window queries.
///
/// Classic retention tests the `last_activity` snapshot only, so it
/// under-counts users whose snapshot has advanced past the target window.
/// That is the defined behavior (see [`RetentionType::Classic`]); rolling
/// retention is the cumulative alternative.
pub fn evaluate_retention(
    log: &dyn EventLog,
    retention_type: RetentionType,
    cohort_window: DateRange,
    target_window: DateRange,
) -> Result<i64> {
    match retention_type {
        RetentionType::Classic => log.count_last_activity(target_window, Some(cohort_window)),
        RetentionType::Functional => {
            let mut returned = std::collections::HashSet::new();
            for kind in ActionKind::functional_signals() {
                returned.extend(log.actor_ids(kind, target_window, Some(cohort_window))?);
            }
            Ok(returned.len() as i64)
        }
        RetentionType::Rolling => {
            // Cumulative span: first day after the cohort window through the
            // end of the target window.
            let span = DateRange {
                start: cohort_window.end + Duration::days(1),
                end: target_window.end,
            };
            log.count_last_activity(span, Some(cohort_window))
        }
    }
}

/// How many cohorts back the series scans for a granularity and period.
///
/// The multiplicative bound keeps a large requested period from forcing a
/// scan impractically far into the past while still returning enough
/// cohorts to chart.
fn scan_cap(granularity: Granularity, period: u32) -> i64 {
    let period = i64::from(period);
    match granularity {
        Granularity::Day => 365.min(period * 5),
        Granularity::Week => 52.min(period * 5),
        Granularity::Month => 12.min(period * 3),
    }
}

/// Presentation label for a bucket window.
fn bucket_label(granularity: Granularity, window: DateRange) -> String {
    match granularity {
        Granularity::Day => window.start.to_string(),
        Granularity::Week => format!(
            "{:02}.{:02}-{:02}.{:02}",
            window.start.day(),
            window.start.month(),
            window.end.day(),
            window.end.month()
        ),
        Granularity::Month => window.start.format("%b %Y").to_string(),
    }
}

/// Build a cohort retention series ending at `today`.
///
/// Cohort `i` is the bucket containing `today` moved back `i + period`
/// units; its target window is the cohort bucket shifted forward `period`
/// units (rolling retention tests the cumulative span instead, per
/// [`evaluate_retention`]). Cohorts with zero registrations are skipped —
/// they carry no information and would only show as spurious 0% rows.
///
/// Results come back in scan order, newest cohort first. Callers needing a
/// different order sort the returned records.
pub fn build_retention_series(
    log: &dyn EventLog,
    retention_type: RetentionType,
    granularity: Granularity,
    period: u32,
    today: NaiveDate,
) -> Result<Vec<RetentionResult>> {
    if period == 0 || period > MAX_PERIOD {
        return Err(Error::InvalidRange(format!(
            "period must be between 1 and {}, got {}",
            MAX_PERIOD, period
        )));
    }

    let cap = scan_cap(granularity, period);
    tracing::debug!(
        retention_type = %retention_type,
        granularity = %granularity,
        period,
        cohorts_scanned = cap,
        "Building retention series"
    );

    let mut series = Vec::new();
    for i in 0..cap {
        let anchor = advance(granularity, today, -(i + i64::from(period)));
        let cohort_window = bucket_containing(granularity, anchor);

        let cohort_size = log.count_registered(cohort_window)?;
        if cohort_size == 0 {
            continue;
        }

        let target_window = shift(granularity, cohort_window, i64::from(period));
        let returned = evaluate_retention(log, retention_type, cohort_window, target_window)?;

        series.push(RetentionResult {
            cohort_label: bucket_label(granularity, cohort_window),
            target_label: bucket_label(granularity, target_window),
            cohort_window,
            target_window,
            cohort_size,
            returned,
            retention_percent: percent(returned, cohort_size),
        });
    }

    tracing::info!(
        retention_type = %retention_type,
        granularity = %granularity,
        period,
        cohorts_emitted = series.len(),
        "Retention series complete"
    );

    Ok(series)
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
        Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
    }

    fn seeded_db() -> Database {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.migrate().expect("migrate schema");
        db
    }

    fn add_user(db: &Database, id: i64, registered: NaiveDate, last_activity: Option<NaiveDate>) {
        db.insert_user(&User {
            id,
            registered_at: ts(registered),
            last_activity: last_activity.map(ts),
        })
        .expect("insert user");
    }

    fn add_action(db: &Database, user_id: i64, kind: ActionKind, day: NaiveDate) {
        db.record_action(&ActionEvent {
            user_id,
            kind,
            occurred_at: ts(day),
        })
        .expect("record action");
    }

    #[test]
    fn test_classic_seven_day_retention_scenario() {
        // 10 users register on day D; 4 have last_activity exactly on D+7.
        let db = seeded_db();
        let cohort_day = d(2024, 3, 1);
        for id in 1..=10 {
            let last = if id <= 4 {
                Some(cohort_day + Duration::days(7))
            } else {
                Some(cohort_day) // active only on registration day
            };
            add_user(&db, id, cohort_day, last);
        }

        let today = cohort_day + Duration::days(10);
        let series = build_retention_series(
            &db,
            RetentionType::Classic,
            Granularity::Day,
            7,
            today,
        )
        .expect("build series");

        let row = series
            .iter()
            .find(|r| r.cohort_window.start == cohort_day)
            .expect("cohort row present");
        assert_eq!(row.cohort_size, 10);
        assert_eq!(row.returned, 4);
        assert_eq!(row.retention_percent, 40.0);
        assert_eq!(row.cohort_label, "2024-03-01");
        assert_eq!(row.target_window.start, cohort_day + Duration::days(7));
    }

    #[test]
    fn test_classic_only_sees_the_last_activity_snapshot() {
        // The user was active on D+7, but their snapshot has advanced to
        // D+20 — classic retention for period 7 no longer counts them.
        let db = seeded_db();
        let cohort_day = d(2024, 3, 1);
        add_user(&db, 1, cohort_day, Some(cohort_day + Duration::days(20)));

        let today = cohort_day + Duration::days(30);
        let series =
            build_retention_series(&db, RetentionType::Classic, Granularity::Day, 7, today)
                .expect("build series");
        let row = series
            .iter()
            .find(|r| r.cohort_window.start == cohort_day)
            .expect("cohort row present");
        assert_eq!(row.returned, 0);
    }

    #[test]
    fn test_functional_unions_distinct_users() {
        let db = seeded_db();
        let cohort_day = d(2024, 3, 4);
        let target_day = cohort_day + Duration::days(1);
        for id in 1..=5 {
            add_user(&db, id, cohort_day, None);
        }
        // User 1 waters and asks a question (counts once), user 2 adds a
        // plant, user 3 only leaves feedback (not a functional signal).
        add_action(&db, 1, ActionKind::Watered, target_day);
        add_action(&db, 1, ActionKind::AskedQuestion, target_day);
        add_action(&db, 2, ActionKind::AddedPlant, target_day);
        add_action(&db, 3, ActionKind::LeftFeedback, target_day);

        let cohort = DateRange::single(cohort_day);
        let target = DateRange::single(target_day);
        let returned =
            evaluate_retention(&db, RetentionType::Functional, cohort, target).unwrap();
        assert_eq!(returned, 2);

        // Union bound: at least each constituent, at most the sum.
        let mut singles = Vec::new();
        for kind in ActionKind::functional_signals() {
            singles.push(db.actor_ids(kind, target, Some(cohort)).unwrap().len() as i64);
        }
        for single in &singles {
            assert!(returned >= *single);
        }
        assert!(returned <= singles.iter().sum::<i64>());
    }

    #[test]
    fn test_functional_ignores_users_outside_the_cohort() {
        let db = seeded_db();
        let cohort_day = d(2024, 3, 4);
        let target_day = cohort_day + Duration::days(1);
        add_user(&db, 1, cohort_day, None);
        add_user(&db, 2, cohort_day - Duration::days(5), None); // earlier cohort
        add_action(&db, 1, ActionKind::Watered, target_day);
        add_action(&db, 2, ActionKind::Watered, target_day);

        let returned = evaluate_retention(
            &db,
            RetentionType::Functional,
            DateRange::single(cohort_day),
            DateRange::single(target_day),
        )
        .unwrap();
        assert_eq!(returned, 1);
    }

    #[test]
    fn test_rolling_is_monotone_in_the_period() {
        let db = seeded_db();
        let cohort_day = d(2024, 2, 1);
        // last_activity spread over the month after registration
        for (id, days_later) in [(1, 2), (2, 5), (3, 11), (4, 20), (5, 28)] {
            add_user(&db, id, cohort_day, Some(cohort_day + Duration::days(days_later)));
        }

        let cohort = DateRange::single(cohort_day);
        let mut previous = 0;
        for period in [1, 3, 7, 14, 30] {
            let target = DateRange::single(cohort_day + Duration::days(period));
            let returned =
                evaluate_retention(&db, RetentionType::Rolling, cohort, target).unwrap();
            assert!(
                returned >= previous,
                "rolling retention shrank from {} to {} at period {}",
                previous,
                returned,
                period
            );
            previous = returned;
        }
        assert_eq!(previous, 5);
    }

    #[test]
    fn test_rolling_excludes_the_cohort_day_itself() {
        // A user whose only activity is the registration day never counts
        // as returned: the cumulative span starts the day after.
        let db = seeded_db();
        let cohort_day = d(2024, 2, 1);
        add_user(&db, 1, cohort_day, Some(cohort_day));

        let returned = evaluate_retention(
            &db,
            RetentionType::Rolling,
            DateRange::single(cohort_day),
            DateRange::single(cohort_day + Duration::days(7)),
        )
        .unwrap();
        assert_eq!(returned, 0);
    }

    #[test]
    fn test_empty_cohorts_are_skipped() {
        let db = seeded_db();
        // Only one registration day in the whole scan range.
        let cohort_day = d(2024, 3, 1);
        add_user(&db, 1, cohort_day, None);

        let today = cohort_day + Duration::days(20);
        for retention_type in [
            RetentionType::Classic,
            RetentionType::Functional,
            RetentionType::Rolling,
        ] {
            let series =
                build_retention_series(&db, retention_type, Granularity::Day, 7, today)
                    .expect("build series");
            assert_eq!(series.len(), 1, "{retention_type} emitted empty cohorts");
            assert_eq!(series[0].cohort_window.start, cohort_day);
            assert_eq!(series[0].retention_percent, 0.0);
        }
    }

    #[test]
    fn test_weekly_series_labels_and_windows() {
        let db = seeded_db();
        // Register two users in the ISO week of 2024-03-04 (Mon).
        add_user(&db, 1, d(2024, 3, 5), Some(d(2024, 3, 12)));
        add_user(&db, 2, d(2024, 3, 7), None);

        let series = build_retention_series(
            &db,
            RetentionType::Classic,
            Granularity::Week,
            1,
            d(2024, 3, 20),
        )
        .expect("build series");

        let row = series
            .iter()
            .find(|r| r.cohort_window.start == d(2024, 3, 4))
            .expect("cohort week present");
        assert_eq!(row.cohort_label, "04.03-10.03");
        assert_eq!(row.target_label, "11.03-17.03");
        assert_eq!(row.cohort_size, 2);
        assert_eq!(row.returned, 1);
        assert_eq!(row.retention_percent, 50.0);
    }

    #[test]
    fn test_monthly_series_uses_calendar_months() {
        let db = seeded_db();
        // Cohort: February 2024 (leap month). Return in March.
        add_user(&db, 1, d(2024, 2, 10), Some(d(2024, 3, 25)));
        add_user(&db, 2, d(2024, 2, 29), Some(d(2024, 2, 29)));

        let series = build_retention_series(
            &db,
            RetentionType::Classic,
            Granularity::Month,
            1,
            d(2024, 4, 15),
        )
        .expect("build series");

        let row = series
            .iter()
            .find(|r| r.cohort_label == "Feb 2024")
            .expect("February cohort present");
        assert_eq!(row.cohort_window.end, d(2024, 2, 29));
        assert_eq!(row.target_label, "Mar 2024");
        assert_eq!(row.target_window.end, d(2024, 3, 31));
        assert_eq!(row.cohort_size, 2);
        assert_eq!(row.returned, 1);
        assert_eq!(row.retention_percent, 50.0);
    }

    #[test]
    fn test_scan_caps() {
        assert_eq!(scan_cap(Granularity::Day, 7), 35);
        assert_eq!(scan_cap(Granularity::Day, 100), 365);
        assert_eq!(scan_cap(Granularity::Week, 2), 10);
        assert_eq!(scan_cap(Granularity::Week, 20), 52);
        assert_eq!(scan_cap(Granularity::Month, 1), 3);
        assert_eq!(scan_cap(Granularity::Month, 6), 12);
    }

    #[test]
    fn test_period_bounds_rejected() {
        let db = seeded_db();
        let today = d(2024, 3, 1);
        for period in [0, MAX_PERIOD + 1] {
            let err = build_retention_series(
                &db,
                RetentionType::Classic,
                Granularity::Day,
                period,
                today,
            )
            .unwrap_err();
            assert!(matches!(err, Error::InvalidRange(_)));
        }
    }
}

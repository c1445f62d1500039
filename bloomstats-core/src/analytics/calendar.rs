//! Calendar bucketing
//!
//! Converts a [`Granularity`] and an anchor date into aligned bucket
//! boundaries and does bucket arithmetic:
//!
//! - day: the calendar day itself
//! - week: Monday through Sunday of the ISO week containing the anchor
//! - month: first through last calendar day of the anchor's month
//!
//! Buckets are closed intervals on both ends, matching the "count if the
//! date falls within `[start, end]`" semantics of the event log queries.
//! Month arithmetic is calendar-aware (variable month lengths, leap
//! February), never a fixed 30-day increment.

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::types::{DateRange, Granularity};

/// The bucket containing `date` for the given granularity.
pub fn bucket_containing(granularity: Granularity, date: NaiveDate) -> DateRange {
    match granularity {
        Granularity::Day => DateRange::single(date),
        Granularity::Week => {
            let start = monday_of(date);
            DateRange {
                start,
                end: start + Duration::days(6),
            }
        }
        Granularity::Month => {
            let start = first_of_month(date);
            DateRange {
                start,
                end: add_months(start, 1) - Duration::days(1),
            }
        }
    }
}

/// Move `date` by `n` granularity units (negative moves backwards).
///
/// Weeks move in whole 7-day steps and then re-align to Monday, so the
/// result is always a week start. Months use calendar arithmetic and clamp
/// the day-of-month when the target month is shorter (Jan 31 + 1 month is
/// the last day of February).
pub fn advance(granularity: Granularity, date: NaiveDate, n: i64) -> NaiveDate {
    match granularity {
        Granularity::Day => date + Duration::days(n),
        Granularity::Week => monday_of(date + Duration::days(7 * n)),
        Granularity::Month => add_months(date, n),
    }
}

/// The bucket `n` units after (or before, when negative) the given bucket.
pub fn shift(granularity: Granularity, window: DateRange, n: i64) -> DateRange {
    bucket_containing(granularity, advance(granularity, window.start, n))
}

/// Monday of the ISO week containing `date`.
fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First calendar day of the month containing `date`.
fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap()
}

/// Calendar-aware month addition (clamps the day-of-month).
fn add_months(date: NaiveDate, n: i64) -> NaiveDate {
    if n >= 0 {
        date.checked_add_months(Months::new(n as u32)).unwrap()
    } else {
        date.checked_sub_months(Months::new((-n) as u32)).unwrap()
    }
}

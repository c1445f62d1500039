//! Single-window aggregates
//!
//! One parametrized snapshot operation serves every fixed reporting window
//! (today, yesterday, or any ad-hoc `[start, end]` pair) — the legacy
//! per-window report paths are thin calls into [`window_snapshot`] with
//! different bucket arguments.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::percent;
use crate::error::Result;
use crate::events::EventLog;
use crate::types::{ActionKind, DateRange};

/// A count paired with its share of the user base.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Share {
    pub count: i64,
    /// Percent of `total_users`, rounded to one decimal; 0 when the user
    /// base is empty
    pub percent: f64,
}

impl Share {
    fn of(count: i64, total: i64) -> Self {
        Self {
            count,
            percent: percent(count, total),
        }
    }
}

/// Aggregate activity snapshot for one reporting window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowStats {
    /// The window this snapshot covers
    pub window: DateRange,
    /// Users registered on or before the window end
    pub total_users: i64,
    /// Users who registered in-window
    pub new_users: i64,
    /// Distinct users who watered a plant in-window
    pub watered: Share,
    /// Distinct users who added a plant in-window
    pub added_plants: Share,
    /// Users whose `last_activity` falls in-window
    pub active: Share,
    /// `total_users - active.count`, never negative
    pub inactive: Share,
}

/// Compute the activity snapshot for a window.
pub fn window_snapshot(log: &dyn EventLog, window: DateRange) -> Result<WindowStats> {
    let total_users = log.count_registered_through(window.end)?;
    let new_users = log.count_registered(window)?;
    let watered = log.count_distinct_actors(ActionKind::Watered, window)?;
    let added_plants = log.count_distinct_actors(ActionKind::AddedPlant, window)?;
    let active = log.count_last_activity(window, None)?;
    let inactive = (total_users - active).max(0);

    Ok(WindowStats {
        window,
        total_users,
        new_users,
        watered: Share::of(watered, total_users),
        added_plants: Share::of(added_plants, total_users),
        active: Share::of(active, total_users),
        inactive: Share::of(inactive, total_users),
    })
}

/// Event counts for today and the trailing seven days.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PeriodCounts {
    pub today: i64,
    pub last_week: i64,
}

/// Secondary engagement metrics: raw event volume rather than distinct
/// users, for the kinds the dashboard tracks outside the trend charts.
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    /// Users registered as of `today`
    pub total_users: i64,
    /// Plant questions asked
    pub questions: PeriodCounts,
    /// Feedback left
    pub feedback: PeriodCounts,
    /// Growing journeys started
    pub started_growing: PeriodCounts,
}

/// Compute the engagement summary as of `today`.
pub fn activity_summary(log: &dyn EventLog, today: NaiveDate) -> Result<ActivitySummary> {
    let day = DateRange::single(today);
    let week = DateRange {
        start: today - Duration::days(6),
        end: today,
    };

    let counts = |kind: ActionKind| -> Result<PeriodCounts> {
        Ok(PeriodCounts {
            today: log.count_events(kind, day)?,
            last_week: log.count_events(kind, week)?,
        })
    };

    Ok(ActivitySummary {
        total_users: log.count_registered_through(today)?,
        questions: counts(ActionKind::AskedQuestion)?,
        feedback: counts(ActionKind::LeftFeedback)?,
        started_growing: counts(ActionKind::StartedGrowing)?,
    })
}

//! Core domain types for bloomstats
//!
//! These types describe the abstract event log the engine reads and the
//! vocabulary of every report it produces.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Cohort** | The set of users who registered within one bucket window |
//! | **Target window** | The window, offset from a cohort's window, against which "return" is tested |
//! | **Granularity** | The bucket unit: day, week, or month |
//! | **Bucket** | A closed calendar interval used as the unit of aggregation |
//! | **Action** | Something a user did in the app (watered, added a plant, ...) |
//!
//! Windows are closed on both ends: a date counts when it falls within
//! `[start, end]`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// User identifier as stored in the event log.
pub type UserId = i64;

// ============================================
// Granularity
// ============================================

/// Bucket unit for cohorts and trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Returns the identifier used in request parameters and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            _ => Err(crate::error::Error::InvalidRange(format!(
                "unknown granularity: {} (expected day, week or month)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Retention type
// ============================================

/// The three definitions of "returned" a cohort can be measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionType {
    /// `last_activity` falls inside the target window.
    ///
    /// `last_activity` is a single mutable last-seen timestamp, so this
    /// only reflects the most recent activity: a user active during the
    /// target window whose snapshot has since advanced past it is not
    /// counted. That limitation is part of the defined semantics.
    Classic,
    /// Performed any of watered / added_plant / asked_question inside the
    /// target window. Distinct users across the three signals.
    Functional,
    /// `last_activity` falls anywhere between the end of the cohort window
    /// and the end of the target window: "returned at least once within N
    /// units of registration".
    Rolling,
}

impl RetentionType {
    /// Returns the identifier used in request parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionType::Classic => "classic",
            RetentionType::Functional => "functional",
            RetentionType::Rolling => "rolling",
        }
    }
}

impl std::str::FromStr for RetentionType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(RetentionType::Classic),
            "functional" => Ok(RetentionType::Functional),
            "rolling" => Ok(RetentionType::Rolling),
            _ => Err(crate::error::Error::InvalidRange(format!(
                "unknown retention type: {} (expected classic, functional or rolling)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RetentionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Action kinds
// ============================================

/// Kinds of user actions recorded in the event log.
///
/// The engine only ever counts *distinct users* per window, never raw
/// event volume, except for [`count_events`](crate::events::EventLog::count_events)
/// which feeds the activity summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Watered,
    AddedPlant,
    AskedQuestion,
    LeftFeedback,
    StartedGrowing,
}

impl ActionKind {
    /// Returns the identifier used in database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Watered => "watered",
            ActionKind::AddedPlant => "added_plant",
            ActionKind::AskedQuestion => "asked_question",
            ActionKind::LeftFeedback => "left_feedback",
            ActionKind::StartedGrowing => "started_growing",
        }
    }

    /// The signals that count as "useful" activity for functional retention.
    pub fn functional_signals() -> [ActionKind; 3] {
        [
            ActionKind::Watered,
            ActionKind::AddedPlant,
            ActionKind::AskedQuestion,
        ]
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watered" => Ok(ActionKind::Watered),
            "added_plant" => Ok(ActionKind::AddedPlant),
            "asked_question" => Ok(ActionKind::AskedQuestion),
            "left_feedback" => Ok(ActionKind::LeftFeedback),
            "started_growing" => Ok(ActionKind::StartedGrowing),
            _ => Err(format!("unknown action kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Date ranges
// ============================================

/// A closed calendar interval: both endpoints are inside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range
    pub start: NaiveDate,
    /// Last day of the range (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting inverted input.
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::error::Result<Self> {
        if start > end {
            return Err(crate::error::Error::InvalidRange(format!(
                "date_from {} is after date_to {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Whether a date falls within `[start, end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, endpoints included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ============================================
// Event log records
// ============================================

/// A registered user as seen by the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// When the user registered
    pub registered_at: DateTime<Utc>,
    /// Most recent interaction of any kind. Monotonically non-decreasing,
    /// and never earlier than `registered_at` when present.
    pub last_activity: Option<DateTime<Utc>>,
}

/// A single user action recorded in the event log.
///
/// Multiple events per user per day are normal; the aggregators
/// deduplicate by user where the report calls for distinct users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    /// The acting user
    pub user_id: UserId,
    /// What the user did
    pub kind: ActionKind,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}

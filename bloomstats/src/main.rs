//! bloomstats - usage metrics reports for the Bloom plant-care app
//!
//! Thin reporting shell over bloomstats-core: parses request parameters,
//! validates and clamps them, invokes the engine, and prints the result as
//! JSON for the dashboard to consume.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bloomstats_core::analytics::{
    activity_summary, build_retention_series, build_timeseries, window_snapshot,
};
use bloomstats_core::types::{DateRange, Granularity, RetentionType};
use bloomstats_core::{Config, Database};
use chrono::{Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};

/// Period bounds enforced at the shell boundary.
const PERIOD_BOUNDS: (u32, u32) = (1, 365);

#[derive(Parser)]
#[command(name = "bloomstats")]
#[command(about = "Usage metrics reports for the Bloom plant-care app")]
#[command(version)]
struct Cli {
    /// Database file to read (defaults to the configured path)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Activity snapshot for a single day
    Snapshot {
        /// Day to report on (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Report on yesterday instead
        #[arg(long, conflicts_with = "date")]
        yesterday: bool,
    },

    /// Activity trend series over a date range
    Trend {
        /// Bucket unit: day, week or month
        #[arg(long, default_value = "day")]
        granularity: String,

        /// Range start (YYYY-MM-DD); defaults to the configured trend window
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Range end (YYYY-MM-DD); defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Cohort retention series
    Retention {
        /// Retention semantics: classic, functional or rolling
        #[arg(long = "type", value_name = "TYPE", default_value = "classic")]
        retention_type: String,

        /// Cohort unit: day, week or month
        #[arg(long, default_value = "day")]
        granularity: String,

        /// Offset between cohort and target window, in granularity units
        #[arg(long)]
        period: Option<u32>,
    },

    /// Engagement summary (questions, feedback, growing journeys)
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging (to file; stdout carries the JSON report)
    let _log_guard = bloomstats_core::logging::init(&config.logging)
        .context("failed to initialize logging")?;

    // Open database
    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_path());
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let today = Utc::now().date_naive();

    let report = match cli.command {
        Command::Snapshot { date, yesterday } => {
            let day = match (date, yesterday) {
                (Some(date), _) => date,
                (None, true) => today - Duration::days(1),
                (None, false) => today,
            };
            let stats = window_snapshot(&db, DateRange::single(day))
                .context("failed to build snapshot")?;
            serde_json::json!({
                "date": day,
                "stats": stats,
            })
        }

        Command::Trend {
            granularity,
            from,
            to,
        } => {
            let granularity: Granularity = granularity.parse()?;
            let to = to.unwrap_or(today);
            let from = from.unwrap_or_else(|| {
                to - Duration::days(i64::from(config.reporting.default_trend_days) - 1)
            });
            let buckets = build_timeseries(&db, granularity, from, to)
                .context("failed to build trend series")?;
            serde_json::json!({
                "granularity": granularity,
                "from": from,
                "to": to,
                "buckets": buckets,
            })
        }

        Command::Retention {
            retention_type,
            granularity,
            period,
        } => {
            let retention_type: RetentionType = retention_type.parse()?;
            let granularity: Granularity = granularity.parse()?;
            let period = period
                .unwrap_or(config.reporting.default_retention_period)
                .clamp(PERIOD_BOUNDS.0, PERIOD_BOUNDS.1);
            let cohorts = build_retention_series(&db, retention_type, granularity, period, today)
                .context("failed to build retention series")?;
            serde_json::json!({
                "retention_type": retention_type,
                "granularity": granularity,
                "period": period,
                "cohorts": cohorts,
            })
        }

        Command::Summary => {
            let summary = activity_summary(&db, today).context("failed to build summary")?;
            serde_json::to_value(summary)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

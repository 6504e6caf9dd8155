use crate::collect::adapter::Platform;
use crate::db;
use crate::settings::settings;
use chrono::{DateTime, Duration, TimeZone, Utc};
use diesel::sqlite::SqliteConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkMode {
    Backfill,
    Incremental,
    FirstRun,
}

impl WatermarkMode {
    pub fn label(&self) -> &'static str {
        match self {
            WatermarkMode::Backfill => "backfill",
            WatermarkMode::Incremental => "incremental",
            WatermarkMode::FirstRun => "first run",
        }
    }
}

/// Lower time bound for the next collection run.
///
/// Backfill wins when requested; otherwise the max stored timestamp for this
/// platform (watermarks are per-platform, since adapters collect
/// independently). No prior data, or a failed watermark query, degrades to
/// the first-run window instead of aborting the run.
pub fn resolve_watermark(
    conn: &mut SqliteConnection,
    platform: Platform,
    backfill_days: i64,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, WatermarkMode) {
    if backfill_days > 0 {
        return (now - Duration::days(backfill_days), WatermarkMode::Backfill);
    }

    let first_run = now - Duration::days(settings().collection.first_run_days);

    match db::latest_post_timestamp(conn, &platform.to_string()) {
        Ok(Some(ts)) => match Utc.timestamp_opt(ts, 0).single() {
            Some(t) => (t, WatermarkMode::Incremental),
            None => (first_run, WatermarkMode::FirstRun),
        },
        Ok(None) => (first_run, WatermarkMode::FirstRun),
        Err(_) => (first_run, WatermarkMode::FirstRun),
    }
}

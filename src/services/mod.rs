//! Review workflow shared by the CLI, the web server and the daily job.

pub mod review;
pub mod schedule;

pub use review::{ReviewService, ScanReport, DEFAULT_RETENTION_DAYS};
pub use schedule::{run_daily, spawn_daily, DailyReport, SCHEDULED_LOOKBACK_DAYS};

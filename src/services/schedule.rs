//! The daily maintenance job: a short scan followed by retention cleanup.
//!
//! The job can be triggered by the `/api/cron` endpoint, the `daily` CLI command, or
//! the optional in-process timer started by [`spawn_daily`].

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::review::{ReviewService, ScanReport};
use crate::error::{AppError, AppResult};

/// Lookback used by the scheduled scan, in days.
pub const SCHEDULED_LOOKBACK_DAYS: u32 = 2;

/// Result of one daily run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    pub scan: Option<ScanReport>,
    /// Why the scan did not run or failed. Cleanup still runs.
    pub scan_error: Option<String>,
    pub removed: usize,
}

/// Run the scan, then cleanup. Only a cleanup failure fails the job.
pub async fn run_daily(
    review: &ReviewService,
    lookback_days: u32,
    retention_days: i64,
) -> AppResult<DailyReport> {
    let mut report = DailyReport::default();

    match review.scan(lookback_days).await {
        Ok(scan) => report.scan = Some(scan),
        Err(AppError::Discovery(e)) => {
            warn!("Scheduled scan skipped: {}", e);
            report.scan_error = Some(e.to_string());
        }
        Err(e) => return Err(e),
    }

    report.removed = review.cleanup(retention_days).await?;
    Ok(report)
}

/// Run [`run_daily`] every `period`, starting one period from now.
pub fn spawn_daily(
    review: ReviewService,
    period: Duration,
    lookback_days: u32,
    retention_days: i64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            info!("Running scheduled scan and cleanup");
            if let Err(e) = run_daily(&review, lookback_days, retention_days).await {
                error!("Scheduled job failed: {}", e);
            }
        }
    })
}

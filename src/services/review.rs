//! Candidate review pipeline.
//!
//! Ingests discovered articles into the candidate store and moves candidates through
//! their review states:
//!
//! ```text
//! PENDING ──approve──▶ APPROVED (linked draft report)
//!    └─────reject───▶ REJECTED ──cleanup (after retention)──▶ deleted
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::discovery::ArticleSource;
use crate::error::{AppError, AppResult};
use crate::models::{Candidate, CandidateStatus, Report, ReportInput};
use crate::repository::{Database, InsertOutcome, TransitionOutcome};

/// Default retention for rejected candidates, in days.
pub const DEFAULT_RETENTION_DAYS: i64 = 60;

/// Counters from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub added: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Orchestrates discovery ingestion and editor review decisions.
#[derive(Clone)]
pub struct ReviewService {
    db: Database,
    source: Arc<dyn ArticleSource>,
}

fn not_pending(id: i32, status: CandidateStatus) -> AppError {
    AppError::Conflict(format!(
        "candidate {} has already been reviewed ({})",
        id,
        status.as_str()
    ))
}

impl ReviewService {
    pub fn new(db: Database, source: Arc<dyn ArticleSource>) -> Self {
        Self { db, source }
    }

    /// Whether the discovery source can be queried.
    pub fn discovery_configured(&self) -> bool {
        self.source.is_configured()
    }

    /// Fetch recent articles and store the ones not seen before.
    ///
    /// A provider failure aborts the scan. Storage failures on individual articles are
    /// counted and do not stop the rest of the batch.
    pub async fn scan(&self, lookback_days: u32) -> AppResult<ScanReport> {
        let drafts = self.source.fetch_recent(lookback_days).await?;
        let candidates = self.db.candidates();
        let mut report = ScanReport::default();

        for draft in &drafts {
            match candidates.insert_if_new(draft).await {
                Ok(InsertOutcome::Created(_)) => report.added += 1,
                Ok(InsertOutcome::AlreadyExists) => report.skipped += 1,
                Err(e) => {
                    warn!("Failed to store candidate {}: {}", draft.external_id, e);
                    report.errors += 1;
                }
            }
        }

        info!(
            "Scan over {} days: {} added, {} skipped, {} errors",
            lookback_days, report.added, report.skipped, report.errors
        );
        Ok(report)
    }

    /// Approve a pending candidate, creating a linked draft report.
    ///
    /// Company and jobs_lost are required; date and source default to the candidate's.
    /// The report and the status change are written in one transaction.
    pub async fn approve(&self, candidate_id: i32, input: ReportInput) -> AppResult<Report> {
        let candidates = self.db.candidates();
        let candidate = candidates
            .get(candidate_id)
            .await?
            .ok_or_else(|| AppError::candidate_not_found(candidate_id))?;
        if candidate.status != CandidateStatus::Pending {
            return Err(not_pending(candidate_id, candidate.status));
        }

        let fields = input.into_approval_fields(&candidate)?;

        match candidates.approve(candidate_id, &fields).await? {
            TransitionOutcome::Done(report) => {
                info!(
                    "Approved candidate {} as draft report {} ({})",
                    candidate_id, report.id, report.company
                );
                Ok(report)
            }
            TransitionOutcome::NotFound => Err(AppError::candidate_not_found(candidate_id)),
            TransitionOutcome::NotPending(status) => Err(not_pending(candidate_id, status)),
        }
    }

    /// Reject a pending candidate.
    pub async fn reject(&self, candidate_id: i32) -> AppResult<Candidate> {
        match self.db.candidates().reject(candidate_id).await? {
            TransitionOutcome::Done(candidate) => {
                info!("Rejected candidate {}", candidate_id);
                Ok(candidate)
            }
            TransitionOutcome::NotFound => Err(AppError::candidate_not_found(candidate_id)),
            TransitionOutcome::NotPending(status) => Err(not_pending(candidate_id, status)),
        }
    }

    /// Delete rejected candidates older than `retention_days`. Returns the number removed.
    pub async fn cleanup(&self, retention_days: i64) -> AppResult<usize> {
        if retention_days < 0 {
            return Err(AppError::Validation(
                "retention days must not be negative".to_string(),
            ));
        }
        let removed = self
            .db
            .candidates()
            .delete_older_than(CandidateStatus::Rejected, retention_days)
            .await?;
        if removed > 0 {
            info!(
                "Removed {} rejected candidates older than {} days",
                removed, retention_days
            );
        }
        Ok(removed)
    }
}

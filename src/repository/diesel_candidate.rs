//! Diesel-based candidate repository for SQLite.
//!
//! Candidates are discovered articles awaiting review. `external_id` carries a UNIQUE
//! constraint; inserts use `ON CONFLICT DO NOTHING` so concurrent scans of the same
//! article converge on a single row.

use chrono::{DateTime, Duration, Utc};
use diesel::prelude::*;

use super::diesel_models::{CandidateRecord, NewCandidate, ReportRecord};
use super::diesel_pool::{run_blocking, DieselError, SqlitePool};
use super::diesel_report::insert_report;
use super::{format_timestamp, parse_datetime, LastInsertRowId};
use crate::models::{
    Candidate, CandidateCounts, CandidateDraft, CandidateStatus, Report, ReportFields,
};
use crate::schema::candidates;

/// Convert a database record to a domain model.
impl From<CandidateRecord> for Candidate {
    fn from(record: CandidateRecord) -> Self {
        Candidate {
            id: record.id,
            external_id: record.external_id,
            title: record.title,
            summary: record.summary,
            source_name: record.source_name,
            source_url: record.source_url,
            published_date: record.published_date,
            status: CandidateStatus::parse(&record.status).unwrap_or_default(),
            report_id: record.report_id,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Result of [`DieselCandidateRepository::insert_if_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id.
    Created(i32),
    /// A candidate with the same external id is already stored.
    AlreadyExists,
}

/// Result of a review transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome<T> {
    Done(T),
    NotFound,
    /// The candidate has already been reviewed.
    NotPending(CandidateStatus),
}

/// Outcome of approving a candidate: the new draft report.
pub type ApproveOutcome = TransitionOutcome<Report>;

#[derive(diesel::QueryableByName)]
struct StatusCount {
    #[diesel(sql_type = diesel::sql_types::Text)]
    status: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    count: i64,
}

/// Read the status of a candidate inside a transaction.
fn current_status(
    conn: &mut SqliteConnection,
    id: i32,
) -> Result<Option<CandidateStatus>, DieselError> {
    let status: Option<String> = candidates::table
        .find(id)
        .select(candidates::status)
        .first(conn)
        .optional()?;
    Ok(status.map(|s| CandidateStatus::parse(&s).unwrap_or_default()))
}

/// Diesel-based candidate repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselCandidateRepository {
    pool: SqlitePool,
}

impl DieselCandidateRepository {
    /// Create a new Diesel candidate repository with an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List candidates, optionally filtered by status, newest publication first.
    pub async fn list(&self, status: Option<CandidateStatus>) -> Result<Vec<Candidate>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let mut query = candidates::table
                .order((candidates::published_date.desc(), candidates::id.desc()))
                .into_boxed();

            if let Some(status) = status {
                query = query.filter(candidates::status.eq(status.as_str()));
            }

            query.load::<CandidateRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Candidate::from).collect())
    }

    /// Get a candidate by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Candidate>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            candidates::table
                .find(id)
                .first::<CandidateRecord>(conn)
                .optional()
        })
        .await
        .map(|opt| opt.map(Candidate::from))
    }

    /// Get a candidate by the provider's article identifier.
    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Candidate>, DieselError> {
        let external_id = external_id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            candidates::table
                .filter(candidates::external_id.eq(&external_id))
                .first::<CandidateRecord>(conn)
                .optional()
        })
        .await
        .map(|opt| opt.map(Candidate::from))
    }

    /// Pending, approved, rejected and total counts.
    pub async fn counts(&self) -> Result<CandidateCounts, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let rows: Vec<StatusCount> = diesel::sql_query(
                "SELECT status, COUNT(*) AS count FROM candidates GROUP BY status",
            )
            .load(conn)?;

            let mut counts = CandidateCounts::default();
            for StatusCount { status, count } in rows {
                let count = count as u64;
                match CandidateStatus::parse(&status) {
                    Some(CandidateStatus::Pending) => counts.pending += count,
                    Some(CandidateStatus::Approved) => counts.approved += count,
                    Some(CandidateStatus::Rejected) => counts.rejected += count,
                    None => {}
                }
                counts.total += count;
            }
            Ok(counts)
        })
        .await
    }

    /// Insert a pending candidate unless one with the same external id exists.
    pub async fn insert_if_new(&self, draft: &CandidateDraft) -> Result<InsertOutcome, DieselError> {
        self.insert_if_new_at(draft, Utc::now()).await
    }

    /// Like [`insert_if_new`](Self::insert_if_new) with an explicit creation time.
    pub async fn insert_if_new_at(
        &self,
        draft: &CandidateDraft,
        created_at: DateTime<Utc>,
    ) -> Result<InsertOutcome, DieselError> {
        let draft = draft.clone();
        let created_at = format_timestamp(created_at);
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.immediate_transaction::<_, DieselError, _>(|conn| {
                let new_candidate = NewCandidate {
                    external_id: &draft.external_id,
                    title: &draft.title,
                    summary: &draft.summary,
                    source_name: &draft.source_name,
                    source_url: &draft.source_url,
                    published_date: &draft.published_date,
                    status: CandidateStatus::Pending.as_str(),
                    created_at: &created_at,
                };

                let rows = diesel::insert_into(candidates::table)
                    .values(&new_candidate)
                    .on_conflict(candidates::external_id)
                    .do_nothing()
                    .execute(conn)?;

                if rows == 0 {
                    return Ok(InsertOutcome::AlreadyExists);
                }

                let id = diesel::sql_query("SELECT last_insert_rowid()")
                    .get_result::<LastInsertRowId>(conn)?
                    .id as i32;
                Ok(InsertOutcome::Created(id))
            })
        })
        .await
    }

    /// Set a candidate's status and report link unconditionally.
    ///
    /// Returns false if the candidate does not exist.
    pub async fn set_status(
        &self,
        id: i32,
        status: CandidateStatus,
        report_id: Option<i32>,
    ) -> Result<bool, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let rows = diesel::update(candidates::table.find(id))
                .set((
                    candidates::status.eq(status.as_str()),
                    candidates::report_id.eq(report_id),
                ))
                .execute(conn)?;
            Ok(rows > 0)
        })
        .await
    }

    /// Create a draft report from `fields` and mark the candidate approved, atomically.
    ///
    /// Only a pending candidate can be approved; nothing is written otherwise.
    pub async fn approve(&self, id: i32, fields: &ReportFields) -> Result<ApproveOutcome, DieselError> {
        let mut fields = fields.clone();
        fields.include = Some(false);
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.immediate_transaction::<_, DieselError, _>(|conn| {
                match current_status(conn, id)? {
                    None => return Ok(TransitionOutcome::NotFound),
                    Some(CandidateStatus::Pending) => {}
                    Some(other) => return Ok(TransitionOutcome::NotPending(other)),
                }

                let report: ReportRecord = insert_report(conn, &fields)?;

                diesel::update(candidates::table.find(id))
                    .set((
                        candidates::status.eq(CandidateStatus::Approved.as_str()),
                        candidates::report_id.eq(Some(report.id)),
                    ))
                    .execute(conn)?;

                Ok(TransitionOutcome::Done(Report::from(report)))
            })
        })
        .await
    }

    /// Mark a pending candidate rejected.
    pub async fn reject(&self, id: i32) -> Result<TransitionOutcome<Candidate>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.immediate_transaction::<_, DieselError, _>(|conn| {
                match current_status(conn, id)? {
                    None => return Ok(TransitionOutcome::NotFound),
                    Some(CandidateStatus::Pending) => {}
                    Some(other) => return Ok(TransitionOutcome::NotPending(other)),
                }

                diesel::update(candidates::table.find(id))
                    .set(candidates::status.eq(CandidateStatus::Rejected.as_str()))
                    .execute(conn)?;

                candidates::table
                    .find(id)
                    .first::<CandidateRecord>(conn)
                    .map(|record| TransitionOutcome::Done(Candidate::from(record)))
            })
        })
        .await
    }

    /// Delete candidates with `status` created more than `days` days ago.
    ///
    /// A window reaching past the earliest representable time matches nothing.
    pub async fn delete_older_than(
        &self,
        status: CandidateStatus,
        days: i64,
    ) -> Result<usize, DieselError> {
        match Duration::try_days(days).and_then(|window| Utc::now().checked_sub_signed(window)) {
            Some(cutoff) => self.delete_created_before(status, cutoff).await,
            None => Ok(0),
        }
    }

    /// Delete candidates with `status` created before `cutoff`.
    pub async fn delete_created_before(
        &self,
        status: CandidateStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, DieselError> {
        let cutoff = format_timestamp(cutoff);
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            diesel::delete(
                candidates::table
                    .filter(candidates::status.eq(status.as_str()))
                    .filter(candidates::created_at.lt(&cutoff)),
            )
            .execute(conn)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LooseNumber, ReportInput};
    use crate::repository::test_support::setup_test_db;

    fn draft(external_id: &str, published_date: &str) -> CandidateDraft {
        CandidateDraft {
            external_id: external_id.to_string(),
            title: format!("Article {external_id}"),
            summary: "Company cuts staff, cites AI".to_string(),
            source_name: "Example News".to_string(),
            source_url: format!("https://news.example.com/{external_id}"),
            published_date: published_date.to_string(),
        }
    }

    fn approval_fields(candidate: &Candidate) -> ReportFields {
        ReportInput {
            company: Some("Acme".to_string()),
            jobs_lost: Some(LooseNumber::from(100)),
            ..Default::default()
        }
        .into_approval_fields(candidate)
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_if_new_is_idempotent() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();

        let first = repo.insert_if_new(&draft("a1", "2025-05-01")).await.unwrap();
        assert!(matches!(first, InsertOutcome::Created(_)));

        let second = repo.insert_if_new(&draft("a1", "2025-05-02")).await.unwrap();
        assert_eq!(second, InsertOutcome::AlreadyExists);

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].published_date, "2025-05-01");
        assert_eq!(all[0].status, CandidateStatus::Pending);
        assert!(all[0].report_id.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_converge() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.insert_if_new(&draft("same", "2025-05-01")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if let InsertOutcome::Created(_) = handle.await.unwrap().unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.counts().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();

        repo.insert_if_new(&draft("old", "2025-01-01")).await.unwrap();
        repo.insert_if_new(&draft("new", "2025-06-01")).await.unwrap();
        repo.insert_if_new(&draft("new-2", "2025-06-01")).await.unwrap();

        let ids: Vec<String> = repo
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.external_id)
            .collect();
        assert_eq!(ids, vec!["new-2", "new", "old"]);

        let old = repo.get_by_external_id("old").await.unwrap().unwrap();
        repo.reject(old.id).await.unwrap();

        let rejected = repo.list(Some(CandidateStatus::Rejected)).await.unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].external_id, "old");
        assert_eq!(repo.list(Some(CandidateStatus::Pending)).await.unwrap().len(), 2);

        let counts = repo.counts().await.unwrap();
        assert_eq!(
            counts,
            CandidateCounts { pending: 2, approved: 0, rejected: 1, total: 3 }
        );
    }

    #[tokio::test]
    async fn test_approve_links_draft_report() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();

        repo.insert_if_new(&draft("a1", "2025-05-01")).await.unwrap();
        let candidate = repo.get_by_external_id("a1").await.unwrap().unwrap();

        let outcome = repo.approve(candidate.id, &approval_fields(&candidate)).await.unwrap();
        let report = match outcome {
            TransitionOutcome::Done(report) => report,
            other => panic!("unexpected outcome {other:?}"),
        };
        assert!(!report.include);
        assert_eq!(report.company, "Acme");
        assert_eq!(report.date, "2025-05-01");
        assert_eq!(report.source_label, "Example News");

        let stored = repo.get(candidate.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CandidateStatus::Approved);
        assert_eq!(stored.report_id, Some(report.id));

        // A second approval must not create another report.
        let again = repo.approve(candidate.id, &approval_fields(&candidate)).await.unwrap();
        assert_eq!(again, TransitionOutcome::NotPending(CandidateStatus::Approved));
        assert_eq!(db.reports().counts().await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_reject_and_missing_ids() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();

        repo.insert_if_new(&draft("r1", "2025-05-01")).await.unwrap();
        let candidate = repo.get_by_external_id("r1").await.unwrap().unwrap();

        match repo.reject(candidate.id).await.unwrap() {
            TransitionOutcome::Done(c) => {
                assert_eq!(c.status, CandidateStatus::Rejected);
                assert!(c.report_id.is_none());
            }
            other => panic!("unexpected outcome {other:?}"),
        }

        assert_eq!(repo.reject(999).await.unwrap(), TransitionOutcome::NotFound);
        assert!(!repo.set_status(999, CandidateStatus::Rejected, None).await.unwrap());
        assert_eq!(
            repo.reject(candidate.id).await.unwrap(),
            TransitionOutcome::NotPending(CandidateStatus::Rejected)
        );
    }

    #[tokio::test]
    async fn test_deleting_report_clears_link() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();

        repo.insert_if_new(&draft("a1", "2025-05-01")).await.unwrap();
        let candidate = repo.get_by_external_id("a1").await.unwrap().unwrap();
        let report = match repo.approve(candidate.id, &approval_fields(&candidate)).await.unwrap() {
            TransitionOutcome::Done(report) => report,
            other => panic!("unexpected outcome {other:?}"),
        };

        assert!(db.reports().delete(report.id).await.unwrap());

        let stored = repo.get(candidate.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CandidateStatus::Approved);
        assert!(stored.report_id.is_none());
    }

    #[tokio::test]
    async fn test_retention_cleanup() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();
        let now = Utc::now();

        for (external_id, age_days) in [("stale", 61), ("fresh", 59)] {
            let created_at = now - Duration::days(age_days);
            repo.insert_if_new_at(&draft(external_id, "2025-01-01"), created_at)
                .await
                .unwrap();
            let c = repo.get_by_external_id(external_id).await.unwrap().unwrap();
            repo.reject(c.id).await.unwrap();
        }
        // Old but approved: never purged.
        repo.insert_if_new_at(&draft("kept", "2025-01-01"), now - Duration::days(90))
            .await
            .unwrap();
        let kept = repo.get_by_external_id("kept").await.unwrap().unwrap();
        repo.set_status(kept.id, CandidateStatus::Approved, None).await.unwrap();

        let removed = repo.delete_older_than(CandidateStatus::Rejected, 60).await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.get_by_external_id("stale").await.unwrap().is_none());
        assert!(repo.get_by_external_id("fresh").await.unwrap().is_some());
        assert!(repo.get_by_external_id("kept").await.unwrap().is_some());

        let removed_again = repo.delete_older_than(CandidateStatus::Rejected, 60).await.unwrap();
        assert_eq!(removed_again, 0);
    }

    #[tokio::test]
    async fn test_retention_window_beyond_calendar_range() {
        let (db, _dir) = setup_test_db().await;
        let repo = db.candidates();
        repo.insert_if_new_at(&draft("ancient", "2025-01-01"), Utc::now() - Duration::days(3650))
            .await
            .unwrap();
        let c = repo.get_by_external_id("ancient").await.unwrap().unwrap();
        repo.reject(c.id).await.unwrap();

        for days in [1_000_000_000, 200_000_000_000_000, i64::MAX] {
            let removed = repo.delete_older_than(CandidateStatus::Rejected, days).await.unwrap();
            assert_eq!(removed, 0, "days = {}", days);
        }
        assert!(repo.get_by_external_id("ancient").await.unwrap().is_some());

        assert_eq!(repo.delete_older_than(CandidateStatus::Rejected, 60).await.unwrap(), 1);
    }
}

//! Diesel-based report repository for SQLite.
//!
//! Reports are the curated layoff events. This store only normalizes; it never rejects
//! a field. Missing rows are reported through `Option`/`bool` results.

use diesel::prelude::*;

use super::diesel_models::{NewReport, ReportRecord};
use super::diesel_pool::{run_blocking, DieselError, SqlitePool};
use super::{now_timestamp, parse_datetime, LastInsertRowId};
use crate::models::{AiAttribution, LossType, Region, Report, ReportCounts, ReportFields};
use crate::schema::{candidates, reports};

/// Convert a database record to a domain model.
impl From<ReportRecord> for Report {
    fn from(record: ReportRecord) -> Self {
        Report {
            id: record.id,
            date: record.date,
            company: record.company,
            industry: record.industry,
            region: Region::parse(&record.region).unwrap_or_default(),
            country: record.country,
            workforce: record.workforce,
            jobs_lost: record.jobs_lost,
            loss_type: LossType::parse(&record.loss_type).unwrap_or_default(),
            ai_attribution: AiAttribution::parse(&record.ai_attribution).unwrap_or_default(),
            source_label: record.source_label,
            source_url: record.source_url,
            stock_delta_pct: record.stock_delta_pct,
            is_estimate: record.is_estimate,
            include: record.include,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

#[derive(diesel::QueryableByName)]
struct PublishCounts {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    published: i64,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    total: i64,
}

/// Insert a report on an existing connection and return the stored row.
///
/// Shared with the candidate repository so approval can create the report inside its
/// own transaction.
pub(super) fn insert_report(
    conn: &mut SqliteConnection,
    fields: &ReportFields,
) -> Result<ReportRecord, DieselError> {
    let now = now_timestamp();
    let new_report = NewReport {
        date: &fields.date,
        company: &fields.company,
        industry: &fields.industry,
        region: fields.region.as_str(),
        country: &fields.country,
        workforce: fields.workforce,
        jobs_lost: fields.jobs_lost,
        loss_type: fields.loss_type.as_str(),
        ai_attribution: fields.ai_attribution.as_str(),
        source_label: &fields.source_label,
        source_url: &fields.source_url,
        stock_delta_pct: fields.stock_delta_pct,
        is_estimate: fields.is_estimate,
        include: fields.include.unwrap_or(false),
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(reports::table)
        .values(&new_report)
        .execute(conn)?;

    let id = diesel::sql_query("SELECT last_insert_rowid()")
        .get_result::<LastInsertRowId>(conn)?
        .id as i32;

    reports::table.find(id).first::<ReportRecord>(conn)
}

/// Diesel-based report repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselReportRepository {
    pool: SqlitePool,
}

impl DieselReportRepository {
    /// Create a new Diesel report repository with an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Published reports, newest first.
    pub async fn list_published(&self) -> Result<Vec<Report>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            reports::table
                .filter(reports::include.eq(true))
                .order((reports::date.desc(), reports::id.desc()))
                .load::<ReportRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Report::from).collect())
    }

    /// All reports including drafts, newest first.
    pub async fn list_all(&self) -> Result<Vec<Report>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            reports::table
                .order((reports::date.desc(), reports::id.desc()))
                .load::<ReportRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Report::from).collect())
    }

    /// Get a report by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Report>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            reports::table.find(id).first::<ReportRecord>(conn).optional()
        })
        .await
        .map(|opt| opt.map(Report::from))
    }

    /// Create a report. `include` defaults to unpublished.
    pub async fn create(&self, fields: &ReportFields) -> Result<Report, DieselError> {
        let fields = fields.clone();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| insert_report(conn, &fields))
            .await
            .map(Report::from)
    }

    /// Replace every field of a report. The publish flag is kept unless `fields.include` is set.
    pub async fn update(&self, id: i32, fields: &ReportFields) -> Result<Option<Report>, DieselError> {
        let fields = fields.clone();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.immediate_transaction::<_, DieselError, _>(|conn| {
                let now = now_timestamp();
                let rows = diesel::update(reports::table.find(id))
                    .set((
                        reports::date.eq(&fields.date),
                        reports::company.eq(&fields.company),
                        reports::industry.eq(&fields.industry),
                        reports::region.eq(fields.region.as_str()),
                        reports::country.eq(&fields.country),
                        reports::workforce.eq(fields.workforce),
                        reports::jobs_lost.eq(fields.jobs_lost),
                        reports::loss_type.eq(fields.loss_type.as_str()),
                        reports::ai_attribution.eq(fields.ai_attribution.as_str()),
                        reports::source_label.eq(&fields.source_label),
                        reports::source_url.eq(&fields.source_url),
                        reports::stock_delta_pct.eq(fields.stock_delta_pct),
                        reports::is_estimate.eq(fields.is_estimate),
                        reports::updated_at.eq(&now),
                    ))
                    .execute(conn)?;

                if rows == 0 {
                    return Ok(None);
                }

                if let Some(include) = fields.include {
                    diesel::update(reports::table.find(id))
                        .set(reports::include.eq(include))
                        .execute(conn)?;
                }

                reports::table.find(id).first::<ReportRecord>(conn).optional()
            })
        })
        .await
        .map(|opt| opt.map(Report::from))
    }

    /// Delete a report. Candidates that referenced it lose the link but are kept.
    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.immediate_transaction::<_, DieselError, _>(|conn| {
                diesel::update(candidates::table.filter(candidates::report_id.eq(id)))
                    .set(candidates::report_id.eq(None::<i32>))
                    .execute(conn)?;

                let rows = diesel::delete(reports::table.find(id)).execute(conn)?;
                Ok(rows > 0)
            })
        })
        .await
    }

    /// Flip the publish flag and return the updated report.
    pub async fn toggle_publish(&self, id: i32) -> Result<Option<Report>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.immediate_transaction::<_, DieselError, _>(|conn| {
                let rows = diesel::update(reports::table.find(id))
                    .set((
                        reports::include.eq(diesel::dsl::not(reports::include)),
                        reports::updated_at.eq(now_timestamp()),
                    ))
                    .execute(conn)?;

                if rows == 0 {
                    return Ok(None);
                }

                reports::table.find(id).first::<ReportRecord>(conn).optional()
            })
        })
        .await
        .map(|opt| opt.map(Report::from))
    }

    /// Published, draft and total report counts.
    pub async fn counts(&self) -> Result<ReportCounts, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let row: PublishCounts = diesel::sql_query(
                "SELECT COALESCE(SUM(CASE WHEN include THEN 1 ELSE 0 END), 0) AS published, \
                 COUNT(*) AS total FROM reports",
            )
            .get_result(conn)?;

            let published = row.published as u64;
            let total = row.total as u64;
            Ok(ReportCounts {
                published,
                draft: total - published,
                total,
            })
        })
        .await
    }
}

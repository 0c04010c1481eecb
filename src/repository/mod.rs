//! Persistence layer: Diesel repositories over a pooled SQLite database.

pub mod diesel_candidate;
pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_report;
pub mod migrations;
pub mod seed;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::OnceCell;
use tracing::info;

pub use diesel_candidate::{
    ApproveOutcome, DieselCandidateRepository, InsertOutcome, TransitionOutcome,
};
pub use diesel_pool::{create_diesel_pool, create_diesel_pool_from_url, run_blocking, SqlitePool};
pub use diesel_report::DieselReportRepository;
pub use seed::SeedSummary;

#[derive(diesel::QueryableByName)]
pub(crate) struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    pub id: i64,
}

/// Format a timestamp for storage.
///
/// Fixed-width UTC so stored timestamps compare correctly as text.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time formatted for storage.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parse a stored timestamp, falling back to the Unix epoch for garbage.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Handle to the application database.
///
/// Cloning is cheap; clones share the pool and the initialization state.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    init: Arc<OnceCell<()>>,
    seed_path: Option<PathBuf>,
}

impl Database {
    /// Open a database from a connection string. No connection is made until first use.
    pub fn open(database_url: &str) -> Self {
        Self::from_pool(create_diesel_pool_from_url(database_url))
    }

    /// Open a database file.
    pub fn open_path(db_path: &Path) -> Self {
        Self::from_pool(create_diesel_pool(db_path))
    }

    fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            init: Arc::new(OnceCell::new()),
            seed_path: None,
        }
    }

    /// Import reports from this JSON file during initialization if the table is empty.
    pub fn with_seed_path(mut self, seed_path: Option<PathBuf>) -> Self {
        self.seed_path = seed_path;
        self
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn reports(&self) -> DieselReportRepository {
        DieselReportRepository::new(self.pool.clone())
    }

    pub fn candidates(&self) -> DieselCandidateRepository {
        DieselCandidateRepository::new(self.pool.clone())
    }

    /// Whether initialization has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// Create the schema and seed the database, once per process.
    ///
    /// Concurrent callers wait for the in-flight attempt. A failed attempt leaves the
    /// database uninitialized so the next call tries again.
    pub async fn ensure_initialized(&self) -> anyhow::Result<()> {
        self.init
            .get_or_try_init(|| self.initialize())
            .await
            .map(|_| ())
    }

    async fn initialize(&self) -> anyhow::Result<()> {
        run_blocking(self.pool.clone(), migrations::run_migrations)
            .await
            .context("failed to create database schema")?;

        if let Some(ref path) = self.seed_path {
            let reports = self.reports();
            let counts = reports.counts().await.context("failed to count reports")?;
            if counts.total == 0 {
                let inputs = seed::load_seed_file(path).await?;
                let summary = seed::import_reports(&reports, inputs).await?;
                info!(
                    "Seeded {} reports from {} ({} skipped)",
                    summary.imported,
                    path.display(),
                    summary.skipped
                );
            }
        }

        info!("Database initialized");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::tempdir;

    /// Fresh, initialized database in a temporary directory.
    pub async fn setup_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("test.db"));
        db.ensure_initialized().await.unwrap();
        (db, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_timestamps_sort_as_text() {
        let early = "2025-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let late = early + chrono::Duration::milliseconds(1500);
        assert!(format_timestamp(early) < format_timestamp(late));
        assert_eq!(parse_datetime(&format_timestamp(late)), late);
        assert_eq!(parse_datetime("not a date"), DateTime::<Utc>::default());
    }

    #[tokio::test]
    async fn test_concurrent_initialization() {
        let dir = tempdir().unwrap();
        let db = Database::open_path(&dir.path().join("init.db"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.ensure_initialized().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(db.is_initialized());
        assert_eq!(db.reports().counts().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_failed_initialization_can_be_retried() {
        let dir = tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        let db = Database::open_path(&dir.path().join("retry.db")).with_seed_path(Some(seed.clone()));

        // Seed file missing: initialization fails and stays retryable.
        assert!(db.ensure_initialized().await.is_err());
        assert!(!db.is_initialized());

        std::fs::write(
            &seed,
            r#"[{"date": "2025-01-01", "company": "Acme", "jobs_lost": 12, "include": true}]"#,
        )
        .unwrap();
        db.ensure_initialized().await.unwrap();
        assert!(db.is_initialized());

        let counts = db.reports().counts().await.unwrap();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.published, 1);
    }
}

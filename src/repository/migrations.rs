//! Schema creation for the SQLite database.
//!
//! Every statement is idempotent so the schema can be applied on each start.

use diesel::connection::SimpleConnection;
use diesel::SqliteConnection;

use super::diesel_pool::DieselError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    company TEXT NOT NULL,
    industry TEXT NOT NULL DEFAULT 'Unknown',
    region TEXT NOT NULL DEFAULT 'GLOBAL',
    country TEXT NOT NULL DEFAULT '',
    workforce INTEGER NOT NULL DEFAULT 0 CHECK (workforce >= 0),
    jobs_lost INTEGER NOT NULL CHECK (jobs_lost >= 0),
    loss_type TEXT NOT NULL DEFAULT 'NEW',
    ai_attribution TEXT NOT NULL DEFAULT 'BLAMED',
    source_label TEXT NOT NULL DEFAULT '',
    source_url TEXT NOT NULL DEFAULT '',
    stock_delta_pct REAL,
    is_estimate INTEGER NOT NULL DEFAULT 0,
    include INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_date ON reports(date DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_reports_include ON reports(include);

CREATE TABLE IF NOT EXISTS candidates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    source_name TEXT NOT NULL DEFAULT '',
    source_url TEXT NOT NULL DEFAULT '',
    published_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING'
        CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED')),
    report_id INTEGER REFERENCES reports(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_candidates_status_created ON candidates(status, created_at);
CREATE INDEX IF NOT EXISTS idx_candidates_published ON candidates(published_date DESC, id DESC);
"#;

/// Create all tables and indexes if they do not exist yet.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), DieselError> {
    conn.batch_execute(SCHEMA)
}

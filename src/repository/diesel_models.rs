//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.
//! For SQLite, operations are wrapped in spawn_blocking.

use diesel::prelude::*;

use crate::schema;

/// Report record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReportRecord {
    pub id: i32,
    pub date: String,
    pub company: String,
    pub industry: String,
    pub region: String,
    pub country: String,
    pub workforce: i64,
    pub jobs_lost: i64,
    pub loss_type: String,
    pub ai_attribution: String,
    pub source_label: String,
    pub source_url: String,
    pub stock_delta_pct: Option<f64>,
    pub is_estimate: bool,
    pub include: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// New report for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::reports)]
pub struct NewReport<'a> {
    pub date: &'a str,
    pub company: &'a str,
    pub industry: &'a str,
    pub region: &'a str,
    pub country: &'a str,
    pub workforce: i64,
    pub jobs_lost: i64,
    pub loss_type: &'a str,
    pub ai_attribution: &'a str,
    pub source_label: &'a str,
    pub source_url: &'a str,
    pub stock_delta_pct: Option<f64>,
    pub is_estimate: bool,
    pub include: bool,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Candidate record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::candidates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CandidateRecord {
    pub id: i32,
    pub external_id: String,
    pub title: String,
    pub summary: String,
    pub source_name: String,
    pub source_url: String,
    pub published_date: String,
    pub status: String,
    pub report_id: Option<i32>,
    pub created_at: String,
}

/// New candidate for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::candidates)]
pub struct NewCandidate<'a> {
    pub external_id: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    pub source_name: &'a str,
    pub source_url: &'a str,
    pub published_date: &'a str,
    pub status: &'a str,
    pub created_at: &'a str,
}

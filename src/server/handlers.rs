//! HTTP request handlers.

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::auth::session_token;
use super::AppState;
use crate::discovery::DEFAULT_LOOKBACK_DAYS;
use crate::error::{AppError, AppResult};
use crate::models::{
    Candidate, CandidateCounts, CandidateStatus, Report, ReportCounts, ReportInput,
};
use crate::services::{run_daily, DailyReport, ScanReport};

/// Browser and CDN cache lifetime for the public feed.
const PUBLIC_CACHE_CONTROL: &str = "public, max-age=300";

/// Middleware: create the schema on the first request that needs the database.
pub async fn ensure_database(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Err(e) = state.db.ensure_initialized().await {
        return AppError::from(e).into_response();
    }
    next.run(request).await
}

// ---------------------------------------------------------------------------
// Public
// ---------------------------------------------------------------------------

/// Handler: GET /api/reports
///
/// Published reports, newest first.
pub async fn published_reports(State(state): State<AppState>) -> AppResult<Response> {
    let reports = state.db.reports().list_published().await?;
    Ok((
        [(header::CACHE_CONTROL, PUBLIC_CACHE_CONTROL)],
        Json(reports),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
}

/// Handler: POST /api/login
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    if !state.auth.login_enabled() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "login is disabled (ADMIN_PASSWORD not configured)" })),
        )
            .into_response();
    }

    if !state.auth.check_password(&body.password) {
        tracing::warn!("Rejected login attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid password" })),
        )
            .into_response();
    }

    let token = state.auth.sessions.create().await;
    tracing::info!("Editor logged in");
    (
        [(header::SET_COOKIE, state.auth.session_cookie(&token))],
        Json(SessionResponse {
            authenticated: true,
        }),
    )
        .into_response()
}

/// Handler: POST /api/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.auth.sessions.revoke(&token).await;
    }
    (
        [(header::SET_COOKIE, state.auth.clear_cookie())],
        Json(SessionResponse {
            authenticated: false,
        }),
    )
        .into_response()
}

/// Handler: GET /api/session
pub async fn session_status(State(state): State<AppState>, headers: HeaderMap) -> Json<SessionResponse> {
    Json(SessionResponse {
        authenticated: state.auth.is_authenticated(&headers).await,
    })
}

// ---------------------------------------------------------------------------
// Admin: reports
// ---------------------------------------------------------------------------

/// Handler: GET /api/admin/reports
///
/// All reports, published or not.
pub async fn list_reports(State(state): State<AppState>) -> AppResult<Json<Vec<Report>>> {
    Ok(Json(state.db.reports().list_all().await?))
}

/// Handler: POST /api/admin/reports
pub async fn create_report(
    State(state): State<AppState>,
    Json(input): Json<ReportInput>,
) -> AppResult<(StatusCode, Json<Report>)> {
    let fields = input.into_fields()?;
    let report = state.db.reports().create(&fields).await?;
    tracing::info!("Created report {} ({})", report.id, report.company);
    Ok((StatusCode::CREATED, Json(report)))
}

/// Handler: GET /api/admin/reports/:id
pub async fn get_report(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Report>> {
    state
        .db
        .reports()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::report_not_found(id))
}

/// Handler: PUT /api/admin/reports/:id
///
/// Full replacement of the editable fields. `include` is left alone unless given.
pub async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<ReportInput>,
) -> AppResult<Json<Report>> {
    let fields = input.into_fields()?;
    state
        .db
        .reports()
        .update(id, &fields)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::report_not_found(id))
}

/// Handler: DELETE /api/admin/reports/:id
pub async fn delete_report(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<StatusCode> {
    if state.db.reports().delete(id).await? {
        tracing::info!("Deleted report {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::report_not_found(id))
    }
}

/// Handler: POST /api/admin/reports/:id/toggle
///
/// Flip the include flag, publishing or unpublishing the report.
pub async fn toggle_report(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Report>> {
    let report = state
        .db
        .reports()
        .toggle_publish(id)
        .await?
        .ok_or_else(|| AppError::report_not_found(id))?;
    tracing::info!(
        "Report {} is now {}",
        id,
        if report.include { "published" } else { "a draft" }
    );
    Ok(Json(report))
}

/// Handler: GET /api/admin/reports/stats
pub async fn report_stats(State(state): State<AppState>) -> AppResult<Json<ReportCounts>> {
    Ok(Json(state.db.reports().counts().await?))
}

// ---------------------------------------------------------------------------
// Admin: candidates
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CandidateFilter {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

/// Handler: GET /api/admin/candidates?status=
///
/// Candidates newest first, optionally filtered by status.
pub async fn list_candidates(
    State(state): State<AppState>,
    Query(filter): Query<CandidateFilter>,
) -> AppResult<Json<Vec<Candidate>>> {
    let status = match filter.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            CandidateStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown candidate status: {}", raw)))?,
        ),
    };
    Ok(Json(state.db.candidates().list(status).await?))
}

/// Handler: GET /api/admin/candidates/stats
pub async fn candidate_stats(State(state): State<AppState>) -> AppResult<Json<CandidateCounts>> {
    Ok(Json(state.db.candidates().counts().await?))
}

/// Handler: POST /api/admin/candidates/scan
///
/// Body is optional; `days` defaults to the standard lookback.
pub async fn scan_candidates(
    State(state): State<AppState>,
    body: Option<Json<ScanRequest>>,
) -> AppResult<Json<ScanReport>> {
    let days = body
        .and_then(|Json(req)| req.days)
        .unwrap_or(DEFAULT_LOOKBACK_DAYS);
    Ok(Json(state.review.scan(days).await?))
}

/// Handler: POST /api/admin/candidates/:id/approve
///
/// Body carries the editor's report fields. Returns the created draft report.
pub async fn approve_candidate(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<ReportInput>,
) -> AppResult<(StatusCode, Json<Report>)> {
    let report = state.review.approve(id, input).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// Handler: POST /api/admin/candidates/:id/reject
pub async fn reject_candidate(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Candidate>> {
    Ok(Json(state.review.reject(id).await?))
}

/// Handler: POST /api/admin/candidates/cleanup
pub async fn cleanup_candidates(
    State(state): State<AppState>,
    body: Option<Json<CleanupRequest>>,
) -> AppResult<Json<CleanupResponse>> {
    let days = body
        .and_then(|Json(req)| req.days)
        .unwrap_or(state.retention_days);
    let removed = state.review.cleanup(days).await?;
    Ok(Json(CleanupResponse { removed }))
}

// ---------------------------------------------------------------------------
// Scheduled trigger
// ---------------------------------------------------------------------------

/// Handler: GET /api/cron
///
/// Short scan followed by retention cleanup. Requires `Authorization: Bearer <CRON_SECRET>`.
pub async fn cron(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<DailyReport>, Response> {
    state.auth.validate_cron(&headers)?;

    run_daily(&state.review, state.scheduled_lookback_days, state.retention_days)
        .await
        .map(Json)
        .map_err(IntoResponse::into_response)
}

//! Route definitions for the web server.

use axum::http::{header, HeaderValue};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::auth::require_session;
use super::handlers;
use super::AppState;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; img-src 'self' data:; \
     style-src 'self' 'unsafe-inline'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'";

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        // Reports
        .route(
            "/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route("/reports/stats", get(handlers::report_stats))
        .route(
            "/reports/:id",
            get(handlers::get_report)
                .put(handlers::update_report)
                .delete(handlers::delete_report),
        )
        .route("/reports/:id/toggle", post(handlers::toggle_report))
        // Candidates
        .route("/candidates", get(handlers::list_candidates))
        .route("/candidates/stats", get(handlers::candidate_stats))
        .route("/candidates/scan", post(handlers::scan_candidates))
        .route("/candidates/cleanup", post(handlers::cleanup_candidates))
        .route("/candidates/:id/approve", post(handlers::approve_candidate))
        .route("/candidates/:id/reject", post(handlers::reject_candidate))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let api = Router::new()
        .route("/reports", get(handlers::published_reports))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/session", get(handlers::session_status))
        .route("/cron", get(handlers::cron).post(handlers::cron))
        .nest("/admin", admin)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::ensure_database,
        ));

    let mut router = Router::new().nest("/api", api);
    if let Some(ref dir) = state.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

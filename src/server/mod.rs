//! Web server for the public feed and the editor console.
//!
//! Serves:
//! - The published report feed (`/api/reports`)
//! - Editor login and session state
//! - The session-protected admin API for reports and candidates
//! - The cron trigger for the daily scan and cleanup
//! - Static frontend assets, when a directory is configured

pub mod auth;
mod handlers;
mod routes;

pub use auth::AuthState;
pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::discovery::{ArticleSource, NewsSearchClient};
use crate::repository::Database;
use crate::services::{spawn_daily, ReviewService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub review: ReviewService,
    pub auth: Arc<AuthState>,
    pub static_dir: Option<PathBuf>,
    pub retention_days: i64,
    pub scheduled_lookback_days: u32,
}

impl AppState {
    /// Build state from settings. Nothing touches the database until the first request.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db = Database::open(&settings.database_url).with_seed_path(settings.seed_path.clone());
        let client = NewsSearchClient::new(settings.discovery.clone())?;
        if settings.discovery.api_key().is_none() {
            tracing::warn!("NEWSAPI_KEY not set; discovery scans are disabled");
        }
        Ok(Self::from_parts(db, Arc::new(client), settings))
    }

    /// Build state around an existing database and article source.
    pub fn from_parts(db: Database, source: Arc<dyn ArticleSource>, settings: &Settings) -> Self {
        let auth = AuthState::new(
            settings.admin_password.as_deref(),
            settings.cron_secret.as_deref(),
            chrono::Duration::hours(settings.session_ttl_hours as i64),
            settings.secure_cookies,
        );

        Self {
            review: ReviewService::new(db.clone(), source),
            db,
            auth: Arc::new(auth),
            static_dir: settings.static_dir.clone(),
            retention_days: settings.retention_days,
            scheduled_lookback_days: settings.scheduled_lookback_days,
        }
    }
}

/// Start the web server.
///
/// With `schedule`, the daily scan and cleanup also run in-process every 24 hours.
pub async fn serve(settings: &Settings, host: &str, port: u16, schedule: bool) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;

    if schedule {
        spawn_daily(
            state.review.clone(),
            Duration::from_secs(24 * 60 * 60),
            state.scheduled_lookback_days,
            state.retention_days,
        );
        tracing::info!("In-process daily schedule enabled");
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

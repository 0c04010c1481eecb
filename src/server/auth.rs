//! Editor authentication.
//!
//! Editors share one password. It is salted and hashed when the server starts and only
//! the digest is kept; a successful login yields an opaque session token stored in an
//! HttpOnly cookie. Sessions live in memory and end on restart.

use std::collections::HashMap;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "lw_session";

/// Salted SHA-256 digest of the shared editor password.
pub struct AdminCredential {
    salt: [u8; 16],
    digest: [u8; 32],
}

fn hash_password(salt: &[u8], password: &str) -> [u8; 32] {
    Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize()
        .into()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl AdminCredential {
    /// Hash `password` with a fresh random salt.
    pub fn from_password(password: &str) -> Self {
        let salt = *Uuid::new_v4().as_bytes();
        let digest = hash_password(&salt, password);
        Self { salt, digest }
    }

    pub fn verify(&self, password: &str) -> bool {
        constant_time_eq(&hash_password(&self.salt, password), &self.digest)
    }
}

/// In-memory session tokens with expiry.
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session and return its token.
    pub async fn create(&self) -> String {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
        bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
        let token = hex::encode(bytes);

        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, expires| *expires > now);
        sessions.insert(token.clone(), now + self.ttl);
        token
    }

    pub async fn is_valid(&self, token: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .is_some_and(|expires| *expires > Utc::now())
    }

    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }
}

/// Authentication state shared by all requests.
pub struct AuthState {
    credential: Option<AdminCredential>,
    pub sessions: SessionStore,
    cron_secret: Option<String>,
    secure_cookies: bool,
}

impl AuthState {
    pub fn new(
        admin_password: Option<&str>,
        cron_secret: Option<&str>,
        session_ttl: Duration,
        secure_cookies: bool,
    ) -> Self {
        if admin_password.is_none() {
            tracing::warn!("ADMIN_PASSWORD not set; editor login is disabled");
        }
        Self {
            credential: admin_password.map(AdminCredential::from_password),
            sessions: SessionStore::new(session_ttl),
            cron_secret: cron_secret.map(str::to_string),
            secure_cookies,
        }
    }

    pub fn login_enabled(&self) -> bool {
        self.credential.is_some()
    }

    pub fn check_password(&self, password: &str) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|credential| credential.verify(password))
    }

    /// Whether the request carries a live session cookie.
    pub async fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        match session_token(headers) {
            Some(token) => self.sessions.is_valid(&token).await,
            None => false,
        }
    }

    /// `Set-Cookie` value for a new session.
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}{}",
            SESSION_COOKIE,
            token,
            self.sessions.ttl().num_seconds(),
            if self.secure_cookies { "; Secure" } else { "" }
        )
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0{}",
            SESSION_COOKIE,
            if self.secure_cookies { "; Secure" } else { "" }
        )
    }

    /// Validate the cron bearer token.
    #[allow(clippy::result_large_err)]
    pub fn validate_cron(&self, headers: &HeaderMap) -> Result<(), Response> {
        // If no secret is configured, the endpoint is disabled
        let Some(expected) = self.cron_secret.as_deref() else {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "cron endpoint is disabled (CRON_SECRET not configured)" })),
            )
                .into_response());
        };

        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match provided {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
            _ => Err(not_authenticated()),
        }
    }
}

/// Extract the session token from the `Cookie` header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Uniform rejection for unauthenticated requests.
pub fn not_authenticated() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "not authenticated" })),
    )
        .into_response()
}

/// Middleware: reject requests without a valid session.
pub async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.auth.is_authenticated(request.headers()).await {
        next.run(request).await
    } else {
        not_authenticated()
    }
}

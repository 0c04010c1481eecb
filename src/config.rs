//! Configuration management for layoffwatch using the prefer crate.
//!
//! Precedence, lowest first: built-in defaults, the `layoffwatch` config file found by
//! prefer, environment variables (a `.env` file is loaded first), then CLI flags.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveryConfig;
use crate::services::{DEFAULT_RETENTION_DAYS, SCHEDULED_LOOKBACK_DAYS};

/// Default session lifetime in hours.
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 12;

/// Application settings.
#[derive(Clone)]
pub struct Settings {
    /// SQLite connection string (`sqlite:` prefix optional).
    pub database_url: String,
    /// Address the web server binds to.
    pub host: String,
    pub port: u16,
    /// Directory of static assets served for non-API paths.
    pub static_dir: Option<PathBuf>,
    /// JSON file of reports imported when the database is empty.
    pub seed_path: Option<PathBuf>,
    /// Shared editor password. Login is disabled without it.
    pub admin_password: Option<String>,
    /// Bearer token for the cron endpoint. The endpoint is disabled without it.
    pub cron_secret: Option<String>,
    /// Session lifetime in hours.
    pub session_ttl_hours: u64,
    /// Mark the session cookie `Secure`. Disable only for plain-HTTP development.
    pub secure_cookies: bool,
    /// Age after which rejected candidates are deleted.
    pub retention_days: i64,
    /// Lookback used by the scheduled scan.
    pub scheduled_lookback_days: u32,
    /// Discovery client configuration.
    pub discovery: DiscoveryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:layoffwatch.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            static_dir: None,
            seed_path: None,
            admin_password: None,
            cron_secret: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            secure_cookies: true,
            retention_days: DEFAULT_RETENTION_DAYS,
            scheduled_lookback_days: SCHEDULED_LOOKBACK_DAYS,
            discovery: DiscoveryConfig::default(),
        }
    }
}

fn redacted(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &self.database_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("static_dir", &self.static_dir)
            .field("seed_path", &self.seed_path)
            .field("admin_password", &redacted(&self.admin_password))
            .field("cron_secret", &redacted(&self.cron_secret))
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("secure_cookies", &self.secure_cookies)
            .field("retention_days", &self.retention_days)
            .field("scheduled_lookback_days", &self.scheduled_lookback_days)
            .field("discovery_api_key", &redacted(&self.discovery.api_key))
            .finish()
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub static_dir: Option<String>,
    #[serde(default)]
    pub seed_path: Option<String>,
    #[serde(default)]
    pub session_ttl_hours: Option<u64>,
    #[serde(default)]
    pub secure_cookies: Option<bool>,
    #[serde(default)]
    pub retention_days: Option<i64>,
    #[serde(default)]
    pub scheduled_lookback_days: Option<u32>,
    /// Discovery client configuration. Secrets belong in the environment.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers layoffwatch config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("layoffwatch").await {
            Ok(pref_config) => {
                let database: Option<String> = pref_config.get("database").ok();
                let host: Option<String> = pref_config.get("host").ok();
                let port: Option<u16> = pref_config.get("port").ok();
                let static_dir: Option<String> = pref_config.get("static_dir").ok();
                let seed_path: Option<String> = pref_config.get("seed_path").ok();
                let session_ttl_hours: Option<u64> =
                    pref_config.get("session_ttl_hours").ok();
                let secure_cookies: Option<bool> = pref_config.get("secure_cookies").ok();
                let retention_days: Option<i64> = pref_config.get("retention_days").ok();
                let scheduled_lookback_days: Option<u32> =
                    pref_config.get("scheduled_lookback_days").ok();
                let discovery: DiscoveryConfig =
                    pref_config.get("discovery").unwrap_or_default();

                Config {
                    database,
                    host,
                    port,
                    static_dir,
                    seed_path,
                    session_ttl_hours,
                    secure_cookies,
                    retention_days,
                    scheduled_lookback_days,
                    discovery,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref database) = self.database {
            settings.database_url = database.clone();
        }
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(ref dir) = self.static_dir {
            settings.static_dir = Some(expand_path(dir));
        }
        if let Some(ref path) = self.seed_path {
            settings.seed_path = Some(expand_path(path));
        }
        if let Some(hours) = self.session_ttl_hours {
            settings.session_ttl_hours = hours;
        }
        if let Some(secure) = self.secure_cookies {
            settings.secure_cookies = secure;
        }
        if let Some(days) = self.retention_days {
            settings.retention_days = days;
        }
        if let Some(days) = self.scheduled_lookback_days {
            settings.scheduled_lookback_days = days;
        }
        settings.discovery = self.discovery.clone();
    }
}

/// Override settings from environment variables, looked up through `lookup`.
pub fn apply_env<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("DATABASE_URL") {
        settings.database_url = url;
    }
    if let Some(host) = var("HOST") {
        settings.host = host;
    }
    if let Some(port) = var("PORT").and_then(|p| p.trim().parse().ok()) {
        settings.port = port;
    }
    if let Some(dir) = var("STATIC_DIR") {
        settings.static_dir = Some(expand_path(&dir));
    }
    if let Some(path) = var("SEED_PATH") {
        settings.seed_path = Some(expand_path(&path));
    }
    if let Some(password) = var("ADMIN_PASSWORD") {
        settings.admin_password = Some(password);
    }
    if let Some(secret) = var("CRON_SECRET") {
        settings.cron_secret = Some(secret);
    }
    if let Some(secure) = var("SECURE_COOKIES") {
        settings.secure_cookies = !matches!(
            secure.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        );
    }
    if let Some(key) = var("NEWSAPI_KEY") {
        settings.discovery.api_key = Some(key);
    }
}

/// Load settings from configuration (async version).
pub async fn load_settings() -> Settings {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

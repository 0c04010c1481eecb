//! Discovery of candidate articles from a third-party news search API.

mod client;

pub use client::{normalize_article, DiscoveryWindow, NewsSearchClient, RawArticle, RawSource};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::CandidateDraft;

/// Phrases associated with AI-attributed layoffs. The query matches any of them.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "AI layoffs",
    "replaced by AI",
    "replaced by artificial intelligence",
    "AI job cuts",
    "jobs cut due to AI",
    "layoffs artificial intelligence",
    "AI workforce reduction",
    "automation layoffs",
];

/// Default lookback window for manual scans, in days.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 3;

/// Configuration for the discovery client.
#[derive(Debug, Clone, Serialize, Deserialize, prefer::FromValue)]
pub struct DiscoveryConfig {
    /// Provider API key. Without it discovery is disabled and candidates are manual-only.
    #[serde(default)]
    #[prefer(default)]
    pub api_key: Option<String>,
    /// Article search endpoint.
    #[serde(default = "default_endpoint")]
    #[prefer(default = "https://eventregistry.org/api/v1/article/getArticles")]
    pub endpoint: String,
    /// Provider language code.
    #[serde(default = "default_language")]
    #[prefer(default = "eng")]
    pub language: String,
    /// Maximum articles fetched per scan.
    #[serde(default = "default_page_size")]
    #[prefer(default = "50")]
    pub page_size: u32,
    /// Maximum characters kept from an article body.
    #[serde(default = "default_summary_chars")]
    #[prefer(default = "500")]
    pub summary_chars: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    #[prefer(default = "30")]
    pub timeout_secs: u64,
    /// Keyword phrases; empty means [`DEFAULT_KEYWORDS`].
    #[serde(default)]
    #[prefer(default)]
    pub keywords: Vec<String>,
}

fn default_endpoint() -> String {
    "https://eventregistry.org/api/v1/article/getArticles".to_string()
}
fn default_language() -> String {
    "eng".to_string()
}
fn default_page_size() -> u32 {
    50
}
fn default_summary_chars() -> usize {
    500
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            language: default_language(),
            page_size: default_page_size(),
            summary_chars: default_summary_chars(),
            timeout_secs: default_timeout_secs(),
            keywords: Vec::new(),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// The configured API key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Keyword phrases to query for.
    pub fn keywords(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
        } else {
            self.keywords.clone()
        }
    }
}

/// Errors from the discovery provider.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// No API key configured.
    #[error("discovery is not configured (missing API key)")]
    NotConfigured,
    /// Failed to reach the provider.
    #[error("discovery connection error: {0}")]
    Connection(String),
    /// The provider answered with an error.
    #[error("discovery API error: {0}")]
    Api(String),
    /// The provider's response could not be parsed.
    #[error("discovery parse error: {0}")]
    Parse(String),
}

/// A source of recently published candidate articles.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch normalized articles published within the last `lookback_days` days.
    async fn fetch_recent(&self, lookback_days: u32) -> Result<Vec<CandidateDraft>, DiscoveryError>;

    /// Whether the source can be queried at all.
    fn is_configured(&self) -> bool {
        true
    }
}

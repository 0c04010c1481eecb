//! Client for an Event Registry compatible article search API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ArticleSource, DiscoveryConfig, DiscoveryError};
use crate::models::CandidateDraft;

const USER_AGENT: &str = concat!("layoffwatch/", env!("CARGO_PKG_VERSION"));

/// Inclusive date range queried by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DiscoveryWindow {
    /// The window ending today (UTC) and reaching back `lookback_days` days.
    pub fn ending_today(lookback_days: u32) -> Self {
        Self::ending_on(Utc::now().date_naive(), lookback_days)
    }

    /// Lookbacks reaching past the earliest representable date are clamped to it.
    pub fn ending_on(end: NaiveDate, lookback_days: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(u64::from(lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }
}

/// Search request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticleQuery<'a> {
    action: &'static str,
    keyword: &'a [String],
    keyword_oper: &'static str,
    lang: &'a str,
    date_start: String,
    date_end: String,
    is_duplicate_filter: &'static str,
    articles_page: u32,
    articles_count: u32,
    articles_sort_by: &'static str,
    result_type: &'static str,
    api_key: &'a str,
}

/// Search response body.
#[derive(Debug, Deserialize)]
struct ArticleResponse {
    #[serde(default)]
    articles: Option<ArticlePage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticlePage {
    #[serde(default)]
    results: Vec<RawArticle>,
}

/// An article as returned by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawArticle {
    /// Provider identifier; a string or a number depending on the endpoint.
    #[serde(default)]
    pub uri: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub title: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Truncate to at most `max_chars` characters (UTF-8 safe).
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Turn a provider article into a candidate draft.
///
/// Articles without an identifier are dropped since they cannot be deduplicated.
/// A missing publication date falls back to the end of the scanned window.
pub fn normalize_article(
    article: &RawArticle,
    window: &DiscoveryWindow,
    summary_chars: usize,
) -> Option<CandidateDraft> {
    let external_id = match article.uri.as_ref()? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => return None,
        other => other.to_string(),
    };
    if external_id.is_empty() {
        return None;
    }

    let published_date = match non_empty(article.date.as_deref()) {
        Some(date) => date.to_string(),
        None => {
            debug!("Article {} has no date, using window end", external_id);
            window.end.format("%Y-%m-%d").to_string()
        }
    };

    Some(CandidateDraft {
        title: non_empty(article.title.as_deref())
            .unwrap_or("Untitled")
            .to_string(),
        summary: truncate_chars(
            non_empty(article.body.as_deref()).unwrap_or_default(),
            summary_chars,
        ),
        source_name: non_empty(
            article
                .source
                .as_ref()
                .and_then(|s| s.title.as_deref()),
        )
        .unwrap_or("Unknown")
        .to_string(),
        source_url: non_empty(article.url.as_deref())
            .unwrap_or_default()
            .to_string(),
        published_date,
        external_id,
    })
}

/// HTTP client for the news search provider.
pub struct NewsSearchClient {
    config: DiscoveryConfig,
    client: Client,
}

impl NewsSearchClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DiscoveryConfig) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DiscoveryError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Query the provider for one page of articles in `window`.
    pub async fn search(&self, window: &DiscoveryWindow) -> Result<Vec<RawArticle>, DiscoveryError> {
        let api_key = self.config.api_key().ok_or(DiscoveryError::NotConfigured)?;
        let keywords = self.config.keywords();

        let query = ArticleQuery {
            action: "getArticles",
            keyword: &keywords,
            keyword_oper: "or",
            lang: &self.config.language,
            date_start: window.start.format("%Y-%m-%d").to_string(),
            date_end: window.end.format("%Y-%m-%d").to_string(),
            is_duplicate_filter: "skipDuplicates",
            articles_page: 1,
            articles_count: self.config.page_size,
            articles_sort_by: "date",
            result_type: "articles",
            api_key,
        };

        debug!(
            "Searching {} for {} phrases between {} and {}",
            self.config.endpoint,
            keywords.len(),
            query.date_start,
            query.date_end
        );

        let resp = self
            .client
            .post(&self.config.endpoint)
            .json(&query)
            .send()
            .await
            .map_err(|e| DiscoveryError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DiscoveryError::Api(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ArticleResponse = resp
            .json()
            .await
            .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(DiscoveryError::Api(error));
        }

        let mut results = parsed.articles.map(|page| page.results).unwrap_or_default();
        results.truncate(self.config.page_size as usize);
        Ok(results)
    }
}

#[async_trait]
impl ArticleSource for NewsSearchClient {
    async fn fetch_recent(&self, lookback_days: u32) -> Result<Vec<CandidateDraft>, DiscoveryError> {
        let window = DiscoveryWindow::ending_today(lookback_days);
        let articles = self.search(&window).await?;

        let drafts: Vec<CandidateDraft> = articles
            .iter()
            .filter_map(|a| normalize_article(a, &window, self.config.summary_chars))
            .collect();

        info!(
            "Discovery returned {} articles ({} usable) for {}..{}",
            articles.len(),
            drafts.len(),
            window.start,
            window.end
        );
        Ok(drafts)
    }

    fn is_configured(&self) -> bool {
        self.config.api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> DiscoveryWindow {
        DiscoveryWindow::ending_on(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), 3)
    }

    #[test]
    fn test_window_bounds() {
        let w = window();
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2025, 6, 7).unwrap());
        assert_eq!(w.end, NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
    }

    #[test]
    fn test_huge_lookback_is_clamped() {
        let end = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let w = DiscoveryWindow::ending_on(end, u32::MAX);
        assert_eq!(w.start, NaiveDate::MIN);
        assert_eq!(w.end, end);

        let w = DiscoveryWindow::ending_today(4_000_000_000);
        assert_eq!(w.start, NaiveDate::MIN);
    }

    #[test]
    fn test_normalize_full_article() {
        let article: RawArticle = serde_json::from_value(serde_json::json!({
            "uri": "8412345678",
            "title": "  Acme replaces support staff with AI ",
            "body": "Acme said on Tuesday...",
            "source": {"title": "Example Times"},
            "url": "https://example.com/acme",
            "date": "2025-06-09"
        }))
        .unwrap();

        let draft = normalize_article(&article, &window(), 500).unwrap();
        assert_eq!(draft.external_id, "8412345678");
        assert_eq!(draft.title, "Acme replaces support staff with AI");
        assert_eq!(draft.source_name, "Example Times");
        assert_eq!(draft.source_url, "https://example.com/acme");
        assert_eq!(draft.published_date, "2025-06-09");
    }

    #[test]
    fn test_normalize_fallbacks() {
        let article = RawArticle {
            uri: Some(serde_json::json!(42)),
            ..Default::default()
        };
        let draft = normalize_article(&article, &window(), 500).unwrap();
        assert_eq!(draft.external_id, "42");
        assert_eq!(draft.title, "Untitled");
        assert_eq!(draft.summary, "");
        assert_eq!(draft.source_name, "Unknown");
        assert_eq!(draft.published_date, "2025-06-10");
    }

    #[test]
    fn test_normalize_requires_identifier() {
        let article = RawArticle {
            title: Some("No id".to_string()),
            ..Default::default()
        };
        assert!(normalize_article(&article, &window(), 500).is_none());

        let article = RawArticle {
            uri: Some(serde_json::json!("  ")),
            ..Default::default()
        };
        assert!(normalize_article(&article, &window(), 500).is_none());
    }

    #[test]
    fn test_summary_is_truncated_on_char_boundary() {
        let body = "é".repeat(600);
        let article = RawArticle {
            uri: Some(serde_json::json!("x")),
            body: Some(body),
            ..Default::default()
        };
        let draft = normalize_article(&article, &window(), 500).unwrap();
        assert_eq!(draft.summary.chars().count(), 500);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = NewsSearchClient::new(DiscoveryConfig::default()).unwrap();
        assert!(!client.is_configured());
        let err = client.fetch_recent(3).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NotConfigured));

        let err = client.fetch_recent(u32::MAX).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NotConfigured));
    }
}

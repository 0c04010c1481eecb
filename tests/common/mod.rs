//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use layoffwatch::discovery::{ArticleSource, DiscoveryError};
use layoffwatch::models::CandidateDraft;
use layoffwatch::repository::Database;

/// Article source that replays canned batches, one per fetch.
pub struct StubSource {
    batches: Mutex<VecDeque<Vec<CandidateDraft>>>,
    configured: bool,
}

impl StubSource {
    pub fn new(batches: Vec<Vec<CandidateDraft>>) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(batches.into()),
            configured: true,
        })
    }

    /// A source with no API key.
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(VecDeque::new()),
            configured: false,
        })
    }
}

#[async_trait]
impl ArticleSource for StubSource {
    async fn fetch_recent(&self, _lookback_days: u32) -> Result<Vec<CandidateDraft>, DiscoveryError> {
        if !self.configured {
            return Err(DiscoveryError::NotConfigured);
        }
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

/// A draft as the discovery client would produce it.
pub fn draft(external_id: &str) -> CandidateDraft {
    CandidateDraft {
        external_id: external_id.to_string(),
        title: format!("Layoffs reported ({})", external_id),
        summary: "The company cited automation of support roles.".to_string(),
        source_name: "Example Times".to_string(),
        source_url: format!("https://news.example.com/{}", external_id),
        published_date: "2025-03-14".to_string(),
    }
}

/// Fresh, initialized database in a temporary directory.
pub async fn test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_path(&dir.path().join("layoffwatch.db"));
    db.ensure_initialized().await.unwrap();
    (db, dir)
}

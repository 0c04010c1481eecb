//! Externally discovered articles awaiting editorial review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review status of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "PENDING",
            CandidateStatus::Approved => "APPROVED",
            CandidateStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(CandidateStatus::Pending),
            "APPROVED" => Some(CandidateStatus::Approved),
            "REJECTED" => Some(CandidateStatus::Rejected),
            _ => None,
        }
    }
}

/// A stored candidate article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: i32,
    /// The discovery provider's article identifier. Unique across all candidates.
    pub external_id: String,
    pub title: String,
    pub summary: String,
    pub source_name: String,
    pub source_url: String,
    pub published_date: String,
    pub status: CandidateStatus,
    pub report_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A normalized article ready for insertion into the candidate store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDraft {
    pub external_id: String,
    pub title: String,
    pub summary: String,
    pub source_name: String,
    pub source_url: String,
    pub published_date: String,
}

/// Per-status breakdown of the candidate table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CandidateCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub total: u64,
}

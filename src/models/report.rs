//! Curated layoff reports and the editor input schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Candidate;
use crate::error::AppError;

/// Geographic region of a layoff event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    Na,
    Eu,
    Apac,
    Latam,
    Mea,
    #[default]
    Global,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Na => "NA",
            Region::Eu => "EU",
            Region::Apac => "APAC",
            Region::Latam => "LATAM",
            Region::Mea => "MEA",
            Region::Global => "GLOBAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NA" => Some(Region::Na),
            "EU" => Some(Region::Eu),
            "APAC" => Some(Region::Apac),
            "LATAM" => Some(Region::Latam),
            "MEA" => Some(Region::Mea),
            "GLOBAL" => Some(Region::Global),
            _ => None,
        }
    }
}

/// Whether the reported job losses are new, a restatement, or a duplicate of another report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LossType {
    #[default]
    New,
    Restated,
    Duplicate,
}

impl LossType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossType::New => "NEW",
            LossType::Restated => "RESTATED",
            LossType::Duplicate => "DUPLICATE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Some(LossType::New),
            "RESTATED" => Some(LossType::Restated),
            "DUPLICATE" => Some(LossType::Duplicate),
            _ => None,
        }
    }
}

/// Strength of the claim that AI caused the layoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiAttribution {
    /// The company itself named AI as the reason.
    Explicit,
    /// Coverage or analysts attribute the cuts to AI.
    #[default]
    Blamed,
    /// AI is one of several stated reasons.
    Mixed,
}

impl AiAttribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiAttribution::Explicit => "EXPLICIT",
            AiAttribution::Blamed => "BLAMED",
            AiAttribution::Mixed => "MIXED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EXPLICIT" => Some(AiAttribution::Explicit),
            "BLAMED" => Some(AiAttribution::Blamed),
            "MIXED" => Some(AiAttribution::Mixed),
            _ => None,
        }
    }
}

/// A published or draft layoff event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: i32,
    pub date: String,
    pub company: String,
    pub industry: String,
    pub region: Region,
    pub country: String,
    pub workforce: i64,
    pub jobs_lost: i64,
    pub loss_type: LossType,
    pub ai_attribution: AiAttribution,
    pub source_label: String,
    pub source_url: String,
    pub stock_delta_pct: Option<f64>,
    pub is_estimate: bool,
    pub include: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Published/draft breakdown of the report table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub published: u64,
    pub draft: u64,
    pub total: u64,
}

/// A number as editors submit it: either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    fn is_blank(&self) -> bool {
        matches!(self, LooseNumber::Text(s) if s.trim().is_empty())
    }

    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(n) => *n,
            LooseNumber::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Coerce to a non-negative integer; anything unparseable becomes zero.
    fn to_count(&self) -> i64 {
        match self.as_f64() {
            Some(n) if n > 0.0 => n.trunc().min(i64::MAX as f64) as i64,
            _ => 0,
        }
    }
}

impl From<i64> for LooseNumber {
    fn from(n: i64) -> Self {
        LooseNumber::Number(n as f64)
    }
}

/// Editor-supplied report fields before normalization.
///
/// Every field is optional at the schema level. [`ReportInput::into_fields`] enforces the
/// required ones and normalizes the rest; nothing else is ever rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportInput {
    pub date: Option<String>,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub workforce: Option<LooseNumber>,
    pub jobs_lost: Option<LooseNumber>,
    pub loss_type: Option<String>,
    pub ai_attribution: Option<String>,
    pub source_label: Option<String>,
    pub source_url: Option<String>,
    pub stock_delta_pct: Option<LooseNumber>,
    pub is_estimate: Option<bool>,
    pub include: Option<bool>,
}

/// Normalized report fields, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFields {
    pub date: String,
    pub company: String,
    pub industry: String,
    pub region: Region,
    pub country: String,
    pub workforce: i64,
    pub jobs_lost: i64,
    pub loss_type: LossType,
    pub ai_attribution: AiAttribution,
    pub source_label: String,
    pub source_url: String,
    pub stock_delta_pct: Option<f64>,
    pub is_estimate: bool,
    /// `None` keeps the stored flag on update and means unpublished on create.
    pub include: Option<bool>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ReportInput {
    /// Validate required fields (date, company, jobs_lost) and normalize everything else.
    pub fn into_fields(self) -> Result<ReportFields, AppError> {
        let mut missing = Vec::new();
        if present(&self.date).is_none() {
            missing.push("date");
        }
        if present(&self.company).is_none() {
            missing.push("company");
        }
        if self.jobs_lost.as_ref().map_or(true, LooseNumber::is_blank) {
            missing.push("jobs_lost");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }
        Ok(self.normalize())
    }

    /// Validate and normalize input for approving `candidate`.
    ///
    /// Company and jobs_lost are required. Date and source fields fall back to the
    /// candidate's, and the resulting report is always a draft.
    pub fn into_approval_fields(mut self, candidate: &Candidate) -> Result<ReportFields, AppError> {
        let mut missing = Vec::new();
        if present(&self.company).is_none() {
            missing.push("company");
        }
        if self.jobs_lost.as_ref().map_or(true, LooseNumber::is_blank) {
            missing.push("jobs_lost");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        if present(&self.date).is_none() {
            self.date = Some(candidate.published_date.clone());
        }
        if present(&self.source_label).is_none() {
            self.source_label = Some(candidate.source_name.clone());
        }
        if present(&self.source_url).is_none() {
            self.source_url = Some(candidate.source_url.clone());
        }

        let mut fields = self.normalize();
        fields.include = Some(false);
        Ok(fields)
    }

    fn normalize(self) -> ReportFields {
        let text = |value: &Option<String>| present(value).unwrap_or_default().to_string();

        ReportFields {
            date: text(&self.date),
            company: text(&self.company),
            industry: present(&self.industry).unwrap_or("Unknown").to_string(),
            region: present(&self.region)
                .and_then(Region::parse)
                .unwrap_or_default(),
            country: text(&self.country),
            workforce: self.workforce.as_ref().map_or(0, LooseNumber::to_count),
            jobs_lost: self.jobs_lost.as_ref().map_or(0, LooseNumber::to_count),
            loss_type: present(&self.loss_type)
                .and_then(LossType::parse)
                .unwrap_or_default(),
            ai_attribution: present(&self.ai_attribution)
                .and_then(AiAttribution::parse)
                .unwrap_or_default(),
            source_label: text(&self.source_label),
            source_url: text(&self.source_url),
            stock_delta_pct: self.stock_delta_pct.as_ref().and_then(LooseNumber::as_f64),
            is_estimate: self.is_estimate.unwrap_or(false),
            include: self.include,
        }
    }
}

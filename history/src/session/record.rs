//! Analysis records and the credibility risk classifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub const UNTITLED: &str = "Untitled Article";
pub const UNKNOWN_SOURCE: &str = "Unknown source";
pub const UNKNOWN_CLASSIFICATION: &str = "UNKNOWN";

/// Four-bucket classification of a credibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Risk {
    Safe,
    Low,
    Medium,
    High,
}

impl Risk {
    /// Scores strictly above a bucket's lower bound fall into it.
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            Risk::High
        } else if score > 0.5 {
            Risk::Medium
        } else if score > 0.3 {
            Risk::Low
        } else {
            Risk::Safe
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Risk::Safe => "SAFE",
            Risk::Low => "LOW",
            Risk::Medium => "MEDIUM",
            Risk::High => "HIGH",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SAFE" => Some(Risk::Safe),
            "LOW" => Some(Risk::Low),
            "MEDIUM" => Some(Risk::Medium),
            "HIGH" => Some(Risk::High),
            _ => None,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Risk::High => "🚨",
            Risk::Medium => "⚠️",
            Risk::Low => "⚡",
            Risk::Safe => "✅",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Risk::High => "#ef4444",
            Risk::Medium => "#f59e0b",
            Risk::Low => "#eab308",
            Risk::Safe => "#10b981",
        }
    }
}

/// Risk bucket plus the badge styling the dashboard shows for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLevel {
    pub level: Risk,
    pub icon: String,
    pub color: String,
}

impl From<Risk> for RiskLevel {
    fn from(level: Risk) -> Self {
        Self {
            level,
            icon: level.icon().to_string(),
            color: level.color().to_string(),
        }
    }
}

pub fn risk_level(score: f64) -> RiskLevel {
    Risk::from_score(score).into()
}

/// One stored analysis outcome. Records are created by the session store and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    pub title: String,
    pub source: String,
    pub credibility_score: f64,
    pub classification: String,
    pub risk_level: RiskLevel,
    /// Classifier payload exactly as it was submitted.
    #[serde(default)]
    pub result: Value,
}

impl AnalysisRecord {
    /// Build a record from a classifier payload. Only `title`, `source`,
    /// `credibilityScore` and `classification` are read; the payload itself
    /// is kept untouched.
    pub fn from_result(result: Value, timestamp: i64) -> Self {
        let credibility_score = credibility_score(&result);
        Self {
            id: generate_id(),
            timestamp,
            title: text_field(&result, "title", UNTITLED),
            source: text_field(&result, "source", UNKNOWN_SOURCE),
            credibility_score,
            classification: text_field(&result, "classification", UNKNOWN_CLASSIFICATION),
            risk_level: risk_level(credibility_score),
            result,
        }
    }

    pub fn risk(&self) -> Risk {
        self.risk_level.level
    }
}

fn generate_id() -> String {
    format!("analysis-{}", Uuid::new_v4())
}

fn text_field(result: &Value, name: &str, fallback: &str) -> String {
    result
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn credibility_score(result: &Value) -> f64 {
    result
        .get("credibilityScore")
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite())
        .map(|score| score.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

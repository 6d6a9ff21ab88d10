//! Derived views over the stored analyses: filtered listings, aggregate
//! statistics and the chronological score series used for charting.

use serde::{Deserialize, Serialize};

use crate::core::format;
use crate::session::record::{AnalysisRecord, Risk};

/// Conjunctive filter over analyses. Unset predicates always hold; unknown
/// keys in the JSON form are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisFilter {
    pub risk_level: Option<Risk>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub search_term: Option<String>,
}

impl AnalysisFilter {
    pub fn risk(mut self, level: Risk) -> Self {
        self.risk_level = Some(level);
        self
    }

    pub fn min_score(mut self, score: f64) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn max_score(mut self, score: f64) -> Self {
        self.max_score = Some(score);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn matches(&self, record: &AnalysisRecord) -> bool {
        if let Some(level) = self.risk_level {
            if record.risk() != level {
                return false;
            }
        }
        if let Some(min) = self.min_score {
            if record.credibility_score < min {
                return false;
            }
        }
        if let Some(max) = self.max_score {
            if record.credibility_score > max {
                return false;
            }
        }
        match self.search_term.as_deref() {
            Some(term) if !term.is_empty() => {
                let needle = term.to_lowercase();
                record.title.to_lowercase().contains(&needle)
                    || record.source.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

pub fn filter_analyses<'a>(
    records: &'a [AnalysisRecord],
    filter: Option<&AnalysisFilter>,
) -> Vec<&'a AnalysisRecord> {
    match filter {
        None => records.iter().collect(),
        Some(filter) => records.iter().filter(|r| filter.matches(r)).collect(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    #[serde(rename = "HIGH")]
    pub high: usize,
    #[serde(rename = "MEDIUM")]
    pub medium: usize,
    #[serde(rename = "LOW")]
    pub low: usize,
    #[serde(rename = "SAFE")]
    pub safe: usize,
}

impl RiskDistribution {
    pub fn count(&self, level: Risk) -> usize {
        match level {
            Risk::High => self.high,
            Risk::Medium => self.medium,
            Risk::Low => self.low,
            Risk::Safe => self.safe,
        }
    }

    fn record(&mut self, level: Risk) {
        let slot = match level {
            Risk::High => &mut self.high,
            Risk::Medium => &mut self.medium,
            Risk::Low => &mut self.low,
            Risk::Safe => &mut self.safe,
        };
        *slot += 1;
    }
}

/// Epoch-millisecond bounds of the stored analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub earliest: i64,
    pub latest: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    pub total: usize,
    pub avg_score: f64,
    pub distribution: RiskDistribution,
    pub time_range: Option<TimeRange>,
}

pub fn statistics(records: &[AnalysisRecord]) -> SessionStatistics {
    if records.is_empty() {
        return SessionStatistics::default();
    }

    let mut distribution = RiskDistribution::default();
    let mut total_score = 0.0;
    let mut earliest = i64::MAX;
    let mut latest = i64::MIN;

    for record in records {
        distribution.record(record.risk());
        total_score += record.credibility_score;
        earliest = earliest.min(record.timestamp);
        latest = latest.max(record.timestamp);
    }

    SessionStatistics {
        total: records.len(),
        avg_score: total_score / records.len() as f64,
        distribution,
        time_range: Some(TimeRange { earliest, latest }),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: i64,
    /// RFC 3339 rendering of `timestamp`.
    pub date: String,
    pub score: f64,
    pub title: String,
}

/// Points ordered by timestamp; records sharing a timestamp keep their
/// insertion order.
pub fn time_series(records: &[AnalysisRecord]) -> Vec<TimeSeriesPoint> {
    let mut ordered: Vec<&AnalysisRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.timestamp);
    ordered
        .into_iter()
        .map(|record| TimeSeriesPoint {
            timestamp: record.timestamp,
            date: format::format_millis_rfc3339(record.timestamp),
            score: record.credibility_score,
            title: record.title.clone(),
        })
        .collect()
}

//! The session history store and the views it derives.

pub mod analytics;
pub mod compare;
pub mod export;
pub mod record;
mod store;

pub use analytics::{
    AnalysisFilter, RiskDistribution, SessionStatistics, TimeRange, TimeSeriesPoint,
};
pub use compare::{ComparisonSelection, SelectionState};
pub use export::{ExportArtifact, ExportMetadata, SessionExport};
pub use record::{risk_level, AnalysisRecord, Risk, RiskLevel};
pub use store::{History, HistoryMetadata, SessionStore};

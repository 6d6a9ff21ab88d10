//! Session history store for the Credence dashboard.
//!
//! The rendering layer hands opaque classifier results to a [`SessionStore`],
//! which keeps a size-bounded, persisted log of past analyses and derives the
//! statistics, chronological series and comparison pairs the dashboard shows.

pub mod config;
pub mod core;
pub mod error;
pub mod session;

pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::storage::{MemoryStorage, Storage};
pub use config::StoreConfig;
pub use error::{StorageError, StoreError};
pub use session::{
    risk_level, AnalysisFilter, AnalysisRecord, ComparisonSelection, ExportArtifact, History,
    Risk, RiskLevel, SelectionState, SessionExport, SessionStatistics, SessionStore,
    TimeSeriesPoint,
};

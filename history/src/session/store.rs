//! The persisted history document and the store that owns it: loading with
//! recovery, capacity eviction, quota-aware saving and the record lifecycle.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::StoreConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::format;
use crate::core::platform;
use crate::core::storage::Storage;
use crate::error::StoreError;
use crate::session::analytics::{self, AnalysisFilter, SessionStatistics, TimeSeriesPoint};
use crate::session::compare::ComparisonSelection;
use crate::session::export::SessionExport;
use crate::session::record::AnalysisRecord;

/// The persisted document: analyses in creation order plus store metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub analyses: Vec<AnalysisRecord>,
    #[serde(default)]
    pub metadata: HistoryMetadata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMetadata {
    /// Epoch milliseconds the document was started.
    pub created: i64,
}

impl History {
    pub fn empty(created: i64) -> Self {
        Self {
            analyses: Vec::new(),
            metadata: HistoryMetadata { created },
        }
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    /// Drop the oldest analyses until at most `capacity` remain. Returns how
    /// many were dropped.
    pub fn evict_to(&mut self, capacity: usize) -> usize {
        let excess = self.analyses.len().saturating_sub(capacity);
        if excess > 0 {
            self.analyses.drain(..excess);
        }
        excess
    }
}

/// Size-bounded, persisted log of analyses.
///
/// The store keeps the history in memory and writes the whole document
/// through its [`Storage`] adapter after every change. Reads never touch the
/// adapter. Lifecycle operations always apply in memory; when the write
/// behind them fails the failure is logged and [`is_durable`](Self::is_durable)
/// turns false until a later save succeeds.
pub struct SessionStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    config: StoreConfig,
    history: History,
    durable: bool,
}

impl<S: Storage> SessionStore<S> {
    pub fn open(storage: S, config: StoreConfig) -> Result<Self, StoreError> {
        Self::open_with_clock(storage, config, SystemClock)
    }
}

impl<S: Storage, C: Clock> SessionStore<S, C> {
    pub fn open_with_clock(storage: S, config: StoreConfig, clock: C) -> Result<Self, StoreError> {
        config.validate()?;
        let history = load_history(&storage, &config, format::epoch_millis(clock.now()));
        debug!(
            platform = platform::platform_string(),
            key = %config.storage_key,
            analyses = history.len(),
            "session history opened"
        );
        Ok(Self {
            storage,
            clock,
            config,
            history,
            durable: true,
        })
    }

    /// Discard in-memory state and read the persisted document again.
    pub fn reload(&mut self) {
        self.history = load_history(&self.storage, &self.config, self.now_millis());
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Whether the last write reached the storage medium.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Persist the current history.
    ///
    /// The history is first cut down to the configured capacity. If the
    /// medium reports it is full, only the most recent `capacity / 2`
    /// analyses are kept and the write is retried once; the in-memory
    /// history follows the retry only when it succeeds.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let capacity = self.config.capacity;
        let evicted = self.history.evict_to(capacity);
        if evicted > 0 {
            debug!(evicted, capacity, "evicted oldest analyses over capacity");
        }

        let key = &self.config.storage_key;
        let outcome = match write_document(&mut self.storage, key, &self.history) {
            Err(StoreError::Storage(err)) if err.is_capacity_exceeded() => {
                let fallback = self.config.quota_fallback_capacity();
                warn!(%err, keep = fallback, "storage full; trimming session history and retrying");
                let mut trimmed = self.history.clone();
                let dropped = trimmed.evict_to(fallback);
                write_document(&mut self.storage, key, &trimmed).map(|()| {
                    debug!(dropped, "session history saved after trimming");
                    self.history = trimmed;
                })
            }
            other => other,
        };

        self.durable = outcome.is_ok();
        outcome
    }

    fn persist(&mut self, operation: &str) {
        if let Err(err) = self.save() {
            error!(operation, %err, "session history change kept in memory only");
        }
    }

    fn now_millis(&self) -> i64 {
        format::epoch_millis(self.clock.now())
    }

    /// Record a classifier result. The record is returned even when it could
    /// not be persisted.
    pub fn add_analysis(&mut self, result: Value) -> AnalysisRecord {
        let record = AnalysisRecord::from_result(result, self.now_millis());
        self.history.analyses.push(record.clone());
        self.persist("add_analysis");
        record
    }

    pub fn get_analysis_by_id(&self, id: &str) -> Option<&AnalysisRecord> {
        self.history.analyses.iter().find(|record| record.id == id)
    }

    /// Returns whether a record was removed. Nothing is written when `id` is
    /// unknown.
    pub fn delete_analysis(&mut self, id: &str) -> bool {
        let Some(index) = self.history.analyses.iter().position(|r| r.id == id) else {
            return false;
        };
        self.history.analyses.remove(index);
        self.persist("delete_analysis");
        true
    }

    pub fn clear_history(&mut self) {
        self.history = History::empty(self.now_millis());
        self.persist("clear_history");
    }

    /// Stored analyses, oldest first, optionally narrowed by `filter`.
    pub fn get_analyses(&self, filter: Option<&AnalysisFilter>) -> Vec<&AnalysisRecord> {
        analytics::filter_analyses(&self.history.analyses, filter)
    }

    /// Stored analyses, newest first.
    pub fn recent_first(&self) -> Vec<&AnalysisRecord> {
        self.history.analyses.iter().rev().collect()
    }

    pub fn get_statistics(&self) -> SessionStatistics {
        analytics::statistics(&self.history.analyses)
    }

    pub fn get_time_series_data(&self) -> Vec<TimeSeriesPoint> {
        analytics::time_series(&self.history.analyses)
    }

    /// Both selected records, once two are selected and both still exist.
    pub fn comparison_pair(
        &self,
        selection: &ComparisonSelection,
    ) -> Option<(&AnalysisRecord, &AnalysisRecord)> {
        let (first, second) = selection.pair()?;
        Some((
            self.get_analysis_by_id(first)?,
            self.get_analysis_by_id(second)?,
        ))
    }

    pub fn export_session(&self) -> SessionExport {
        SessionExport::new(self.history.analyses.clone(), self.clock.now())
    }

    /// Replace the history with the analyses of an exported snapshot. Returns
    /// how many analyses the store holds afterwards.
    pub fn import_session(&mut self, raw: &str) -> Result<usize, StoreError> {
        let snapshot = SessionExport::from_json(raw)?;
        self.history = History {
            analyses: snapshot.analyses,
            metadata: HistoryMetadata {
                created: self.now_millis(),
            },
        };
        self.persist("import_session");
        Ok(self.history.len())
    }
}

fn write_document<S: Storage>(
    storage: &mut S,
    key: &str,
    history: &History,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(history)?;
    storage.write(key, &raw)?;
    Ok(())
}

fn load_history<S: Storage>(storage: &S, config: &StoreConfig, now: i64) -> History {
    let key = config.storage_key.as_str();
    let mut history = match storage.read(key) {
        Ok(Some(raw)) => match serde_json::from_str::<History>(&raw) {
            Ok(history) => history,
            Err(err) => {
                warn!(key, %err, "stored session history is unreadable; starting fresh");
                History::empty(now)
            }
        },
        Ok(None) => {
            debug!(key, "no stored session history; starting fresh");
            History::empty(now)
        }
        Err(err) => {
            warn!(key, %err, "session history could not be read; starting fresh");
            History::empty(now)
        }
    };

    let evicted = history.evict_to(config.capacity);
    if evicted > 0 {
        debug!(evicted, "stored history exceeded capacity; oldest analyses dropped");
    }
    history
}

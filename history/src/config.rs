//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Key the history document is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "credence:sessionHistory";

/// Number of analyses retained before the oldest are evicted.
pub const DEFAULT_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    pub storage_key: String,
    pub capacity: usize,
}

impl StoreConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Size the history is cut down to when the medium reports it is full.
    pub fn quota_fallback_capacity(&self) -> usize {
        self.capacity / 2
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.storage_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "storage key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

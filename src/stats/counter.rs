//! Session counter and enabled flag
//!
//! `totalCorrections` counts accepted suggestions across sessions;
//! `extensionEnabled` gates checking. Missing values read as their defaults
//! (`0` and `true`); the flag is only off when it is literally `false`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::storage::{KeyValueStore, KEY_ENABLED, KEY_TOTAL};
use crate::console;
use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_corrections: u64,
    pub extension_enabled: bool,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            total_corrections: 0,
            extension_enabled: true,
        }
    }
}

pub struct Stats<S> {
    store: S,
}

impl<S: KeyValueStore> Stats<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Install/update hook: write defaults for keys that are not set yet.
    /// Existing values, including the counter, survive an update.
    pub fn initialize_defaults(&self) -> Result<(), StorageError> {
        let defaults = StatsSnapshot::default();
        if self.store.get(KEY_ENABLED)?.is_none() {
            self.store.set(KEY_ENABLED, json!(defaults.extension_enabled))?;
        }
        if self.store.get(KEY_TOTAL)?.is_none() {
            self.store.set(KEY_TOTAL, json!(defaults.total_corrections))?;
        }
        Ok(())
    }

    /// Add one accepted suggestion, returning the new total
    pub fn increment(&self) -> Result<u64, StorageError> {
        let next = self.store.update(KEY_TOTAL, &mut |current| {
            let total = parse_total(current)?;
            Ok(json!(total.saturating_add(1)))
        })?;
        parse_total(Some(&next))
    }

    pub fn total(&self) -> Result<u64, StorageError> {
        parse_total(self.store.get(KEY_TOTAL)?.as_ref())
    }

    pub fn is_enabled(&self) -> Result<bool, StorageError> {
        Ok(parse_enabled(self.store.get(KEY_ENABLED)?.as_ref()))
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.store.set(KEY_ENABLED, json!(enabled))
    }

    /// Current values; a failing store reads as the defaults
    pub fn snapshot(&self) -> StatsSnapshot {
        let read = || -> Result<StatsSnapshot, StorageError> {
            Ok(StatsSnapshot {
                total_corrections: self.total()?,
                extension_enabled: self.is_enabled()?,
            })
        };
        read().unwrap_or_else(|e| {
            console::warn(&format!("[Stats] reading stats failed, using defaults: {}", e));
            StatsSnapshot::default()
        })
    }
}

fn parse_total(value: Option<&Value>) -> Result<u64, StorageError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v.as_u64().ok_or_else(|| StorageError::Malformed {
            key: KEY_TOTAL.to_string(),
            reason: format!("expected a non-negative integer, got {}", v),
        }),
    }
}

fn parse_enabled(value: Option<&Value>) -> bool {
    !matches!(value, Some(Value::Bool(false)))
}

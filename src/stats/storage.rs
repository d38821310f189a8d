//! Key-value storage behind the session counter
//!
//! `KeyValueStore::update` is the only way to read-modify-write a key: the
//! closure runs while the store is locked, so concurrent increments never
//! lose an update.

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

pub const KEY_ENABLED: &str = "extensionEnabled";
pub const KEY_TOTAL: &str = "totalCorrections";

pub type Updater<'a> = &'a mut dyn FnMut(Option<&Value>) -> Result<Value, StorageError>;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Atomically replace the value of `key` with `f(current)`, returning the new value
    fn update(&self, key: &str, f: Updater<'_>) -> Result<Value, StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn update(&self, key: &str, f: Updater<'_>) -> Result<Value, StorageError> {
        (**self).update(key, f)
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a JSON object (e.g. a `chrome.storage` snapshot)
    pub fn from_object(object: Map<String, Value>) -> Self {
        Self {
            entries: Mutex::new(object.into_iter().collect()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn update(&self, key: &str, f: Updater<'_>) -> Result<Value, StorageError> {
        let mut entries = self.lock()?;
        let next = f(entries.get(key))?;
        entries.insert(key.to_string(), next.clone());
        Ok(next)
    }
}

// =============================================================================
// WriteThrough
// =============================================================================

/// Wraps a synchronous cache and remembers which keys changed, so the host
/// can flush them to the real (asynchronous) backing store.
#[derive(Debug, Default)]
pub struct WriteThrough<S> {
    cache: S,
    dirty: Mutex<BTreeSet<String>>,
}

impl<S: KeyValueStore> WriteThrough<S> {
    pub fn new(cache: S) -> Self {
        Self {
            cache,
            dirty: Mutex::new(BTreeSet::new()),
        }
    }

    fn mark(&self, key: &str) -> Result<(), StorageError> {
        self.dirty
            .lock()
            .map_err(|_| StorageError::Unavailable("dirty set lock poisoned".into()))?
            .insert(key.to_string());
        Ok(())
    }

    /// Take every changed key with its current value
    pub fn drain(&self) -> Result<Map<String, Value>, StorageError> {
        let keys = std::mem::take(
            &mut *self
                .dirty
                .lock()
                .map_err(|_| StorageError::Unavailable("dirty set lock poisoned".into()))?,
        );
        let mut out = Map::new();
        for key in keys {
            if let Some(value) = self.cache.get(&key)? {
                out.insert(key, value);
            }
        }
        Ok(out)
    }
}

impl<S: KeyValueStore> KeyValueStore for WriteThrough<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.cache.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.cache.set(key, value)?;
        self.mark(key)
    }

    fn update(&self, key: &str, f: Updater<'_>) -> Result<Value, StorageError> {
        let value = self.cache.update(key, f)?;
        self.mark(key)?;
        Ok(value)
    }
}

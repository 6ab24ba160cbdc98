pub mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::error::PersistenceError;

pub use sqlite::SqliteSlotStore;

/// A string-valued key-value store where each key names one slot.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    async fn ping(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Process-local slot store. Writes can be made to fail to simulate a full
/// or read-only backing store.
#[derive(Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, String>>,
    reject_writes: AtomicBool,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.put(key, value);
        store
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("quota exceeded".to_string()));
        }
        self.put(key, value);
        Ok(())
    }
}

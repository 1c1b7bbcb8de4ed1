use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::DocumentStore;
use crate::error::PersistenceError;

/// In-memory document store, optionally failing every write
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, Value>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.lock().get(name).cloned()
    }

    pub fn insert(&self, name: &str, document: Value) {
        self.lock().insert(name.to_string(), document);
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        match self.documents.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, name: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.get(name))
    }

    async fn save(&self, name: &str, document: &Value) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io {
                document: name.to_string(),
                source: std::io::Error::other("writes disabled"),
            });
        }
        self.insert(name, document.clone());
        Ok(())
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::ProspectRecord;

/// Storage abstraction keyed by phone number so the service can be exercised in isolation.
pub trait ProspectStore: Send + Sync {
    /// Insert or replace the record for `record.phone`.
    fn put(&self, record: ProspectRecord) -> Result<(), StoreError>;
    fn get(&self, phone: &str) -> Result<Option<ProspectRecord>, StoreError>;
}

/// Error enumeration for store failures. An unknown phone is `Ok(None)`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("prospect not found")]
    NotFound,
    #[error("prospect store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store. Records are never evicted.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProspectStore {
    records: Arc<Mutex<HashMap<String, ProspectRecord>>>,
}

impl InMemoryProspectStore {
    pub fn len(&self) -> usize {
        self.records.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProspectStore for InMemoryProspectStore {
    fn put(&self, record: ProspectRecord) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        guard.insert(record.phone.clone(), record);
        Ok(())
    }

    fn get(&self, phone: &str) -> Result<Option<ProspectRecord>, StoreError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))?;
        Ok(guard.get(phone).cloned())
    }
}

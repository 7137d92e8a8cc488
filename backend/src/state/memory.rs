use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::state::model::CrossState;
use crate::state::repository::CrossStateRepository;

/// Process-local repository. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<BTreeMap<String, CrossState>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl CrossStateRepository for InMemoryRepository {
    fn get(&self, symbol: &str) -> Result<Option<CrossState>, StoreError> {
        Ok(self.records.lock().get(symbol).cloned())
    }

    fn put(&self, symbol: &str, state: &CrossState) -> Result<(), StoreError> {
        self.records.lock().insert(symbol.to_string(), state.clone());
        Ok(())
    }

    fn remove(&self, symbol: &str) -> Result<bool, StoreError> {
        Ok(self.records.lock().remove(symbol).is_some())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.records.lock().clear();
        Ok(())
    }

    fn list(&self) -> Result<Vec<CrossState>, StoreError> {
        Ok(self.records.lock().values().cloned().collect())
    }
}

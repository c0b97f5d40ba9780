use crate::core::errors::StoreError;
use crate::core::traits::TradeStore;
use crate::core::types::TradeRecord;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory trade store for tests and embedders that do not want disk
/// I/O. Clones share the same underlying log.
#[derive(Debug, Clone, Default)]
pub struct MemoryTradeStore {
    records: Arc<Mutex<Vec<TradeRecord>>>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far.
    pub fn records(&self) -> Vec<TradeRecord> {
        self.records.lock().expect("store lock poisoned").clone()
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn save(&self, record: &TradeRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("store lock poisoned")
            .push(record.clone());
        Ok(())
    }

    async fn find(&self, order_id: &str) -> Result<Option<TradeRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store lock poisoned")
            .iter()
            .rev()
            .find(|r| r.order_id == order_id)
            .cloned())
    }
}

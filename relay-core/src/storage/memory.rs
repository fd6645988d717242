use super::{PublishRecord, RecordStore};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Process-local store, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<PublishRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record in insertion order.
    pub fn records(&self) -> Vec<PublishRecord> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PublishRecord>> {
        // A panic while holding the lock cannot leave a half-pushed Vec.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &PublishRecord) -> Result<i64> {
        let mut records = self.lock();
        let id = records.len() as i64 + 1;
        let mut stored = record.clone();
        stored.id = Some(id);
        records.push(stored);
        Ok(id)
    }

    async fn find_latest(&self, email: &str, task: &str) -> Result<Option<PublishRecord>> {
        Ok(self
            .lock()
            .iter()
            .rev()
            .find(|r| r.email == email && r.task == task)
            .cloned())
    }
}

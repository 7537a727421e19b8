//! In-process settings record store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::repos::{RepoError, SettingsRecordRepo};
use crate::domain::entities::SettingsRecord;

/// Same contract as the Postgres store, kept in a map.
///
/// Counts reads and writes, and can be told to fail the next save.
#[derive(Default)]
pub struct InMemorySettingsRepo {
    records: Mutex<HashMap<String, SettingsRecord>>,
    fail_next_save: Mutex<Option<RepoError>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemorySettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = SettingsRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.class_name.clone(), record))
            .collect();
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    pub async fn snapshot(&self, class_name: &str) -> Option<SettingsRecord> {
        self.records.lock().await.get(class_name).cloned()
    }

    /// Overwrites a record without counting a write.
    pub async fn replace(&self, record: SettingsRecord) {
        self.records
            .lock()
            .await
            .insert(record.class_name.clone(), record);
    }

    /// Makes the next `save` return `error` without storing anything.
    pub async fn fail_next_save(&self, error: RepoError) {
        *self.fail_next_save.lock().await = Some(error);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsRecordRepo for InMemorySettingsRepo {
    async fn find_by_class_name(
        &self,
        class_name: &str,
    ) -> Result<Option<SettingsRecord>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().await.get(class_name).cloned())
    }

    async fn save(&self, record: SettingsRecord) -> Result<(), RepoError> {
        if let Some(error) = self.fail_next_save.lock().await.take() {
            return Err(error);
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().await;
        match records.get_mut(&record.class_name) {
            Some(existing) => {
                existing.store.extend(record.store);
                existing.last_modified_by = record.last_modified_by;
                existing.updated_at = record.updated_at;
            }
            None => {
                records.insert(record.class_name.clone(), record);
            }
        }
        Ok(())
    }
}

//! In-memory record store.
//!
//! Implements the full [`RecordStore`] contract, including the device
//! uniqueness rule, so the license state machine can be exercised without
//! a database.

use crate::error::{StorageError, StorageResult};
use crate::record_store::RecordStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use sypher_types::{DeviceId, LicenseKey, LicenseRecord, LicenseStatus};
use tokio::sync::RwLock;

/// A [`RecordStore`] backed by a map in process memory.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<LicenseKey, LicenseRecord>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Fails if `record` is bound to a device that another key already holds.
fn check_device_unique(
    records: &BTreeMap<LicenseKey, LicenseRecord>,
    record: &LicenseRecord,
) -> StorageResult<()> {
    let Some(device) = &record.device_id else {
        return Ok(());
    };
    let taken = records
        .values()
        .any(|other| other.key != record.key && other.is_bound_to(device));
    if taken {
        return Err(StorageError::Constraint(format!(
            "device {device} is already bound to another license"
        )));
    }
    Ok(())
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &LicenseKey) -> StorageResult<Option<LicenseRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn get_all(&self) -> StorageResult<Vec<LicenseRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get_by_device(&self, device: &DeviceId) -> StorageResult<Option<LicenseRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|r| r.is_bound_to(device))
            .cloned())
    }

    async fn get_by_status(&self, status: &LicenseStatus) -> StorageResult<Vec<LicenseRecord>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|r| &r.status == status)
            .cloned()
            .collect())
    }

    async fn create(&self, record: LicenseRecord) -> StorageResult<LicenseRecord> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.key) {
            return Ok(existing.clone());
        }
        check_device_unique(&records, &record)?;
        records.insert(record.key.clone(), record.clone());
        Ok(record)
    }

    async fn put(&self, record: &LicenseRecord) -> StorageResult<()> {
        let mut records = self.records.write().await;
        check_device_unique(&records, record)?;
        records.insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &LicenseKey) -> StorageResult<()> {
        self.records.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.records.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> StorageResult<usize> {
        Ok(self.records.read().await.len())
    }
}

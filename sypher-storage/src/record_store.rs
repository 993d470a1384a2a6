//! The license record store contract.

use crate::error::StorageResult;
use async_trait::async_trait;
use sypher_types::{DeviceId, LicenseKey, LicenseRecord, LicenseStatus};

/// Durable keyed storage for license records.
///
/// Every method commits atomically: a failed write leaves the previously
/// stored record untouched. Records returned are owned snapshots.
///
/// Among records that carry a `device_id`, the device id is unique. A write
/// that would bind a second record to an already-bound device fails with
/// [`StorageError::Constraint`](crate::StorageError::Constraint).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the name of the backend, for logging.
    fn backend_name(&self) -> &'static str;

    /// Fetches the record stored under `key`.
    async fn get(&self, key: &LicenseKey) -> StorageResult<Option<LicenseRecord>>;

    /// Returns every stored record. Order carries no meaning.
    async fn get_all(&self) -> StorageResult<Vec<LicenseRecord>>;

    /// Returns the record currently bound to `device`, if any.
    async fn get_by_device(&self, device: &DeviceId) -> StorageResult<Option<LicenseRecord>>;

    /// Returns all records with the given status.
    async fn get_by_status(&self, status: &LicenseStatus) -> StorageResult<Vec<LicenseRecord>>;

    /// Inserts a new record.
    ///
    /// If a record with the same key already exists, nothing is written and
    /// the existing record is returned. Otherwise the inserted record is
    /// returned.
    async fn create(&self, record: LicenseRecord) -> StorageResult<LicenseRecord>;

    /// Inserts or replaces the record with the same key.
    async fn put(&self, record: &LicenseRecord) -> StorageResult<()>;

    /// Removes the record under `key`. Missing keys are not an error.
    async fn delete(&self, key: &LicenseKey) -> StorageResult<()>;

    /// Removes every record.
    async fn clear(&self) -> StorageResult<()>;

    /// Returns the number of stored records.
    async fn count(&self) -> StorageResult<usize>;
}

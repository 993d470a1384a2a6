//! Storage layer for Sypher licensing.
//!
//! Two tiers of local persistence:
//!
//! - [`RecordStore`]: the authoritative, transactional store of license
//!   records keyed by license key, with secondary lookups by device and by
//!   status. [`SqliteRecordStore`] is the durable backend and
//!   [`MemoryRecordStore`] an in-memory implementation of the same contract.
//! - [`DeviceStorage`]: a small device-scoped key/value area holding the
//!   cached device id and the pointer to the license this device activated.
//!   It is a hint only; the record store always wins.

mod device_storage;
mod error;
mod memory;
mod record_store;
mod sqlite;

pub use device_storage::{DeviceStorage, FileDeviceStorage, MemoryDeviceStorage};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryRecordStore;
pub use record_store::RecordStore;
pub use sqlite::SqliteRecordStore;

//! Local licensing and device activation for Sypher.
//!
//! This crate handles:
//! - License key generation
//! - Device fingerprinting for license binding
//! - Activation and deactivation against a local record store
//! - Export, import and clearing of the license set
//!
//! # Design Principles
//!
//! - **No remote authority**: all state lives on the device; nothing is
//!   signed or verified against a server
//! - **One device per active license**: the binding is recorded on the
//!   license record itself
//! - **Store is authoritative**: the device-local pointer to "my license"
//!   is re-checked against the store on every read
//! - **Injected storage**: the manager is handed its stores, so it can run
//!   against SQLite or an in-memory store alike
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> sypher_license::LicenseResult<()> {
//! use std::sync::Arc;
//! use sypher_license::{DeviceIdentity, LicenseManager};
//! use sypher_storage::{MemoryDeviceStorage, MemoryRecordStore};
//!
//! let manager = LicenseManager::new(
//!     Arc::new(MemoryRecordStore::new()),
//!     DeviceIdentity::from_environment(Arc::new(MemoryDeviceStorage::new())),
//! );
//! let license = manager.issue_license().await?;
//! manager.activate(&license.key).await?;
//! assert!(manager.is_device_licensed().await?);
//! # Ok(())
//! # }
//! ```

mod bulk;
mod device;
mod error;
mod key;
mod manager;

pub use bulk::{clear_all, export_all, import_all, import_document, ExportDocument, SCHEMA_VERSION};
pub use device::{
    fingerprint, rolling_hash, DeviceIdentity, EnvironmentSignals, DEVICE_ID_ITEM,
    DEVICE_ID_PREFIX,
};
pub use error::{LicenseError, LicenseResult};
pub use key::{generate_license_key, generate_license_key_with};
pub use manager::{
    ActivationOutcome, DeactivationOutcome, LicenseManager, LICENSE_POINTER_ITEM,
    MAX_ISSUE_ATTEMPTS,
};

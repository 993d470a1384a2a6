//! Core type definitions for Sypher licensing.
//!
//! This crate defines the plain data shared by the storage layer and the
//! license state machine:
//! - License key and device identifiers
//! - The persisted license record and its status
//!
//! Behaviour (activation rules, fingerprinting, persistence) lives in
//! `sypher-license` and `sypher-storage`, not here.

mod ids;
mod record;

pub use ids::{DeviceId, LicenseKey, KEY_ALPHABET, KEY_LENGTH};
pub use record::{LicenseRecord, LicenseStatus};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid license key: {0}")]
    InvalidLicenseKey(String),

    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),
}

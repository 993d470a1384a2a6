//! Error types for the licensing module.

use sypher_storage::StorageError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Underlying storage failed to open, read or write.
    #[error("storage error: {0}")]
    Store(#[from] StorageError),

    /// No record exists for the given license key.
    #[error("license not found: {0}")]
    NotFound(String),

    /// The license is bound to a different device.
    #[error("license {0} is already in use on another device")]
    Conflict(String),

    /// A key or device id could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidKey(#[from] sypher_types::Error),

    /// Import data or a stored record is malformed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Every freshly generated key collided with an existing record.
    #[error("could not generate an unused license key after {0} attempts")]
    KeySpaceExhausted(u32),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

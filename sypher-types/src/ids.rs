//! Identifier types used throughout Sypher.
//!
//! Both identifiers are opaque strings on the wire. Construction through
//! `parse` trims surrounding whitespace and rejects empty input; anything
//! else is accepted so that imported data with foreign key shapes survives.
//! Deserialization goes through `parse` as well, so a stored or imported
//! identifier always matches the one a user types.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Characters a generated license key is drawn from.
pub const KEY_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated license key.
pub const KEY_LENGTH: usize = 16;

/// A license key, the primary key of a license record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Parses a license key entered by a user or read from storage.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidLicenseKey("key must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wraps an already-validated key string without checks.
    ///
    /// Used by the key generator, which only produces well-formed keys.
    #[must_use]
    pub fn from_generated(s: String) -> Self {
        Self(s)
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the key has the shape the generator produces:
    /// sixteen characters from `A-Z0-9`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == KEY_LENGTH && self.0.bytes().all(|b| KEY_ALPHABET.contains(&b))
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for LicenseKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LicenseKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<LicenseKey> for String {
    fn from(value: LicenseKey) -> Self {
        value.0
    }
}

/// Identifier of a device a license can be bound to.
///
/// Derived from a non-cryptographic fingerprint, so it is best-effort and
/// not unique: two devices reporting identical environments share an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Parses a device id.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidDeviceId("device id must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wraps a fingerprint-derived id without checks.
    #[must_use]
    pub fn from_derived(s: String) -> Self {
        Self(s)
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

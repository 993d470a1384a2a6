//! The persisted license record.

use crate::{DeviceId, LicenseKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activation status of a license record.
///
/// Policy only ever produces `Inactive` and `Active`. Stores accept
/// arbitrary status strings, which are carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LicenseStatus {
    /// Not bound to any device.
    Inactive,
    /// Bound to exactly one device.
    Active,
    /// Any other status string found in the store.
    Other(String),
}

impl LicenseStatus {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Other(s) => s,
        }
    }

    #[must_use]
    pub fn is_inactive(&self) -> bool {
        matches!(self, Self::Inactive)
    }
}

impl From<String> for LicenseStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "inactive" => Self::Inactive,
            "active" => Self::Active,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for LicenseStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<LicenseStatus> for String {
    fn from(status: LicenseStatus) -> Self {
        match status {
            LicenseStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A license key together with its device binding state.
///
/// Records handed out by a store are snapshots; changing one has no effect
/// until it is written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Primary key. Never changes after creation.
    pub key: LicenseKey,
    pub status: LicenseStatus,
    /// Set once when the record is first created.
    pub created_at: DateTime<Utc>,
    /// When the current device binding was made.
    #[serde(default)]
    pub activation_date: Option<DateTime<Utc>>,
    /// The bound device, present only while active.
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    /// Last activation or deactivation event.
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    /// Fields this version does not know about, preserved as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LicenseRecord {
    /// Creates a fresh, unbound record.
    #[must_use]
    pub fn new(key: LicenseKey, created_at: DateTime<Utc>) -> Self {
        Self {
            key,
            status: LicenseStatus::Inactive,
            created_at,
            activation_date: None,
            device_id: None,
            last_active: None,
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == LicenseStatus::Active
    }

    /// Returns true if the record is bound to the given device.
    #[must_use]
    pub fn is_bound_to(&self, device: &DeviceId) -> bool {
        self.device_id.as_ref() == Some(device)
    }

    /// Returns true if `activation_date` and `device_id` are both present
    /// or both absent.
    #[must_use]
    pub fn is_binding_consistent(&self) -> bool {
        self.activation_date.is_some() == self.device_id.is_some()
    }

    /// Binds the record to `device` as of `now`.
    pub fn bind(&mut self, device: DeviceId, now: DateTime<Utc>) {
        self.status = LicenseStatus::Active;
        self.device_id = Some(device);
        self.activation_date = Some(now);
        self.last_active = Some(now);
    }

    /// Drops the device binding. Status and `last_active` are left to the caller.
    pub fn unbind(&mut self) {
        self.device_id = None;
        self.activation_date = None;
    }
}

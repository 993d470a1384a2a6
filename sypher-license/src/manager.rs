//! The license state machine.
//!
//! A record is either `inactive` (unbound) or `active` (bound to one
//! device). [`LicenseManager`] moves records between the two states and
//! keeps a device-local pointer to the license this device activated.
//!
//! The pointer is only a hint. Every read of "this device's license"
//! re-checks the record store and drops the pointer when the store says
//! the binding no longer holds, since another device or an import may have
//! changed the record in the meantime.
//!
//! There is no coordination across devices sharing a store: two devices
//! that both see a record as inactive can both activate it, and the last
//! write wins.

use crate::device::DeviceIdentity;
use crate::error::{LicenseError, LicenseResult};
use crate::key::generate_license_key;
use chrono::Utc;
use std::sync::Arc;
use sypher_storage::{DeviceStorage, RecordStore};
use sypher_types::{DeviceId, LicenseKey, LicenseRecord, LicenseStatus};
use tracing::{debug, info, warn};

/// Device storage item pointing at the license this device activated.
pub const LICENSE_POINTER_ITEM: &str = "sypher-license-key";

/// How many fresh keys [`LicenseManager::issue_license`] tries.
pub const MAX_ISSUE_ATTEMPTS: u32 = 8;

/// Result of [`LicenseManager::activate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    /// The record was inactive and is now bound to this device.
    Activated(LicenseRecord),
    /// The record was already bound to this device. Nothing was written.
    AlreadyActive(LicenseRecord),
}

impl ActivationOutcome {
    /// Returns the record as it stands after the call.
    #[must_use]
    pub fn license(&self) -> &LicenseRecord {
        match self {
            Self::Activated(record) | Self::AlreadyActive(record) => record,
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Activated(_) => "License activated successfully",
            Self::AlreadyActive(_) => "License already activated on this device",
        }
    }
}

/// Result of [`LicenseManager::deactivate`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeactivationOutcome {
    /// This device had no license pointer.
    NoActiveLicense,
    /// The pointer referenced a record that is missing or bound elsewhere.
    /// The pointer was cleared; no record was written.
    NotAssociated,
    /// The record was released from this device.
    Deactivated(LicenseRecord),
}

impl DeactivationOutcome {
    /// Returns the released record, if one was written.
    #[must_use]
    pub fn license(&self) -> Option<&LicenseRecord> {
        match self {
            Self::Deactivated(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoActiveLicense => "No active license found",
            Self::NotAssociated => "License not associated with this device",
            Self::Deactivated(_) => "License deactivated successfully",
        }
    }
}

/// Activation and bookkeeping over a [`RecordStore`] for one device.
#[derive(Clone)]
pub struct LicenseManager {
    store: Arc<dyn RecordStore>,
    identity: DeviceIdentity,
}

impl LicenseManager {
    /// Creates a manager over `store` acting as the device `identity`
    /// resolves to. The license pointer lives in the identity's storage.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, identity: DeviceIdentity) -> Self {
        Self { store, identity }
    }

    /// Returns the underlying record store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Returns the id of the device this manager acts as.
    pub fn current_device_id(&self) -> LicenseResult<DeviceId> {
        self.identity.current_device_id()
    }

    fn device_storage(&self) -> &dyn DeviceStorage {
        self.identity.storage().as_ref()
    }

    // ── Records ──────────────────────────────────────────────────

    /// Fetches the record for `key`.
    pub async fn get_license(&self, key: &LicenseKey) -> LicenseResult<Option<LicenseRecord>> {
        Ok(self.store.get(key).await?)
    }

    /// Returns every record in the store.
    pub async fn get_all_licenses(&self) -> LicenseResult<Vec<LicenseRecord>> {
        Ok(self.store.get_all().await?)
    }

    /// Creates an inactive record for `key`.
    ///
    /// Creating a key that already exists succeeds and returns the stored
    /// record unchanged. The stored record is not compared against a fresh
    /// one, so callers that care whether they created it should check the
    /// returned `created_at` or status.
    pub async fn create_license(&self, key: LicenseKey) -> LicenseResult<LicenseRecord> {
        let record = self
            .store
            .create(LicenseRecord::new(key, Utc::now()))
            .await?;
        debug!(key = %record.key, status = %record.status, "license created");
        Ok(record)
    }

    /// Generates a key that is not yet in the store and creates it.
    pub async fn issue_license(&self) -> LicenseResult<LicenseRecord> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let key = generate_license_key();
            if self.store.get(&key).await?.is_some() {
                debug!(key = %key, attempt, "generated key already exists, retrying");
                continue;
            }
            let record = self.create_license(key).await?;
            info!(key = %record.key, "license issued");
            return Ok(record);
        }
        Err(LicenseError::KeySpaceExhausted(MAX_ISSUE_ATTEMPTS))
    }

    /// Sets the status of `key`.
    ///
    /// Setting `inactive` also drops the device binding. Other statuses
    /// leave the binding as it is.
    pub async fn update_status(
        &self,
        key: &LicenseKey,
        status: LicenseStatus,
    ) -> LicenseResult<LicenseRecord> {
        let mut record = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| LicenseError::NotFound(key.to_string()))?;

        record.status = status;
        if record.status.is_inactive() {
            record.unbind();
        }
        self.store.put(&record).await?;
        info!(key = %key, status = %record.status, "license status updated");
        Ok(record)
    }

    /// Deletes the record for `key`. Missing keys are not an error.
    pub async fn delete_license(&self, key: &LicenseKey) -> LicenseResult<()> {
        self.store.delete(key).await?;
        info!(key = %key, "license deleted");
        Ok(())
    }

    // ── Activation ───────────────────────────────────────────────

    /// Binds `key` to the current device.
    ///
    /// # Errors
    ///
    /// [`LicenseError::NotFound`] if there is no record for `key`, and
    /// [`LicenseError::Conflict`] if it is bound to another device.
    pub async fn activate(&self, key: &LicenseKey) -> LicenseResult<ActivationOutcome> {
        let device = self.current_device_id()?;
        let mut record = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| LicenseError::NotFound(key.to_string()))?;

        if !record.status.is_inactive() {
            if record.is_bound_to(&device) {
                debug!(key = %key, device_id = %device, "license already active on this device");
                return Ok(ActivationOutcome::AlreadyActive(record));
            }
            warn!(key = %key, device_id = %device, "license is bound to another device");
            return Err(LicenseError::Conflict(key.to_string()));
        }

        record.bind(device.clone(), Utc::now());
        self.store.put(&record).await?;
        self.device_storage()
            .set_item(LICENSE_POINTER_ITEM, key.as_str())?;
        info!(key = %key, device_id = %device, "license activated");
        Ok(ActivationOutcome::Activated(record))
    }

    /// Releases the license this device activated.
    ///
    /// Succeeds without writing when there is nothing to release, including
    /// when the pointer is stale because the record was removed or bound
    /// elsewhere.
    pub async fn deactivate(&self) -> LicenseResult<DeactivationOutcome> {
        let Some(key) = self.pointer()? else {
            debug!("no license pointer, nothing to deactivate");
            return Ok(DeactivationOutcome::NoActiveLicense);
        };
        let device = self.current_device_id()?;

        let mut record = match self.store.get(&key).await? {
            Some(record) if record.is_bound_to(&device) => record,
            _ => {
                warn!(key = %key, device_id = %device, "license pointer is stale, clearing it");
                self.clear_pointer()?;
                return Ok(DeactivationOutcome::NotAssociated);
            }
        };

        record.status = LicenseStatus::Inactive;
        record.unbind();
        record.last_active = Some(Utc::now());
        self.store.put(&record).await?;
        self.clear_pointer()?;
        info!(key = %key, device_id = %device, "license deactivated");
        Ok(DeactivationOutcome::Deactivated(record))
    }

    /// Returns the license active on this device.
    ///
    /// The device pointer is checked against the store; if the record is
    /// gone, inactive or bound to another device, the pointer is cleared and
    /// `None` is returned.
    pub async fn get_device_license(&self) -> LicenseResult<Option<LicenseRecord>> {
        let Some(key) = self.pointer()? else {
            return Ok(None);
        };
        let device = self.current_device_id()?;

        match self.store.get(&key).await? {
            Some(record) if record.is_bound_to(&device) && record.is_active() => Ok(Some(record)),
            _ => {
                warn!(key = %key, device_id = %device, "license pointer no longer valid, clearing it");
                self.clear_pointer()?;
                Ok(None)
            }
        }
    }

    /// Returns true if this device holds an active license.
    pub async fn is_device_licensed(&self) -> LicenseResult<bool> {
        Ok(self.get_device_license().await?.is_some())
    }

    fn pointer(&self) -> LicenseResult<Option<LicenseKey>> {
        let Some(raw) = self.device_storage().get_item(LICENSE_POINTER_ITEM)? else {
            return Ok(None);
        };
        match LicenseKey::parse(&raw) {
            Ok(key) => Ok(Some(key)),
            Err(_) => {
                self.clear_pointer()?;
                Ok(None)
            }
        }
    }

    fn clear_pointer(&self) -> LicenseResult<()> {
        self.device_storage().remove_item(LICENSE_POINTER_ITEM)?;
        Ok(())
    }
}

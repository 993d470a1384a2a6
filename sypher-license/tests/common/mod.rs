//! Shared test helpers for license tests.

#![allow(dead_code)]

use std::sync::Arc;
use sypher_license::{DeviceIdentity, EnvironmentSignals, LicenseManager};
use sypher_storage::{MemoryDeviceStorage, MemoryRecordStore, RecordStore};
use sypher_types::{DeviceId, LicenseKey};

/// A fixed environment, so fingerprints do not depend on the test host.
pub fn desk_signals() -> EnvironmentSignals {
    EnvironmentSignals {
        user_agent: "sypher/0.3.0 (linux; x86_64; desk)".to_string(),
        language: "en-US".to_string(),
        hardware_concurrency: 8,
        screen_width: 1920,
        screen_height: 1080,
        color_depth: 24,
        timezone: "Europe/Berlin".to_string(),
    }
}

pub fn key(s: &str) -> LicenseKey {
    LicenseKey::parse(s).unwrap()
}

pub fn device(s: &str) -> DeviceId {
    DeviceId::parse(s).unwrap()
}

/// A manager acting as device `id`, with its own device storage.
pub fn manager_on(store: Arc<dyn RecordStore>, id: &str) -> LicenseManager {
    let identity =
        DeviceIdentity::with_id(Arc::new(MemoryDeviceStorage::new()), &device(id)).unwrap();
    LicenseManager::new(store, identity)
}

/// A manager over a fresh in-memory store acting as device `id`.
pub fn single_device(id: &str) -> (Arc<dyn RecordStore>, LicenseManager) {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let manager = manager_on(Arc::clone(&store), id);
    (store, manager)
}

/// A manager that fingerprints `signals` with its own empty device storage.
pub fn manager_with_signals(
    store: Arc<dyn RecordStore>,
    signals: EnvironmentSignals,
) -> LicenseManager {
    let identity = DeviceIdentity::new(Arc::new(MemoryDeviceStorage::new()), signals);
    LicenseManager::new(store, identity)
}

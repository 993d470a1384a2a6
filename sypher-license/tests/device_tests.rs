mod common;

use common::{desk_signals, device, manager_with_signals};
use proptest::prelude::*;
use std::sync::Arc;
use sypher_license::{
    fingerprint, rolling_hash, ActivationOutcome, DeviceIdentity, EnvironmentSignals,
    DEVICE_ID_ITEM, DEVICE_ID_PREFIX,
};
use sypher_storage::{DeviceStorage, MemoryDeviceStorage, MemoryRecordStore, RecordStore};

// ── Rolling hash ─────────────────────────────────────────────────

#[test]
fn rolling_hash_known_values() {
    assert_eq!(rolling_hash(""), 0);
    assert_eq!(rolling_hash("a"), 97);
    assert_eq!(rolling_hash("ab"), 97 * 31 + 98);
    assert_eq!(rolling_hash("hello"), 99_162_322);
    assert_eq!(rolling_hash("hello world"), 1_794_106_052);
}

#[test]
fn rolling_hash_wraps_to_i32_min() {
    assert_eq!(rolling_hash("polygenelubricants"), i32::MIN);
}

#[test]
fn rolling_hash_uses_utf16_units() {
    // U+1F600 is a surrogate pair in UTF-16: 0xD83D 0xDE00.
    let expected = 0xD83Di32.wrapping_mul(31).wrapping_add(0xDE00);
    assert_eq!(rolling_hash("\u{1F600}"), expected);
}

// ── Fingerprint ──────────────────────────────────────────────────

#[test]
fn fingerprint_source_sums_screen_geometry() {
    let source = desk_signals().fingerprint_source();
    assert_eq!(
        source,
        "sypher/0.3.0 (linux; x86_64; desk)en-US83024Europe/Berlin"
    );
}

#[test]
fn fingerprint_is_prefixed_hex_of_absolute_hash() {
    let signals = desk_signals();
    let hash = rolling_hash(&signals.fingerprint_source());
    let id = fingerprint(&signals);
    assert_eq!(id.as_str(), format!("device_{:x}", hash.unsigned_abs()));
    assert!(id.as_str().starts_with(DEVICE_ID_PREFIX));
}

#[test]
fn fingerprint_of_min_hash_does_not_overflow() {
    let signals = EnvironmentSignals {
        user_agent: "polygenelubricants".to_string(),
        language: String::new(),
        hardware_concurrency: 0,
        screen_width: 0,
        screen_height: 0,
        color_depth: 0,
        timezone: String::new(),
    };
    // Concurrency and screen sum still contribute "0" and "0".
    let expected = rolling_hash("polygenelubricants00");
    assert_eq!(
        fingerprint(&signals).as_str(),
        format!("device_{:x}", expected.unsigned_abs())
    );
}

#[test]
fn different_environments_usually_differ() {
    let mut other = desk_signals();
    other.timezone = "America/New_York".to_string();
    assert_ne!(fingerprint(&desk_signals()), fingerprint(&other));
}

#[test]
fn collected_signals_are_populated() {
    let signals = EnvironmentSignals::collect();
    assert!(signals.user_agent.starts_with("sypher/"));
    assert!(!signals.language.is_empty());
    assert!(signals.hardware_concurrency >= 1);
    assert!(!signals.timezone.is_empty());
}

#[test]
fn signals_serde_roundtrip() {
    let signals = desk_signals();
    let json = serde_json::to_string(&signals).unwrap();
    let parsed: EnvironmentSignals = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, signals);
}

// ── DeviceIdentity ───────────────────────────────────────────────

#[test]
fn first_call_persists_fingerprint() {
    let storage = Arc::new(MemoryDeviceStorage::new());
    let identity = DeviceIdentity::new(storage.clone(), desk_signals());

    let id = identity.current_device_id().unwrap();
    assert_eq!(id, fingerprint(&desk_signals()));
    assert_eq!(
        storage.get_item(DEVICE_ID_ITEM).unwrap().as_deref(),
        Some(id.as_str())
    );
}

#[test]
fn cached_id_wins_over_changed_environment() {
    let storage = Arc::new(MemoryDeviceStorage::new());
    let first = DeviceIdentity::new(storage.clone(), desk_signals())
        .current_device_id()
        .unwrap();

    let mut moved = desk_signals();
    moved.timezone = "Asia/Tokyo".to_string();
    let second = DeviceIdentity::new(storage, moved).current_device_id().unwrap();

    assert_eq!(first, second);
}

#[test]
fn with_id_pins_the_device() {
    let storage = Arc::new(MemoryDeviceStorage::new());
    let identity = DeviceIdentity::with_id(storage, &device("device_1a2b")).unwrap();
    assert_eq!(identity.current_device_id().unwrap(), device("device_1a2b"));
    assert_eq!(identity.signals(), &EnvironmentSignals::default());
}

#[test]
fn blank_cached_id_is_regenerated() {
    let storage = Arc::new(MemoryDeviceStorage::new());
    storage.set_item(DEVICE_ID_ITEM, "   ").unwrap();
    let identity = DeviceIdentity::new(storage, desk_signals());
    assert_eq!(identity.current_device_id().unwrap(), fingerprint(&desk_signals()));
}

// ── Collisions ───────────────────────────────────────────────────

#[tokio::test]
async fn identical_environments_are_the_same_device() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let laptop = manager_with_signals(Arc::clone(&store), desk_signals());
    let lookalike = manager_with_signals(Arc::clone(&store), desk_signals());

    let record = laptop.issue_license().await.unwrap();
    laptop.activate(&record.key).await.unwrap();

    // The second machine reports the same environment, so it hashes to the
    // same id and the license counts as already active there.
    let outcome = lookalike.activate(&record.key).await.unwrap();
    assert!(matches!(outcome, ActivationOutcome::AlreadyActive(_)));
    assert_eq!(
        laptop.current_device_id().unwrap(),
        lookalike.current_device_id().unwrap()
    );
}

proptest! {
    #[test]
    fn fingerprint_is_deterministic(
        ua in ".{0,40}",
        lang in "[a-z]{2}-[A-Z]{2}",
        cpus in 1u32..256,
        w in 0u32..8000,
        h in 0u32..8000,
        tz in "[A-Za-z/_]{1,30}",
    ) {
        let signals = EnvironmentSignals {
            user_agent: ua,
            language: lang,
            hardware_concurrency: cpus,
            screen_width: w,
            screen_height: h,
            color_depth: 24,
            timezone: tz,
        };
        let a = fingerprint(&signals);
        let b = fingerprint(&signals.clone());
        prop_assert_eq!(&a, &b);
        prop_assert!(a.as_str().starts_with(DEVICE_ID_PREFIX));
        prop_assert!(a.as_str()[DEVICE_ID_PREFIX.len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}

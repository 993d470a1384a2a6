use chrono::{TimeZone, Utc};
use sypher_types::{DeviceId, LicenseKey, LicenseRecord, LicenseStatus};

fn key(s: &str) -> LicenseKey {
    LicenseKey::parse(s).unwrap()
}

// ── LicenseStatus ────────────────────────────────────────────────

#[test]
fn status_wire_names() {
    assert_eq!(LicenseStatus::Inactive.as_str(), "inactive");
    assert_eq!(LicenseStatus::Active.as_str(), "active");
    assert_eq!(LicenseStatus::from("suspended").as_str(), "suspended");
}

#[test]
fn status_parses_known_values() {
    assert_eq!(LicenseStatus::from("active"), LicenseStatus::Active);
    assert_eq!(LicenseStatus::from("inactive"), LicenseStatus::Inactive);
    assert_eq!(
        LicenseStatus::from("revoked"),
        LicenseStatus::Other("revoked".to_string())
    );
}

#[test]
fn status_serde_as_plain_string() {
    let json = serde_json::to_string(&LicenseStatus::Active).unwrap();
    assert_eq!(json, r#""active""#);
    let parsed: LicenseStatus = serde_json::from_str(r#""trial""#).unwrap();
    assert_eq!(parsed, LicenseStatus::Other("trial".into()));
}

#[test]
fn only_inactive_is_inactive() {
    assert!(LicenseStatus::Inactive.is_inactive());
    assert!(!LicenseStatus::Active.is_inactive());
    assert!(!LicenseStatus::from("paused").is_inactive());
}

// ── LicenseRecord ────────────────────────────────────────────────

#[test]
fn new_record_is_inactive_and_unbound() {
    let now = Utc::now();
    let record = LicenseRecord::new(key("ABCD1234XXXXXXXX"), now);
    assert_eq!(record.status, LicenseStatus::Inactive);
    assert_eq!(record.created_at, now);
    assert!(record.device_id.is_none());
    assert!(record.activation_date.is_none());
    assert!(record.last_active.is_none());
    assert!(record.is_binding_consistent());
}

#[test]
fn bind_then_unbind() {
    let now = Utc::now();
    let device = DeviceId::parse("device_1a2b").unwrap();
    let mut record = LicenseRecord::new(key("K1"), now);

    record.bind(device.clone(), now);
    assert!(record.is_active());
    assert!(record.is_bound_to(&device));
    assert_eq!(record.activation_date, Some(now));
    assert_eq!(record.last_active, Some(now));
    assert!(record.is_binding_consistent());

    record.unbind();
    assert!(!record.is_bound_to(&device));
    assert!(record.activation_date.is_none());
    assert!(record.is_binding_consistent());
}

#[test]
fn json_uses_camel_case_and_nulls() {
    let created = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let record = LicenseRecord::new(key("K1"), created);
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["key"], "K1");
    assert_eq!(value["status"], "inactive");
    assert!(value["createdAt"].is_string());
    assert!(value["deviceId"].is_null());
    assert!(value["activationDate"].is_null());
    assert!(value["lastActive"].is_null());
}

#[test]
fn parses_browser_style_iso_timestamps() {
    let json = r#"{
        "key": "ABCD1234XXXXXXXX",
        "status": "active",
        "createdAt": "2025-01-02T03:04:05.678Z",
        "activationDate": "2025-01-03T00:00:00.000Z",
        "deviceId": "device_1a2b",
        "lastActive": "2025-01-03T00:00:00.000Z"
    }"#;
    let record: LicenseRecord = serde_json::from_str(json).unwrap();
    assert!(record.is_active());
    assert_eq!(record.device_id.as_ref().map(DeviceId::as_str), Some("device_1a2b"));
    assert!(record.extra.is_empty());
}

#[test]
fn missing_optional_fields_default_to_none() {
    let json = r#"{"key":"K","status":"inactive","createdAt":"2025-01-02T03:04:05Z"}"#;
    let record: LicenseRecord = serde_json::from_str(json).unwrap();
    assert!(record.device_id.is_none());
    assert!(record.activation_date.is_none());
}

#[test]
fn unknown_fields_are_preserved() {
    let json = r#"{
        "key": "K",
        "status": "inactive",
        "createdAt": "2025-01-02T03:04:05Z",
        "owner": "ops@example.com",
        "seats": 3
    }"#;
    let record: LicenseRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.extra["owner"], "ops@example.com");
    assert_eq!(record.extra["seats"], 3);

    let back = serde_json::to_value(&record).unwrap();
    assert_eq!(back["owner"], "ops@example.com");
    assert_eq!(back["seats"], 3);
}

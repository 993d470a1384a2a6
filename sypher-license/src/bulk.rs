//! Export, import and clearing of the whole record set.
//!
//! The export document is plain JSON:
//!
//! ```json
//! { "exportDate": "2025-06-01T12:00:00Z", "version": 1, "licenses": [ ... ] }
//! ```
//!
//! Import replaces the store contents. It is not atomic: the store is
//! cleared first and records are inserted one by one, so a storage failure
//! part-way through leaves a partial set. Take an export first if that
//! matters.

use crate::error::LicenseResult;
use crate::manager::LicenseManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sypher_storage::RecordStore;
use sypher_types::LicenseRecord;
use tracing::info;

/// Schema version written into exports.
pub const SCHEMA_VERSION: u32 = 1;

/// A snapshot of every license record plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: DateTime<Utc>,
    pub version: u32,
    pub licenses: Vec<LicenseRecord>,
}

/// Reads every record from `store` into an export document.
pub async fn export_all(store: &dyn RecordStore) -> LicenseResult<ExportDocument> {
    let licenses = store.get_all().await?;
    Ok(ExportDocument {
        export_date: Utc::now(),
        version: SCHEMA_VERSION,
        licenses,
    })
}

/// Replaces the contents of `store` with the records in `data["licenses"]`.
///
/// All records are decoded before anything is written, so a malformed
/// record fails the import with the store untouched. A missing or non-array
/// `licenses` field clears the store and inserts nothing. Duplicate keys in
/// the document keep the first occurrence. Records without `createdAt` are
/// stamped with the import time.
///
/// Returns the number of records in the store afterwards.
pub async fn import_all(store: &dyn RecordStore, data: &Value) -> LicenseResult<usize> {
    let imported_at = Utc::now();
    let records = match data.get("licenses").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .map(|item| decode_imported(item, imported_at))
            .collect::<LicenseResult<Vec<_>>>()?,
        None => Vec::new(),
    };
    insert_replacing(store, records).await
}

fn decode_imported(item: &Value, imported_at: DateTime<Utc>) -> LicenseResult<LicenseRecord> {
    let mut item = item.clone();
    if let Some(fields) = item.as_object_mut() {
        if fields.get("createdAt").is_none_or(Value::is_null) {
            fields.insert("createdAt".to_string(), serde_json::to_value(imported_at)?);
        }
    }
    Ok(serde_json::from_value(item)?)
}

/// Typed variant of [`import_all`].
pub async fn import_document(
    store: &dyn RecordStore,
    document: ExportDocument,
) -> LicenseResult<usize> {
    insert_replacing(store, document.licenses).await
}

/// Removes every record from `store`.
pub async fn clear_all(store: &dyn RecordStore) -> LicenseResult<()> {
    store.clear().await?;
    info!(backend = store.backend_name(), "all licenses cleared");
    Ok(())
}

async fn insert_replacing(
    store: &dyn RecordStore,
    records: Vec<LicenseRecord>,
) -> LicenseResult<usize> {
    let offered = records.len();
    store.clear().await?;
    for record in records {
        store.create(record).await?;
    }
    let count = store.count().await?;
    info!(offered, imported = count, "licenses imported");
    Ok(count)
}

impl LicenseManager {
    /// Snapshots every record. See [`export_all`].
    pub async fn export_all(&self) -> LicenseResult<ExportDocument> {
        export_all(self.store().as_ref()).await
    }

    /// Replaces every record from an export-shaped JSON value. See [`import_all`].
    pub async fn import_all(&self, data: &Value) -> LicenseResult<usize> {
        import_all(self.store().as_ref(), data).await
    }

    /// Replaces every record from a typed export. See [`import_document`].
    pub async fn import_document(&self, document: ExportDocument) -> LicenseResult<usize> {
        import_document(self.store().as_ref(), document).await
    }

    /// Removes every record. See [`clear_all`].
    pub async fn clear_all(&self) -> LicenseResult<()> {
        clear_all(self.store().as_ref()).await
    }
}

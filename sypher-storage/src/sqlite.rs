//! SQLite-backed record store.
//!
//! Each record is kept as a JSON document in the `data` column so fields
//! this version does not know about survive. `status`, `device_id` and
//! `activation_date` are mirrored into columns for indexed lookups.
//!
//! The connection is opened on first use and reused afterwards. A failed
//! open is reported to the caller that triggered it; the next call tries
//! again.

use crate::error::{StorageError, StorageResult};
use crate::record_store::RecordStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sypher_types::{DeviceId, LicenseKey, LicenseRecord, LicenseStatus};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS licenses (
        key TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        device_id TEXT,
        activation_date TEXT,
        created_at TEXT NOT NULL,
        data TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_licenses_status ON licenses(status);
    CREATE INDEX IF NOT EXISTS idx_licenses_activation_date ON licenses(activation_date);
    CREATE UNIQUE INDEX IF NOT EXISTS idx_licenses_device
        ON licenses(device_id) WHERE device_id IS NOT NULL;
";

const SELECT_DATA: &str = "SELECT data FROM licenses";

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// A [`RecordStore`] persisted in a SQLite database file.
pub struct SqliteRecordStore {
    location: Location,
    conn: OnceCell<Arc<Mutex<Connection>>>,
}

impl SqliteRecordStore {
    /// Creates a store for the database at `path`. Nothing is opened until
    /// the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: OnceCell::new(),
        }
    }

    /// Creates a store backed by a private in-memory database (for testing).
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: OnceCell::new(),
        }
    }

    /// Creates a store for `path` and opens it immediately.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let store = Self::new(path);
        store.connection().await?;
        Ok(store)
    }

    /// Returns the database path, or `None` for in-memory stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    async fn connection(&self) -> StorageResult<Arc<Mutex<Connection>>> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let location = self.location.clone();
                let conn = tokio::task::spawn_blocking(move || open_connection(&location))
                    .await?
                    .inspect_err(|e| warn!("license store open failed: {e}"))?;
                Ok::<_, StorageError>(Arc::new(Mutex::new(conn)))
            })
            .await?;
        Ok(Arc::clone(conn))
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection().await?;
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&mut guard)
        })
        .await?
    }
}

fn open_connection(location: &Location) -> StorageResult<Connection> {
    let conn = match location {
        Location::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            debug!(path = %path.display(), "opening license store");
            Connection::open(path)
                .map_err(|e| StorageError::Open(format!("{}: {e}", path.display())))?
        }
        Location::Memory => Connection::open_in_memory()
            .map_err(|e| StorageError::Open(format!("in-memory database: {e}")))?,
    };
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(SCHEMA)
        .map_err(|e| StorageError::Open(format!("failed to init license schema: {e}")))?;
    Ok(conn)
}

/// Turns SQLite constraint failures into [`StorageError::Constraint`].
fn map_write_err(e: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(err, msg) = &e {
        if err.code == ErrorCode::ConstraintViolation {
            return StorageError::Constraint(msg.clone().unwrap_or_else(|| err.to_string()));
        }
    }
    StorageError::Database(e)
}

/// Column values mirrored out of a record.
struct Row {
    key: String,
    status: String,
    device_id: Option<String>,
    activation_date: Option<String>,
    created_at: String,
    data: String,
}

impl Row {
    fn from_record(record: &LicenseRecord) -> StorageResult<Self> {
        Ok(Self {
            key: record.key.to_string(),
            status: record.status.to_string(),
            device_id: record.device_id.as_ref().map(ToString::to_string),
            activation_date: record.activation_date.map(|d| d.to_rfc3339()),
            created_at: record.created_at.to_rfc3339(),
            data: serde_json::to_string(record)?,
        })
    }
}

fn decode(data: &str) -> StorageResult<LicenseRecord> {
    Ok(serde_json::from_str(data)?)
}

fn query_records(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StorageResult<Vec<LicenseRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;
    let mut records = Vec::new();
    for data in rows {
        records.push(decode(&data?)?);
    }
    Ok(records)
}

fn query_one(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StorageResult<Option<LicenseRecord>> {
    let data: Option<String> = conn
        .query_row(sql, params, |row| row.get(0))
        .optional()?;
    data.as_deref().map(decode).transpose()
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &LicenseKey) -> StorageResult<Option<LicenseRecord>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            query_one(conn, &format!("{SELECT_DATA} WHERE key = ?1"), params![key])
        })
        .await
    }

    async fn get_all(&self) -> StorageResult<Vec<LicenseRecord>> {
        self.with_conn(|conn| query_records(conn, &format!("{SELECT_DATA} ORDER BY key"), []))
            .await
    }

    async fn get_by_device(&self, device: &DeviceId) -> StorageResult<Option<LicenseRecord>> {
        let device = device.to_string();
        self.with_conn(move |conn| {
            query_one(
                conn,
                &format!("{SELECT_DATA} WHERE device_id = ?1"),
                params![device],
            )
        })
        .await
    }

    async fn get_by_status(&self, status: &LicenseStatus) -> StorageResult<Vec<LicenseRecord>> {
        let status = status.to_string();
        self.with_conn(move |conn| {
            query_records(
                conn,
                &format!("{SELECT_DATA} WHERE status = ?1 ORDER BY key"),
                params![status],
            )
        })
        .await
    }

    async fn create(&self, record: LicenseRecord) -> StorageResult<LicenseRecord> {
        let row = Row::from_record(&record)?;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let inserted = tx
                .execute(
                    "INSERT INTO licenses (key, status, device_id, activation_date, created_at, data)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(key) DO NOTHING",
                    params![
                        row.key,
                        row.status,
                        row.device_id,
                        row.activation_date,
                        row.created_at,
                        row.data
                    ],
                )
                .map_err(map_write_err)?;

            let result = if inserted == 0 {
                debug!(key = %row.key, "license already exists, keeping stored record");
                query_one(&tx, &format!("{SELECT_DATA} WHERE key = ?1"), params![row.key])?
                    .unwrap_or(record)
            } else {
                record
            };
            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn put(&self, record: &LicenseRecord) -> StorageResult<()> {
        let row = Row::from_record(record)?;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO licenses (key, status, device_id, activation_date, created_at, data)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(key) DO UPDATE SET
                     status = excluded.status,
                     device_id = excluded.device_id,
                     activation_date = excluded.activation_date,
                     created_at = excluded.created_at,
                     data = excluded.data",
                params![
                    row.key,
                    row.status,
                    row.device_id,
                    row.activation_date,
                    row.created_at,
                    row.data
                ],
            )
            .map_err(map_write_err)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &LicenseKey) -> StorageResult<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM licenses WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM licenses", [])?;
            Ok(())
        })
        .await
    }

    async fn count(&self) -> StorageResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM licenses", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }
}

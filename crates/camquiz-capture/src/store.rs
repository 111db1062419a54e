//! Append-only store of captured descriptor payloads.
//!
//! Records are written once under a fresh key and never updated. Readers
//! scan by key prefix; [`history`] orders the captures newest first.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{CaptureError, CaptureResult};

/// Key prefix for captured descriptor records.
pub const KEY_PREFIX: &str = "xml_data_";

/// One captured payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedRecord {
    /// Completion time of the fetch, serialized as ISO-8601.
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
    pub raw_xml: String,
}

impl CapturedRecord {
    pub fn new(source_url: impl Into<String>, raw_xml: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            source_url: source_url.into(),
            raw_xml: raw_xml.into(),
        }
    }
}

/// A record together with its store key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub key: String,
    pub record: CapturedRecord,
}

/// Append-only key-value store of captured records.
pub trait RecordStore: Send + Sync {
    /// Append a record under a freshly generated key and return the key.
    fn append(&self, record: &CapturedRecord) -> CaptureResult<String>;

    fn get(&self, key: &str) -> CaptureResult<Option<CapturedRecord>>;

    /// All records whose key starts with `prefix`, in append order.
    fn scan_prefix(&self, prefix: &str) -> CaptureResult<Vec<StoredRecord>>;
}

/// Generate a fresh record key.
pub fn new_key() -> String {
    format!("{KEY_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

/// All captured records, newest first.
pub fn history(store: &dyn RecordStore) -> CaptureResult<Vec<StoredRecord>> {
    let mut records = store.scan_prefix(KEY_PREFIX)?;
    // Stable sort keeps append order for equal timestamps; reverse that too
    records.reverse();
    records.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
    Ok(records)
}

/// The most recent captured record, if any.
pub fn latest(store: &dyn RecordStore) -> CaptureResult<Option<StoredRecord>> {
    Ok(history(store)?.into_iter().next())
}

/// The most recent record, if its source URL contains `path`.
///
/// Only the newest record is considered: an older capture of the same
/// page is not surfaced once another page has been captured since.
pub fn latest_for_path(
    store: &dyn RecordStore,
    path: &str,
) -> CaptureResult<Option<StoredRecord>> {
    Ok(latest(store)?.filter(|stored| stored.record.source_url.contains(path)))
}

/// In-memory store, used by tests and one-shot runs.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StoredRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn append(&self, record: &CapturedRecord) -> CaptureResult<String> {
        let key = new_key();
        self.lock().push(StoredRecord {
            key: key.clone(),
            record: record.clone(),
        });
        Ok(key)
    }

    fn get(&self, key: &str) -> CaptureResult<Option<CapturedRecord>> {
        Ok(self
            .lock()
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.record.clone()))
    }

    fn scan_prefix(&self, prefix: &str) -> CaptureResult<Vec<StoredRecord>> {
        Ok(self
            .lock()
            .iter()
            .filter(|r| r.key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// SQLite-backed store.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at `path`.
    pub fn open(path: &Path) -> CaptureResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Connection::open(path)?;
        Self::init(db)
    }

    /// Store that lives only as long as the process.
    pub fn open_in_memory() -> CaptureResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> CaptureResult<Self> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                source_url TEXT NOT NULL,
                raw_xml TEXT NOT NULL
            );",
        )?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_timestamp(key: &str, raw: &str) -> CaptureResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CaptureError::CorruptRecord {
            key: key.to_string(),
            message: format!("bad timestamp {raw:?}: {e}"),
        })
}

impl RecordStore for SqliteStore {
    fn append(&self, record: &CapturedRecord) -> CaptureResult<String> {
        let key = new_key();
        self.lock().execute(
            "INSERT INTO records (key, timestamp, source_url, raw_xml)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                key,
                record.timestamp.to_rfc3339(),
                record.source_url,
                record.raw_xml
            ],
        )?;
        Ok(key)
    }

    fn get(&self, key: &str) -> CaptureResult<Option<CapturedRecord>> {
        let row = self
            .lock()
            .query_row(
                "SELECT timestamp, source_url, raw_xml FROM records WHERE key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((ts, source_url, raw_xml)) => Ok(Some(CapturedRecord {
                timestamp: parse_timestamp(key, &ts)?,
                source_url,
                raw_xml,
            })),
            None => Ok(None),
        }
    }

    fn scan_prefix(&self, prefix: &str) -> CaptureResult<Vec<StoredRecord>> {
        let db = self.lock();
        // substr comparison, since LIKE treats '_' in the prefix as a wildcard
        let mut stmt = db.prepare(
            "SELECT key, timestamp, source_url, raw_xml FROM records
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![prefix], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (key, ts, source_url, raw_xml) = row?;
            let timestamp = match parse_timestamp(&key, &ts) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(key = %key, "skipping record: {e}");
                    continue;
                }
            };
            records.push(StoredRecord {
                key,
                record: CapturedRecord {
                    timestamp,
                    source_url,
                    raw_xml,
                },
            });
        }
        Ok(records)
    }
}

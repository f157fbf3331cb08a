//! Snapshot persistence for defectscope
//!
//! A small SQLite-backed key-value store holding the imported issue
//! collection and its derived snapshots between runs. Values are JSON
//! documents; there is no schema versioning of the payloads, so readers
//! tolerate absent or malformed values by returning `None` and letting
//! the caller fall back to recomputation or the empty state.

use crate::error::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;

/// Well-known snapshot keys.
pub mod keys {
    /// The imported issue collection
    pub const ISSUES: &str = "issues";
    /// The derived issue index
    pub const INDEX: &str = "index";
    /// The derived statistics snapshot
    pub const STATISTICS: &str = "statistics";
    /// Timestamp of the last successful import
    pub const DATA_UPDATED: &str = "data_updated";
    /// Content hash of the last imported export
    pub const IMPORT_HASH: &str = "import_hash";
    /// Persisted configuration overrides
    pub const CONFIG: &str = "config";
    /// UI theme name
    pub const THEME: &str = "theme";
}

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: key-value snapshot table
    r#"
    CREATE TABLE IF NOT EXISTS kv (
        key        TEXT PRIMARY KEY,
        value      TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
];

/// Key-value snapshot store handle (single connection).
pub struct SnapshotStore {
    conn: Mutex<Connection>,
}

impl SnapshotStore {
    /// Open or create a store at the given path.
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this store.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let current: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        for version in (current + 1)..=SCHEMA_VERSION {
            let migration = MIGRATIONS[(version - 1) as usize];
            conn.execute_batch(migration)?;
            conn.pragma_update(None, "user_version", version)?;
            tracing::info!(version, "Applied snapshot store migration");
        }

        Ok(())
    }

    /// Read the raw JSON text for a key.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Read and decode a JSON value.
    ///
    /// A malformed payload is logged and treated as absent, so a corrupt
    /// snapshot degrades to recomputation instead of an error.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding malformed snapshot value");
                Ok(None)
            }
        }
    }

    /// Encode and write a JSON value.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, raw, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// When a key was last written.
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let raw: Option<String> = conn
            .query_row(
                "SELECT updated_at FROM kv WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc))
        }))
    }

    /// Remove one key. Returns true when something was deleted.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// Drop all persisted snapshots.
    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM kv", [])?;
        tracing::info!("Snapshot store cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SnapshotStore {
        let store = SnapshotStore::open_in_memory().expect("open in-memory store");
        store.migrate().expect("migrate");
        store
    }

    #[test]
    fn test_roundtrip() {
        let store = store();
        store
            .put_json(keys::THEME, &json!("dark"))
            .expect("put theme");
        assert_eq!(
            store.get_json::<serde_json::Value>(keys::THEME).unwrap(),
            Some(json!("dark"))
        );
        assert!(store.updated_at(keys::THEME).unwrap().is_some());
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let store = store();
        store.put_json(keys::IMPORT_HASH, &json!("aaa")).unwrap();
        store.put_json(keys::IMPORT_HASH, &json!("bbb")).unwrap();
        assert_eq!(
            store
                .get_json::<serde_json::Value>(keys::IMPORT_HASH)
                .unwrap(),
            Some(json!("bbb"))
        );
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = store();
        assert_eq!(
            store.get_json::<serde_json::Value>(keys::ISSUES).unwrap(),
            None
        );
        assert_eq!(store.updated_at(keys::ISSUES).unwrap(), None);
    }

    #[test]
    fn test_malformed_value_degrades_to_none() {
        let store = store();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![keys::STATISTICS, "{not json", Utc::now().to_rfc3339()],
            )
            .unwrap();
        }
        assert_eq!(
            store
                .get_json::<serde_json::Value>(keys::STATISTICS)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_delete_and_clear() {
        let store = store();
        store.put_json(keys::THEME, &json!("dark")).unwrap();
        assert!(store.delete(keys::THEME).unwrap());
        assert!(!store.delete(keys::THEME).unwrap());

        store.put_json(keys::ISSUES, &json!([])).unwrap();
        store.put_json(keys::THEME, &json!("light")).unwrap();
        store.clear().unwrap();
        assert_eq!(
            store.get_json::<serde_json::Value>(keys::ISSUES).unwrap(),
            None
        );
    }

    #[test]
    fn test_migrate_twice_is_idempotent() {
        let store = store();
        store.migrate().expect("second migrate");
    }
}

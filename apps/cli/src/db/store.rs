//! Key-value medium backed by a single SQLite table.

use crate::db::error::DbError;
use crate::db::schema::{INIT_SCHEMA_VERSION, SCHEMA, SCHEMA_VERSION};
use review_core::{KeyValueStore, StoreError};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

type Result<T> = std::result::Result<T, DbError>;

/// SQLite implementation of [`KeyValueStore`]. Keys enumerate in byte order.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.conn.execute_batch(INIT_SCHEMA_VERSION)?;

        let found: i32 = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
        if found != SCHEMA_VERSION {
            return Err(DbError::SchemaVersion {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(DbError::from)?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(DbError::from)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> std::result::Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(DbError::from)?;
        Ok(())
    }

    fn len(&self) -> std::result::Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .map_err(DbError::from)?;
        Ok(count as usize)
    }

    fn key(&self, index: usize) -> std::result::Result<Option<String>, StoreError> {
        let key = self
            .conn
            .query_row(
                "SELECT key FROM kv ORDER BY key LIMIT 1 OFFSET ?1",
                params![index as i64],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)?;
        Ok(key)
    }

    fn keys(&self) -> std::result::Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv ORDER BY key")
            .map_err(DbError::from)?;
        let keys = stmt
            .query_map([], |row| row.get(0))
            .map_err(DbError::from)?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(DbError::from)?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_get_remove() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.is_empty().unwrap());

        store.set("vocab:anna:review_haus_A→B", "{}").unwrap();
        store.set("vocab:anna:review_haus_A→B", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get("vocab:anna:review_haus_A→B").unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(store.len().unwrap(), 1);

        store.remove("vocab:anna:review_haus_A→B").unwrap();
        assert_eq!(store.get("vocab:anna:review_haus_A→B").unwrap(), None);
        store.remove("missing").unwrap();
    }

    #[test]
    fn ordinal_enumeration_matches_keys() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for key in ["c", "a", "b"] {
            store.set(key, "1").unwrap();
        }
        assert_eq!(store.key(0).unwrap().as_deref(), Some("a"));
        assert_eq!(store.key(2).unwrap().as_deref(), Some("c"));
        assert_eq!(store.key(3).unwrap(), None);
        assert_eq!(store.keys().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn reopening_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("k", "v").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}

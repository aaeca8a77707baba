use anyhow::{Context, Result};
use log::{debug, info};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use std::path::Path;

use super::KeyValueStore;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// Snapshots kept as rows of a single key/value table
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = build_pool(manager)?;
        let store = Self { pool };
        store.setup()?;
        info!("Opened SQLite storage at {}", path.as_ref().display());
        Ok(store)
    }

    fn setup(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(SCHEMA, [])
            .context("Failed to create kv table")
            .map(|_| ())
    }

    fn connection(&self) -> Result<DbConn> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

fn build_pool(manager: SqliteConnectionManager) -> Result<DbPool> {
    r2d2::Pool::builder()
        .max_size(1)
        .build(manager)
        .context("Failed to create database connection pool")
}

fn upsert(conn: &rusqlite::Connection, key: &str, value: &Value) -> Result<()> {
    let sql = "INSERT INTO kv (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP";
    let json = serde_json::to_string(value)?;
    conn.execute(sql, params![key, json])
        .with_context(|| format!("Failed to save {}", key))?;
    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn load_value(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.connection()?;
        let text: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to query {}", key))?;

        text.map(|json| {
            serde_json::from_str(&json).with_context(|| format!("Failed to parse stored {}", key))
        })
        .transpose()
    }

    fn save_value(&mut self, key: &str, value: &Value) -> Result<()> {
        let conn = self.connection()?;
        upsert(&conn, key, value)?;
        debug!("Saved {} to SQLite", key);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .with_context(|| format!("Failed to remove {}", key))?;
        Ok(())
    }

    fn commit(&mut self, entries: &[(&str, Value)]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        for (key, value) in entries {
            upsert(&tx, key, value)?;
        }
        tx.commit().context("Failed to commit transaction")?;
        debug!("Committed {} keys to SQLite", entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_load_overwrite_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("ledger.db")).unwrap();

        assert!(store.load_value("players").unwrap().is_none());

        store.save_value("players", &json!({"Anna": 1})).unwrap();
        store.save_value("players", &json!({"Anna": 2})).unwrap();
        assert_eq!(store.load_value("players").unwrap(), Some(json!({"Anna": 2})));

        store.remove("players").unwrap();
        assert!(store.load_value("players").unwrap().is_none());
    }

    #[test]
    fn commit_writes_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SqliteStore::open(dir.path().join("ledger.db")).unwrap();

        store
            .commit(&[("a", json!([1])), ("b", json!({"x": true}))])
            .unwrap();

        assert_eq!(store.load_value("a").unwrap(), Some(json!([1])));
        assert_eq!(store.load_value("b").unwrap(), Some(json!({"x": true})));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save_value("games", &json!([])).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_value("games").unwrap(), Some(json!([])));
    }
}

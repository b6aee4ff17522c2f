use rusqlite::{Connection, OptionalExtension};

use crate::SqliteKv;
use crate::error::KvError;
use crate::kv::KvBackend;

impl SqliteKv {
    pub fn get_value(&self, key: &str) -> Result<Option<String>, KvError> {
        self.with_conn(|conn| query_value(conn, key))
    }

    pub fn put_value(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                (key, value),
            )?;
            Ok(())
        })
    }

    /// Returns whether a row was actually deleted.
    pub fn delete_value(&self, key: &str) -> Result<bool, KvError> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM kv_entries WHERE key = ?1", [key])?;
            Ok(n > 0)
        })
    }
}

fn query_value(conn: &Connection, key: &str) -> Result<Option<String>, KvError> {
    let value = conn
        .query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value)
}

// Blocking SQLite calls run off the async runtime.
impl KvBackend for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let db = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || db.get_value(&key)).await?
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        let db = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || db.put_value(&key, &value)).await?
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        let db = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || db.delete_value(&key).map(|_| ())).await?
    }
}

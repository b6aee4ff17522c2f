pub mod error;
pub mod file;
pub mod kv;
pub mod memory;
pub mod migrations;
pub mod queries;
pub mod store;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub use error::{KvError, StoreError};
pub use file::FileKv;
pub use kv::KvBackend;
pub use memory::MemoryKv;
pub use store::{LISTINGS_KEY, ListingStore};

/// SQLite-backed key-value store.
///
/// Values live in a single `kv_entries` table. Cloning shares the
/// connection.
#[derive(Clone)]
pub struct SqliteKv {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKv {
    pub fn open(path: &Path) -> Result<Self, KvError> {
        let conn = Connection::open(path)?;

        // WAL so a reader in another process is not blocked by our writes
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Key-value database opened at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, KvError> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, KvError>
    where
        F: FnOnce(&Connection) -> Result<T, KvError>,
    {
        let conn = self.conn.lock().map_err(|_| KvError::Poisoned)?;
        f(&conn)
    }
}

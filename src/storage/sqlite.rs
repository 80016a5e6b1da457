//! SqliteCache — durable cache backed by a single SQLite key-value table.
//!
//! Native counterpart of the browser's local storage: one row per name,
//! surviving process restarts when opened on a file.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;

use super::traits::BlobStorage;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS kv (
        name  TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );
";

pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl BlobStorage for SqliteCache {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StorageError> {
        self.conn.lock().execute(
            "INSERT INTO kv (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, blob],
        )?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE name = ?1", params![name])?;
        Ok(())
    }
}

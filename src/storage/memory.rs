//! In-process blob storage.
//!
//! Used as the durable cache when nothing better exists, and as the fake
//! backend in tests. A forced failure can be installed to simulate quota or
//! permission errors.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::StorageError;

use super::traits::BlobStorage;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: Mutex<HashMap<String, String>>,
    /// When set, every call fails with this error.
    failure: Mutex<Option<StorageError>>,
    writes: Mutex<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob without counting it as a write.
    pub fn with_blob(self, name: &str, blob: &str) -> Self {
        self.blobs.lock().insert(name.to_string(), blob.to_string());
        self
    }

    /// Make every subsequent call fail with `error`, or clear with `None`.
    pub fn set_failure(&self, error: Option<StorageError>) {
        *self.failure.lock() = error;
    }

    /// Number of successful `set` and `remove` calls.
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }

    /// Current blob, bypassing any forced failure.
    pub fn peek(&self, name: &str) -> Option<String> {
        self.blobs.lock().get(name).cloned()
    }

    fn check(&self) -> Result<(), StorageError> {
        match self.failure.lock().as_ref() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl BlobStorage for MemoryStorage {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.blobs.lock().get(name).cloned())
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StorageError> {
        self.check()?;
        self.blobs.lock().insert(name.to_string(), blob.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.check()?;
        self.blobs.lock().remove(name);
        *self.writes.lock() += 1;
        Ok(())
    }
}

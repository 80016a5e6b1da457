//! Storage traits: the blob backend contract and the orchestrator contract.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::codec::Decoded;
use crate::error::StorageError;
use crate::schema::Schema;

// ============================================================================
// BlobStorage — one opaque text blob per name
// ============================================================================

/// A backend holding opaque text blobs by name.
///
/// Implemented by the shareable-parameter and durable-cache adapters. All
/// calls are synchronous; failures are reported, never panicked.
pub trait BlobStorage: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, name: &str, blob: &str) -> Result<(), StorageError>;
    fn remove(&self, name: &str) -> Result<(), StorageError>;
}

impl<T: BlobStorage + ?Sized> BlobStorage for Arc<T> {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StorageError> {
        (**self).set(name, blob)
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        (**self).remove(name)
    }
}

// ============================================================================
// PersistStorage — what the persisted store talks to
// ============================================================================

/// Which backend a hydrated state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Param,
    Cache,
}

/// A decoded state together with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub source: Source,
    pub decoded: Decoded,
}

/// Outcome of a write or remove across both backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteReport {
    pub param: bool,
    pub cache: bool,
}

impl WriteReport {
    pub fn all(&self) -> bool {
        self.param && self.cache
    }
}

/// Fail-open state persistence keyed by name.
///
/// Nothing here returns an error: decode and storage failures are logged and
/// surface as "no prior state" or an unsuccessful `WriteReport`.
pub trait PersistStorage: Send + Sync {
    /// Tracked fields, in wire order.
    fn schema(&self) -> &Schema;
    fn get(&self, name: &str) -> Option<Loaded>;
    fn set(&self, name: &str, state: &Map<String, Value>, version: u64) -> WriteReport;
    fn remove(&self, name: &str) -> WriteReport;
}

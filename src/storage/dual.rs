//! DualStorage — shareable parameter first, durable cache second.
//!
//! Load prefers the parameter; a parameter blob that decodes is written
//! through to the cache so an opened link replaces the local state. Writes
//! go to both backends independently. Every failure is logged and dropped.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::codec::{Codec, Decoded};
use crate::schema::Schema;

use super::traits::{BlobStorage, Loaded, PersistStorage, Source, WriteReport};

pub struct DualStorage<P: BlobStorage, C: BlobStorage> {
    param: P,
    cache: C,
    codec: Codec,
}

impl<P: BlobStorage, C: BlobStorage> DualStorage<P, C> {
    pub fn new(param: P, cache: C, codec: Codec) -> Self {
        Self {
            param,
            cache,
            codec,
        }
    }

    pub fn param(&self) -> &P {
        &self.param
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Load the authoritative state, or `None` for "no prior state".
    pub fn get(&self, name: &str) -> Option<Loaded> {
        if let Some(blob) = read(&self.param, name, Source::Param) {
            match self.codec.decode(&blob) {
                Ok(decoded) => {
                    debug!(name, "hydrating from shareable parameter");
                    if let Err(e) = self.cache.set(name, &blob) {
                        warn!(name, error = %e, "failed to write parameter state through to cache");
                    }
                    return Some(Loaded {
                        source: Source::Param,
                        decoded,
                    });
                }
                Err(e) => {
                    warn!(name, error = %e, "discarding undecodable shareable parameter");
                }
            }
        }

        let blob = read(&self.cache, name, Source::Cache)?;
        match self.codec.decode(&blob) {
            Ok(decoded) => {
                debug!(name, "hydrating from durable cache");
                Some(Loaded {
                    source: Source::Cache,
                    decoded,
                })
            }
            Err(e) => {
                warn!(name, error = %e, "discarding undecodable cached state");
                None
            }
        }
    }

    /// Encode `state` once and write the blob to both backends.
    pub fn set(&self, name: &str, state: &Map<String, Value>, version: u64) -> WriteReport {
        match self.codec.encode(state, version) {
            Ok(blob) => self.set_blob(name, &blob),
            Err(e) => {
                warn!(name, error = %e, "failed to encode state; nothing written");
                WriteReport::default()
            }
        }
    }

    /// Write an already-encoded blob to both backends.
    pub fn set_blob(&self, name: &str, blob: &str) -> WriteReport {
        let param = match self.param.set(name, blob) {
            Ok(()) => true,
            Err(e) => {
                warn!(name, error = %e, "failed to write shareable parameter");
                false
            }
        };
        let cache = match self.cache.set(name, blob) {
            Ok(()) => true,
            Err(e) => {
                warn!(name, error = %e, "failed to write durable cache");
                false
            }
        };
        WriteReport { param, cache }
    }

    pub fn remove(&self, name: &str) -> WriteReport {
        let param = match self.param.remove(name) {
            Ok(()) => true,
            Err(e) => {
                warn!(name, error = %e, "failed to remove shareable parameter");
                false
            }
        };
        let cache = match self.cache.remove(name) {
            Ok(()) => true,
            Err(e) => {
                warn!(name, error = %e, "failed to remove durable cache entry");
                false
            }
        };
        WriteReport { param, cache }
    }

    /// Decode whatever one backend holds, ignoring the other.
    pub fn peek(&self, name: &str, source: Source) -> Option<Decoded> {
        let blob = match source {
            Source::Param => read(&self.param, name, source),
            Source::Cache => read(&self.cache, name, source),
        }?;
        self.codec.decode(&blob).ok()
    }
}

/// Read a blob, treating a failing backend as empty.
fn read<B: BlobStorage>(backend: &B, name: &str, source: Source) -> Option<String> {
    match backend.get(name) {
        Ok(blob) => blob,
        Err(e) => {
            warn!(name, ?source, error = %e, "storage read failed; treating as empty");
            None
        }
    }
}

impl<P: BlobStorage, C: BlobStorage> PersistStorage for DualStorage<P, C> {
    fn schema(&self) -> &Schema {
        self.codec.schema()
    }

    fn get(&self, name: &str) -> Option<Loaded> {
        DualStorage::get(self, name)
    }

    fn set(&self, name: &str, state: &Map<String, Value>, version: u64) -> WriteReport {
        DualStorage::set(self, name, state, version)
    }

    fn remove(&self, name: &str) -> WriteReport {
        DualStorage::remove(self, name)
    }
}

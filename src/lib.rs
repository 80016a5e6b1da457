//! Shareable, cache-backed UI state.
//!
//! A fixed subset of state is packed positionally into a versioned CBOR
//! envelope, carried as base64url text in a URL query parameter, and mirrored
//! into a durable local cache. On load the link wins over the cache; broken
//! blobs fall back to defaults and never surface as errors.

pub mod analysis;
pub mod codec;
pub mod config;
pub mod error;
pub mod schema;
pub mod storage;
pub mod store;

pub use codec::{decode, encode, Codec, Decoded, LengthPolicy, MAX_BLOB_LEN};
pub use config::{Migrate, PersistOptions};
pub use error::{DecodeError, EncodeError, SchemaError, StorageError};
pub use schema::{Field, FieldType, Schema, SchemaBuilder};
pub use storage::dual::DualStorage;
pub use storage::location::LocationParam;
pub use storage::memory::MemoryStorage;
#[cfg(feature = "sqlite")]
pub use storage::sqlite::SqliteCache;
pub use storage::traits::{BlobStorage, Loaded, PersistStorage, Source, WriteReport};
pub use store::{Listener, PersistedStore, Subscription};

//! Options for a persisted store.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Upgrade a stored state written under `from_version`.
///
/// Returning `None` discards the stored state so defaults apply.
pub type Migrate =
    Arc<dyn Fn(Map<String, Value>, u64) -> Option<Map<String, Value>> + Send + Sync>;

#[derive(Clone)]
pub struct PersistOptions {
    /// Logical name shared by the query parameter and the cache key.
    pub name: String,
    /// Version written into every envelope.
    pub version: u64,
    /// Run when a stored envelope carries a different version.
    pub migrate: Option<Migrate>,
}

impl PersistOptions {
    pub fn new(name: impl Into<String>, version: u64) -> Self {
        Self {
            name: name.into(),
            version,
            migrate: None,
        }
    }

    pub fn with_migrate(
        mut self,
        migrate: impl Fn(Map<String, Value>, u64) -> Option<Map<String, Value>> + Send + Sync + 'static,
    ) -> Self {
        self.migrate = Some(Arc::new(migrate));
        self
    }
}

impl fmt::Debug for PersistOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistOptions")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("migrate", &self.migrate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

//! PersistedStore — a reactive state container that hydrates from and writes
//! through to a `PersistStorage`.
//!
//! Only the fields named in the storage schema are persisted. Every other
//! field of `S` is transient: it starts from the defaults and is never
//! written. Hydration never writes.
//!
//! Mutations and hydrations are serialized by a write-order lock held across
//! the storage write, so the last mutation is also the last write.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::codec::Decoded;
use crate::config::PersistOptions;
use crate::storage::traits::{PersistStorage, WriteReport};

/// Callback invoked with the new state after each change.
pub type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

type Listeners<S> = Mutex<Vec<(u64, Listener<S>)>>;

// ============================================================================
// Subscription
// ============================================================================

/// Handle for a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription<S> {
    id: u64,
    listeners: Weak<Listeners<S>>,
}

impl<S> Subscription<S> {
    pub fn unsubscribe(self) {}
}

impl<S> Drop for Subscription<S> {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

// ============================================================================
// PersistedStore
// ============================================================================

pub struct PersistedStore<S> {
    storage: Arc<dyn PersistStorage>,
    options: PersistOptions,
    defaults: S,
    state: Mutex<S>,
    write_order: Mutex<()>,
    listeners: Arc<Listeners<S>>,
    next_listener: AtomicU64,
    hydrated: AtomicBool,
}

impl<S> PersistedStore<S>
where
    S: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Build the store and hydrate it from `storage`.
    ///
    /// Tracked fields found in storage overwrite `defaults`; fields missing
    /// from an older, shorter envelope keep their default.
    pub fn new(storage: Arc<dyn PersistStorage>, options: PersistOptions, defaults: S) -> Self {
        let store = Self {
            storage,
            options,
            state: Mutex::new(defaults.clone()),
            defaults,
            write_order: Mutex::new(()),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener: AtomicU64::new(0),
            hydrated: AtomicBool::new(false),
        };
        let found = store.hydrate();
        store.hydrated.store(found, Ordering::Relaxed);
        store
    }

    pub fn options(&self) -> &PersistOptions {
        &self.options
    }

    /// Whether the last hydration found a prior state.
    pub fn has_hydrated(&self) -> bool {
        self.hydrated.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> S {
        self.state.lock().clone()
    }

    /// Read the state without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.lock())
    }

    /// Mutate the state, persist the tracked subset if it changed, then
    /// notify listeners.
    ///
    /// `f` runs under the state lock and must not call back into the store.
    /// Listeners run after the write, outside both locks.
    pub fn set(&self, f: impl FnOnce(&mut S)) {
        let after = {
            let _order = self.write_order.lock();
            let (before, after) = {
                let mut state = self.state.lock();
                let before = self.tracked(&state);
                f(&mut state);
                (before, state.clone())
            };

            if let Some(tracked) = self.tracked(&after) {
                if before.as_ref() != Some(&tracked) {
                    self.storage
                        .set(&self.options.name, &tracked, self.options.version);
                }
            }
            after
        };
        self.notify(&after);
    }

    /// Replace the whole state.
    pub fn replace(&self, next: S) {
        self.set(|state| *state = next);
    }

    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> Subscription<S> {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Re-read storage (e.g. after the location changed) and notify
    /// listeners. Never writes.
    pub fn rehydrate(&self) -> bool {
        let found = self.hydrate();
        self.hydrated.store(found, Ordering::Relaxed);
        let snapshot = self.state();
        self.notify(&snapshot);
        found
    }

    /// Remove the persisted copies. The in-memory state is left as is.
    pub fn clear_storage(&self) -> WriteReport {
        self.storage.remove(&self.options.name)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Replace the tracked fields with the stored ones, laid over the
    /// defaults. Transient fields keep their current values.
    fn hydrate(&self) -> bool {
        let _order = self.write_order.lock();
        let name = self.options.name.as_str();
        let Some(loaded) = self.storage.get(name) else {
            debug!(name, "no prior state; keeping defaults");
            return false;
        };

        let Decoded {
            version,
            state: mut persisted,
        } = loaded.decoded;
        if version != self.options.version {
            match &self.options.migrate {
                Some(migrate) => match migrate(persisted, version) {
                    Some(migrated) => persisted = self.storage.schema().project(&migrated),
                    None => {
                        warn!(name, from = version, "migration rejected stored state");
                        return false;
                    }
                },
                None => warn!(
                    name,
                    stored = version,
                    current = self.options.version,
                    "stored state has a different version and no migration; using it as-is"
                ),
            }
        }

        let (Some(mut merged), Some(current)) =
            (self.to_object(&self.defaults), self.to_object(&self.state()))
        else {
            return false;
        };
        let schema = self.storage.schema();
        merged.extend(
            current
                .into_iter()
                .filter(|(field, _)| schema.position(field).is_none()),
        );
        merged.extend(persisted);

        match serde_json::from_value::<S>(Value::Object(merged)) {
            Ok(next) => {
                *self.state.lock() = next;
                true
            }
            Err(e) => {
                warn!(name, error = %e, "stored state does not fit; keeping defaults");
                false
            }
        }
    }

    /// The persisted projection of `state`.
    fn tracked(&self, state: &S) -> Option<Map<String, Value>> {
        self.to_object(state)
            .map(|map| self.storage.schema().project(&map))
    }

    fn to_object(&self, state: &S) -> Option<Map<String, Value>> {
        match serde_json::to_value(state) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!(name = %self.options.name, "state does not serialize to an object");
                None
            }
            Err(e) => {
                warn!(name = %self.options.name, error = %e, "failed to serialize state");
                None
            }
        }
    }

    fn notify(&self, state: &S) {
        let listeners: Vec<Listener<S>> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }
}

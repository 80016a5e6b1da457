//! Durable cache on `window.localStorage`.

use sharestate::{BlobStorage, StorageError};
use web_sys::Storage;

use crate::error::{no_window, storage_error};

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserLocalStorage;

fn local_storage() -> Result<Storage, StorageError> {
    web_sys::window()
        .ok_or_else(no_window)?
        .local_storage()
        .map_err(storage_error)?
        .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".into()))
}

impl BlobStorage for BrowserLocalStorage {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        local_storage()?.get_item(name).map_err(storage_error)
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StorageError> {
        local_storage()?.set_item(name, blob).map_err(storage_error)
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        local_storage()?.remove_item(name).map_err(storage_error)
    }
}

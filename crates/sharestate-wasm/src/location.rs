//! Shareable parameter on `window.location`.
//!
//! Writes go through `history.replaceState`, so the page neither reloads nor
//! gains a history entry. Outside a window every call is `Unavailable`.

use sharestate::{BlobStorage, StorageError};
use web_sys::{UrlSearchParams, Window};

use crate::error::{no_window, storage_error};

#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserLocation;

impl BrowserLocation {
    fn params(window: &Window) -> Result<UrlSearchParams, StorageError> {
        let search = window.location().search().map_err(storage_error)?;
        UrlSearchParams::new_with_str(&search).map_err(storage_error)
    }

    /// Apply `edit` to the current query and replace the location in place.
    fn rewrite(&self, edit: impl FnOnce(&UrlSearchParams)) -> Result<(), StorageError> {
        let window = web_sys::window().ok_or_else(no_window)?;
        let params = Self::params(&window)?;
        edit(&params);

        let location = window.location();
        let mut url = location.pathname().map_err(storage_error)?;
        let query = String::from(params.to_string());
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }
        url.push_str(&location.hash().map_err(storage_error)?);

        window
            .history()
            .map_err(storage_error)?
            .replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", Some(&url))
            .map_err(storage_error)
    }
}

impl BlobStorage for BrowserLocation {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let window = web_sys::window().ok_or_else(no_window)?;
        Ok(Self::params(&window)?.get(name).filter(|v| !v.is_empty()))
    }

    fn set(&self, name: &str, blob: &str) -> Result<(), StorageError> {
        self.rewrite(|params| params.set(name, blob))
    }

    fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.rewrite(|params| params.delete(name))
    }
}

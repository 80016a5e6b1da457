//! `AnalysisStore` — the persisted analysis selection, exposed to JS.
//!
//! Hydrates from the page URL (falling back to localStorage) on construction
//! and writes both on every selection change.

use std::sync::Arc;

use sharestate::analysis::{self, AnalysisActions, AnalysisState};
use sharestate::{DualStorage, PersistedStore, Subscription};
use wasm_bindgen::prelude::*;

use crate::error::{to_js_error, to_js_value};
use crate::local_storage::BrowserLocalStorage;
use crate::location::BrowserLocation;

// ============================================================================
// JS listener wrapper
// ============================================================================

struct JsListener {
    callback: js_sys::Function,
}

// SAFETY: WASM is single-threaded.
unsafe impl Send for JsListener {}
unsafe impl Sync for JsListener {}

impl JsListener {
    fn call(&self, state: &AnalysisState) {
        let result = to_js_value(state)
            .and_then(|value| self.callback.call1(&JsValue::NULL, &value));
        if let Err(e) = result {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "[sharestate] analysis listener failed: {e:?}"
            )));
        }
    }
}

/// Returned by `subscribe`; call `unsubscribe()` to detach.
#[wasm_bindgen]
pub struct AnalysisSubscription {
    inner: Option<Subscription<AnalysisState>>,
}

#[wasm_bindgen]
impl AnalysisSubscription {
    pub fn unsubscribe(&mut self) {
        self.inner.take();
    }
}

// ============================================================================
// AnalysisStore
// ============================================================================

#[wasm_bindgen]
pub struct AnalysisStore {
    inner: PersistedStore<AnalysisState>,
}

#[wasm_bindgen]
impl AnalysisStore {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<AnalysisStore, JsValue> {
        console_error_panic_hook::set_once();
        let codec = analysis::codec().map_err(to_js_error)?;
        let storage = Arc::new(DualStorage::new(BrowserLocation, BrowserLocalStorage, codec));
        Ok(AnalysisStore {
            inner: analysis::open_store(storage),
        })
    }

    /// Current state as a plain object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.inner.state())
    }

    #[wasm_bindgen(js_name = "hasHydrated")]
    pub fn has_hydrated(&self) -> bool {
        self.inner.has_hydrated()
    }

    #[wasm_bindgen(js_name = "setSelectedHero")]
    pub fn set_selected_hero(&self, hero: Option<u32>) {
        self.inner.set_selected_hero(hero.map(i64::from));
    }

    #[wasm_bindgen(js_name = "addSelectedItem")]
    pub fn add_selected_item(&self, item_id: u32) {
        self.inner.add_selected_item(i64::from(item_id));
    }

    #[wasm_bindgen(js_name = "removeSelectedItem")]
    pub fn remove_selected_item(&self, item_id: u32) {
        self.inner.remove_selected_item(i64::from(item_id));
    }

    /// `item_ids`: array of numbers.
    #[wasm_bindgen(js_name = "removeManySelectedItems")]
    pub fn remove_many_selected_items(&self, item_ids: JsValue) -> Result<(), JsValue> {
        let ids: Vec<i64> = serde_wasm_bindgen::from_value(item_ids).map_err(to_js_error)?;
        self.inner.remove_many_selected_items(&ids);
        Ok(())
    }

    #[wasm_bindgen(js_name = "addExcludedItem")]
    pub fn add_excluded_item(&self, item_id: u32) {
        self.inner.add_excluded_item(i64::from(item_id));
    }

    #[wasm_bindgen(js_name = "removeExcludedItem")]
    pub fn remove_excluded_item(&self, item_id: u32) {
        self.inner.remove_excluded_item(i64::from(item_id));
    }

    /// `item_ids`: array of numbers.
    #[wasm_bindgen(js_name = "removeManyExcludedItems")]
    pub fn remove_many_excluded_items(&self, item_ids: JsValue) -> Result<(), JsValue> {
        let ids: Vec<i64> = serde_wasm_bindgen::from_value(item_ids).map_err(to_js_error)?;
        self.inner.remove_many_excluded_items(&ids);
        Ok(())
    }

    #[wasm_bindgen(js_name = "setMinBadgeLevel")]
    pub fn set_min_badge_level(&self, level: u32) {
        self.inner.set_min_badge_level(i64::from(level));
    }

    #[wasm_bindgen(js_name = "setLoading")]
    pub fn set_loading(&self, loading: bool) {
        self.inner.set_loading(loading);
    }

    /// Request for the current selection, or `null` when incomplete.
    pub fn request(&self) -> Result<JsValue, JsValue> {
        match self.inner.state().request() {
            Some(request) => to_js_value(&request),
            None => Ok(JsValue::NULL),
        }
    }

    /// Re-read the URL and localStorage, e.g. on `popstate`.
    pub fn rehydrate(&self) -> bool {
        self.inner.rehydrate()
    }

    #[wasm_bindgen(js_name = "clearStorage")]
    pub fn clear_storage(&self) {
        let report = self.inner.clear_storage();
        if !report.all() {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "[sharestate] clearStorage incomplete: {report:?}"
            )));
        }
    }

    /// Call `callback(state)` after every change.
    pub fn subscribe(&self, callback: js_sys::Function) -> AnalysisSubscription {
        let listener = JsListener { callback };
        AnalysisSubscription {
            inner: Some(self.inner.subscribe(move |state| listener.call(state))),
        }
    }
}

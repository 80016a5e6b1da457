//! Build-analysis state: the hero and item selection shared through links.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::config::PersistOptions;
use crate::error::SchemaError;
use crate::schema::{FieldType, Schema};
use crate::storage::traits::PersistStorage;
use crate::store::PersistedStore;

/// Query parameter and cache key.
pub const STORE_NAME: &str = "analysis-store";
pub const SCHEMA_VERSION: u64 = 1;
pub const DEFAULT_MIN_BADGE_LEVEL: i64 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisState {
    pub selected_hero: Option<i64>,
    pub selected_items: Vec<i64>,
    pub excluded_items: Vec<i64>,
    pub min_badge_level: i64,
    /// Not persisted.
    #[serde(default)]
    pub is_loading: bool,
}

impl Default for AnalysisState {
    fn default() -> Self {
        Self {
            selected_hero: None,
            selected_items: Vec::new(),
            excluded_items: Vec::new(),
            min_badge_level: DEFAULT_MIN_BADGE_LEVEL,
            is_loading: false,
        }
    }
}

/// Tracked fields in wire order. Append only.
pub fn schema() -> Result<Schema, SchemaError> {
    Schema::builder()
        .field("selectedHero", FieldType::NullableInt)
        .field("selectedItems", FieldType::IntList)
        .field("excludedItems", FieldType::IntList)
        .field("minBadgeLevel", FieldType::Int)
        .build()
}

pub fn codec() -> Result<Codec, SchemaError> {
    Ok(Codec::new(schema()?))
}

pub fn options() -> PersistOptions {
    PersistOptions::new(STORE_NAME, SCHEMA_VERSION)
}

/// Open the analysis store over `storage`, hydrating from it.
pub fn open_store(storage: Arc<dyn PersistStorage>) -> PersistedStore<AnalysisState> {
    PersistedStore::new(storage, options(), AnalysisState::default())
}

// ============================================================================
// Request payload
// ============================================================================

/// Win-rate analysis request derived from the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub hero_id: i64,
    pub min_badge_level: i64,
    pub body: AnalysisRequestBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequestBody {
    pub required_item_ids: Vec<i64>,
    pub excluded_item_ids: Vec<i64>,
}

impl AnalysisRequest {
    /// `hero_id=..&min_badge_level=..`
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("hero_id", &self.hero_id.to_string())
            .append_pair("min_badge_level", &self.min_badge_level.to_string())
            .finish()
    }
}

impl AnalysisState {
    /// The request to submit, or `None` when there is nothing to analyse:
    /// no hero (id 0 counts as none), or neither required nor excluded items.
    pub fn request(&self) -> Option<AnalysisRequest> {
        let hero_id = self.selected_hero.filter(|&id| id != 0)?;
        if self.selected_items.is_empty() && self.excluded_items.is_empty() {
            return None;
        }
        Some(AnalysisRequest {
            hero_id,
            min_badge_level: self.min_badge_level,
            body: AnalysisRequestBody {
                required_item_ids: self.selected_items.clone(),
                excluded_item_ids: self.excluded_items.clone(),
            },
        })
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Selection actions on the persisted analysis store.
pub trait AnalysisActions {
    fn set_selected_hero(&self, hero: Option<i64>);
    /// Ignored when the item is already selected.
    fn add_selected_item(&self, item_id: i64);
    fn remove_selected_item(&self, item_id: i64);
    fn remove_many_selected_items(&self, item_ids: &[i64]);
    fn add_excluded_item(&self, item_id: i64);
    fn remove_excluded_item(&self, item_id: i64);
    fn remove_many_excluded_items(&self, item_ids: &[i64]);
    fn set_min_badge_level(&self, level: i64);
    fn set_loading(&self, loading: bool);
}

impl AnalysisActions for PersistedStore<AnalysisState> {
    fn set_selected_hero(&self, hero: Option<i64>) {
        self.set(|s| s.selected_hero = hero);
    }

    fn add_selected_item(&self, item_id: i64) {
        self.set(|s| {
            if !s.selected_items.contains(&item_id) {
                s.selected_items.push(item_id);
            }
        });
    }

    fn remove_selected_item(&self, item_id: i64) {
        self.set(|s| s.selected_items.retain(|id| *id != item_id));
    }

    fn remove_many_selected_items(&self, item_ids: &[i64]) {
        self.set(|s| s.selected_items.retain(|id| !item_ids.contains(id)));
    }

    fn add_excluded_item(&self, item_id: i64) {
        self.set(|s| s.excluded_items.push(item_id));
    }

    fn remove_excluded_item(&self, item_id: i64) {
        self.set(|s| s.excluded_items.retain(|id| *id != item_id));
    }

    fn remove_many_excluded_items(&self, item_ids: &[i64]) {
        self.set(|s| s.excluded_items.retain(|id| !item_ids.contains(id)));
    }

    fn set_min_badge_level(&self, level: i64) {
        self.set(|s| s.min_badge_level = level);
    }

    fn set_loading(&self, loading: bool) {
        self.set(|s| s.is_loading = loading);
    }
}

//! End-to-end: analysis store over a URL parameter and a durable cache.

use std::sync::Arc;

use serde_json::json;
use sharestate::analysis::{self, AnalysisActions, AnalysisState};
#[cfg(feature = "sqlite")]
use sharestate::{PersistStorage, SqliteCache};
use sharestate::{BlobStorage, DualStorage, LocationParam, MemoryStorage, Source, StorageError};
use url::Url;

const PAGE: &str = "https://stats.example/build-analysis?tab=items";

// ============================================================================
// Helpers
// ============================================================================

type Browser = DualStorage<Arc<LocationParam>, Arc<MemoryStorage>>;

fn browser(href: &str, cache: MemoryStorage) -> Arc<Browser> {
    Arc::new(DualStorage::new(
        Arc::new(LocationParam::parse(href).unwrap()),
        Arc::new(cache),
        analysis::codec().unwrap(),
    ))
}

fn blob_for(state: &AnalysisState) -> String {
    let map = serde_json::to_value(state)
        .unwrap()
        .as_object()
        .cloned()
        .unwrap();
    analysis::codec()
        .unwrap()
        .encode(&map, analysis::SCHEMA_VERSION)
        .unwrap()
}

fn link_with(blob: &str) -> String {
    let mut url = Url::parse(PAGE).unwrap();
    url.query_pairs_mut().append_pair(analysis::STORE_NAME, blob);
    url.to_string()
}

fn selection(hero: i64, items: &[i64]) -> AnalysisState {
    AnalysisState {
        selected_hero: Some(hero),
        selected_items: items.to_vec(),
        ..Default::default()
    }
}

// ============================================================================
// Load precedence
// ============================================================================

#[test]
fn defaults_when_link_and_cache_are_empty() {
    let storage = browser(PAGE, MemoryStorage::new());
    let store = analysis::open_store(storage.clone());

    assert_eq!(store.state(), AnalysisState::default());
    assert!(!store.has_hydrated());
    assert_eq!(storage.param().href().as_deref(), Some(PAGE));
    assert_eq!(storage.cache().write_count(), 0);
}

#[test]
fn shared_link_wins_over_cache_and_replaces_it() {
    let a = blob_for(&selection(15, &[123, 456]));
    let b = blob_for(&selection(3, &[7]));
    let storage = browser(&link_with(&a), MemoryStorage::new().with_blob(analysis::STORE_NAME, &b));

    let store = analysis::open_store(storage.clone());

    assert_eq!(store.state(), selection(15, &[123, 456]));
    assert_eq!(storage.cache().peek(analysis::STORE_NAME), Some(a));
}

#[test]
fn cache_is_used_when_link_has_no_state() {
    let b = blob_for(&selection(3, &[7]));
    let storage = browser(PAGE, MemoryStorage::new().with_blob(analysis::STORE_NAME, &b));

    let store = analysis::open_store(storage.clone());

    assert_eq!(store.state(), selection(3, &[7]));
    assert_eq!(storage.get(analysis::STORE_NAME).unwrap().source, Source::Cache);
}

#[test]
fn cache_is_used_when_link_is_corrupted() {
    let b = blob_for(&selection(3, &[7]));
    let storage = browser(
        &link_with("gqEB-broken"),
        MemoryStorage::new().with_blob(analysis::STORE_NAME, &b),
    );

    let store = analysis::open_store(storage);
    assert_eq!(store.state(), selection(3, &[7]));
}

#[test]
fn unavailable_cache_still_hydrates_from_link() {
    let cache = MemoryStorage::new();
    cache.set_failure(Some(StorageError::AccessDenied("private mode".into())));
    let storage = browser(&link_with(&blob_for(&selection(9, &[1]))), cache);

    let store = analysis::open_store(storage);
    assert_eq!(store.state(), selection(9, &[1]));
}

#[test]
fn no_location_falls_back_to_cache() {
    let b = blob_for(&selection(3, &[7]));
    let storage = Arc::new(DualStorage::new(
        LocationParam::detached(),
        MemoryStorage::new().with_blob(analysis::STORE_NAME, &b),
        analysis::codec().unwrap(),
    ));
    let store = analysis::open_store(storage.clone());
    assert_eq!(store.state(), selection(3, &[7]));

    store.add_selected_item(8);
    let written = storage.cache().peek(analysis::STORE_NAME).unwrap();
    assert_eq!(written, blob_for(&selection(3, &[7, 8])));
}

// ============================================================================
// Write-through on mutation
// ============================================================================

#[test]
fn example_scenario_updates_link_and_cache() {
    let storage = browser(PAGE, MemoryStorage::new());
    let store = analysis::open_store(storage.clone());

    let x = blob_for(&store.state());

    store.set_selected_hero(Some(15));
    store.add_selected_item(123);
    store.add_selected_item(456);

    let y = storage.param().get(analysis::STORE_NAME).unwrap().unwrap();
    assert_ne!(x, y);
    assert_eq!(storage.cache().peek(analysis::STORE_NAME), Some(y.clone()));

    let decoded = analysis::codec().unwrap().decode(&y).unwrap();
    assert_eq!(decoded.version, 1);
    assert_eq!(
        serde_json::Value::Object(decoded.state),
        json!({
            "selectedHero": 15,
            "selectedItems": [123, 456],
            "excludedItems": [],
            "minBadgeLevel": 80,
        })
    );

    let href = storage.param().href().unwrap();
    assert!(href.starts_with("https://stats.example/build-analysis?tab=items&analysis-store="));
}

#[test]
fn copied_link_reconstructs_state_elsewhere() {
    let here = browser(PAGE, MemoryStorage::new());
    let store = analysis::open_store(here.clone());
    store.set_selected_hero(Some(22));
    store.add_excluded_item(999);
    store.set_min_badge_level(60);

    let link = here.param().href().unwrap();
    let there = browser(&link, MemoryStorage::new());
    let reopened = analysis::open_store(there);

    assert_eq!(reopened.state(), store.state());
}

#[test]
fn loading_flag_is_not_persisted() {
    let storage = browser(PAGE, MemoryStorage::new());
    let store = analysis::open_store(storage.clone());
    store.set_loading(true);
    assert!(store.state().is_loading);
    assert_eq!(storage.param().get(analysis::STORE_NAME).unwrap(), None);
    assert_eq!(storage.cache().write_count(), 0);
}

#[test]
fn clearing_storage_removes_link_parameter() {
    let storage = browser(PAGE, MemoryStorage::new());
    let store = analysis::open_store(storage.clone());
    store.set_selected_hero(Some(1));
    assert!(store.clear_storage().all());
    assert_eq!(storage.param().href().as_deref(), Some(PAGE));
    assert_eq!(storage.cache().peek(analysis::STORE_NAME), None);
}

#[test]
fn navigating_to_a_new_link_rehydrates() {
    let storage = browser(PAGE, MemoryStorage::new());
    let store = analysis::open_store(storage.clone());
    store.set_selected_hero(Some(1));

    let other = blob_for(&selection(40, &[5, 6]));
    storage
        .param()
        .navigate(Url::parse(&link_with(&other)).unwrap());
    assert!(store.rehydrate());
    assert_eq!(store.state(), selection(40, &[5, 6]));
    assert_eq!(storage.cache().peek(analysis::STORE_NAME), Some(other));
}

// ============================================================================
// Schema growth
// ============================================================================

#[test]
fn blob_from_shorter_schema_keeps_default_for_appended_field() {
    let old_schema = sharestate::Schema::builder()
        .field("selectedHero", sharestate::FieldType::NullableInt)
        .field("selectedItems", sharestate::FieldType::IntList)
        .field("excludedItems", sharestate::FieldType::IntList)
        .build()
        .unwrap();
    let old_blob = sharestate::encode(
        json!({ "selectedHero": 4, "selectedItems": [2], "excludedItems": [] })
            .as_object()
            .unwrap(),
        &old_schema,
        1,
    )
    .unwrap();

    let store = analysis::open_store(browser(&link_with(&old_blob), MemoryStorage::new()));
    let state = store.state();
    assert_eq!(state.selected_hero, Some(4));
    assert_eq!(state.selected_items, vec![2]);
    assert_eq!(state.min_badge_level, analysis::DEFAULT_MIN_BADGE_LEVEL);
}

// ============================================================================
// SQLite durable cache
// ============================================================================

#[cfg(feature = "sqlite")]
#[test]
fn sqlite_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.sqlite3");

    {
        let storage = Arc::new(DualStorage::new(
            LocationParam::parse(PAGE).unwrap(),
            SqliteCache::open(&path).unwrap(),
            analysis::codec().unwrap(),
        ));
        let store = analysis::open_store(storage);
        store.set_selected_hero(Some(12));
        store.add_selected_item(77);
    }

    let storage: Arc<dyn PersistStorage> = Arc::new(DualStorage::new(
        LocationParam::parse(PAGE).unwrap(),
        SqliteCache::open(&path).unwrap(),
        analysis::codec().unwrap(),
    ));
    let store = analysis::open_store(storage);
    assert_eq!(store.state(), selection(12, &[77]));
}

//! Model files on disk: loading, caching by content identity, and running a pipeline
//! from stored models.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use cipher_core::classifier::{ModelSpec, ModelStoreError};
use cipher_core::data::{generate_series, SyntheticSpec};
use cipher_core::domain::ModelId;
use cipher_core::{ModelCache, ModelStore, Pipeline, PipelineConfig, PipelineError};

// ── Fixtures ─────────────────────────────────────────────────────────

fn logistic_json(intercept: f64) -> String {
    serde_json::json!({
        "kind": "logistic",
        "n_features": 10,
        "weights": vec![0.0; 10],
        "intercept": intercept,
    })
    .to_string()
}

/// Splits on rsi_mfi (feature 2) at zero.
fn tree_json() -> serde_json::Value {
    serde_json::json!({
        "n_features": 10,
        "nodes": [
            {"feature": 2, "threshold": 0.0, "left": 1, "right": 2},
            {"label": 0},
            {"label": 1},
        ],
    })
}

fn forest_json() -> String {
    serde_json::json!({
        "kind": "random_forest",
        "n_features": 10,
        "trees": [tree_json(), tree_json(), tree_json()],
    })
    .to_string()
}

fn write_model(dir: &Path, tag: &str, json: &str) {
    fs::write(dir.join(format!("{tag}.json")), json).unwrap();
}

// ── Store ────────────────────────────────────────────────────────────

#[test]
fn load_each_model_kind() {
    let dir = tempfile::tempdir().unwrap();
    let mut tree = tree_json();
    tree["kind"] = "decision_tree".into();
    write_model(dir.path(), "tree", &tree.to_string());
    write_model(dir.path(), "forest", &forest_json());
    write_model(dir.path(), "logit", &logistic_json(0.0));

    let store = ModelStore::new(dir.path());
    assert!(matches!(
        store.load("tree").unwrap().spec(),
        ModelSpec::DecisionTree(_)
    ));
    assert!(matches!(
        store.load("forest").unwrap().spec(),
        ModelSpec::RandomForest(_)
    ));
    let logit = store.load("logit").unwrap();
    assert!(matches!(logit.spec(), ModelSpec::Logistic(_)));
    assert_eq!(logit.id().tag, "logit");
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ModelStore::new(dir.path()).load("absent").unwrap_err();
    assert!(matches!(err, ModelStoreError::Io { .. }));
}

#[test]
fn malformed_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "broken", r#"{"kind": "logistic", "n_features": 10}"#);
    let err = ModelStore::new(dir.path()).load("broken").unwrap_err();
    assert!(matches!(err, ModelStoreError::Invalid { .. }));
}

#[test]
fn tags_cannot_escape_the_directory() {
    let store = ModelStore::new("models");
    assert!(matches!(
        store.path_for("../secret"),
        Err(ModelStoreError::InvalidTag(_))
    ));
    assert!(matches!(store.path_for(""), Err(ModelStoreError::EmptyTag)));
}

// ── Cache ────────────────────────────────────────────────────────────

#[test]
fn cache_hit_returns_same_model() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "buy", &logistic_json(1.0));
    let store = ModelStore::new(dir.path());
    let cache = ModelCache::new();

    let first = cache.get_or_load(&store, "buy").unwrap();
    let second = cache.get_or_load(&store, "buy").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(first.id()).is_some());
}

#[test]
fn changed_file_replaces_cached_entry() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "buy", &logistic_json(1.0));
    let store = ModelStore::new(dir.path());
    let cache = ModelCache::new();

    let old = cache.get_or_load(&store, "buy").unwrap();
    write_model(dir.path(), "buy", &logistic_json(-1.0));
    let new = cache.get_or_load(&store, "buy").unwrap();

    assert_ne!(old.id(), new.id());
    assert_eq!(cache.len(), 1);
    assert!(cache.get(old.id()).is_none());
    assert!(cache.get(new.id()).is_some());
}

#[test]
fn identity_follows_content_not_path() {
    let json = logistic_json(0.25);
    let a = ModelId::from_content("buy", json.as_bytes());
    let b = ModelId::from_content("buy", json.as_bytes());
    assert_eq!(a, b);
    assert_ne!(a, ModelId::from_content("sell", json.as_bytes()));
}

#[test]
fn invalidate_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "buy", &logistic_json(1.0));
    write_model(dir.path(), "sell", &logistic_json(-1.0));
    let store = ModelStore::new(dir.path());
    let cache = ModelCache::new();

    cache.get_or_load(&store, "buy").unwrap();
    cache.get_or_load(&store, "sell").unwrap();
    assert_eq!(cache.len(), 2);

    assert_eq!(cache.invalidate("buy"), 1);
    assert_eq!(cache.invalidate("buy"), 0);
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

// ── Pipeline from stored models ──────────────────────────────────────

#[test]
fn pipeline_runs_with_stored_models() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "buy", &logistic_json(1.0));
    write_model(dir.path(), "sell", &logistic_json(-1.0));

    let cache = ModelCache::new();
    let pipeline = Pipeline::from_store(
        PipelineConfig::default(),
        &ModelStore::new(dir.path()),
        &cache,
    )
    .unwrap();
    assert_eq!(cache.len(), 2);

    let series = generate_series(&SyntheticSpec::with_bars(300, 4)).unwrap();
    let out = pipeline.run(&series).unwrap();
    assert!(!out.is_empty());
    assert!(out.rows.iter().all(|r| r.prediction_buy == 1));
    assert!(out.rows.iter().all(|r| r.prediction_sell == 0));
}

#[test]
fn forest_predictions_follow_rsi_mfi_sign() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "buy", &forest_json());
    write_model(dir.path(), "sell", &forest_json());

    let pipeline = Pipeline::from_store(
        PipelineConfig::default(),
        &ModelStore::new(dir.path()),
        &ModelCache::new(),
    )
    .unwrap();
    let series = generate_series(&SyntheticSpec::with_bars(300, 8)).unwrap();
    let out = pipeline.run(&series).unwrap();

    for row in &out.rows {
        let expected = u8::from(row.rsi_mfi > 0.0);
        assert_eq!(row.prediction_buy, expected);
        assert_eq!(row.prediction_sell, expected);
    }
}

#[test]
fn model_with_wrong_width_fails_before_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let narrow = serde_json::json!({
        "kind": "logistic",
        "n_features": 9,
        "weights": vec![0.0; 9],
        "intercept": 0.0,
    })
    .to_string();
    write_model(dir.path(), "buy", &narrow);
    write_model(dir.path(), "sell", &logistic_json(0.0));

    let pipeline = Pipeline::from_store(
        PipelineConfig::default(),
        &ModelStore::new(dir.path()),
        &ModelCache::new(),
    )
    .unwrap();
    let series = generate_series(&SyntheticSpec::with_bars(200, 2)).unwrap();
    let err = pipeline.run(&series).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }), "got {err:?}");
}

#[test]
fn missing_sell_model_names_its_tag() {
    let dir = tempfile::tempdir().unwrap();
    write_model(dir.path(), "buy", &logistic_json(0.0));

    let err = Pipeline::from_store(
        PipelineConfig::default(),
        &ModelStore::new(dir.path()),
        &ModelCache::new(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::ModelUnavailable { ref tag, .. } if tag == "sell"));
}

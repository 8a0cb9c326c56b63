//! The config and models shipped at the workspace root must load and run.

use std::path::PathBuf;

use cipher_core::data::{generate_series, SyntheticSpec};
use cipher_core::{ModelCache, ModelStore, OutputFormat, Pipeline, PipelineConfig};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..")
}

#[test]
fn shipped_config_matches_defaults_except_formats() {
    let config = PipelineConfig::from_file(&workspace_root().join("cipher.toml")).unwrap();
    config.validate().unwrap();

    let defaults = PipelineConfig::default();
    assert_eq!(config.wavetrend, defaults.wavetrend);
    assert_eq!(config.money_flow, defaults.money_flow);
    assert_eq!(config.models, defaults.models);
    assert_eq!(
        config.output.formats,
        vec![OutputFormat::Csv, OutputFormat::Json, OutputFormat::Parquet]
    );
}

#[test]
fn shipped_models_run_on_synthetic_bars() {
    let store = ModelStore::new(workspace_root().join("models"));
    let pipeline =
        Pipeline::from_store(PipelineConfig::default(), &store, &ModelCache::new()).unwrap();

    let series = generate_series(&SyntheticSpec::with_bars(500, 42)).unwrap();
    let out = pipeline.run(&series).unwrap();
    assert_eq!(out.len(), pipeline.analyze(&series).features.matrix.n_rows());
    assert!(out
        .rows
        .iter()
        .all(|r| r.prediction_buy <= 1 && r.prediction_sell <= 1));
    // The sell tree only fires on cross-only down moves above wt2 = 40.
    for row in out.rows.iter().filter(|r| r.prediction_sell == 1) {
        assert!(row.wt2 > 40.0);
        assert!(row.flags.wt_cross_down_only);
    }
}

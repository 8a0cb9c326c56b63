//! Cipher Core: WaveTrend / money-flow indicators, signal detection and the
//! classifier bridge.
//!
//! Pipeline, strictly forward:
//! - Bar series (file ingestion or synthetic generator)
//! - WaveTrend engine and money-flow normalizer, run side by side
//! - Signal detector (crossovers, zones, cross-only strength buckets)
//! - Feature builder (per-row validity mask, source index kept per row)
//! - Classifier bridge (buy and sell models behind one trait)
//! - Annotated output series with markers and CSV / JSON / Parquet export

pub mod classifier;
pub mod config;
pub mod data;
pub mod domain;
pub mod features;
pub mod indicators;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod signals;

pub use classifier::{Classifier, ClassifierError, ModelCache, ModelStore};
pub use config::{ConfigError, OutputFormat, PipelineConfig};
pub use domain::{Bar, BarSeries, SeriesMeta};
pub use output::{AnnotatedBar, AnnotatedBarSeries, RunSummary};
pub use pipeline::{Pipeline, PipelineError};

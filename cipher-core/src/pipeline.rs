//! End-to-end run: bars → indicators → signals → features → predictions.
//!
//! Each stage is a pure function of the previous one. Models are loaded before any
//! computation starts, and every shape check happens before a classifier is called.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::classifier::{self, Classifier, ClassifierError, ModelCache, ModelStore};
use crate::config::{ConfigError, PipelineConfig};
use crate::domain::BarSeries;
use crate::features::{build_features, FeatureSet};
use crate::indicators::{compute_indicators, IndicatorSeries};
use crate::output::AnnotatedBarSeries;
use crate::signals::{detect, SignalTable};

/// Fewer bars than this still run, with a warning.
pub const RECOMMENDED_MIN_BARS: usize = 100;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("schema mismatch in {subject}: expected {expected}, got {actual}")]
    SchemaMismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    #[error("model '{tag}' unavailable: {reason}")]
    ModelUnavailable { tag: String, reason: String },

    #[error("classifier '{classifier}' returned invalid predictions: {reason}")]
    InvalidPrediction { classifier: String, reason: String },

    #[error("classifier '{name}' failed: {source}")]
    Classifier {
        name: String,
        #[source]
        source: ClassifierError,
    },
}

/// Intermediate results of one run, before prediction.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub indicators: IndicatorSeries,
    pub signals: SignalTable,
    pub features: FeatureSet,
}

/// A configured pipeline holding its two classifiers.
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    buy: Arc<dyn Classifier>,
    sell: Arc<dyn Classifier>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("buy", &self.buy.name())
            .field("sell", &self.sell.name())
            .finish()
    }
}

impl Pipeline {
    /// Fails with `Config` when the parameters do not validate.
    pub fn new(
        config: PipelineConfig,
        buy: Arc<dyn Classifier>,
        sell: Arc<dyn Classifier>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config, buy, sell })
    }

    /// Validate the config, then load both models through the cache. Fails with
    /// `ModelUnavailable` before any bar is touched.
    pub fn from_store(
        config: PipelineConfig,
        store: &ModelStore,
        cache: &ModelCache,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let load = |tag: &str| -> Result<Arc<dyn Classifier>, PipelineError> {
            let model: Arc<dyn Classifier> = cache
                .get_or_load(store, tag)
                .map_err(|e| PipelineError::ModelUnavailable {
                    tag: tag.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(model)
        };
        let buy = load(&config.models.buy_tag)?;
        let sell = load(&config.models.sell_tag)?;
        Self::new(config, buy, sell)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Indicators, signals and features for the whole series.
    pub fn analyze(&self, series: &BarSeries) -> Analysis {
        let indicators = compute_indicators(
            series.bars(),
            &self.config.wavetrend,
            &self.config.money_flow,
        );
        let signals = detect(&indicators.wt1, &indicators.wt2);
        let features = build_features(&indicators, &signals);
        Analysis {
            indicators,
            signals,
            features,
        }
    }

    /// Run every stage and assemble the annotated output.
    ///
    /// Too little history is not an error: the result is empty and a warning is logged.
    pub fn run(&self, series: &BarSeries) -> Result<AnnotatedBarSeries, PipelineError> {
        let label = series.meta().label();
        if series.len() < RECOMMENDED_MIN_BARS {
            warn!(
                series = %label,
                bars = series.len(),
                recommended = RECOMMENDED_MIN_BARS,
                "short bar history"
            );
        }
        let insane = series.insane_count();
        if insane > 0 {
            warn!(series = %label, insane, "bars violate OHLC ordering");
        }

        let analysis = self.analyze(series);

        let gaps = analysis.indicators.interior_gaps();
        if gaps > 0 {
            warn!(series = %label, gaps, "indeterminate indicator values after warm-up");
        }
        if analysis.features.matrix.is_empty() {
            warn!(
                series = %label,
                bars = series.len(),
                warmup = self.config.warmup(),
                "insufficient history, no feature rows"
            );
        }

        let predictions =
            classifier::predict(&analysis.features.matrix, self.buy.as_ref(), self.sell.as_ref())?;
        let output = AnnotatedBarSeries::assemble(
            series,
            &analysis.indicators,
            &analysis.signals,
            &analysis.features.matrix,
            &predictions,
        );

        let summary = output.summary();
        let hash = series.content_hash();
        info!(
            series = %summary.label,
            hash = hash.short(),
            bars = summary.input_bars,
            retained = summary.retained,
            first = ?summary.first_retained,
            buy_signals = summary.buy_signals,
            sell_signals = summary.sell_signals,
            predicted_buys = summary.predicted_buys,
            predicted_sells = summary.predicted_sells,
            "run complete"
        );
        Ok(output)
    }
}

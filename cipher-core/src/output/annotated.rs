//! The annotated bar series: the pipeline's sole output artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Predictions;
use crate::domain::{BarSeries, SeriesMeta};
use crate::features::FeatureMatrix;
use crate::indicators::IndicatorSeries;
use crate::schema::OUTPUT_SCHEMA_VERSION;
use crate::signals::{SignalFlags, SignalTable};

/// One retained bar with everything computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    /// Position of this bar in the input series.
    pub source_index: usize,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub wt1: f64,
    pub wt2: f64,
    pub rsi_mfi: f64,
    pub wt1_minus_wt2: f64,
    #[serde(flatten)]
    pub flags: SignalFlags,
    pub prediction_buy: u8,
    pub prediction_sell: u8,
}

/// Retained rows, position-aligned with the feature matrix they were predicted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBarSeries {
    pub schema_version: u32,
    pub meta: SeriesMeta,
    /// Length of the input series before warm-up and gap rows were dropped.
    pub input_bars: usize,
    pub rows: Vec<AnnotatedBar>,
}

impl AnnotatedBarSeries {
    /// Output with no retained rows.
    pub fn empty(meta: SeriesMeta, input_bars: usize) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION,
            meta,
            input_bars,
            rows: Vec::new(),
        }
    }

    /// Join bars, indicators, signals and predictions on the feature matrix's source index.
    ///
    /// Row k of the result is row k of `features`. Predictions must have one label per
    /// matrix row; rows beyond a shorter prediction vector are dropped.
    pub fn assemble(
        series: &BarSeries,
        indicators: &IndicatorSeries,
        signals: &SignalTable,
        features: &FeatureMatrix,
        predictions: &Predictions,
    ) -> Self {
        let rows = features
            .source_index()
            .iter()
            .zip(predictions.buy.iter().zip(&predictions.sell))
            .filter_map(|(&i, (&prediction_buy, &prediction_sell))| {
                let bar = series.get(i)?;
                Some(AnnotatedBar {
                    source_index: i,
                    timestamp: bar.timestamp,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close: bar.close,
                    volume: bar.volume,
                    wt1: *indicators.wt1.get(i)?,
                    wt2: *indicators.wt2.get(i)?,
                    rsi_mfi: *indicators.rsi_mfi.get(i)?,
                    wt1_minus_wt2: *signals.wt1_minus_wt2.get(i)?,
                    flags: *signals.flags.get(i)?,
                    prediction_buy,
                    prediction_sell,
                })
            })
            .collect();

        Self {
            schema_version: OUTPUT_SCHEMA_VERSION,
            meta: series.meta().clone(),
            input_bars: series.len(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            label: self.meta.label(),
            input_bars: self.input_bars,
            retained: self.rows.len(),
            first_retained: self.rows.first().map(|r| r.source_index),
            buy_signals: self.rows.iter().filter(|r| r.flags.buy_signal).count(),
            sell_signals: self.rows.iter().filter(|r| r.flags.sell_signal).count(),
            predicted_buys: self.rows.iter().filter(|r| r.prediction_buy == 1).count(),
            predicted_sells: self.rows.iter().filter(|r| r.prediction_sell == 1).count(),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    pub input_bars: usize,
    pub retained: usize,
    pub first_retained: Option<usize>,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub predicted_buys: usize,
    pub predicted_sells: usize,
}

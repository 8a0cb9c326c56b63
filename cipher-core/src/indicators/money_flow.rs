//! Money-flow oscillator (rsi_mfi): candle body relative to range, globally min-max scaled.
//!
//! mfi     = ((close - open) / (high - low)) * multiplier      (undefined when high == low)
//! norm    = ((mfi - min) / (max - min) * 200 - 100) * 10       (min/max over the whole window)
//! rsi_mfi = SMA(norm, smoothing)
//!
//! The min/max are global statistics of the input window, so the oscillator must see
//! the complete bar window at once: appending a bar can rescale every historical value.
//! A streaming variant would need a rolling min/max, which changes historical output.
//! Lookback: smoothing - 1.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

use super::sma::sma_of_series;
use super::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyFlowParams {
    pub multiplier: f64,
    pub smoothing: usize,
}

impl Default for MoneyFlowParams {
    fn default() -> Self {
        Self {
            multiplier: 150.0,
            smoothing: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoneyFlow {
    params: MoneyFlowParams,
    name: String,
}

impl MoneyFlow {
    pub fn new(params: MoneyFlowParams) -> Self {
        assert!(params.smoothing >= 1, "money flow smoothing must be >= 1");
        Self {
            params,
            name: format!("rsi_mfi_{}", params.smoothing),
        }
    }
}

impl Indicator for MoneyFlow {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.params.smoothing.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        compute_rsi_mfi(bars, &self.params)
    }
}

/// The full rsi_mfi series. A zero smoothing window leaves every value undefined.
pub fn compute_rsi_mfi(bars: &[Bar], params: &MoneyFlowParams) -> Vec<f64> {
    let raw = raw_money_flow(bars, params.multiplier);
    let normalized = normalize_global(&raw);
    sma_of_series(&normalized, params.smoothing)
}

/// Per-bar money flow. Zero-range bars are undefined.
pub fn raw_money_flow(bars: &[Bar], multiplier: f64) -> Vec<f64> {
    bars.iter()
        .map(|bar| {
            let range = bar.high - bar.low;
            if range == 0.0 || !range.is_finite() {
                return f64::NAN;
            }
            (bar.close - bar.open) / range * multiplier
        })
        .collect()
}

/// Rescale to [-1000, 1000] using the min/max of all defined values.
///
/// Undefined everywhere when nothing is defined or the series has no spread.
pub fn normalize_global(values: &[f64]) -> Vec<f64> {
    let (min, max) = match global_bounds(values) {
        Some(bounds) => bounds,
        None => return vec![f64::NAN; values.len()],
    };

    let spread = max - min;
    if spread == 0.0 {
        return vec![f64::NAN; values.len()];
    }

    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                ((v - min) / spread * 200.0 - 100.0) * 10.0
            } else {
                f64::NAN
            }
        })
        .collect()
}

fn global_bounds(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

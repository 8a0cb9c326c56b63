//! Indicator engines.
//!
//! Indicators are pure functions: bar history in, numeric series out, same length as
//! the input. Undefined positions (warm-up, indeterminate arithmetic) hold `f64::NAN`.
//!
//! The WaveTrend engine and the money-flow normalizer are independent of each other and
//! run side by side on the rayon pool; the result is identical to running them in sequence.

pub mod ema;
pub mod money_flow;
pub mod sma;
pub mod wavetrend;

pub use ema::ema_of_series;
pub use money_flow::{compute_rsi_mfi, MoneyFlow, MoneyFlowParams};
pub use sma::sma_of_series;
pub use wavetrend::{WaveTrend, WaveTrendLine, WaveTrendLines, WaveTrendParams};

use serde::Serialize;
use tracing::debug;

use crate::domain::Bar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later, with
/// one documented exception: the money-flow normalizer scales by whole-window bounds.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_9", "wt2_9_12_3").
    fn name(&self) -> &str;

    /// Index of the first defined output on gap-free input.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Indicator columns aligned 1:1 with a bar series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorSeries {
    pub wt1: Vec<f64>,
    pub wt2: Vec<f64>,
    pub rsi_mfi: Vec<f64>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.wt1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wt1.is_empty()
    }

    /// True when wt1, wt2 and rsi_mfi are all defined at `index`.
    pub fn is_defined(&self, index: usize) -> bool {
        [&self.wt1, &self.wt2, &self.rsi_mfi]
            .iter()
            .all(|col| col.get(index).is_some_and(|v| v.is_finite()))
    }

    /// First position where every column is defined.
    pub fn first_defined(&self) -> Option<usize> {
        (0..self.len()).find(|&i| self.is_defined(i))
    }

    /// Undefined positions that occur after the first defined one.
    pub fn interior_gaps(&self) -> usize {
        match self.first_defined() {
            Some(start) => (start..self.len()).filter(|&i| !self.is_defined(i)).count(),
            None => 0,
        }
    }
}

/// Run both indicator engines over the bars.
pub fn compute_indicators(
    bars: &[Bar],
    wavetrend: &WaveTrendParams,
    money_flow: &MoneyFlowParams,
) -> IndicatorSeries {
    let (lines, rsi_mfi) = rayon::join(
        || wavetrend::compute_lines(bars, wavetrend),
        || compute_rsi_mfi(bars, money_flow),
    );

    let series = IndicatorSeries {
        wt1: lines.wt1,
        wt2: lines.wt2,
        rsi_mfi,
    };
    debug!(
        bars = bars.len(),
        first_defined = ?series.first_defined(),
        interior_gaps = series.interior_gaps(),
        "indicators computed"
    );
    series
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let ohlc: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    bars_from_ohlc(&ohlc)
}

/// Create hourly bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn bars_from_ohlc(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    ohlc.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(
                base + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

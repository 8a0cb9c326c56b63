//! WaveTrend oscillator: two smoothed momentum lines derived from typical price.
//!
//! hlc3 = (high + low + close) / 3
//! esa  = EMA(hlc3, channel_length)
//! de   = EMA(|hlc3 - esa|, channel_length)
//! ci   = (hlc3 - esa) / (ci_scale * de)      (undefined when de == 0)
//! wt1  = EMA(ci, average_length)
//! wt2  = SMA(wt1, signal_length)
//!
//! Exposed as one `Indicator` instance per line, mirroring multi-band indicators.
//! Lookback with defaults (9, 12, 3): wt1 = 27, wt2 = 29.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

use super::ema::ema_of_series;
use super::sma::sma_of_series;
use super::Indicator;

/// WaveTrend smoothing lengths and channel-index scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTrendParams {
    pub channel_length: usize,
    pub average_length: usize,
    pub signal_length: usize,
    pub ci_scale: f64,
}

impl Default for WaveTrendParams {
    fn default() -> Self {
        Self {
            channel_length: 9,
            average_length: 12,
            signal_length: 3,
            ci_scale: 0.015,
        }
    }
}

impl WaveTrendParams {
    /// Index of the first defined wt1 value on gap-free input.
    pub fn wt1_lookback(&self) -> usize {
        2 * self.channel_length.saturating_sub(1) + self.average_length.saturating_sub(1)
    }

    /// Index of the first defined wt2 value on gap-free input.
    pub fn wt2_lookback(&self) -> usize {
        self.wt1_lookback() + self.signal_length.saturating_sub(1)
    }
}

/// Which WaveTrend line an indicator instance yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveTrendLine {
    Wt1,
    Wt2,
}

/// Both WaveTrend lines, aligned 1:1 with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTrendLines {
    pub wt1: Vec<f64>,
    pub wt2: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct WaveTrend {
    params: WaveTrendParams,
    line: WaveTrendLine,
    name: String,
}

impl WaveTrend {
    pub fn wt1(params: WaveTrendParams) -> Self {
        Self::with_line(params, WaveTrendLine::Wt1)
    }

    pub fn wt2(params: WaveTrendParams) -> Self {
        Self::with_line(params, WaveTrendLine::Wt2)
    }

    fn with_line(params: WaveTrendParams, line: WaveTrendLine) -> Self {
        assert!(params.channel_length >= 1, "channel_length must be >= 1");
        assert!(params.average_length >= 1, "average_length must be >= 1");
        assert!(params.signal_length >= 1, "signal_length must be >= 1");
        let prefix = match line {
            WaveTrendLine::Wt1 => "wt1",
            WaveTrendLine::Wt2 => "wt2",
        };
        Self {
            params,
            line,
            name: format!(
                "{prefix}_{}_{}_{}",
                params.channel_length, params.average_length, params.signal_length
            ),
        }
    }

    /// Compute both lines in one pass over the bars.
    pub fn lines(&self, bars: &[Bar]) -> WaveTrendLines {
        compute_lines(bars, &self.params)
    }
}

impl Indicator for WaveTrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            WaveTrendLine::Wt1 => self.params.wt1_lookback(),
            WaveTrendLine::Wt2 => self.params.wt2_lookback(),
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let lines = self.lines(bars);
        match self.line {
            WaveTrendLine::Wt1 => lines.wt1,
            WaveTrendLine::Wt2 => lines.wt2,
        }
    }
}

/// Compute wt1 and wt2 for a bar slice.
pub fn compute_lines(bars: &[Bar], params: &WaveTrendParams) -> WaveTrendLines {
    let hlc3: Vec<f64> = bars.iter().map(Bar::hlc3).collect();
    let esa = ema_of_series(&hlc3, params.channel_length);

    let deviation: Vec<f64> = hlc3
        .iter()
        .zip(&esa)
        .map(|(price, avg)| (price - avg).abs())
        .collect();
    let de = ema_of_series(&deviation, params.channel_length);

    let ci: Vec<f64> = hlc3
        .iter()
        .zip(esa.iter().zip(&de))
        .map(|(&price, (&avg, &dev))| channel_index(price, avg, dev, params.ci_scale))
        .collect();

    let wt1 = ema_of_series(&ci, params.average_length);
    let wt2 = sma_of_series(&wt1, params.signal_length);

    WaveTrendLines { wt1, wt2 }
}

/// Channel index; undefined when the scaled deviation is zero or undefined.
fn channel_index(price: f64, esa: f64, de: f64, scale: f64) -> f64 {
    let denominator = scale * de;
    if denominator == 0.0 || !denominator.is_finite() || !esa.is_finite() {
        return f64::NAN;
    }
    (price - esa) / denominator
}

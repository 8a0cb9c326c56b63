//! WaveTrend crossover, zone and strength detection.
//!
//! Each bar is evaluated from its own wt1/wt2 values and the previous bar's values,
//! nothing older. Undefined inputs never produce a true flag.

use serde::Serialize;
use tracing::debug;

use super::flags::SignalFlags;

/// wt2 at or above this level is overbought.
pub const OVERBOUGHT_LEVEL: f64 = 53.0;
/// wt2 at or below this level is oversold.
pub const OVERSOLD_LEVEL: f64 = -53.0;
/// Up-cross-only events with |wt1 - wt2| at or above this are strong.
pub const UP_STRENGTH_THRESHOLD: f64 = 1.0;
/// Down-cross-only events with |wt1 - wt2| at or above this are strong.
/// Deliberately lower than the up threshold.
pub const DOWN_STRENGTH_THRESHOLD: f64 = 0.5;

/// Signal flags plus the |wt1 - wt2| spread, aligned 1:1 with the bar series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalTable {
    pub flags: Vec<SignalFlags>,
    pub wt1_minus_wt2: Vec<f64>,
}

impl SignalTable {
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn buy_count(&self) -> usize {
        self.flags.iter().filter(|f| f.buy_signal).count()
    }

    pub fn sell_count(&self) -> usize {
        self.flags.iter().filter(|f| f.sell_signal).count()
    }
}

/// Evaluate the flags at `index`.
///
/// Requires wt1/wt2 at `index`; crossovers additionally require them at `index - 1`.
/// Bar 0 never crosses.
pub fn evaluate(wt1: &[f64], wt2: &[f64], index: usize) -> SignalFlags {
    let (Some(&fast), Some(&slow)) = (wt1.get(index), wt2.get(index)) else {
        return SignalFlags::default();
    };
    if !fast.is_finite() || !slow.is_finite() {
        return SignalFlags::default();
    }

    let previous = index
        .checked_sub(1)
        .and_then(|p| Some((*wt1.get(p)?, *wt2.get(p)?)))
        .filter(|(f, s)| f.is_finite() && s.is_finite());

    let (wt_cross_up, wt_cross_down) = match previous {
        Some((fast_prev, slow_prev)) => (
            fast > slow && fast_prev <= slow_prev,
            fast < slow && fast_prev >= slow_prev,
        ),
        None => (false, false),
    };

    let wt_oversold = slow <= OVERSOLD_LEVEL;
    let wt_overbought = slow >= OVERBOUGHT_LEVEL;
    let buy_signal = wt_cross_up && wt_oversold;
    let sell_signal = wt_cross_down && wt_overbought;

    let wt_cross_up_only = wt_cross_up && !buy_signal && !sell_signal;
    let wt_cross_down_only = wt_cross_down && !buy_signal && !sell_signal;

    let spread = (fast - slow).abs();
    let up_strong = spread >= UP_STRENGTH_THRESHOLD;
    let down_strong = spread >= DOWN_STRENGTH_THRESHOLD;

    SignalFlags {
        wt_cross_up,
        wt_cross_down,
        wt_oversold,
        wt_overbought,
        buy_signal,
        sell_signal,
        wt_cross_up_only,
        wt_cross_down_only,
        wt_up_strong: wt_cross_up_only && up_strong,
        wt_up_weak: wt_cross_up_only && !up_strong,
        wt_down_strong: wt_cross_down_only && down_strong,
        wt_down_weak: wt_cross_down_only && !down_strong,
    }
}

/// Evaluate every bar.
pub fn detect(wt1: &[f64], wt2: &[f64]) -> SignalTable {
    debug_assert_eq!(wt1.len(), wt2.len(), "wt1/wt2 length mismatch");
    let n = wt1.len().min(wt2.len());

    let flags: Vec<SignalFlags> = (0..n).map(|i| evaluate(wt1, wt2, i)).collect();
    let wt1_minus_wt2 = wt1
        .iter()
        .zip(wt2)
        .map(|(fast, slow)| (fast - slow).abs())
        .collect();

    let table = SignalTable {
        flags,
        wt1_minus_wt2,
    };
    debug!(
        bars = n,
        buys = table.buy_count(),
        sells = table.sell_count(),
        "signals detected"
    );
    table
}

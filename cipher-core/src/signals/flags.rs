//! Per-bar signal flags.

use serde::{Deserialize, Serialize};

/// Direction of a WaveTrend crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    /// wt1 moved from at-or-below wt2 to above it.
    Up,
    /// wt1 moved from at-or-above wt2 to below it.
    Down,
}

/// Magnitude bucket of a cross that did not qualify as a buy/sell signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossStrength {
    Strong,
    Weak,
}

/// All signal flags for one bar.
///
/// Every flag is false on bars whose WaveTrend values are undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalFlags {
    pub wt_cross_up: bool,
    pub wt_cross_down: bool,
    pub wt_oversold: bool,
    pub wt_overbought: bool,
    pub buy_signal: bool,
    pub sell_signal: bool,
    pub wt_cross_up_only: bool,
    pub wt_cross_down_only: bool,
    pub wt_up_strong: bool,
    pub wt_up_weak: bool,
    pub wt_down_strong: bool,
    pub wt_down_weak: bool,
}

impl SignalFlags {
    pub fn cross(&self) -> Option<CrossDirection> {
        if self.wt_cross_up {
            Some(CrossDirection::Up)
        } else if self.wt_cross_down {
            Some(CrossDirection::Down)
        } else {
            None
        }
    }

    /// Strength bucket of a cross-only event, if this bar has one.
    pub fn cross_only_strength(&self) -> Option<(CrossDirection, CrossStrength)> {
        match (
            self.wt_up_strong,
            self.wt_up_weak,
            self.wt_down_strong,
            self.wt_down_weak,
        ) {
            (true, _, _, _) => Some((CrossDirection::Up, CrossStrength::Strong)),
            (_, true, _, _) => Some((CrossDirection::Up, CrossStrength::Weak)),
            (_, _, true, _) => Some((CrossDirection::Down, CrossStrength::Strong)),
            (_, _, _, true) => Some((CrossDirection::Down, CrossStrength::Weak)),
            _ => None,
        }
    }

    /// The six flags encoded into the feature vector, as 0/1 in feature order.
    pub fn feature_bits(&self) -> [f64; 6] {
        [
            self.wt_cross_up_only,
            self.wt_cross_down_only,
            self.wt_up_strong,
            self.wt_up_weak,
            self.wt_down_strong,
            self.wt_down_weak,
        ]
        .map(|flag| if flag { 1.0 } else { 0.0 })
    }
}

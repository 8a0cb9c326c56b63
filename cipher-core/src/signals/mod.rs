//! Signal detection: discrete WaveTrend events derived from indicator columns.
//!
//! Signals are pure functions of the indicator series. They never look further back
//! than the previous bar and never see classifier output.

pub mod detector;
pub mod flags;

pub use detector::{
    detect, evaluate, SignalTable, DOWN_STRENGTH_THRESHOLD, OVERBOUGHT_LEVEL, OVERSOLD_LEVEL,
    UP_STRENGTH_THRESHOLD,
};
pub use flags::{CrossDirection, CrossStrength, SignalFlags};

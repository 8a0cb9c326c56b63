//! Bar, the fundamental market data unit, and the ordered series the pipeline consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::ContentHash;

/// OHLCV bar for a single fixed time interval.
///
/// Price consistency (`high >= low` etc.) is expected from upstream but not enforced;
/// see [`Bar::is_sane`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Typical price: (high + low + close) / 3.
    pub fn hlc3(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any OHLCV field is not finite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("bar {index} at {current} is not after previous bar at {previous}")]
    NotAscending {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// Descriptive labels for a series. Carried through to the annotated output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    /// True when the bars came from the synthetic generator.
    #[serde(default)]
    pub synthetic: bool,
}

impl SeriesMeta {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            timeframe: Some(timeframe.into()),
            synthetic: false,
        }
    }

    /// "SYMBOL (timeframe)" label, or "unnamed series".
    pub fn label(&self) -> String {
        match (&self.symbol, &self.timeframe) {
            (Some(s), Some(t)) => format!("{s} ({t})"),
            (Some(s), None) => s.clone(),
            (None, Some(t)) => format!("({t})"),
            (None, None) => "unnamed series".to_string(),
        }
    }
}

/// Bars ordered strictly ascending by timestamp.
///
/// Immutable once constructed: the pipeline only ever reads it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BarSeries {
    meta: SeriesMeta,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, rejecting out-of-order or duplicate timestamps.
    pub fn new(bars: Vec<Bar>) -> Result<Self, BarError> {
        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(BarError::NotAscending {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self {
            meta: SeriesMeta::default(),
            bars,
        })
    }

    pub fn with_meta(mut self, meta: SeriesMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn meta(&self) -> &SeriesMeta {
        &self.meta
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Number of bars failing [`Bar::is_sane`].
    pub fn insane_count(&self) -> usize {
        self.bars.iter().filter(|b| !b.is_sane()).count()
    }

    /// BLAKE3 hash over timestamps and OHLCV values, hex encoded.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        for bar in &self.bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                hasher.update(&v.to_le_bytes());
            }
        }
        ContentHash(hasher.finalize().to_hex().to_string())
    }
}

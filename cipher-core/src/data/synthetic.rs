//! Seeded synthetic bar generator for offline runs and benchmarks.
//!
//! A geometric random walk with a slow sine drift so WaveTrend swings through both
//! zones. The seed is expanded with BLAKE3 together with the symbol, so two symbols
//! under the same seed get independent paths.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, BarError, BarSeries, SeriesMeta};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub bars: usize,
    pub seed: u64,
    pub symbol: String,
    pub timeframe: String,
    pub start_price: f64,
    /// Per-bar standard step, as a fraction of price.
    pub volatility: f64,
    pub interval_minutes: i64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            bars: 500,
            seed: 42,
            symbol: "SYNTH".into(),
            timeframe: "1h".into(),
            start_price: 100.0,
            volatility: 0.01,
            interval_minutes: 60,
        }
    }
}

impl SyntheticSpec {
    pub fn with_bars(bars: usize, seed: u64) -> Self {
        Self {
            bars,
            seed,
            ..Self::default()
        }
    }

    /// Seed for this generator's symbol, independent of generation order.
    pub fn sub_seed(&self) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(self.symbol.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    fn start(&self) -> DateTime<Utc> {
        // 2024-01-01T00:00:00Z
        DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default()
    }
}

/// Generate bars. Every bar satisfies `low <= min(open, close) <= max(open, close) <= high`
/// with `high > low`.
pub fn generate_bars(spec: &SyntheticSpec) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(spec.sub_seed());
    let start = spec.start();
    let step = Duration::minutes(spec.interval_minutes.max(1));

    let mut close = spec.start_price.max(f64::MIN_POSITIVE);
    (0..spec.bars)
        .map(|i| {
            let open = close;
            let drift = (i as f64 / 40.0).sin() * spec.volatility * 0.5;
            let shock: f64 = rng.gen_range(-1.0..1.0) * spec.volatility;
            close = (open * (1.0 + drift + shock)).max(f64::MIN_POSITIVE);

            let wick_up: f64 = rng.gen_range(0.05..1.0) * spec.volatility * open;
            let wick_down: f64 = rng.gen_range(0.05..1.0) * spec.volatility * open;
            let high = open.max(close) + wick_up;
            let low = (open.min(close) - wick_down).max(f64::MIN_POSITIVE);
            let volume = rng.gen_range(500.0..1500.0);

            Bar::new(start + step * i as i32, open, high, low, close, volume)
        })
        .collect()
}

/// Generate a series tagged as synthetic.
pub fn generate_series(spec: &SyntheticSpec) -> Result<BarSeries, BarError> {
    let meta = SeriesMeta {
        synthetic: true,
        ..SeriesMeta::new(spec.symbol.clone(), spec.timeframe.clone())
    };
    Ok(BarSeries::new(generate_bars(spec))?.with_meta(meta))
}

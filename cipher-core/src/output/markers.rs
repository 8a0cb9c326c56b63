//! Chart markers for the rendering consumer.
//!
//! Signals sit just outside the bar (below the low for buys, above the high for sells),
//! predictions slightly closer in so both can show on the same bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::annotated::AnnotatedBarSeries;

const SIGNAL_OFFSET: f64 = 0.02;
const PREDICTION_OFFSET: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    BuySignal,
    SellSignal,
    PredictedBuy,
    PredictedSell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub source_index: usize,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Markers in row order; within a row: buy signal, sell signal, predicted buy, predicted sell.
pub fn extract_markers(series: &AnnotatedBarSeries) -> Vec<Marker> {
    let mut markers = Vec::new();
    for row in &series.rows {
        let mut push = |kind, price| {
            markers.push(Marker {
                kind,
                source_index: row.source_index,
                timestamp: row.timestamp,
                price,
            })
        };
        if row.flags.buy_signal {
            push(MarkerKind::BuySignal, row.low * (1.0 - SIGNAL_OFFSET));
        }
        if row.flags.sell_signal {
            push(MarkerKind::SellSignal, row.high * (1.0 + SIGNAL_OFFSET));
        }
        if row.prediction_buy == 1 {
            push(MarkerKind::PredictedBuy, row.low * (1.0 - PREDICTION_OFFSET));
        }
        if row.prediction_sell == 1 {
            push(MarkerKind::PredictedSell, row.high * (1.0 + PREDICTION_OFFSET));
        }
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::annotated::fixtures::sample;

    #[test]
    fn marker_placement() {
        let markers = extract_markers(&sample());
        let kinds: Vec<MarkerKind> = markers.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MarkerKind::BuySignal,
                MarkerKind::PredictedBuy,
                MarkerKind::PredictedSell,
                MarkerKind::SellSignal,
            ]
        );
        // row 0: low 99
        assert!((markers[0].price - 99.0 * 0.98).abs() < 1e-9);
        assert!((markers[1].price - 99.0 * 0.99).abs() < 1e-9);
        // row 1: high 103
        assert!((markers[2].price - 103.0 * 1.01).abs() < 1e-9);
        assert_eq!(markers[2].source_index, 61);
        // row 2: high 104
        assert!((markers[3].price - 104.0 * 1.02).abs() < 1e-9);
    }

    #[test]
    fn no_events_no_markers() {
        let mut series = sample();
        series.rows.clear();
        assert!(extract_markers(&series).is_empty());
    }
}

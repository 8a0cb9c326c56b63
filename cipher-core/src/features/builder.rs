//! Assembles the classifier feature matrix from indicators and signals.

use serde::Serialize;
use tracing::debug;

use super::matrix::{FeatureMatrix, FeatureVector};
use crate::indicators::IndicatorSeries;
use crate::signals::SignalTable;

/// Which bars carry a complete feature row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidityMask(Vec<bool>);

impl ValidityMask {
    pub fn from_indicators(indicators: &IndicatorSeries) -> Self {
        Self((0..indicators.len()).map(|i| indicators.is_defined(i)).collect())
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.0.iter().filter(|v| **v).count()
    }

    /// Positions of valid bars, ascending.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().filter_map(|(i, v)| v.then_some(i))
    }
}

/// Feature matrix plus the mask it was filtered by.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    pub matrix: FeatureMatrix,
    pub mask: ValidityMask,
}

/// Build one row per bar whose wt1, wt2 and rsi_mfi are all defined.
///
/// Rows are filtered position by position, so a gap in the middle of the series
/// drops only the affected bars and every row keeps its source bar index.
pub fn build_features(indicators: &IndicatorSeries, signals: &SignalTable) -> FeatureSet {
    let mask = ValidityMask::from_indicators(indicators);

    let rows: Vec<(usize, FeatureVector)> = mask
        .indices()
        .filter_map(|i| {
            Some((
                i,
                FeatureVector {
                    wt1: indicators.wt1[i],
                    wt2: indicators.wt2[i],
                    rsi_mfi: indicators.rsi_mfi[i],
                    wt1_minus_wt2: *signals.wt1_minus_wt2.get(i)?,
                    flags: *signals.flags.get(i)?,
                },
            ))
        })
        .collect();

    let matrix = FeatureMatrix::from_vectors(&rows);
    debug!(
        bars = mask.len(),
        rows = matrix.n_rows(),
        first = ?matrix.source_index().first(),
        "features built"
    );
    FeatureSet { matrix, mask }
}

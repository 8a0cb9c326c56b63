//! Feature vectors and the row-major feature matrix handed to classifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signals::SignalFlags;

/// Classifier input columns, in the order models were trained on.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "wt1",
    "wt2",
    "rsi_mfi",
    "wt1-wt2",
    "wt_cross_up_only",
    "wt_cross_down_only",
    "wt_up_strong",
    "wt_up_weak",
    "wt_down_strong",
    "wt_down_weak",
];

pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

#[derive(Debug, Error, PartialEq)]
pub enum FeatureError {
    #[error("row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{rows} rows but {indices} source indices")]
    SourceIndexLength { rows: usize, indices: usize },
}

/// One bar's classifier input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub wt1: f64,
    pub wt2: f64,
    pub rsi_mfi: f64,
    pub wt1_minus_wt2: f64,
    pub flags: SignalFlags,
}

impl FeatureVector {
    /// Values in [`FEATURE_COLUMNS`] order, flags as 0/1.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        let bits = self.flags.feature_bits();
        [
            self.wt1,
            self.wt2,
            self.rsi_mfi,
            self.wt1_minus_wt2,
            bits[0],
            bits[1],
            bits[2],
            bits[3],
            bits[4],
            bits[5],
        ]
    }
}

/// Named columns over row-major values.
///
/// Each row remembers the position of the bar it was built from in the original series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Vec<f64>,
    source_index: Vec<usize>,
}

impl FeatureMatrix {
    /// Matrix with the standard columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            values: Vec::new(),
            source_index: Vec::new(),
        }
    }

    /// Build from feature vectors tagged with their source bar index.
    pub fn from_vectors(rows: &[(usize, FeatureVector)]) -> Self {
        let mut matrix = Self::empty();
        matrix.values.reserve(rows.len() * FEATURE_COUNT);
        for (index, vector) in rows {
            matrix.values.extend_from_slice(&vector.to_array());
            matrix.source_index.push(*index);
        }
        matrix
    }

    /// Build from arbitrary named columns. Rows must all match the column count.
    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
        source_index: Vec<usize>,
    ) -> Result<Self, FeatureError> {
        if rows.len() != source_index.len() {
            return Err(FeatureError::SourceIndexLength {
                rows: rows.len(),
                indices: source_index.len(),
            });
        }
        let width = columns.len();
        let mut values = Vec::with_capacity(rows.len() * width);
        for (row, data) in rows.into_iter().enumerate() {
            if data.len() != width {
                return Err(FeatureError::RaggedRow {
                    row,
                    expected: width,
                    actual: data.len(),
                });
            }
            values.extend(data);
        }
        Ok(Self {
            columns,
            values,
            source_index,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.source_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_index.is_empty()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let width = self.n_cols();
        let start = row.checked_mul(width)?;
        self.values.get(start..start + width)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on zero width
        self.values.chunks_exact(self.n_cols().max(1))
    }

    /// Original bar position of each row.
    pub fn source_index(&self) -> &[usize] {
        &self.source_index
    }

    /// True when the columns are exactly [`FEATURE_COLUMNS`] in order.
    pub fn has_standard_columns(&self) -> bool {
        self.columns.len() == FEATURE_COUNT
            && self.columns.iter().zip(FEATURE_COLUMNS).all(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(wt1: f64) -> FeatureVector {
        FeatureVector {
            wt1,
            wt2: wt1 - 1.0,
            rsi_mfi: 12.5,
            wt1_minus_wt2: 1.0,
            flags: SignalFlags {
                wt_cross_up: true,
                wt_cross_up_only: true,
                wt_up_strong: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn vector_array_follows_column_order() {
        let arr = vector(5.0).to_array();
        assert_eq!(arr, [5.0, 4.0, 12.5, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn from_vectors_keeps_source_index() {
        let matrix = FeatureMatrix::from_vectors(&[(60, vector(1.0)), (62, vector(2.0))]);
        assert_eq!(matrix.shape(), (2, FEATURE_COUNT));
        assert_eq!(matrix.source_index(), &[60, 62]);
        assert_eq!(matrix.row(1).unwrap()[0], 2.0);
        assert!(matrix.row(2).is_none());
        assert_eq!(matrix.rows().count(), 2);
        assert!(matrix.has_standard_columns());
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let err = FeatureMatrix::from_rows(columns, vec![vec![1.0, 2.0], vec![1.0]], vec![0, 1])
            .unwrap_err();
        assert_eq!(
            err,
            FeatureError::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn from_rows_rejects_index_length() {
        let err = FeatureMatrix::from_rows(vec!["a".into()], vec![vec![1.0]], vec![]).unwrap_err();
        assert!(matches!(err, FeatureError::SourceIndexLength { .. }));
    }

    #[test]
    fn nine_columns_are_not_standard() {
        let columns: Vec<String> = FEATURE_COLUMNS[..9].iter().map(|c| c.to_string()).collect();
        let matrix = FeatureMatrix::from_rows(columns, vec![vec![0.0; 9]], vec![0]).unwrap();
        assert_eq!(matrix.shape(), (1, 9));
        assert!(!matrix.has_standard_columns());
    }

    #[test]
    fn empty_matrix() {
        let matrix = FeatureMatrix::empty();
        assert!(matrix.is_empty());
        assert_eq!(matrix.shape(), (0, FEATURE_COUNT));
        assert_eq!(matrix.rows().count(), 0);
    }
}

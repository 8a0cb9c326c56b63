//! Runs the buy and sell classifiers over a checked feature matrix.

use tracing::debug;

use super::Classifier;
use crate::features::{FeatureMatrix, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::pipeline::PipelineError;

/// Per-row predictions, aligned with the feature matrix rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predictions {
    pub buy: Vec<u8>,
    pub sell: Vec<u8>,
}

impl Predictions {
    pub fn len(&self) -> usize {
        self.buy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty()
    }
}

fn describe_columns<S: AsRef<str>>(columns: &[S]) -> String {
    let names: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    format!("{} columns [{}]", names.len(), names.join(", "))
}

/// The matrix must carry exactly the trained columns in the trained order.
pub fn check_schema(features: &FeatureMatrix) -> Result<(), PipelineError> {
    if features.has_standard_columns() {
        return Ok(());
    }
    Err(PipelineError::SchemaMismatch {
        subject: "feature matrix".into(),
        expected: describe_columns(FEATURE_COLUMNS.as_slice()),
        actual: describe_columns(features.columns()),
    })
}

fn check_classifier(classifier: &dyn Classifier) -> Result<(), PipelineError> {
    if classifier.n_features() == FEATURE_COUNT {
        return Ok(());
    }
    Err(PipelineError::SchemaMismatch {
        subject: format!("classifier '{}'", classifier.name()),
        expected: format!("{FEATURE_COUNT} features"),
        actual: format!("{} features", classifier.n_features()),
    })
}

fn run_one(classifier: &dyn Classifier, features: &FeatureMatrix) -> Result<Vec<u8>, PipelineError> {
    let labels = classifier
        .predict(features)
        .map_err(|source| PipelineError::Classifier {
            name: classifier.name().to_string(),
            source,
        })?;

    if labels.len() != features.n_rows() {
        return Err(PipelineError::InvalidPrediction {
            classifier: classifier.name().to_string(),
            reason: format!("{} labels for {} rows", labels.len(), features.n_rows()),
        });
    }
    if let Some((row, label)) = labels.iter().enumerate().find(|(_, l)| **l > 1) {
        return Err(PipelineError::InvalidPrediction {
            classifier: classifier.name().to_string(),
            reason: format!("label {label} at row {row} is not 0 or 1"),
        });
    }
    Ok(labels)
}

/// Predict buy and sell labels for every matrix row.
///
/// Every shape check runs before either classifier is called, so a mismatch never
/// yields partial output. An empty matrix returns empty predictions without invoking
/// the classifiers.
pub fn predict(
    features: &FeatureMatrix,
    buy: &dyn Classifier,
    sell: &dyn Classifier,
) -> Result<Predictions, PipelineError> {
    check_schema(features)?;
    check_classifier(buy)?;
    check_classifier(sell)?;

    if features.is_empty() {
        debug!("empty feature matrix, classifiers skipped");
        return Ok(Predictions::default());
    }

    let predictions = Predictions {
        buy: run_one(buy, features)?,
        sell: run_one(sell, features)?,
    };
    debug!(
        rows = features.n_rows(),
        buy = predictions.buy.iter().filter(|l| **l == 1).count(),
        sell = predictions.sell.iter().filter(|l| **l == 1).count(),
        "predictions complete"
    );
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierError;
    use crate::features::FeatureVector;
    use crate::signals::SignalFlags;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        label: u8,
        width: usize,
        extra: usize,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(label: u8) -> Self {
            Self {
                label,
                width: FEATURE_COUNT,
                extra: 0,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Classifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn n_features(&self) -> usize {
            self.width
        }

        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![self.label; features.n_rows() + self.extra])
        }
    }

    fn matrix(rows: usize) -> FeatureMatrix {
        let vectors: Vec<(usize, FeatureVector)> = (0..rows)
            .map(|i| {
                (
                    60 + i,
                    FeatureVector {
                        wt1: 1.0,
                        wt2: 0.5,
                        rsi_mfi: 3.0,
                        wt1_minus_wt2: 0.5,
                        flags: SignalFlags::default(),
                    },
                )
            })
            .collect();
        FeatureMatrix::from_vectors(&vectors)
    }

    #[test]
    fn predicts_one_label_per_row() {
        let buy = Fixed::new(1);
        let sell = Fixed::new(0);
        let out = predict(&matrix(3), &buy, &sell).unwrap();
        assert_eq!(out.buy, vec![1, 1, 1]);
        assert_eq!(out.sell, vec![0, 0, 0]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn empty_matrix_skips_classifiers() {
        let buy = Fixed::new(1);
        let sell = Fixed::new(1);
        let out = predict(&FeatureMatrix::empty(), &buy, &sell).unwrap();
        assert!(out.is_empty());
        assert_eq!(buy.calls.load(Ordering::SeqCst), 0);
        assert_eq!(sell.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_columns_is_schema_mismatch_before_any_call() {
        let columns: Vec<String> = FEATURE_COLUMNS[..9].iter().map(|c| c.to_string()).collect();
        let nine = FeatureMatrix::from_rows(columns, vec![vec![0.0; 9]], vec![0]).unwrap();
        let buy = Fixed::new(1);
        let sell = Fixed::new(0);
        let err = predict(&nine, &buy, &sell).unwrap_err();
        match err {
            PipelineError::SchemaMismatch {
                expected, actual, ..
            } => {
                assert!(expected.starts_with("10 columns"));
                assert!(actual.starts_with("9 columns"));
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
        assert_eq!(buy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reordered_columns_is_schema_mismatch() {
        let mut columns: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.swap(0, 1);
        let m = FeatureMatrix::from_rows(columns, vec![vec![0.0; 10]], vec![0]).unwrap();
        let err = predict(&m, &Fixed::new(0), &Fixed::new(0)).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn classifier_width_mismatch() {
        let buy = Fixed::new(1);
        let mut sell = Fixed::new(0);
        sell.width = 9;
        let err = predict(&matrix(2), &buy, &sell).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
        assert_eq!(buy.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_label_count_is_invalid() {
        let mut buy = Fixed::new(1);
        buy.extra = 1;
        let err = predict(&matrix(2), &buy, &Fixed::new(0)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPrediction { .. }));
    }

    #[test]
    fn non_binary_label_is_invalid() {
        let err = predict(&matrix(2), &Fixed::new(0), &Fixed::new(2)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidPrediction { .. }));
    }
}

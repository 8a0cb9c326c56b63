//! Logistic regression scorer.

use serde::{Deserialize, Serialize};

use super::ClassifierError;

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub n_features: usize,
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Probability at or above which the label is 1.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Numerically stable logistic function.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

impl LogisticModel {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.weights.len() != self.n_features {
            return Err(ClassifierError::InvalidModel(format!(
                "{} weights for {} features",
                self.weights.len(),
                self.n_features
            )));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ClassifierError::InvalidModel(
                "non-finite coefficient".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ClassifierError::InvalidModel(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    pub fn probability(&self, row: &[f64]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        sigmoid(z)
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        if row.len() != self.n_features {
            return Err(ClassifierError::WidthMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }
        Ok(u8::from(self.probability(row) >= self.threshold))
    }
}

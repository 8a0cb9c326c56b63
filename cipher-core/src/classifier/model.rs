//! On-disk model format and the loaded model handle.

use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use super::logistic::LogisticModel;
use super::tree::DecisionTree;
use super::{Classifier, ClassifierError};
use crate::domain::ModelId;
use crate::features::FeatureMatrix;

/// A model file, tagged by `kind`.
///
/// ```json
/// {"kind": "logistic", "n_features": 10, "weights": [...], "intercept": 0.0}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    Logistic(LogisticModel),
}

impl ModelSpec {
    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let spec: Self =
            serde_json::from_str(json).map_err(|e| ClassifierError::InvalidModel(e.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::DecisionTree(_) => "decision_tree",
            ModelSpec::RandomForest(_) => "random_forest",
            ModelSpec::Logistic(_) => "logistic",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            ModelSpec::DecisionTree(m) => m.n_features,
            ModelSpec::RandomForest(m) => m.n_features,
            ModelSpec::Logistic(m) => m.n_features,
        }
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.n_features() == 0 {
            return Err(ClassifierError::InvalidModel("n_features is 0".into()));
        }
        match self {
            ModelSpec::DecisionTree(m) => m.validate(),
            ModelSpec::RandomForest(m) => m.validate(),
            ModelSpec::Logistic(m) => m.validate(),
        }
    }

    pub fn predict_row(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        match self {
            ModelSpec::DecisionTree(m) => m.predict_row(row),
            ModelSpec::RandomForest(m) => m.predict_row(row),
            ModelSpec::Logistic(m) => m.predict_row(row),
        }
    }

    /// One label per matrix row. The matrix must be exactly `n_features` wide.
    pub fn predict_matrix(&self, features: &FeatureMatrix) -> Result<Vec<u8>, ClassifierError> {
        if features.n_cols() != self.n_features() {
            return Err(ClassifierError::WidthMismatch {
                expected: self.n_features(),
                actual: features.n_cols(),
            });
        }
        features.rows().map(|row| self.predict_row(row)).collect()
    }
}

/// A validated model together with its identity.
#[derive(Debug, Clone)]
pub struct Model {
    id: ModelId,
    spec: ModelSpec,
}

impl Model {
    pub fn new(id: ModelId, spec: ModelSpec) -> Result<Self, ClassifierError> {
        spec.validate()?;
        Ok(Self { id, spec })
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }
}

impl Classifier for Model {
    fn name(&self) -> &str {
        &self.id.tag
    }

    fn n_features(&self) -> usize {
        self.spec.n_features()
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>, ClassifierError> {
        self.spec.predict_matrix(features)
    }
}

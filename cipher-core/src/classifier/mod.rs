//! Classifier bridge: binary buy/sell predictors over the feature matrix.
//!
//! Model families implement [`Classifier`]; the bridge checks the matrix against the
//! trained column layout before any model sees it. Loaded models are immutable and
//! shared across threads via `Arc<dyn Classifier>`.

pub mod bridge;
pub mod forest;
pub mod logistic;
pub mod model;
pub mod store;
pub mod tree;

pub use bridge::{check_schema, predict, Predictions};
pub use forest::RandomForest;
pub use logistic::LogisticModel;
pub use model::{Model, ModelSpec};
pub use store::{ModelCache, ModelStore, ModelStoreError};
pub use tree::{DecisionTree, TreeNode};

use thiserror::Error;

use crate::features::FeatureMatrix;

#[derive(Debug, Error, PartialEq)]
pub enum ClassifierError {
    #[error("row width {actual} does not match model width {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// A binary classifier: one label in {0, 1} per feature-matrix row.
pub trait Classifier: Send + Sync {
    /// Model name or tag, for logs and errors.
    fn name(&self) -> &str;

    /// Number of feature columns the model was trained on.
    fn n_features(&self) -> usize;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>, ClassifierError>;
}

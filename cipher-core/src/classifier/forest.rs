//! Random forest: majority vote over decision trees.

use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;
use super::ClassifierError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.trees.is_empty() {
            return Err(ClassifierError::InvalidModel("forest has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features != self.n_features {
                return Err(ClassifierError::InvalidModel(format!(
                    "tree {i} expects {} features, forest expects {}",
                    tree.n_features, self.n_features
                )));
            }
            tree.validate()?;
        }
        Ok(())
    }

    /// 1 only when strictly more than half of the trees vote 1; ties go to 0.
    pub fn predict_row(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        let mut positive = 0usize;
        for tree in &self.trees {
            if tree.predict_row(row)? == 1 {
                positive += 1;
            }
        }
        Ok(u8::from(positive * 2 > self.trees.len()))
    }
}

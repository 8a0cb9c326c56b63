//! Decision tree stored as a flat node array.

use serde::{Deserialize, Serialize};

use super::ClassifierError;

/// One node of a flat tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes to `left`, everything else to `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        label: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Reject trees that could index out of bounds, loop, or emit a non-binary label.
    ///
    /// Children must sit after their parent in the array, which rules out cycles.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.nodes.is_empty() {
            return Err(ClassifierError::InvalidModel("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= self.n_features {
                        return Err(ClassifierError::InvalidModel(format!(
                            "node {i} splits on feature {feature}, model has {}",
                            self.n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ClassifierError::InvalidModel(format!(
                            "node {i} has non-finite threshold"
                        )));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(ClassifierError::InvalidModel(format!(
                                "node {i} has invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { label } => {
                    if label > 1 {
                        return Err(ClassifierError::InvalidModel(format!(
                            "leaf {i} has label {label}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf. Assumes a validated tree and a row of `n_features` values.
    pub fn predict_row(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        let mut index = 0;
        // A validated tree strictly increases the index, so the walk ends within nodes.len() steps
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { label }) => return Ok(*label),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().ok_or(ClassifierError::WidthMismatch {
                        expected: self.n_features,
                        actual: row.len(),
                    })?;
                    index = if value <= *threshold { *left } else { *right };
                }
                None => break,
            }
        }
        Err(ClassifierError::InvalidModel(format!(
            "tree walk did not reach a leaf (node {index})"
        )))
    }
}

#[cfg(test)]
pub(crate) fn stump(feature: usize, threshold: f64, n_features: usize) -> DecisionTree {
    DecisionTree {
        n_features,
        nodes: vec![
            TreeNode::Split {
                feature,
                threshold,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { label: 0 },
            TreeNode::Leaf { label: 1 },
        ],
    }
}

//! Feature builder: indicator columns and signal flags as classifier input.

pub mod builder;
pub mod matrix;

pub use builder::{build_features, FeatureSet, ValidityMask};
pub use matrix::{FeatureError, FeatureMatrix, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};

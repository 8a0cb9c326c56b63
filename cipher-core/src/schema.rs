//! Column contracts at the crate boundaries.
//!
//! - Input: the bar table accepted by the CSV and Parquet readers.
//! - Output: the versioned columns the rendering consumer reads, plus the full
//!   annotated row written by the exporters.

use serde::{Deserialize, Serialize};

/// Version of the annotated output layout. Bump on any column change.
pub const OUTPUT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaType {
    /// Epoch milliseconds, UTC.
    TimestampMs,
    Int64,
    Float64,
    /// 0/1 flag.
    Flag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: &'static str,
    pub dtype: SchemaType,
}

const fn field(name: &'static str, dtype: SchemaType) -> SchemaField {
    SchemaField { name, dtype }
}

/// Bar table accepted on input. Extra columns are ignored.
pub const INPUT_BAR_SCHEMA: &[SchemaField] = &[
    field("timestamp", SchemaType::TimestampMs),
    field("open", SchemaType::Float64),
    field("high", SchemaType::Float64),
    field("low", SchemaType::Float64),
    field("close", SchemaType::Float64),
    field("volume", SchemaType::Float64),
];

/// Columns the rendering consumer relies on.
pub const OUTPUT_COLUMNS: &[SchemaField] = &[
    field("timestamp", SchemaType::TimestampMs),
    field("open", SchemaType::Float64),
    field("high", SchemaType::Float64),
    field("low", SchemaType::Float64),
    field("close", SchemaType::Float64),
    field("volume", SchemaType::Float64),
    field("wt1", SchemaType::Float64),
    field("wt2", SchemaType::Float64),
    field("rsi_mfi", SchemaType::Float64),
    field("buy_signal", SchemaType::Flag),
    field("sell_signal", SchemaType::Flag),
    field("prediction_buy", SchemaType::Flag),
    field("prediction_sell", SchemaType::Flag),
];

/// Full annotated row, in export order. A superset of [`OUTPUT_COLUMNS`].
pub const EXPORT_COLUMNS: &[SchemaField] = &[
    field("source_index", SchemaType::Int64),
    field("timestamp", SchemaType::TimestampMs),
    field("open", SchemaType::Float64),
    field("high", SchemaType::Float64),
    field("low", SchemaType::Float64),
    field("close", SchemaType::Float64),
    field("volume", SchemaType::Float64),
    field("wt1", SchemaType::Float64),
    field("wt2", SchemaType::Float64),
    field("rsi_mfi", SchemaType::Float64),
    field("wt1_minus_wt2", SchemaType::Float64),
    field("wt_cross_up", SchemaType::Flag),
    field("wt_cross_down", SchemaType::Flag),
    field("wt_oversold", SchemaType::Flag),
    field("wt_overbought", SchemaType::Flag),
    field("buy_signal", SchemaType::Flag),
    field("sell_signal", SchemaType::Flag),
    field("wt_cross_up_only", SchemaType::Flag),
    field("wt_cross_down_only", SchemaType::Flag),
    field("wt_up_strong", SchemaType::Flag),
    field("wt_up_weak", SchemaType::Flag),
    field("wt_down_strong", SchemaType::Flag),
    field("wt_down_weak", SchemaType::Flag),
    field("prediction_buy", SchemaType::Flag),
    field("prediction_sell", SchemaType::Flag),
];

pub fn column_names(schema: &[SchemaField]) -> Vec<&'static str> {
    schema.iter().map(|f| f.name).collect()
}

/// Result of schema validation.
#[derive(Debug, Clone)]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check that every required column is present with the expected type.
///
/// Extra columns are reported only when `strict` is set.
pub fn validate_columns(
    required: &[SchemaField],
    columns: &[(&str, SchemaType)],
    strict: bool,
) -> SchemaValidation {
    let mut errors = Vec::new();

    for expected in required {
        match columns.iter().find(|(name, _)| *name == expected.name) {
            Some((_, dtype)) if *dtype == expected.dtype => {}
            Some((_, dtype)) => {
                errors.push(format!(
                    "column '{}': expected {:?}, got {:?}",
                    expected.name, expected.dtype, dtype
                ));
            }
            None => {
                errors.push(format!("missing required column '{}'", expected.name));
            }
        }
    }

    if strict {
        for (name, _) in columns {
            if !required.iter().any(|f| f.name == *name) {
                errors.push(format!("unexpected column '{name}'"));
            }
        }
    }

    SchemaValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

//! Export of the annotated series: CSV, JSON and Parquet.
//!
//! - **CSV**: one line per retained bar, [`EXPORT_COLUMNS`] order, flags as 0/1,
//!   timestamps as epoch milliseconds.
//! - **JSON**: full serialization including `schema_version` and series metadata.
//!   Newer schema versions are rejected on import.
//! - **Parquet**: same columns as CSV, via polars.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;
use tracing::info;

use super::annotated::{AnnotatedBar, AnnotatedBarSeries};
use super::markers::extract_markers;
use crate::config::OutputFormat;
use crate::schema::{column_names, EXPORT_COLUMNS, OUTPUT_SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn flag(value: bool) -> String {
    u8::from(value).to_string()
}

// ─── CSV ────────────────────────────────────────────────────────────

fn csv_record(row: &AnnotatedBar) -> Vec<String> {
    let f = &row.flags;
    vec![
        row.source_index.to_string(),
        row.timestamp.timestamp_millis().to_string(),
        row.open.to_string(),
        row.high.to_string(),
        row.low.to_string(),
        row.close.to_string(),
        row.volume.to_string(),
        row.wt1.to_string(),
        row.wt2.to_string(),
        row.rsi_mfi.to_string(),
        row.wt1_minus_wt2.to_string(),
        flag(f.wt_cross_up),
        flag(f.wt_cross_down),
        flag(f.wt_oversold),
        flag(f.wt_overbought),
        flag(f.buy_signal),
        flag(f.sell_signal),
        flag(f.wt_cross_up_only),
        flag(f.wt_cross_down_only),
        flag(f.wt_up_strong),
        flag(f.wt_up_weak),
        flag(f.wt_down_strong),
        flag(f.wt_down_weak),
        row.prediction_buy.to_string(),
        row.prediction_sell.to_string(),
    ]
}

pub fn export_csv(series: &AnnotatedBarSeries) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(column_names(EXPORT_COLUMNS))?;
    for row in &series.rows {
        wtr.write_record(csv_record(row))?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(data)?)
}

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(series: &AnnotatedBarSeries) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(series)?)
}

/// Deserialize, rejecting series written by a newer schema.
pub fn import_json(json: &str) -> Result<AnnotatedBarSeries, ExportError> {
    let series: AnnotatedBarSeries = serde_json::from_str(json)?;
    if series.schema_version > OUTPUT_SCHEMA_VERSION {
        return Err(ExportError::UnsupportedVersion {
            found: series.schema_version,
            supported: OUTPUT_SCHEMA_VERSION,
        });
    }
    Ok(series)
}

// ─── Parquet ────────────────────────────────────────────────────────

fn float_column(rows: &[AnnotatedBar], name: &str, get: fn(&AnnotatedBar) -> f64) -> Column {
    Column::new(name.into(), rows.iter().map(get).collect::<Vec<f64>>())
}

fn flag_column(rows: &[AnnotatedBar], name: &str, get: fn(&AnnotatedBar) -> bool) -> Column {
    Column::new(name.into(), rows.iter().map(get).collect::<Vec<bool>>())
}

/// Build a DataFrame with [`EXPORT_COLUMNS`].
pub fn to_dataframe(series: &AnnotatedBarSeries) -> Result<DataFrame, ExportError> {
    let rows = series.rows.as_slice();

    DataFrame::new(vec![
        Column::new(
            "source_index".into(),
            rows.iter().map(|r| r.source_index as i64).collect::<Vec<i64>>(),
        ),
        Column::new(
            "timestamp".into(),
            rows.iter()
                .map(|r| r.timestamp.timestamp_millis())
                .collect::<Vec<i64>>(),
        ),
        float_column(rows, "open", |r| r.open),
        float_column(rows, "high", |r| r.high),
        float_column(rows, "low", |r| r.low),
        float_column(rows, "close", |r| r.close),
        float_column(rows, "volume", |r| r.volume),
        float_column(rows, "wt1", |r| r.wt1),
        float_column(rows, "wt2", |r| r.wt2),
        float_column(rows, "rsi_mfi", |r| r.rsi_mfi),
        float_column(rows, "wt1_minus_wt2", |r| r.wt1_minus_wt2),
        flag_column(rows, "wt_cross_up", |r| r.flags.wt_cross_up),
        flag_column(rows, "wt_cross_down", |r| r.flags.wt_cross_down),
        flag_column(rows, "wt_oversold", |r| r.flags.wt_oversold),
        flag_column(rows, "wt_overbought", |r| r.flags.wt_overbought),
        flag_column(rows, "buy_signal", |r| r.flags.buy_signal),
        flag_column(rows, "sell_signal", |r| r.flags.sell_signal),
        flag_column(rows, "wt_cross_up_only", |r| r.flags.wt_cross_up_only),
        flag_column(rows, "wt_cross_down_only", |r| r.flags.wt_cross_down_only),
        flag_column(rows, "wt_up_strong", |r| r.flags.wt_up_strong),
        flag_column(rows, "wt_up_weak", |r| r.flags.wt_up_weak),
        flag_column(rows, "wt_down_strong", |r| r.flags.wt_down_strong),
        flag_column(rows, "wt_down_weak", |r| r.flags.wt_down_weak),
        flag_column(rows, "prediction_buy", |r| r.prediction_buy == 1),
        flag_column(rows, "prediction_sell", |r| r.prediction_sell == 1),
    ])
    .map_err(|e| ExportError::Parquet(format!("dataframe creation: {e}")))
}

pub fn write_parquet(series: &AnnotatedBarSeries, path: &Path) -> Result<(), ExportError> {
    let mut df = to_dataframe(series)?;
    let file = fs::File::create(path).map_err(io_error(path))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| ExportError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Base file name for a series: `{symbol}_{timeframe}`, or `annotated` when unnamed.
pub fn file_stem(series: &AnnotatedBarSeries) -> String {
    let meta = &series.meta;
    let parts: Vec<&str> = [meta.symbol.as_deref(), meta.timeframe.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        "annotated".to_string()
    } else {
        parts
            .join("_")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    }
}

/// Write the series in every requested format plus a markers file.
///
/// Files land in `dir` as `{stem}.{ext}` and `{stem}.markers.json`.
/// Returns the written paths.
pub fn write_outputs(
    series: &AnnotatedBarSeries,
    dir: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let stem = file_stem(series);
    let mut written = Vec::with_capacity(formats.len() + 1);

    for format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        match format {
            OutputFormat::Csv => {
                fs::write(&path, export_csv(series)?).map_err(io_error(&path))?;
            }
            OutputFormat::Json => {
                fs::write(&path, export_json(series)?).map_err(io_error(&path))?;
            }
            OutputFormat::Parquet => write_parquet(series, &path)?,
        }
        written.push(path);
    }

    let markers_path = dir.join(format!("{stem}.markers.json"));
    let markers = serde_json::to_string_pretty(&extract_markers(series))?;
    fs::write(&markers_path, markers).map_err(io_error(&markers_path))?;
    written.push(markers_path);

    info!(
        dir = %dir.display(),
        files = written.len(),
        rows = series.len(),
        "outputs written"
    );
    Ok(written)
}

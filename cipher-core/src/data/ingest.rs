//! Bar ingestion from already-fetched files.
//!
//! Supported layouts:
//! - CSV with `timestamp,open,high,low,close,volume` (timestamp in epoch milliseconds)
//! - Binance kline dumps: a JSON array of 12-element arrays with numbers encoded as
//!   strings; only open time and OHLCV are kept
//! - Parquet with the CSV columns

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Bar, BarError, BarSeries, SeriesMeta};
use crate::schema::{validate_columns, SchemaType, INPUT_BAR_SCHEMA};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
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

    #[error("schema validation failed: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("unsupported bar file '{0}' (expected .csv, .json or .parquet)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Series(#[from] BarError),
}

/// Input file layout, chosen from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarFileFormat {
    Csv,
    BinanceJson,
    Parquet,
}

impl BarFileFormat {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::BinanceJson),
            Some("parquet") | Some("pq") => Ok(Self::Parquet),
            _ => Err(IngestError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn timestamp(row: usize, millis: i64) -> Result<DateTime<Utc>, IngestError> {
    DateTime::from_timestamp_millis(millis).ok_or(IngestError::InvalidRow {
        row,
        reason: format!("timestamp {millis} out of range"),
    })
}

// ── CSV ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse CSV bars from any reader. Extra columns are ignored.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Bar>, IngestError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();
    for (row, record) in rdr.deserialize::<CsvBar>().enumerate() {
        let r = record?;
        bars.push(Bar::new(
            timestamp(row, r.timestamp)?,
            r.open,
            r.high,
            r.low,
            r.close,
            r.volume,
        ));
    }
    Ok(bars)
}

pub fn read_csv(path: &Path) -> Result<Vec<Bar>, IngestError> {
    let file = fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(file)
}

// ── Binance klines ──────────────────────────────────────────────────

fn kline_number(row: usize, field: &str, value: &serde_json::Value) -> Result<f64, IngestError> {
    let parsed = match value {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| IngestError::InvalidRow {
        row,
        reason: format!("{field} is not numeric: {value}"),
    })
}

/// Parse a kline dump: `[[open_time, "open", "high", "low", "close", "volume", close_time, ...], ...]`.
pub fn parse_binance_klines(json: &str) -> Result<Vec<Bar>, IngestError> {
    let rows: Vec<Vec<serde_json::Value>> = serde_json::from_str(json)?;
    rows.iter()
        .enumerate()
        .map(|(row, fields)| {
            if fields.len() < 6 {
                return Err(IngestError::InvalidRow {
                    row,
                    reason: format!("kline has {} fields, need at least 6", fields.len()),
                });
            }
            let open_time = fields[0].as_i64().ok_or_else(|| IngestError::InvalidRow {
                row,
                reason: format!("open time is not an integer: {}", fields[0]),
            })?;
            Ok(Bar::new(
                timestamp(row, open_time)?,
                kline_number(row, "open", &fields[1])?,
                kline_number(row, "high", &fields[2])?,
                kline_number(row, "low", &fields[3])?,
                kline_number(row, "close", &fields[4])?,
                kline_number(row, "volume", &fields[5])?,
            ))
        })
        .collect()
}

pub fn read_binance_klines(path: &Path) -> Result<Vec<Bar>, IngestError> {
    let json = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_binance_klines(&json)
}

// ── Parquet ─────────────────────────────────────────────────────────

fn schema_type(name: &str, dtype: &DataType) -> SchemaType {
    if dtype.is_float() {
        SchemaType::Float64
    } else if dtype.is_integer() {
        // integer prices and volumes are widened on read
        if name == "timestamp" {
            SchemaType::TimestampMs
        } else {
            SchemaType::Float64
        }
    } else {
        SchemaType::Int64
    }
}

/// Convert a DataFrame with [`INPUT_BAR_SCHEMA`] columns to bars.
pub fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<Bar>, IngestError> {
    let present: Vec<(&str, SchemaType)> = df
        .get_columns()
        .iter()
        .map(|c| (c.name().as_str(), schema_type(c.name().as_str(), c.dtype())))
        .collect();
    let validation = validate_columns(INPUT_BAR_SCHEMA, &present, false);
    if !validation.is_valid {
        return Err(IngestError::Schema(validation.errors));
    }

    let map_err = |e: PolarsError| IngestError::Parquet(format!("column read: {e}"));
    let column = |name: &str, dtype: DataType| -> Result<Column, IngestError> {
        df.column(name).map_err(map_err)?.cast(&dtype).map_err(map_err)
    };

    let ts = column("timestamp", DataType::Int64)?;
    let ts_ca = ts.i64().map_err(map_err)?;
    let [open, high, low, close, volume] = ["open", "high", "low", "close", "volume"]
        .map(|name| column(name, DataType::Float64));
    let (open, high, low, close, volume) = (open?, high?, low?, close?, volume?);
    let open_ca = open.f64().map_err(map_err)?;
    let high_ca = high.f64().map_err(map_err)?;
    let low_ca = low.f64().map_err(map_err)?;
    let close_ca = close.f64().map_err(map_err)?;
    let vol_ca = volume.f64().map_err(map_err)?;

    (0..df.height())
        .map(|i| {
            let millis = ts_ca.get(i).ok_or_else(|| IngestError::InvalidRow {
                row: i,
                reason: "null timestamp".into(),
            })?;
            Ok(Bar::new(
                timestamp(i, millis)?,
                open_ca.get(i).unwrap_or(f64::NAN),
                high_ca.get(i).unwrap_or(f64::NAN),
                low_ca.get(i).unwrap_or(f64::NAN),
                close_ca.get(i).unwrap_or(f64::NAN),
                vol_ca.get(i).unwrap_or(f64::NAN),
            ))
        })
        .collect()
}

pub fn read_parquet(path: &Path) -> Result<Vec<Bar>, IngestError> {
    let file = fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| IngestError::Parquet(format!("read: {e}")))?;
    dataframe_to_bars(&df)
}

// ── Series loading ──────────────────────────────────────────────────

/// Read a bar file, pick the reader from its extension, and build a validated series.
///
/// Bars with non-finite fields are kept; they surface as undefined indicator values.
pub fn load_series(path: &Path, meta: SeriesMeta) -> Result<BarSeries, IngestError> {
    let format = BarFileFormat::from_path(path)?;
    let bars = match format {
        BarFileFormat::Csv => read_csv(path)?,
        BarFileFormat::BinanceJson => read_binance_klines(path)?,
        BarFileFormat::Parquet => read_parquet(path)?,
    };
    let void = bars.iter().filter(|b| b.is_void()).count();
    if void > 0 {
        warn!(path = %path.display(), void, "bars with non-finite fields");
    }
    let series = BarSeries::new(bars)?.with_meta(meta);
    debug!(
        path = %path.display(),
        ?format,
        bars = series.len(),
        "bars loaded"
    );
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
timestamp,open,high,low,close,volume
1704067200000,100.0,101.5,99.5,101.0,12.5
1704070800000,101.0,102.0,100.0,100.5,8.0
";

    #[test]
    fn csv_parses_epoch_millis() {
        let bars = parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp.timestamp_millis(), 1_704_067_200_000);
        assert_eq!(bars[1].close, 100.5);
        assert_eq!(bars[0].volume, 12.5);
    }

    #[test]
    fn csv_missing_column_is_error() {
        let bad = "timestamp,open,high,low,close\n1704067200000,1,2,0.5,1.5\n";
        assert!(matches!(parse_csv(bad.as_bytes()), Err(IngestError::Csv(_))));
    }

    #[test]
    fn klines_keep_open_time_and_ohlcv() {
        let json = r#"[
            [1704067200000, "42000.1", "42100.0", "41950.5", "42050.0", "12.34",
             1704070799999, "518000.0", 1200, "6.1", "256000.0", "0"],
            [1704070800000, "42050.0", "42200.0", "42000.0", "42150.0", "10.00",
             1704074399999, "421000.0", 900, "5.0", "210000.0", "0"]
        ]"#;
        let bars = parse_binance_klines(json).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, 42000.1);
        assert_eq!(bars[0].low, 41950.5);
        assert_eq!(bars[0].volume, 12.34);
        assert_eq!(bars[1].timestamp.timestamp_millis(), 1_704_070_800_000);
    }

    #[test]
    fn short_kline_is_invalid() {
        let err = parse_binance_klines(r#"[[1704067200000, "1", "2"]]"#).unwrap_err();
        assert!(matches!(err, IngestError::InvalidRow { row: 0, .. }));
    }

    #[test]
    fn non_numeric_kline_field_is_invalid() {
        let json = r#"[[1704067200000, "1", "x", "0.5", "1.5", "3"]]"#;
        let err = parse_binance_klines(json).unwrap_err();
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn dataframe_with_integer_volume() {
        let df = DataFrame::new(vec![
            Column::new("timestamp".into(), vec![1_704_067_200_000i64, 1_704_070_800_000]),
            Column::new("open".into(), vec![1.0, 2.0]),
            Column::new("high".into(), vec![2.0, 3.0]),
            Column::new("low".into(), vec![0.5, 1.5]),
            Column::new("close".into(), vec![1.5, 2.5]),
            Column::new("volume".into(), vec![10i64, 20]),
        ])
        .unwrap();
        let bars = dataframe_to_bars(&df).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].volume, 20.0);
    }

    #[test]
    fn dataframe_missing_column_is_schema_error() {
        let df = DataFrame::new(vec![
            Column::new("timestamp".into(), vec![1_704_067_200_000i64]),
            Column::new("close".into(), vec![1.5]),
        ])
        .unwrap();
        match dataframe_to_bars(&df) {
            Err(IngestError::Schema(errors)) => {
                assert!(errors.iter().any(|e| e.contains("open")));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            BarFileFormat::from_path(Path::new("a/b.CSV")).unwrap(),
            BarFileFormat::Csv
        );
        assert_eq!(
            BarFileFormat::from_path(Path::new("klines.json")).unwrap(),
            BarFileFormat::BinanceJson
        );
        assert!(BarFileFormat::from_path(Path::new("bars.xlsx")).is_err());
    }
}

//! Bar sources: file ingestion and the synthetic generator.

pub mod ingest;
pub mod synthetic;

pub use ingest::{
    load_series, parse_binance_klines, parse_csv, read_binance_klines, read_csv, read_parquet,
    BarFileFormat, IngestError,
};
pub use synthetic::{generate_bars, generate_series, SyntheticSpec};

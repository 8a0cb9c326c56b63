//! Annotated output series, chart markers and exporters.

pub mod annotated;
pub mod export;
pub mod markers;

pub use annotated::{AnnotatedBar, AnnotatedBarSeries, RunSummary};
pub use export::{
    export_csv, export_json, import_json, to_dataframe, write_outputs, write_parquet, ExportError,
};
pub use markers::{extract_markers, Marker, MarkerKind};

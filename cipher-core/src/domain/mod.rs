//! Domain types for the Cipher pipeline

pub mod bar;
pub mod ids;

pub use bar::{Bar, BarError, BarSeries, SeriesMeta};
pub use ids::{ContentHash, ModelId};

//! Pipeline configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) yields the standard
//! WaveTrend 9/12/3 and money-flow 150/60 setup. Zone and strength thresholds are
//! fixed constants in [`crate::signals`] and are not configurable.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::{MoneyFlowParams, WaveTrendParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(ConfigError::Invalid(format!("unknown output format '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub dir: PathBuf,
    pub buy_tag: String,
    pub sell_tag: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            buy_tag: "buy".into(),
            sell_tag: "sell".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            formats: vec![OutputFormat::Csv, OutputFormat::Json],
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub wavetrend: WaveTrendParams,
    pub money_flow: MoneyFlowParams,
    pub models: ModelsConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Parse and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wt = &self.wavetrend;
        for (name, value) in [
            ("wavetrend.channel_length", wt.channel_length),
            ("wavetrend.average_length", wt.average_length),
            ("wavetrend.signal_length", wt.signal_length),
            ("money_flow.smoothing", self.money_flow.smoothing),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        if !(wt.ci_scale.is_finite() && wt.ci_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "wavetrend.ci_scale must be positive, got {}",
                wt.ci_scale
            )));
        }
        let multiplier = self.money_flow.multiplier;
        if !multiplier.is_finite() || multiplier == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "money_flow.multiplier must be finite and non-zero, got {multiplier}"
            )));
        }
        if self.models.buy_tag.trim().is_empty() || self.models.sell_tag.trim().is_empty() {
            return Err(ConfigError::Invalid("model tags must not be empty".into()));
        }
        Ok(())
    }

    /// First bar index with every indicator defined, on gap-free input.
    pub fn warmup(&self) -> usize {
        self.wavetrend
            .wt2_lookback()
            .max(self.money_flow.smoothing.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.wavetrend.channel_length, 9);
        assert_eq!(config.money_flow.smoothing, 60);
        assert_eq!(config.models.buy_tag, "buy");
        assert_eq!(config.output.formats, vec![OutputFormat::Csv, OutputFormat::Json]);
        assert_eq!(config.warmup(), 59);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let toml_str = r#"
[wavetrend]
average_length = 21

[output]
formats = ["parquet"]
"#;
        let config = PipelineConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.wavetrend.average_length, 21);
        assert_eq!(config.wavetrend.channel_length, 9);
        assert_eq!(config.output.formats, vec![OutputFormat::Parquet]);
        assert_eq!(config.output.dir, PathBuf::from("output"));
    }

    #[test]
    fn roundtrip_through_toml() {
        let config = PipelineConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_zero_length() {
        let err = PipelineConfig::from_toml("[wavetrend]\nsignal_length = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("signal_length")));
    }

    #[test]
    fn rejects_bad_scale_and_multiplier() {
        assert!(PipelineConfig::from_toml("[wavetrend]\nci_scale = 0.0\n").is_err());
        assert!(PipelineConfig::from_toml("[money_flow]\nmultiplier = 0.0\n").is_err());
    }

    #[test]
    fn rejects_empty_tag() {
        let err = PipelineConfig::from_toml("[models]\nsell_tag = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(PipelineConfig::from_toml("[output]\nformats = [\"xlsx\"]\n").is_err());
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xlsx".parse::<OutputFormat>().is_err());
    }
}

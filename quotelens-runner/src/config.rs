//! Serializable pipeline configuration.
//!
//! A run is described by a small TOML file:
//!
//! ```toml
//! [input]
//! path = "bars.csv"
//!
//! [output]
//! path = "annotated.csv"
//! format = "csv"        # or "jsonl"
//!
//! [alerts]
//! volume_spike_ratio = 3.0
//!
//! [run]
//! parallel = true
//! ```
//!
//! Only `[input]` and `[output]` are required. Everything else has defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use quotelens_core::{AlertThresholds, ThresholdError};

/// Errors from reading or checking a pipeline config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid alert thresholds: {0}")]
    Thresholds(#[from] ThresholdError),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub run: RunOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub path: PathBuf,
    /// Single ASCII field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// Write `<output>.manifest.json` next to the output.
    #[serde(default = "default_true")]
    pub manifest: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunOptions {
    /// Process symbols on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Jsonl => "jsonl",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            other => Err(format!("unknown output format '{other}' (expected csv or jsonl)")),
        }
    }
}

impl InputConfig {
    /// The delimiter as the byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        delimiter_byte(self.delimiter)
    }
}

/// Accept space, tab, or printable ASCII punctuation other than the quote.
pub fn delimiter_byte(delimiter: char) -> Result<u8, ConfigError> {
    match delimiter {
        ' ' | '\t' => Ok(delimiter as u8),
        c if c.is_ascii_punctuation() && c != '"' => Ok(c as u8),
        other => Err(ConfigError::Invalid(format!(
            "delimiter must be space, tab, or ASCII punctuation other than '\"', got {other:?}"
        ))),
    }
}

impl PipelineConfig {
    /// Config for a plain input/output pair with default thresholds.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: InputConfig {
                path: input.into(),
                delimiter: default_delimiter(),
            },
            output: OutputConfig {
                path: output.into(),
                format: OutputFormat::default(),
                manifest: true,
            },
            alerts: AlertThresholds::default(),
            run: RunOptions::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Read and parse a TOML file. Relative input/output paths resolve
    /// against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.input.path = resolve(base, &config.input.path);
            config.output.path = resolve(base, &config.output.path);
        }
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        self.input.delimiter_byte()?;
        self.alerts.check()?;
        if self.input.path == self.output.path {
            return Err(ConfigError::Invalid(
                "input and output must be different files".into(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [input]
            path = "bars.csv"

            [output]
            path = "out.csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.input.delimiter, ',');
        assert_eq!(config.output.format, OutputFormat::Csv);
        assert!(config.output.manifest);
        assert!(config.run.parallel);
        assert_eq!(config.alerts, AlertThresholds::default());
    }

    #[test]
    fn partial_alert_section_keeps_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [input]
            path = "bars.csv"
            delimiter = ";"

            [output]
            path = "out.jsonl"
            format = "jsonl"

            [alerts]
            volume_spike_ratio = 3.0

            [run]
            parallel = false
            "#,
        )
        .unwrap();

        assert_eq!(config.input.delimiter_byte().unwrap(), b';');
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.alerts.volume_spike_ratio, 3.0);
        assert_eq!(config.alerts.rsi_overbought, 70.0);
        assert!(!config.run.parallel);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PipelineConfig::from_toml(
            r#"
            [input]
            path = "bars.csv"
            colour = "blue"

            [output]
            path = "out.csv"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn inconsistent_thresholds_are_invalid() {
        let err = PipelineConfig::from_toml(
            r#"
            [input]
            path = "bars.csv"

            [output]
            path = "out.csv"

            [alerts]
            rsi_oversold = 90.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Thresholds(ThresholdError::RsiOrder { .. })
        ));
    }

    #[test]
    fn nan_threshold_is_invalid() {
        let mut config = PipelineConfig::new("bars.csv", "out.csv");
        config.alerts.volatility = f64::NAN;
        assert!(matches!(
            config.check(),
            Err(ConfigError::Thresholds(ThresholdError::NonFinite {
                field: "volatility",
                ..
            }))
        ));
    }

    #[test]
    fn delimiter_must_be_printable_separator() {
        for ok in [',', ';', '|', '\t', ' ', ':'] {
            assert_eq!(delimiter_byte(ok).unwrap(), ok as u8, "{ok:?}");
        }
        for bad in ['"', '\n', '\r', '\0', '\x1f', '\x7f', 'a', '7', 'é'] {
            assert!(
                matches!(delimiter_byte(bad), Err(ConfigError::Invalid(_))),
                "{bad:?}"
            );
        }

        let mut config = PipelineConfig::new("bars.csv", "out.csv");
        config.input.delimiter = '"';
        assert!(config.check().is_err());
    }

    #[test]
    fn same_input_and_output_is_invalid() {
        let config = PipelineConfig::new("bars.csv", "bars.csv");
        assert!(config.check().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let config = PipelineConfig::new("in.csv", "out.csv");
        let text = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn output_format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}

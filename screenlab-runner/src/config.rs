//! Screen configuration, loaded from TOML.
//!
//! Every section and key is optional; a missing key takes the conventional
//! default. Example:
//!
//! ```toml
//! [data]
//! dir = "static"
//! start_date = "2022-08-23"
//! end_date = "2024-10-05"
//! symbols = ["AAPL", "MSFT"]
//!
//! [backtest]
//! gain_threshold = 0.05
//!
//! [output]
//! dir = "results"
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use screenlab_core::{BacktestParams, FilterParams, IndicatorParams};

/// Errors from loading or validating a screen configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid parameters: {0}")]
    Params(#[from] screenlab_core::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

/// Where price data comes from and which window to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding `{SYMBOL}_prices.csv` files.
    pub dir: PathBuf,
    /// First date to load (inclusive). Unbounded when absent.
    pub start_date: Option<NaiveDate>,
    /// Evaluation end date (exclusive). Defaults to the day after the
    /// latest loaded bar.
    pub end_date: Option<NaiveDate>,
    /// Symbols to screen. Empty means every CSV in `dir`.
    pub symbols: Vec<String>,
    /// Generate deterministic synthetic data for symbols without a CSV.
    pub synthetic: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            start_date: None,
            end_date: None,
            symbols: Vec::new(),
            synthetic: false,
        }
    }
}

/// Artifact locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Rows kept in each per-instrument indicator file.
    pub indicator_tail: usize,
    pub monitor_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            indicator_tail: 10,
            monitor_file: PathBuf::from("monitoring_stocks.csv"),
        }
    }
}

/// Full configuration for a screening run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub data: DataConfig,
    pub indicators: IndicatorParams,
    pub filter: FilterParams,
    pub backtest: BacktestParams,
    pub output: OutputConfig,
}

impl ScreenConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        self.filter.validate()?;
        self.backtest.validate()?;
        if let (Some(start), Some(end)) = (self.data.start_date, self.data.end_date) {
            if start >= end {
                return Err(ConfigError::Invalid(format!(
                    "data.start_date ({start}) must be before data.end_date ({end})"
                )));
            }
        }
        if self.output.indicator_tail == 0 {
            return Err(ConfigError::Invalid(
                "output.indicator_tail must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ScreenConfig::from_toml("").unwrap();
        assert_eq!(config, ScreenConfig::default());
        assert_eq!(config.backtest.lookback_days, 545);
        assert_eq!(config.output.indicator_tail, 10);
        assert_eq!(config.data.dir, PathBuf::from("data"));
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let config = ScreenConfig::from_toml(
            r#"
            [data]
            dir = "static"
            end_date = "2024-10-05"
            symbols = ["AAPL", "MSFT"]

            [backtest]
            gain_threshold = 0.05
            "#,
        )
        .unwrap();
        assert_eq!(config.data.dir, PathBuf::from("static"));
        assert_eq!(config.data.end_date, NaiveDate::from_ymd_opt(2024, 10, 5));
        assert_eq!(config.data.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(config.backtest.gain_threshold, 0.05);
        assert_eq!(config.backtest.outcome_window, 24);
        assert_eq!(config.indicators, IndicatorParams::default());
    }

    #[test]
    fn invalid_engine_params_rejected() {
        let err = ScreenConfig::from_toml("[indicators]\nrsi_period = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Params(_)));
        assert!(err.to_string().contains("rsi_period"));
    }

    #[test]
    fn reversed_dates_rejected() {
        let err = ScreenConfig::from_toml(
            "[data]\nstart_date = \"2024-10-05\"\nend_date = \"2024-01-01\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ScreenConfig::from_toml("[data\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = ScreenConfig::default();
        config.data.symbols = vec!["SPY".into()];
        config.data.start_date = NaiveDate::from_ymd_opt(2022, 8, 23);
        let text = config.to_toml().unwrap();
        assert_eq!(ScreenConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ScreenConfig::from_file(Path::new("/nonexistent/screen.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/screen.toml"));
    }
}

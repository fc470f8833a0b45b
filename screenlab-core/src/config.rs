//! Engine parameters and their validation.
//!
//! Each parameter block carries the conventional defaults and is validated
//! once, when the component that uses it is constructed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid parameter values, rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be >= 1 (got {value})")]
    NonPositivePeriod { name: &'static str, value: usize },

    #[error("{lower} ({lower_value}) must be less than {upper} ({upper_value})")]
    PeriodOrder {
        lower: &'static str,
        lower_value: usize,
        upper: &'static str,
        upper_value: usize,
    },

    #[error("{name} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{0}")]
    Invalid(String),
}

fn require_period(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositivePeriod { name, value });
    }
    Ok(())
}

fn require_order(
    lower: (&'static str, usize),
    upper: (&'static str, usize),
) -> Result<(), ConfigError> {
    if lower.1 >= upper.1 {
        return Err(ConfigError::PeriodOrder {
            lower: lower.0,
            lower_value: lower.1,
            upper: upper.0,
            upper_value: upper.1,
        });
    }
    Ok(())
}

fn require_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Lookback lengths for the indicator frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ema_short: usize,
    pub ema_medium: usize,
    pub ema_long: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    /// Raw %K lookback (highest high / lowest low window).
    pub stoch_k: usize,
    /// Smoothing applied to raw %K to get the slow %K.
    pub stoch_slow_k: usize,
    pub stoch_d: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_short: 5,
            ema_medium: 13,
            ema_long: 26,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            stoch_k: 14,
            stoch_slow_k: 3,
            stoch_d: 3,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_period("ema_short", self.ema_short)?;
        require_period("ema_medium", self.ema_medium)?;
        require_period("ema_long", self.ema_long)?;
        require_period("macd_fast", self.macd_fast)?;
        require_period("macd_slow", self.macd_slow)?;
        require_period("macd_signal", self.macd_signal)?;
        require_period("rsi_period", self.rsi_period)?;
        require_period("stoch_k", self.stoch_k)?;
        require_period("stoch_slow_k", self.stoch_slow_k)?;
        require_period("stoch_d", self.stoch_d)?;
        require_order(("ema_short", self.ema_short), ("ema_medium", self.ema_medium))?;
        require_order(("ema_medium", self.ema_medium), ("ema_long", self.ema_long))?;
        require_order(("macd_fast", self.macd_fast), ("macd_slow", self.macd_slow))?;
        Ok(())
    }
}

/// Thresholds and lookbacks for the composite buy filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Trailing rows that must all be fully defined, or the instrument is skipped.
    pub min_rows: usize,
    /// Number of recent day-over-day transitions scanned for the EMA alignment.
    pub alignment_lookback: usize,
    pub rsi_low: f64,
    pub rsi_high: f64,
    /// Rows scanned for the informational %K > %D flag.
    pub stoch_recent_lookback: usize,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_rows: 6,
            alignment_lookback: 4,
            rsi_low: 40.0,
            rsi_high: 60.0,
            stoch_recent_lookback: 5,
        }
    }
}

impl FilterParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_period("alignment_lookback", self.alignment_lookback)?;
        require_period("stoch_recent_lookback", self.stoch_recent_lookback)?;
        // Each alignment transition needs the row before it.
        require_order(
            ("alignment_lookback", self.alignment_lookback),
            ("min_rows", self.min_rows),
        )?;
        if self.stoch_recent_lookback > self.min_rows {
            return Err(ConfigError::Invalid(format!(
                "stoch_recent_lookback ({}) must not exceed min_rows ({})",
                self.stoch_recent_lookback, self.min_rows
            )));
        }
        require_range("rsi_low", self.rsi_low, 0.0, 100.0)?;
        require_range("rsi_high", self.rsi_high, self.rsi_low, 100.0)?;
        Ok(())
    }
}

/// Upper bound on `BacktestParams::lookback_days` (about a century).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Parameters of the crossover → confirmation → outcome backtest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    /// Crossovers only count when slow %K is below this level.
    pub oversold_ceiling: f64,
    /// Trading days scanned after a crossover for the EMA confirmation.
    pub confirmation_window: usize,
    /// Trading days scanned after a confirmation for the target gain.
    pub outcome_window: usize,
    /// Fractional gain that marks an outcome as successful.
    pub gain_threshold: f64,
    /// Calendar days before the evaluation end date where the backtest window starts.
    pub lookback_days: i64,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            oversold_ceiling: 20.0,
            confirmation_window: 20,
            outcome_window: 24,
            gain_threshold: 0.03,
            lookback_days: 545,
        }
    }
}

impl BacktestParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ceiling(self.oversold_ceiling)?;
        require_period("confirmation_window", self.confirmation_window)?;
        require_period("outcome_window", self.outcome_window)?;
        require_range("gain_threshold", self.gain_threshold, 0.0, 1.0)?;
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be within [1, {MAX_LOOKBACK_DAYS}] (got {})",
                self.lookback_days
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_ceiling(ceiling: f64) -> Result<(), ConfigError> {
    if !(ceiling > 0.0 && ceiling <= 100.0) {
        return Err(ConfigError::OutOfRange {
            name: "oversold_ceiling",
            value: ceiling,
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

//! ScreenLab Core — price series, indicators, buy filter, crossover backtest.
//!
//! This crate is the pure engine of the screener:
//! - Domain types (bars, validated price series)
//! - Indicator frame (EMA 5/13/26, MACD 12/26/9, RSI 14, slow stochastic 14/3/3)
//! - Composite buy filter evaluated on the most recent rows
//! - Oversold crossover detection, EMA confirmation, forward gain outcomes
//! - Per-instrument backtest summaries
//!
//! Nothing here performs I/O. Loading data, writing artifacts and the
//! monitoring log live in `screenlab-runner`.

pub mod backtest;
pub mod config;
pub mod domain;
pub mod indicators;
pub mod signals;

pub use backtest::{run_backtest, success_rate, BacktestSummary, Backtester};
pub use config::{BacktestParams, ConfigError, FilterParams, IndicatorParams};
pub use domain::{PriceBar, PriceSeries, SeriesError};
pub use indicators::{compute_indicators, IndicatorEngine, IndicatorFrame, IndicatorRow};
pub use signals::{
    filter_instruments, ConfirmationEvent, ConfirmationTracker, CrossoverDetector,
    CrossoverEvent, CrossoverKind, FilterOutcome, Outcome, OutcomeTracker, SignalFilter,
    SignalRecord,
};

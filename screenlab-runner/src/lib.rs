//! ScreenLab Runner — screen orchestration, artifacts, monitoring list.
//!
//! This crate builds on `screenlab-core` to provide:
//! - TOML configuration
//! - Price loading from per-symbol CSV files with a synthetic fallback
//! - Parallel screening and backtesting of a universe
//! - CSV/JSON artifact export
//! - The monitoring list

pub mod config;
pub mod data_loader;
pub mod export;
pub mod monitor;
pub mod screen;

pub use config::{ConfigError, DataConfig, OutputConfig, ScreenConfig};
pub use data_loader::{
    generate_synthetic_series, generate_synthetic_series_with, load_universe, read_series_csv,
    validate_symbol, write_series_csv, DataSource, LoadError, LoadOptions, LoadedData,
    SyntheticParams,
};
pub use export::{load_report, save_artifacts};
pub use monitor::{selection_entries, MonitorEntry, MonitorError, MonitorLog};
pub use screen::{indicators_file_name, run_screen, ScreenReport, ScreenRow, SummaryRow};

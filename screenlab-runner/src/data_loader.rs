//! Price loading for the runner.
//!
//! Reads one `{SYMBOL}_prices.csv` file per instrument from a data directory.
//! Implements the fallback policy:
//! 1. If the CSV exists → parse it
//! 2. If not and synthetic mode is on → generate synthetic bars (tagged)
//! 3. Otherwise → the instrument is listed as missing and left out
//!
//! A malformed file never aborts the run; the instrument is reported as
//! missing. Synthetic data is a developer-only debug mode.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use screenlab_core::{PriceBar, PriceSeries, SeriesError};

/// File name suffix of per-instrument price files.
pub const PRICE_FILE_SUFFIX: &str = "_prices.csv";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("invalid symbol '{0}': must be a plain file name component")]
    InvalidSymbol(String),
}

/// Where an instrument's bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Csv,
    Synthetic,
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub dir: PathBuf,
    /// First date kept (inclusive).
    pub start: Option<NaiveDate>,
    /// Evaluation end date (exclusive).
    pub end: Option<NaiveDate>,
    /// Generate synthetic bars when a CSV is unavailable.
    pub synthetic: bool,
}

/// Result of loading a universe, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub series: BTreeMap<String, PriceSeries>,
    pub sources: BTreeMap<String, DataSource>,
    /// Requested symbols with no usable data.
    pub missing: Vec<String>,
    /// BLAKE3 over every loaded bar.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

impl LoadedData {
    /// Day after the most recent bar in the universe.
    pub fn default_end_date(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(|s| s.last())
            .map(|b| b.date)
            .max()
            .map(|d| d + Duration::days(1))
    }
}

/// One row of a price CSV. Empty cells (no-trade days) deserialize to `None`.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

/// Check that a symbol can be used as part of a file name.
///
/// Symbols end up in price and artifact paths, so separators, `..` and a
/// leading dot are rejected.
pub fn validate_symbol(symbol: &str) -> Result<(), LoadError> {
    let valid = !symbol.is_empty()
        && !symbol.starts_with('.')
        && !symbol.contains("..")
        && !symbol.chars().any(|c| matches!(c, '/' | '\\' | ':' | '\0'));
    if valid {
        Ok(())
    } else {
        Err(LoadError::InvalidSymbol(symbol.to_string()))
    }
}

/// Path of an instrument's price file.
pub fn price_file(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{symbol}{PRICE_FILE_SUFFIX}"))
}

/// Symbols with a price file in `dir`, sorted.
pub fn discover_symbols(dir: &Path) -> Result<Vec<String>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut symbols: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let symbol = name.strip_suffix(PRICE_FILE_SUFFIX)?;
            validate_symbol(symbol).is_ok().then(|| symbol.to_string())
        })
        .collect();
    symbols.sort();
    Ok(symbols)
}

/// Read one price file, keeping rows inside `[start, end)`.
///
/// Rows with an empty or non-finite price are dropped. Rows whose date
/// cannot be parsed are dropped with a warning.
pub fn read_series_csv(
    path: &Path,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars = Vec::new();
    let mut dropped = 0usize;
    for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(symbol, line = line + 2, error = %e, "unreadable CSV row, skipping");
                continue;
            }
        };
        let Some(date) = parse_date(&row.date) else {
            warn!(symbol, line = line + 2, date = %row.date, "unparseable date, skipping");
            continue;
        };
        if start.is_some_and(|s| date < s) || end.is_some_and(|e| date >= e) {
            continue;
        }
        match bar_from_row(date, &row) {
            Some(bar) => bars.push(bar),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(symbol, dropped, "dropped rows with missing prices");
    }

    Ok(PriceSeries::new(symbol, bars)?)
}

/// Accepts `YYYY-MM-DD` with an optional time suffix.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn bar_from_row(date: NaiveDate, row: &CsvRow) -> Option<PriceBar> {
    let bar = PriceBar {
        date,
        open: row.open?,
        high: row.high?,
        low: row.low?,
        close: row.close?,
        volume: row.volume.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0).round() as u64,
    };
    bar.is_finite().then_some(bar)
}

/// Write a series in the price CSV format.
pub fn write_series_csv(path: &Path, series: &PriceSeries) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(["Date", "Open", "High", "Low", "Close", "Volume"])
        .map_err(csv_err)?;
    for bar in series.bars() {
        wtr.write_record([
            bar.date.to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every requested symbol (or every CSV in the directory when
/// `symbols` is empty).
pub fn load_universe(symbols: &[String], opts: &LoadOptions) -> Result<LoadedData, LoadError> {
    let symbols = if symbols.is_empty() {
        discover_symbols(&opts.dir)?
    } else {
        symbols.to_vec()
    };
    for symbol in &symbols {
        validate_symbol(symbol)?;
    }

    let mut series = BTreeMap::new();
    let mut sources = BTreeMap::new();
    let mut missing = Vec::new();
    let mut has_synthetic = false;

    for symbol in &symbols {
        let path = price_file(&opts.dir, symbol);

        // Step 1: CSV on disk
        if path.exists() {
            match read_series_csv(&path, symbol, opts.start, opts.end) {
                Ok(s) => {
                    series.insert(symbol.clone(), s);
                    sources.insert(symbol.clone(), DataSource::Csv);
                    continue;
                }
                Err(e) => warn!(symbol = %symbol, error = %e, "failed to load price file"),
            }
        }

        // Step 2: Synthetic fallback (if enabled)
        if opts.synthetic {
            warn!(symbol = %symbol, "generating synthetic data, results will be tagged as synthetic");
            let (start, end) = synthetic_range(opts.start, opts.end);
            series.insert(symbol.clone(), generate_synthetic_series(symbol, start, end)?);
            sources.insert(symbol.clone(), DataSource::Synthetic);
            has_synthetic = true;
            continue;
        }

        // Step 3: Absent
        debug!(symbol = %symbol, "no price data");
        missing.push(symbol.clone());
    }

    let dataset_hash = compute_dataset_hash(&series);
    info!(
        loaded = series.len(),
        missing = missing.len(),
        synthetic = has_synthetic,
        "price data loaded"
    );

    Ok(LoadedData {
        series,
        sources,
        missing,
        dataset_hash,
        has_synthetic,
    })
}

/// Synthetic window: up to the end date (today when unset), 800 calendar
/// days long unless a start is given.
fn synthetic_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = start.unwrap_or(end - Duration::days(800));
    (start, end)
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// The hash covers dates and all OHLCV values in sorted symbol order.
fn compute_dataset_hash(series: &BTreeMap<String, PriceSeries>) -> String {
    let mut hasher = blake3::Hasher::new();

    for (symbol, s) in series {
        hasher.update(symbol.as_bytes());
        for bar in s.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

/// Shape of the synthetic random walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticParams {
    pub start_price: f64,
    /// Mean daily return.
    pub drift: f64,
    /// Daily returns are uniform on `drift ± volatility`.
    pub volatility: f64,
    /// Largest high/low extension beyond the candle body, as a fraction.
    pub max_wick: f64,
    /// Inclusive daily volume range.
    pub volume: (u64, u64),
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            drift: 0.0,
            volatility: 0.03,
            max_wick: 0.01,
            volume: (500_000, 5_000_000),
        }
    }
}

/// Generate weekday bars over `[start, end)` with the default walk.
///
/// The seed is derived from the symbol, so the same symbol and range always
/// give the same bars.
pub fn generate_synthetic_series(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, SeriesError> {
    generate_synthetic_series_with(symbol, start, end, &SyntheticParams::default())
}

/// Generate weekday bars over `[start, end)` with an explicit walk shape.
///
/// Prices stay positive only while `drift - volatility > -1`.
pub fn generate_synthetic_series_with(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    params: &SyntheticParams,
) -> Result<PriceSeries, SeriesError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::from_seed(*blake3::hash(symbol.as_bytes()).as_bytes());
    let (vol_lo, vol_hi) = (
        params.volume.0.min(params.volume.1),
        params.volume.0.max(params.volume.1),
    );

    let mut price = params.start_price;
    let bars = start
        .iter_days()
        .take_while(|day| *day < end)
        .filter(|day| day.weekday().number_from_monday() <= 5)
        .map(|date| {
            // Unit draws keep zero volatility or wick from producing empty ranges.
            let ret = params.drift + params.volatility * (2.0 * rng.gen::<f64>() - 1.0);
            let open = price;
            let close = open * (1.0 + ret);
            let high = open.max(close) * (1.0 + params.max_wick * rng.gen::<f64>());
            let low = open.min(close) * (1.0 - params.max_wick * rng.gen::<f64>());
            price = close;
            PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume: rng.gen_range(vol_lo..=vol_hi),
            }
        })
        .collect();

    PriceSeries::new(symbol, bars)
}

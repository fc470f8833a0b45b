//! Screening pipeline: filter every instrument, backtest the ones that pass.
//!
//! Instruments are independent, so they are processed in parallel with rayon
//! and collected into a `BTreeMap`; the report does not depend on
//! scheduling order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use screenlab_core::{
    BacktestSummary, Backtester, IndicatorEngine, IndicatorRow, PriceSeries, SignalFilter,
    SignalRecord,
};

use crate::config::ScreenConfig;
use crate::data_loader::LoadedData;
use crate::ConfigError;

/// Current report schema version. Bump when the layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Last close of every screened instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub stock: String,
    pub closing_price: f64,
    pub indicators_file: String,
}

/// One passing instrument: filter flags merged with its backtest.
///
/// Backtest columns are `None` when the backtest skipped the instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRow {
    pub stock: String,
    pub closing_price: f64,
    pub indicators_file: String,
    pub ema_crossover: bool,
    pub macd_condition: bool,
    pub rsi_condition: bool,
    pub stoch_crossover: bool,
    pub stoch_crossover_last_5_days: bool,
    pub total_crossovers: Option<usize>,
    pub successful_crossovers: Option<usize>,
    pub success_rate: Option<f64>,
    pub crossover_dates: Vec<NaiveDate>,
    pub successful_dates: Vec<NaiveDate>,
}

impl ScreenRow {
    fn merge(summary: &SummaryRow, record: &SignalRecord, backtest: Option<&BacktestSummary>) -> Self {
        Self {
            stock: summary.stock.clone(),
            closing_price: summary.closing_price,
            indicators_file: summary.indicators_file.clone(),
            ema_crossover: record.ema_alignment,
            macd_condition: record.momentum,
            rsi_condition: record.neutral_strength,
            stoch_crossover: record.stoch_crossover,
            stoch_crossover_last_5_days: record.stoch_recent,
            total_crossovers: backtest.map(|b| b.total),
            successful_crossovers: backtest.map(|b| b.successful),
            success_rate: backtest.map(|b| b.success_rate),
            crossover_dates: backtest.map(|b| b.crossover_dates.clone()).unwrap_or_default(),
            successful_dates: backtest.map(|b| b.successful_dates.clone()).unwrap_or_default(),
        }
    }
}

/// Everything a screening run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenReport {
    pub schema_version: u32,
    pub end_date: NaiveDate,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    /// All instruments with data, in symbol order.
    pub summary: Vec<SummaryRow>,
    /// Filter verdicts for every instrument with enough rows.
    pub records: Vec<SignalRecord>,
    /// Passing instruments only.
    pub rows: Vec<ScreenRow>,
    pub backtests: Vec<BacktestSummary>,
    /// Most recent indicator rows per instrument.
    pub indicators: BTreeMap<String, Vec<IndicatorRow>>,
    /// BLAKE3 over the verdicts and backtests, for idempotence checks.
    pub result_hash: String,
}

impl ScreenReport {
    pub fn passing(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.stock.as_str())
    }
}

/// Per-instrument intermediate result.
struct InstrumentScreen {
    summary: SummaryRow,
    record: Option<SignalRecord>,
    backtest: Option<BacktestSummary>,
    tail: Vec<IndicatorRow>,
}

/// Name of the per-instrument indicator artifact.
pub fn indicators_file_name(symbol: &str) -> String {
    format!("indicators_{symbol}.csv")
}

/// Run the full screen over loaded data.
///
/// `end` is the evaluation end date used for the backtest window.
pub fn run_screen(
    config: &ScreenConfig,
    data: &LoadedData,
    end: NaiveDate,
) -> Result<ScreenReport, ConfigError> {
    config.validate()?;
    let engine = IndicatorEngine::new(config.indicators)?;
    let filter = SignalFilter::new(config.filter)?;
    let backtester = Backtester::new(config.backtest)?;
    let tail_len = config.output.indicator_tail;

    let screened: BTreeMap<String, InstrumentScreen> = data
        .series
        .par_iter()
        .filter_map(|(symbol, series)| {
            screen_instrument(&engine, &filter, &backtester, series, end, tail_len)
                .map(|s| (symbol.clone(), s))
        })
        .collect();

    let mut summary = Vec::with_capacity(screened.len());
    let mut records = Vec::new();
    let mut rows = Vec::new();
    let mut backtests = Vec::new();
    let mut indicators = BTreeMap::new();

    for (symbol, s) in screened {
        if let Some(record) = &s.record {
            if record.passed {
                rows.push(ScreenRow::merge(&s.summary, record, s.backtest.as_ref()));
            }
        }
        records.extend(s.record);
        backtests.extend(s.backtest);
        indicators.insert(symbol, s.tail);
        summary.push(s.summary);
    }

    let result_hash = compute_result_hash(&records, &backtests);
    info!(
        screened = summary.len(),
        evaluated = records.len(),
        passing = rows.len(),
        backtested = backtests.len(),
        "screen complete"
    );

    Ok(ScreenReport {
        schema_version: SCHEMA_VERSION,
        end_date: end,
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        summary,
        records,
        rows,
        backtests,
        indicators,
        result_hash,
    })
}

fn screen_instrument(
    engine: &IndicatorEngine,
    filter: &SignalFilter,
    backtester: &Backtester,
    series: &PriceSeries,
    end: NaiveDate,
    tail_len: usize,
) -> Option<InstrumentScreen> {
    let Some(last) = series.last() else {
        debug!(instrument = series.instrument(), "no data, skipping");
        return None;
    };

    let frame = engine.compute(series);
    let record = filter.evaluate(&frame);
    let backtest = record
        .as_ref()
        .filter(|r| r.passed)
        .and_then(|_| backtester.run_instrument(series, &frame, end));

    Some(InstrumentScreen {
        summary: SummaryRow {
            stock: series.instrument().to_string(),
            closing_price: last.close,
            indicators_file: indicators_file_name(series.instrument()),
        },
        record,
        backtest,
        tail: frame.tail(tail_len).to_vec(),
    })
}

fn compute_result_hash(records: &[SignalRecord], backtests: &[BacktestSummary]) -> String {
    let mut hasher = blake3::Hasher::new();

    for r in records {
        hasher.update(r.instrument.as_bytes());
        for flag in [
            r.ema_alignment,
            r.momentum,
            r.neutral_strength,
            r.stoch_crossover,
            r.stoch_recent,
            r.passed,
        ] {
            hasher.update(&[flag as u8]);
        }
    }
    for b in backtests {
        hasher.update(b.instrument.as_bytes());
        hasher.update(&(b.total as u64).to_le_bytes());
        hasher.update(&(b.successful as u64).to_le_bytes());
        hasher.update(&b.success_rate.to_le_bytes());
        for date in b.crossover_dates.iter().chain(&b.successful_dates) {
            hasher.update(date.to_string().as_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

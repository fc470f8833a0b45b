//! Composite buy filter.
//!
//! An instrument passes when all four conditions hold on its latest rows:
//! 1. a bullish EMA alignment began on one of the last `alignment_lookback` days
//! 2. MACD above its signal line and above zero
//! 3. RSI inside the neutral band (inclusive)
//! 4. slow %K above %D
//!
//! A fifth flag (%K above %D on any of the last few rows) is reported but
//! does not affect the verdict.
//!
//! Only the last `min_rows` rows are read, and all of them must be fully
//! defined; otherwise the instrument is skipped rather than failed.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ConfigError, FilterParams};
use crate::domain::PriceSeries;
use crate::indicators::frame::above;
use crate::indicators::{IndicatorEngine, IndicatorFrame, IndicatorRow};

/// Per-instrument verdict with the state of every sub-condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub instrument: String,
    pub ema_alignment: bool,
    /// Most recent day on which the alignment began.
    pub alignment_date: Option<NaiveDate>,
    pub momentum: bool,
    pub neutral_strength: bool,
    pub stoch_crossover: bool,
    /// Informational only.
    pub stoch_recent: bool,
    pub passed: bool,
}

/// Result of filtering a universe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    /// Instruments that passed, in input order.
    pub passing: Vec<String>,
    /// One record per evaluated instrument. Skipped instruments have none.
    pub records: Vec<SignalRecord>,
}

#[derive(Debug, Clone)]
pub struct SignalFilter {
    params: FilterParams,
}

impl SignalFilter {
    pub fn new(params: FilterParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Evaluate one instrument.
    ///
    /// Returns `None` unless the last `min_rows` rows exist and have every
    /// indicator defined.
    pub fn evaluate(&self, frame: &IndicatorFrame) -> Option<SignalRecord> {
        let rows = frame.rows();
        if rows.len() < self.params.min_rows {
            debug!(
                instrument = frame.instrument(),
                rows = rows.len(),
                min_rows = self.params.min_rows,
                "too few rows, skipping"
            );
            return None;
        }
        let trailing = &rows[rows.len() - self.params.min_rows..];
        if let Some(row) = trailing.iter().find(|r| !r.is_complete()) {
            debug!(
                instrument = frame.instrument(),
                date = %row.date,
                "undefined indicators in trailing rows, skipping"
            );
            return None;
        }
        let latest = rows.last()?;

        let alignment_date = self.recent_alignment(rows);
        let ema_alignment = alignment_date.is_some();
        let momentum = above(latest.macd, latest.macd_signal) && above(latest.macd, Some(0.0));
        let neutral_strength = latest
            .rsi
            .is_some_and(|rsi| (self.params.rsi_low..=self.params.rsi_high).contains(&rsi));
        let stoch_crossover = latest.stoch_k_above_d();
        let stoch_recent = rows
            .iter()
            .rev()
            .take(self.params.stoch_recent_lookback)
            .any(IndicatorRow::stoch_k_above_d);

        Some(SignalRecord {
            instrument: frame.instrument().to_string(),
            ema_alignment,
            alignment_date,
            momentum,
            neutral_strength,
            stoch_crossover,
            stoch_recent,
            passed: ema_alignment && momentum && neutral_strength && stoch_crossover,
        })
    }

    /// Scan the last `alignment_lookback` transitions, newest first, for a day
    /// that is bullish-aligned while the day before was not.
    fn recent_alignment(&self, rows: &[IndicatorRow]) -> Option<NaiveDate> {
        let n = rows.len();
        (1..=self.params.alignment_lookback)
            .map(|i| (&rows[n - i], &rows[n - i - 1]))
            .find(|(today, yesterday)| today.is_bullish_aligned() && !yesterday.is_bullish_aligned())
            .map(|(today, _)| today.date)
    }

    /// Compute each instrument's frame and evaluate it.
    pub fn filter_all(
        &self,
        engine: &IndicatorEngine,
        series_by_instrument: &BTreeMap<String, PriceSeries>,
    ) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for series in series_by_instrument.values() {
            if series.is_empty() {
                debug!(instrument = series.instrument(), "no data, skipping");
                continue;
            }
            let frame = engine.compute(series);
            if let Some(record) = self.evaluate(&frame) {
                if record.passed {
                    outcome.passing.push(record.instrument.clone());
                }
                outcome.records.push(record);
            }
        }
        outcome
    }
}

impl Default for SignalFilter {
    fn default() -> Self {
        Self {
            params: FilterParams::default(),
        }
    }
}

/// Filter a universe with the conventional indicator and filter parameters.
pub fn filter_instruments(series_by_instrument: &BTreeMap<String, PriceSeries>) -> FilterOutcome {
    SignalFilter::default().filter_all(&IndicatorEngine::default(), series_by_instrument)
}

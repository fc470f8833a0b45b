//! Historical backtest of the oversold-crossover setup.
//!
//! Per instrument: restrict the frame to the trailing window that starts
//! `lookback_days` calendar days before the evaluation end, detect crossovers
//! there, confirm them, and check each confirmation for the target gain.
//! Crossovers over the full history are reported alongside for context.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BacktestParams, ConfigError};
use crate::domain::PriceSeries;
use crate::indicators::{IndicatorEngine, IndicatorFrame};
use crate::signals::{
    successful_dates, ConfirmationTracker, CrossoverDetector, OutcomeTracker,
};

/// Per-instrument backtest result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub instrument: String,
    pub window_start: NaiveDate,
    /// Confirmations inside the window.
    pub total: usize,
    pub successful: usize,
    /// `successful / total * 100`, 0 when there were no confirmations.
    pub success_rate: f64,
    /// Crossover dates over the instrument's full history.
    pub crossover_dates: Vec<NaiveDate>,
    pub successful_dates: Vec<NaiveDate>,
}

/// Percentage of successful outcomes. Zero when `total` is zero.
pub fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    successful as f64 / total as f64 * 100.0
}

#[derive(Debug, Clone)]
pub struct Backtester {
    params: BacktestParams,
    detector: CrossoverDetector,
    confirmations: ConfirmationTracker,
    outcomes: OutcomeTracker,
}

impl Backtester {
    pub fn new(params: BacktestParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            detector: CrossoverDetector::new(params.oversold_ceiling)?,
            confirmations: ConfirmationTracker::new(params.confirmation_window)?,
            outcomes: OutcomeTracker::new(params.gain_threshold, params.outcome_window)?,
        })
    }

    pub fn params(&self) -> &BacktestParams {
        &self.params
    }

    /// First date of the backtest window for a given evaluation end date.
    ///
    /// `None` when the window would start before the earliest representable date.
    pub fn cutoff(&self, end: NaiveDate) -> Option<NaiveDate> {
        Duration::try_days(self.params.lookback_days).and_then(|d| end.checked_sub_signed(d))
    }

    /// Backtest one instrument whose frame was computed from `series`.
    ///
    /// Returns `None` when the cutoff date is not a trading day in the frame.
    pub fn run_instrument(
        &self,
        series: &PriceSeries,
        frame: &IndicatorFrame,
        end: NaiveDate,
    ) -> Option<BacktestSummary> {
        let Some(cutoff) = self.cutoff(end) else {
            debug!(instrument = frame.instrument(), %end, "cutoff out of range, skipping backtest");
            return None;
        };
        if frame.position(cutoff).is_none() {
            debug!(
                instrument = frame.instrument(),
                %cutoff,
                "cutoff date not in series, skipping backtest"
            );
            return None;
        }

        let rows = frame.since(cutoff);
        let bars = series.since(cutoff);
        let events = self.detector.detect(frame.instrument(), rows);
        let confirmed = self.confirmations.track(&events, rows);
        let outcomes = self.outcomes.track_confirmations(&confirmed, bars);
        let successes = successful_dates(&outcomes);

        let crossover_dates = self
            .detector
            .detect(frame.instrument(), frame.rows())
            .into_iter()
            .map(|e| e.date)
            .collect();

        debug!(
            instrument = frame.instrument(),
            crossovers = events.len(),
            confirmations = confirmed.len(),
            successful = successes.len(),
            "backtest complete"
        );

        Some(BacktestSummary {
            instrument: frame.instrument().to_string(),
            window_start: cutoff,
            total: confirmed.len(),
            successful: successes.len(),
            success_rate: success_rate(successes.len(), confirmed.len()),
            crossover_dates,
            successful_dates: successes,
        })
    }

    /// Backtest each candidate in order. Candidates without data or without
    /// the cutoff date are omitted.
    pub fn run(
        &self,
        engine: &IndicatorEngine,
        candidates: &[String],
        series_by_instrument: &BTreeMap<String, PriceSeries>,
        end: NaiveDate,
    ) -> Vec<BacktestSummary> {
        candidates
            .iter()
            .filter_map(|id| {
                let Some(series) = series_by_instrument.get(id) else {
                    debug!(instrument = %id, "no data, skipping backtest");
                    return None;
                };
                let frame = engine.compute(series);
                self.run_instrument(series, &frame, end)
            })
            .collect()
    }
}

impl Default for Backtester {
    fn default() -> Self {
        Self {
            params: BacktestParams::default(),
            detector: CrossoverDetector::default(),
            confirmations: ConfirmationTracker::default(),
            outcomes: OutcomeTracker::default(),
        }
    }
}

/// Backtest candidates with the conventional parameters.
pub fn run_backtest(
    candidates: &[String],
    series_by_instrument: &BTreeMap<String, PriceSeries>,
    end: NaiveDate,
) -> Vec<BacktestSummary> {
    Backtester::default().run(
        &IndicatorEngine::default(),
        candidates,
        series_by_instrument,
        end,
    )
}

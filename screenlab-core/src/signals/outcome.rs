//! Forward gain search after reference dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::PriceBar;

use super::ConfirmationEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Index of the reference in the tracked slice.
    pub source: usize,
    pub date: NaiveDate,
    /// Bars after the reference at which the threshold was first met.
    pub success_offset: Option<usize>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.success_offset.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OutcomeTracker {
    gain_threshold: f64,
    window: usize,
}

impl OutcomeTracker {
    pub fn new(gain_threshold: f64, window: usize) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&gain_threshold) {
            return Err(ConfigError::OutOfRange {
                name: "gain_threshold",
                value: gain_threshold,
                min: 0.0,
                max: 1.0,
            });
        }
        if window == 0 {
            return Err(ConfigError::NonPositivePeriod {
                name: "outcome_window",
                value: window,
            });
        }
        Ok(Self {
            gain_threshold,
            window,
        })
    }

    pub fn gain_threshold(&self) -> f64 {
        self.gain_threshold
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// One outcome per reference date, in input order.
    pub fn track(&self, references: &[NaiveDate], bars: &[PriceBar]) -> Vec<Outcome> {
        references
            .iter()
            .enumerate()
            .map(|(source, &date)| Outcome {
                source,
                date,
                success_offset: self.first_gain(date, bars),
            })
            .collect()
    }

    pub fn track_confirmations(
        &self,
        confirmations: &[ConfirmationEvent],
        bars: &[PriceBar],
    ) -> Vec<Outcome> {
        let dates: Vec<NaiveDate> = confirmations.iter().map(|c| c.date).collect();
        self.track(&dates, bars)
    }

    fn first_gain(&self, date: NaiveDate, bars: &[PriceBar]) -> Option<usize> {
        let start = bars.binary_search_by_key(&date, |b| b.date).ok()?;
        let base = bars[start].close;
        if base <= 0.0 {
            return None;
        }
        bars[start + 1..]
            .iter()
            .take(self.window)
            .position(|bar| (bar.close - base) / base >= self.gain_threshold)
            .map(|i| i + 1)
    }
}

impl Default for OutcomeTracker {
    fn default() -> Self {
        Self {
            gain_threshold: 0.03,
            window: 24,
        }
    }
}

/// Reference dates that reached the threshold, in input order.
pub fn successful_dates(outcomes: &[Outcome]) -> Vec<NaiveDate> {
    outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| o.date)
        .collect()
}

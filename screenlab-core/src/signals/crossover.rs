//! Oversold stochastic crossover detection.
//!
//! Fires at t when slow %K crosses above %D (%K[t] > %D[t] and
//! %K[t-1] <= %D[t-1]) while %K[t] is still below the oversold ceiling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{validate_ceiling, ConfigError};
use crate::indicators::frame::at_or_below;
use crate::indicators::IndicatorRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    /// %K crossed above %D below the oversold ceiling.
    OversoldBullish,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub instrument: String,
    pub date: NaiveDate,
    pub kind: CrossoverKind,
}

#[derive(Debug, Clone, Copy)]
pub struct CrossoverDetector {
    ceiling: f64,
}

impl CrossoverDetector {
    pub fn new(ceiling: f64) -> Result<Self, ConfigError> {
        validate_ceiling(ceiling)?;
        Ok(Self { ceiling })
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    /// Scan `rows` chronologically. The first row can never fire because it
    /// has no predecessor inside the slice.
    pub fn detect(&self, instrument: &str, rows: &[IndicatorRow]) -> Vec<CrossoverEvent> {
        rows.windows(2)
            .filter(|w| self.is_crossover(&w[0], &w[1]))
            .map(|w| CrossoverEvent {
                instrument: instrument.to_string(),
                date: w[1].date,
                kind: CrossoverKind::OversoldBullish,
            })
            .collect()
    }

    fn is_crossover(&self, prev: &IndicatorRow, today: &IndicatorRow) -> bool {
        let Some(k) = today.stoch_k else {
            return false;
        };
        today.stoch_k_above_d() && at_or_below(prev.stoch_k, prev.stoch_d) && k < self.ceiling
    }
}

impl Default for CrossoverDetector {
    fn default() -> Self {
        Self { ceiling: 20.0 }
    }
}

//! EMA confirmation of stochastic crossovers.
//!
//! For each crossover at t, rows t+1..=t+window are scanned in order and the
//! first one satisfying
//!
//! ```text
//! (short > medium && short > long && prev_short < prev_medium) || prev_short < prev_long
//! ```
//!
//! becomes the confirmation. The grouping is deliberate: the trailing
//! `prev_short < prev_long` term alone is enough to confirm.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::indicators::frame::{above, below};
use crate::indicators::IndicatorRow;

use super::CrossoverEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationEvent {
    /// Index of the originating crossover in the tracked event slice.
    pub source: usize,
    pub source_date: NaiveDate,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfirmationTracker {
    window: usize,
}

impl ConfirmationTracker {
    pub fn new(window: usize) -> Result<Self, ConfigError> {
        if window == 0 {
            return Err(ConfigError::NonPositivePeriod {
                name: "confirmation_window",
                value: window,
            });
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Track every event against the rows it was detected on.
    ///
    /// Events whose date is not in `rows` and events with no confirmation
    /// inside the window produce nothing.
    pub fn track(&self, events: &[CrossoverEvent], rows: &[IndicatorRow]) -> Vec<ConfirmationEvent> {
        events
            .iter()
            .enumerate()
            .filter_map(|(source, event)| {
                let start = rows.binary_search_by_key(&event.date, |r| r.date).ok()?;
                let end = (start + self.window).min(rows.len() - 1);
                ((start + 1)..=end)
                    .find(|&i| confirms(&rows[i - 1], &rows[i]))
                    .map(|i| ConfirmationEvent {
                        source,
                        source_date: event.date,
                        date: rows[i].date,
                    })
            })
            .collect()
    }
}

impl Default for ConfirmationTracker {
    fn default() -> Self {
        Self { window: 20 }
    }
}

fn confirms(prev: &IndicatorRow, today: &IndicatorRow) -> bool {
    (above(today.ema_short, today.ema_medium)
        && above(today.ema_short, today.ema_long)
        && below(prev.ema_short, prev.ema_medium))
        || below(prev.ema_short, prev.ema_long)
}

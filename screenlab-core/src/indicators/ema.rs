//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: EMA[period-1] = SMA of the first `period` closes.
//! Lookback: period - 1.

use crate::domain::PriceBar;

use super::{closes, Indicator};

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    /// `period` is expected to be >= 1; a zero period yields an all-undefined series.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        ema_of_series(&closes(bars), self.period)
    }
}

/// EMA of an arbitrary value series.
///
/// Leading undefined values are skipped: the seed is the simple average of
/// the first `period` defined values, placed at the last of them. An
/// undefined value after the seed leaves the rest of the series undefined.
/// Used directly by composed indicators (MACD signal line).
pub fn ema_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 {
        return result;
    }

    let Some(start) = values.iter().position(|v| v.is_some()) else {
        return result;
    };
    let seed_end = start + period - 1;
    if seed_end >= n {
        return result;
    }

    let mut sum = 0.0;
    for v in &values[start..=seed_end] {
        match v {
            Some(v) => sum += v,
            None => return result,
        }
    }
    let seed = sum / period as f64;
    result[seed_end] = Some(seed);

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in (seed_end + 1)..n {
        let Some(v) = values[i] else {
            return result;
        };
        let ema = alpha * v + (1.0 - alpha) * prev;
        result[i] = Some(ema);
        prev = ema;
    }

    result
}

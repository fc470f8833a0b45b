//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window. A window containing an undefined
//! value is undefined.
//! Lookback: period - 1.

use crate::domain::PriceBar;

use super::{closes, Indicator};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        sma_of_series(&closes(bars), self.period)
    }
}

/// Rolling mean of an arbitrary value series.
pub fn sma_of_series(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[(i + 1 - period)..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        result[i] = sum.map(|s| s / period as f64);
    }

    result
}

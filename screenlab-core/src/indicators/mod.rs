//! Indicator implementations and the per-instrument indicator frame.
//!
//! Indicators are pure functions: bar history in, value series out. Every
//! output is index-aligned with the input bars. Positions inside an
//! indicator's warmup (or with a degenerate denominator) are `None`; no
//! indicator ever emits NaN.
//!
//! Multi-series indicators (MACD, stochastic) expose one named instance per
//! line, keeping the single-series `Indicator` trait unchanged.

pub mod ema;
pub mod frame;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use ema::{ema_of_series, Ema};
pub use frame::{compute_indicators, IndicatorEngine, IndicatorFrame, IndicatorRow};
pub use macd::{Macd, MacdLine, MacdSeries};
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma};
pub use stochastic::{Stochastic, StochasticLine, StochasticSeries};

use crate::domain::PriceBar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a value series of the same
/// length. The first `lookback()` values are `None` (warmup).
///
/// # Look-ahead guard
/// No value at bar t may depend on bars after t. Every indicator must pass
/// the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_13", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>>;
}

/// Close prices as an always-defined value series.
pub(crate) fn closes(bars: &[PriceBar]) -> Vec<Option<f64>> {
    bars.iter().map(|b| Some(b.close)).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev close (or close for the first bar), high = max(open, close) + 1,
/// low = min(open, close) - 1, one bar per calendar day from 2024-01-02.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

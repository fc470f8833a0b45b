//! Slow stochastic oscillator.
//!
//! raw %K[t] = 100 * (close[t] - LL) / (HH - LL) over the last `k_period` bars
//! slow %K   = SMA(raw %K, slow_k_period)
//! %D        = SMA(slow %K, d_period)
//!
//! HH / LL extend the high / low of each bar with its close, so a bar whose
//! close sits outside its own range still yields a value in [0, 100].
//! A flat window (HH == LL) has no defined %K.
//! Lookback: k - 1 + slow_k - 1 for slow %K, plus d - 1 for %D.

use crate::domain::PriceBar;

use super::{sma_of_series, Indicator};

/// Which stochastic line an instance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    SlowK,
    D,
}

/// Both stochastic lines, index-aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub slow_k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    slow_k_period: usize,
    d_period: usize,
    line: StochasticLine,
    name: String,
}

impl Stochastic {
    pub fn new(k_period: usize, slow_k_period: usize, d_period: usize, line: StochasticLine) -> Self {
        let suffix = match line {
            StochasticLine::SlowK => "k",
            StochasticLine::D => "d",
        };
        Self {
            k_period,
            slow_k_period,
            d_period,
            line,
            name: format!("stoch_{suffix}_{k_period}_{slow_k_period}_{d_period}"),
        }
    }

    pub fn slow_k(k_period: usize, slow_k_period: usize, d_period: usize) -> Self {
        Self::new(k_period, slow_k_period, d_period, StochasticLine::SlowK)
    }

    pub fn d(k_period: usize, slow_k_period: usize, d_period: usize) -> Self {
        Self::new(k_period, slow_k_period, d_period, StochasticLine::D)
    }

    /// Unsmoothed %K.
    pub fn raw_k(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];
        let period = self.k_period;

        if period == 0 || n < period {
            return result;
        }

        for i in (period - 1)..n {
            let window = &bars[(i + 1 - period)..=i];
            let highest = window
                .iter()
                .map(|b| b.high.max(b.close))
                .fold(f64::NEG_INFINITY, f64::max);
            let lowest = window
                .iter()
                .map(|b| b.low.min(b.close))
                .fold(f64::INFINITY, f64::min);

            let range = highest - lowest;
            if range > 0.0 {
                result[i] = Some(100.0 * (bars[i].close - lowest) / range);
            }
        }

        result
    }

    pub fn compute_all(&self, bars: &[PriceBar]) -> StochasticSeries {
        let slow_k = sma_of_series(&self.raw_k(bars), self.slow_k_period);
        let d = sma_of_series(&slow_k, self.d_period);
        StochasticSeries { slow_k, d }
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k = self.k_period.saturating_sub(1) + self.slow_k_period.saturating_sub(1);
        match self.line {
            StochasticLine::SlowK => k,
            StochasticLine::D => k + self.d_period.saturating_sub(1),
        }
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let all = self.compute_all(bars);
        match self.line {
            StochasticLine::SlowK => all.slow_k,
            StochasticLine::D => all.d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn make_ohlc_bars(data: &[(f64, f64, f64)]) -> Vec<PriceBar> {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn raw_k_known_values() {
        // period 3: window highs 12, 13, 14; lows 8, 9, 10
        let bars = make_ohlc_bars(&[(12.0, 8.0, 10.0), (13.0, 9.0, 12.0), (14.0, 10.0, 11.0)]);
        let raw = Stochastic::slow_k(3, 1, 1).raw_k(&bars);
        assert_eq!(raw[0], None);
        assert_eq!(raw[1], None);
        // HH = 14, LL = 8 → 100 * (11 - 8) / 6 = 50
        assert_approx(raw[2].unwrap(), 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn slow_k_and_d_are_smoothed() {
        let bars = make_ohlc_bars(&[
            (10.0, 0.0, 5.0),
            (10.0, 0.0, 10.0),
            (10.0, 0.0, 0.0),
            (10.0, 0.0, 10.0),
            (10.0, 0.0, 10.0),
        ]);
        // raw %K with period 1 over a fixed 0..10 range = close * 10
        let all = Stochastic::slow_k(1, 2, 2).compute_all(&bars);
        assert_eq!(all.slow_k[0], None);
        assert_approx(all.slow_k[1].unwrap(), 75.0, DEFAULT_EPSILON);
        assert_approx(all.slow_k[2].unwrap(), 50.0, DEFAULT_EPSILON);
        assert_approx(all.slow_k[3].unwrap(), 50.0, DEFAULT_EPSILON);
        assert_approx(all.slow_k[4].unwrap(), 100.0, DEFAULT_EPSILON);
        assert_eq!(all.d[1], None);
        assert_approx(all.d[2].unwrap(), 62.5, DEFAULT_EPSILON);
        assert_approx(all.d[4].unwrap(), 75.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_window_is_undefined() {
        let bars = make_ohlc_bars(&[(10.0, 10.0, 10.0); 8]);
        let all = Stochastic::slow_k(3, 3, 3).compute_all(&bars);
        assert!(all.slow_k.iter().all(|v| v.is_none()));
        assert!(all.d.iter().all(|v| v.is_none()));
    }

    #[test]
    fn close_outside_bar_range_stays_bounded() {
        let bars = make_ohlc_bars(&[(10.0, 9.0, 9.5), (10.0, 9.0, 12.0)]);
        let raw = Stochastic::slow_k(2, 1, 1).raw_k(&bars);
        assert_approx(raw[1].unwrap(), 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn values_within_bounds() {
        let bars = make_bars(&[100.0, 103.0, 99.0, 104.0, 98.0, 101.0, 97.0, 105.0, 102.0]);
        let all = Stochastic::slow_k(3, 2, 2).compute_all(&bars);
        for v in all.slow_k.iter().chain(&all.d).flatten() {
            assert!((0.0..=100.0).contains(v), "stochastic out of bounds: {v}");
        }
    }

    #[test]
    fn lookbacks() {
        assert_eq!(Stochastic::slow_k(14, 3, 3).lookback(), 15);
        assert_eq!(Stochastic::d(14, 3, 3).lookback(), 17);
        assert_eq!(Stochastic::d(14, 3, 3).name(), "stoch_d_14_3_3");
    }
}

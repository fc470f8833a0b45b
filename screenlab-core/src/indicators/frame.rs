//! Indicator frame — every derived series for one instrument, one row per bar.
//!
//! `IndicatorEngine` is a pure transform from a `PriceSeries` to an
//! `IndicatorFrame`. Rows are index-aligned 1:1 with the source bars and
//! carry `None` wherever an indicator is still warming up or its
//! denominator is degenerate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, IndicatorParams};
use crate::domain::PriceSeries;

use super::{Ema, Indicator, Macd, Rsi, Stochastic};

/// `a > b` when both are defined. Undefined never compares true.
pub fn above(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

/// `a < b` when both are defined.
pub fn below(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

/// `a <= b` when both are defined.
pub fn at_or_below(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a <= b)
}

/// Indicator values for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub ema_short: Option<f64>,
    pub ema_medium: Option<f64>,
    pub ema_long: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub rsi: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
}

impl IndicatorRow {
    /// Short EMA above both the medium and the long EMA.
    pub fn is_bullish_aligned(&self) -> bool {
        above(self.ema_short, self.ema_medium) && above(self.ema_short, self.ema_long)
    }

    /// Slow %K above %D.
    pub fn stoch_k_above_d(&self) -> bool {
        above(self.stoch_k, self.stoch_d)
    }

    /// True when every indicator on this row is defined.
    pub fn is_complete(&self) -> bool {
        [
            self.ema_short,
            self.ema_medium,
            self.ema_long,
            self.macd,
            self.macd_signal,
            self.macd_hist,
            self.rsi,
            self.stoch_k,
            self.stoch_d,
        ]
        .iter()
        .all(Option::is_some)
    }
}

/// Ordered indicator rows for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    instrument: String,
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// Assemble a frame from precomputed rows. Rows must be in strictly
    /// increasing date order.
    pub fn from_rows(instrument: impl Into<String>, rows: Vec<IndicatorRow>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            instrument: instrument.into(),
            rows,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    /// Position of `date` in the frame (exact match).
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.rows.binary_search_by_key(&date, |r| r.date).ok()
    }

    /// Rows dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> &[IndicatorRow] {
        let idx = self.rows.partition_point(|r| r.date < start);
        &self.rows[idx..]
    }

    /// The last `n` rows (all rows if the frame is shorter).
    pub fn tail(&self, n: usize) -> &[IndicatorRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}

/// Computes indicator frames with a fixed, validated parameter set.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    params: IndicatorParams,
    ema_short: Ema,
    ema_medium: Ema,
    ema_long: Ema,
    macd: Macd,
    rsi: Rsi,
    stochastic: Stochastic,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self::build(params))
    }

    fn build(params: IndicatorParams) -> Self {
        Self {
            params,
            ema_short: Ema::new(params.ema_short),
            ema_medium: Ema::new(params.ema_medium),
            ema_long: Ema::new(params.ema_long),
            macd: Macd::signal(params.macd_fast, params.macd_slow, params.macd_signal),
            rsi: Rsi::new(params.rsi_period),
            stochastic: Stochastic::d(params.stoch_k, params.stoch_slow_k, params.stoch_d),
        }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Bars needed before every column of a row is defined.
    pub fn warmup(&self) -> usize {
        let indicators: [&dyn Indicator; 6] = [
            &self.ema_short,
            &self.ema_medium,
            &self.ema_long,
            &self.macd,
            &self.rsi,
            &self.stochastic,
        ];
        indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
    }

    pub fn compute(&self, series: &PriceSeries) -> IndicatorFrame {
        let bars = series.bars();
        let ema_short = self.ema_short.compute(bars);
        let ema_medium = self.ema_medium.compute(bars);
        let ema_long = self.ema_long.compute(bars);
        let macd = self.macd.compute_all(bars);
        let rsi = self.rsi.compute(bars);
        let stoch = self.stochastic.compute_all(bars);

        let rows = bars
            .iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                date: bar.date,
                ema_short: ema_short[i],
                ema_medium: ema_medium[i],
                ema_long: ema_long[i],
                macd: macd.line[i],
                macd_signal: macd.signal[i],
                macd_hist: macd.histogram[i],
                rsi: rsi[i],
                stoch_k: stoch.slow_k[i],
                stoch_d: stoch.d[i],
            })
            .collect();

        IndicatorFrame {
            instrument: series.instrument().to_string(),
            rows,
        }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::build(IndicatorParams::default())
    }
}

/// Compute the indicator frame for one instrument with the conventional parameters.
pub fn compute_indicators(series: &PriceSeries) -> IndicatorFrame {
    IndicatorEngine::default().compute(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("TEST", make_bars(closes)).unwrap()
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 * 1.01_f64.powi(i as i32)).collect()
    }

    #[test]
    fn frame_is_index_aligned() {
        let s = series(&rising(50));
        let frame = compute_indicators(&s);
        assert_eq!(frame.len(), 50);
        assert_eq!(frame.instrument(), "TEST");
        for (row, bar) in frame.rows().iter().zip(s.bars()) {
            assert_eq!(row.date, bar.date);
        }
    }

    #[test]
    fn warmup_matches_first_complete_row() {
        let engine = IndicatorEngine::default();
        assert_eq!(engine.warmup(), 33);
        let frame = engine.compute(&series(&rising(50)));
        let first_complete = frame.rows().iter().position(|r| r.is_complete());
        assert_eq!(first_complete, Some(33));
    }

    #[test]
    fn short_series_is_accepted() {
        let frame = compute_indicators(&series(&[100.0, 101.0, 102.0]));
        assert_eq!(frame.len(), 3);
        assert!(frame.rows().iter().all(|r| r.ema_medium.is_none() && r.rsi.is_none()));
        assert!(frame.rows()[2].ema_long.is_none());
    }

    #[test]
    fn invalid_params_rejected() {
        let params = IndicatorParams {
            stoch_k: 0,
            ..Default::default()
        };
        assert!(IndicatorEngine::new(params).is_err());
    }

    #[test]
    fn comparisons_fail_closed() {
        assert!(above(Some(2.0), Some(1.0)));
        assert!(!above(None, Some(1.0)));
        assert!(!above(Some(2.0), None));
        assert!(!below(None, None));
        assert!(at_or_below(Some(1.0), Some(1.0)));
        assert!(!at_or_below(Some(1.0), None));
    }

    #[test]
    fn since_and_tail() {
        let s = series(&rising(10));
        let frame = compute_indicators(&s);
        let start = s.bars()[7].date;
        assert_eq!(frame.since(start).len(), 3);
        assert_eq!(frame.tail(4).len(), 4);
        assert_eq!(frame.tail(40).len(), 10);
        assert_eq!(frame.position(start), Some(7));
    }
}

//! Moving Average Convergence/Divergence (MACD).
//!
//! line      = EMA(close, fast) - EMA(close, slow)
//! signal    = EMA(line, signal), seeded from the first `signal` defined line values
//! histogram = line - signal
//!
//! Exposed as three named instances (line, signal, histogram); the frame
//! builder uses `compute_all` to get the three series in one pass.
//! Lookback: slow - 1 for the line, slow + signal - 2 for signal and histogram.

use crate::domain::PriceBar;

use super::{closes, ema_of_series, Indicator};

/// Which MACD series an instance produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

/// All three MACD series, index-aligned with the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdLine) -> Self {
        let suffix = match output {
            MacdLine::Line => "line",
            MacdLine::Signal => "signal",
            MacdLine::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{suffix}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Line)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Histogram)
    }

    pub fn compute_all(&self, bars: &[PriceBar]) -> MacdSeries {
        let closes = closes(bars);
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        let line: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = ema_of_series(&line, self.signal);
        let histogram = line
            .iter()
            .zip(&signal)
            .map(|(l, s)| Some((*l)? - (*s)?))
            .collect();

        MacdSeries {
            line,
            signal,
            histogram,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let line = self.fast.max(self.slow).saturating_sub(1);
        match self.output {
            MacdLine::Line => line,
            MacdLine::Signal | MacdLine::Histogram => line + self.signal.saturating_sub(1),
        }
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<Option<f64>> {
        let all = self.compute_all(bars);
        match self.output {
            MacdLine::Line => all.line,
            MacdLine::Signal => all.signal,
            MacdLine::Histogram => all.histogram,
        }
    }
}

//! PriceSeries — the validated, chronologically ordered bar history of one instrument.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::PriceBar;

/// Errors raised when a bar sequence violates the series invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("instrument id must not be empty")]
    EmptyInstrument,

    #[error("{instrument}: bar dates must be strictly increasing ({previous} followed by {date})")]
    OutOfOrder {
        instrument: String,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("{instrument}: non-finite price on {date}")]
    NonFinite { instrument: String, date: NaiveDate },
}

/// Ordered daily bars for one instrument.
///
/// Dates are strictly increasing with no duplicates and every price is finite.
/// The series is immutable once built; indicator computation borrows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    instrument: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(instrument: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let instrument = instrument.into();
        if instrument.is_empty() {
            return Err(SeriesError::EmptyInstrument);
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_finite() {
                return Err(SeriesError::NonFinite {
                    instrument,
                    date: bar.date,
                });
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(SeriesError::OutOfOrder {
                    instrument,
                    previous: bars[i - 1].date,
                    date: bar.date,
                });
            }
        }

        Ok(Self { instrument, bars })
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar, if any.
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Position of `date` in the series (exact match).
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Bars dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> &[PriceBar] {
        let idx = self.bars.partition_point(|b| b.date < start);
        &self.bars[idx..]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn accepts_ordered_bars() {
        let series = PriceSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.instrument(), "SPY");
        assert_eq!(series.last().unwrap().close, 101.0);
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new("SPY", vec![bar(2, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { .. }));
    }

    #[test]
    fn rejects_descending_dates() {
        let err = PriceSeries::new("SPY", vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_nan_price() {
        let err = PriceSeries::new("SPY", vec![bar(2, f64::NAN)]).unwrap_err();
        assert!(matches!(err, SeriesError::NonFinite { .. }));
    }

    #[test]
    fn rejects_empty_instrument() {
        assert_eq!(
            PriceSeries::new("", vec![]).unwrap_err(),
            SeriesError::EmptyInstrument
        );
    }

    #[test]
    fn position_and_since() {
        let series =
            PriceSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.0), bar(5, 102.0)]).unwrap();
        assert_eq!(series.position(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()), Some(1));
        assert_eq!(series.position(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()), None);
        let tail = series.since(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].close, 102.0);
    }
}

//! Property tests for indicator and signal invariants.
//!
//! Uses proptest to verify:
//! 1. EMA seeding and smoothing bound
//! 2. Oscillator bounds — RSI and slow %K stay in [0, 100] or are undefined
//! 3. No look-ahead — a truncated series yields the same rows as the full one
//! 4. Crossover events respect the ceiling and are strictly chronological
//! 5. Confirmations — at most one per event, strictly after, inside the window
//! 6. Outcomes — success offsets are inside the window and meet the threshold

use proptest::prelude::*;
use screenlab_core::indicators::{Ema, Indicator, Rsi, Stochastic};
use screenlab_core::{
    compute_indicators, ConfirmationTracker, CrossoverDetector, OutcomeTracker, PriceBar,
    PriceSeries,
};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of 40..200 bars with wicks around each open/close pair.
fn arb_bars() -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec((-0.05..0.05_f64, 0.0..0.02_f64, 0.0..0.02_f64), 40..200).prop_map(
        |steps| {
            let base = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
            let mut close = 100.0;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (ret, up, down))| {
                    let open = close;
                    close *= 1.0 + ret;
                    PriceBar {
                        date: base + chrono::Duration::days(i as i64),
                        open,
                        high: open.max(close) * (1.0 + up),
                        low: open.min(close) * (1.0 - down),
                        close,
                        volume: 10_000,
                    }
                })
                .collect()
        },
    )
}

fn arb_series() -> impl Strategy<Value = PriceSeries> {
    arb_bars().prop_map(|bars| PriceSeries::new("PROP", bars).unwrap())
}

// ── 1. EMA ───────────────────────────────────────────────────────────

proptest! {
    /// First defined EMA is the SMA of the first p closes; every later value
    /// lies between the previous EMA and the new close.
    #[test]
    fn ema_seed_and_smoothing_bound(bars in arb_bars(), period in 1usize..30) {
        let ema = Ema::new(period).compute(&bars);
        let seed_idx = period - 1;
        for v in &ema[..seed_idx] {
            prop_assert!(v.is_none());
        }
        let sma: f64 = bars[..period].iter().map(|b| b.close).sum::<f64>() / period as f64;
        let seed = ema[seed_idx].unwrap();
        prop_assert!((seed - sma).abs() < 1e-9);

        for i in (seed_idx + 1)..bars.len() {
            let prev = ema[i - 1].unwrap();
            let cur = ema[i].unwrap();
            let close = bars[i].close;
            let (lo, hi) = if prev <= close { (prev, close) } else { (close, prev) };
            prop_assert!(cur >= lo - 1e-9 && cur <= hi + 1e-9,
                "ema {} outside [{}, {}] at {}", cur, lo, hi, i);
        }
    }
}

// ── 2. Oscillator bounds ─────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(bars in arb_bars()) {
        for v in Rsi::new(14).compute(&bars).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&v), "rsi {}", v);
        }
    }

    #[test]
    fn stochastic_is_bounded(bars in arb_bars()) {
        let series = Stochastic::d(14, 3, 3).compute_all(&bars);
        for v in series.slow_k.iter().chain(series.d.iter()).flatten() {
            prop_assert!((0.0..=100.0).contains(v), "stochastic {}", v);
        }
    }
}

// ── 3. No look-ahead ─────────────────────────────────────────────────

proptest! {
    /// Rows computed on a prefix equal the same rows computed on the full series.
    #[test]
    fn truncated_series_matches_full(bars in arb_bars(), cut in 0.3..1.0_f64) {
        let keep = ((bars.len() as f64 * cut) as usize).max(1);
        let full = compute_indicators(&PriceSeries::new("P", bars.clone()).unwrap());
        let prefix = compute_indicators(&PriceSeries::new("P", bars[..keep].to_vec()).unwrap());
        prop_assert_eq!(prefix.rows(), &full.rows()[..keep]);
    }

    #[test]
    fn frame_is_idempotent(series in arb_series()) {
        prop_assert_eq!(compute_indicators(&series), compute_indicators(&series));
    }
}

// ── 4–6. Event invariants ────────────────────────────────────────────

proptest! {
    #[test]
    fn crossovers_below_ceiling_and_chronological(series in arb_series(), ceiling in 5.0..100.0_f64) {
        let frame = compute_indicators(&series);
        let events = CrossoverDetector::new(ceiling).unwrap().detect("PROP", frame.rows());
        for pair in events.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for event in &events {
            let row = &frame.rows()[frame.position(event.date).unwrap()];
            prop_assert!(row.stoch_k.unwrap() < ceiling);
            prop_assert!(row.stoch_k.unwrap() > row.stoch_d.unwrap());
        }
    }

    #[test]
    fn confirmations_follow_their_event(series in arb_series(), window in 1usize..30) {
        let frame = compute_indicators(&series);
        let events = CrossoverDetector::new(50.0).unwrap().detect("PROP", frame.rows());
        let confirmed = ConfirmationTracker::new(window).unwrap().track(&events, frame.rows());
        prop_assert!(confirmed.len() <= events.len());
        for pair in confirmed.windows(2) {
            prop_assert!(pair[0].source < pair[1].source);
            prop_assert!(pair[0].date <= pair[1].date);
        }
        for c in &confirmed {
            prop_assert_eq!(c.source_date, events[c.source].date);
            let from = frame.position(c.source_date).unwrap();
            let to = frame.position(c.date).unwrap();
            prop_assert!(to > from && to - from <= window);
        }
    }

    #[test]
    fn successes_meet_threshold(bars in arb_bars(), threshold in 0.0..0.2_f64, window in 1usize..40) {
        let tracker = OutcomeTracker::new(threshold, window).unwrap();
        let refs: Vec<_> = bars.iter().map(|b| b.date).collect();
        for outcome in tracker.track(&refs, &bars) {
            let base = bars[outcome.source].close;
            match outcome.success_offset {
                Some(offset) => {
                    prop_assert!(offset >= 1 && offset <= window);
                    let gain = (bars[outcome.source + offset].close - base) / base;
                    prop_assert!(gain >= threshold);
                    for i in 1..offset {
                        prop_assert!((bars[outcome.source + i].close - base) / base < threshold);
                    }
                }
                None => {
                    let end = (outcome.source + window).min(bars.len() - 1);
                    for i in (outcome.source + 1)..=end {
                        prop_assert!((bars[i].close - base) / base < threshold);
                    }
                }
            }
        }
    }
}

//! Criterion benchmarks for ScreenLab hot paths.
//!
//! Benchmarks:
//! 1. Indicator frame computation
//! 2. Composite filter over a universe
//! 3. Crossover backtest for one instrument

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use screenlab_core::{
    filter_instruments, Backtester, IndicatorEngine, PriceBar, PriceSeries,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(symbol: &str, n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_indicator_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_frame");
    let engine = IndicatorEngine::default();

    for &bar_count in &[252, 1260, 2520] {
        let series = make_series("BENCH", bar_count);
        group.bench_with_input(BenchmarkId::new("compute", bar_count), &bar_count, |b, _| {
            b.iter(|| engine.compute(black_box(&series)));
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_filter");

    for &symbols in &[10, 100] {
        let universe: BTreeMap<String, PriceSeries> = (0..symbols)
            .map(|i| {
                let id = format!("SYM{i}");
                let series = make_series(&id, 600);
                (id, series)
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("universe", symbols), &symbols, |b, _| {
            b.iter(|| filter_instruments(black_box(&universe)));
        });
    }

    group.finish();
}

fn bench_backtest(c: &mut Criterion) {
    let engine = IndicatorEngine::default();
    let backtester = Backtester::default();
    let series = make_series("BENCH", 2520);
    let frame = engine.compute(&series);
    let end = series.last().unwrap().date;

    c.bench_function("backtest_instrument_2520", |b| {
        b.iter(|| backtester.run_instrument(black_box(&series), black_box(&frame), end));
    });
}

criterion_group!(benches, bench_indicator_frame, bench_filter, bench_backtest);
criterion_main!(benches);

//! Integration tests for the runner's data pipeline.
//!
//! Price CSVs are written to a temp directory, loaded back, screened, and the
//! artifact set is written and reloaded.

use std::path::Path;

use chrono::NaiveDate;
use screenlab_runner::data_loader::price_file;
use screenlab_runner::{
    generate_synthetic_series, load_report, load_universe, run_screen, save_artifacts,
    selection_entries, write_series_csv, DataSource, LoadOptions, MonitorLog, ScreenConfig,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn write_universe(dir: &Path, symbols: &[&str]) {
    for symbol in symbols {
        let series = generate_synthetic_series(symbol, d(2022, 8, 23), d(2024, 10, 5)).unwrap();
        write_series_csv(&price_file(dir, symbol), &series).unwrap();
    }
}

fn csv_options(dir: &Path) -> LoadOptions {
    LoadOptions {
        dir: dir.to_path_buf(),
        start: None,
        end: None,
        synthetic: false,
    }
}

#[test]
fn csv_round_trip_preserves_bars() {
    let dir = tempfile::tempdir().unwrap();
    write_universe(dir.path(), &["SPY"]);

    let loaded = load_universe(&["SPY".to_string()], &csv_options(dir.path())).unwrap();
    assert_eq!(loaded.sources["SPY"], DataSource::Csv);
    assert!(!loaded.has_synthetic);

    let original = generate_synthetic_series("SPY", d(2022, 8, 23), d(2024, 10, 5)).unwrap();
    let restored = &loaded.series["SPY"];
    assert_eq!(restored.len(), original.len());
    for (a, b) in restored.bars().iter().zip(original.bars()) {
        assert_eq!(a.date, b.date);
        assert!((a.close - b.close).abs() < 1e-9);
    }
}

#[test]
fn symbols_default_to_every_csv_in_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_universe(dir.path(), &["MSFT", "AAPL"]);
    std::fs::write(dir.path().join("notes.txt"), "not prices").unwrap();

    let loaded = load_universe(&[], &csv_options(dir.path())).unwrap();
    let symbols: Vec<&str> = loaded.series.keys().map(String::as_str).collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    assert!(loaded.missing.is_empty());
}

#[test]
fn dataset_hash_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    write_universe(dir.path(), &["SPY", "QQQ"]);

    let a = load_universe(&[], &csv_options(dir.path())).unwrap();
    let b = load_universe(&[], &csv_options(dir.path())).unwrap();
    assert_eq!(a.dataset_hash, b.dataset_hash);
    assert!(!a.dataset_hash.is_empty());
}

#[test]
fn date_window_is_half_open() {
    let dir = tempfile::tempdir().unwrap();
    write_universe(dir.path(), &["SPY"]);

    let opts = LoadOptions {
        start: Some(d(2024, 1, 2)),
        end: Some(d(2024, 10, 4)),
        ..csv_options(dir.path())
    };
    let loaded = load_universe(&["SPY".to_string()], &opts).unwrap();
    let bars = loaded.series["SPY"].bars();
    assert_eq!(bars.first().unwrap().date, d(2024, 1, 2));
    assert_eq!(bars.last().unwrap().date, d(2024, 10, 3));
    assert_eq!(loaded.default_end_date(), Some(d(2024, 10, 4)));
}

#[test]
fn missing_symbol_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_universe(dir.path(), &["SPY"]);

    let symbols = vec!["SPY".to_string(), "NOPE".to_string()];
    let loaded = load_universe(&symbols, &csv_options(dir.path())).unwrap();
    assert_eq!(loaded.series.len(), 1);
    assert_eq!(loaded.missing, vec!["NOPE".to_string()]);
}

#[test]
fn screen_and_artifacts_end_to_end() {
    let data_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let symbols = ["AAPL", "AMZN", "MSFT", "NVDA", "SPY"];
    write_universe(data_dir.path(), &symbols);

    let loaded = load_universe(&[], &csv_options(data_dir.path())).unwrap();
    let end = loaded.default_end_date().unwrap();
    let config = ScreenConfig::default();
    let report = run_screen(&config, &loaded, end).unwrap();

    assert_eq!(report.summary.len(), symbols.len());
    assert_eq!(report.dataset_hash, loaded.dataset_hash);
    assert!(!report.has_synthetic);

    save_artifacts(&report, &config.indicators, out_dir.path()).unwrap();
    let summary = std::fs::read_to_string(out_dir.path().join("summary_indicators.csv")).unwrap();
    assert_eq!(summary.lines().count(), symbols.len() + 1);

    let screen = std::fs::read_to_string(out_dir.path().join("screen.csv")).unwrap();
    assert_eq!(screen.lines().count(), report.rows.len() + 1);

    for symbol in symbols {
        let path = out_dir.path().join(format!("indicators_{symbol}.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 11, "{symbol}: header plus ten rows");
    }

    let reloaded = load_report(out_dir.path()).unwrap();
    assert_eq!(reloaded, report);

    // Running again on the same data yields the same verdicts.
    let again = run_screen(&config, &loaded, end).unwrap();
    assert_eq!(again.result_hash, report.result_hash);
}

#[test]
fn monitor_selection_from_loaded_prices() {
    let data_dir = tempfile::tempdir().unwrap();
    write_universe(data_dir.path(), &["SPY"]);
    let loaded = load_universe(&[], &csv_options(data_dir.path())).unwrap();
    let end = loaded.default_end_date().unwrap();

    let entries = selection_entries(&["SPY".to_string()], &loaded.series, end).unwrap();
    assert_eq!(entries[0].date_added, loaded.series["SPY"].last().unwrap().date);

    let log = MonitorLog::new(data_dir.path().join("monitoring_stocks.csv"));
    assert_eq!(log.add(&entries).unwrap(), 1);
    assert_eq!(log.add(&entries).unwrap(), 0);
    assert_eq!(log.load().unwrap(), entries);
}

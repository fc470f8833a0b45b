//! Reporting and export — CSV and JSON artifact generation.
//!
//! Provides the artifact set of a screening run:
//! - **screen.csv**: passing instruments with filter flags and backtest columns
//! - **summary_indicators.csv**: last close of every instrument
//! - **indicators_{SYMBOL}.csv**: most recent indicator rows per instrument
//! - **report.json**: the full `ScreenReport`, schema-versioned
//!
//! Unknown schema versions are rejected on load. Undefined indicator values
//! are written as empty cells.

use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use screenlab_core::{IndicatorParams, IndicatorRow};
use tracing::info;

use crate::screen::{ScreenReport, ScreenRow, SummaryRow, SCHEMA_VERSION};

/// Separator used when a list of dates is flattened into one CSV cell.
pub const DATE_SEPARATOR: &str = ";";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ScreenReport` to pretty JSON.
pub fn export_json(report: &ScreenReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScreenReport to JSON")
}

/// Deserialize a `ScreenReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ScreenReport> {
    let report: ScreenReport =
        serde_json::from_str(json).context("failed to deserialize ScreenReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(NaiveDate::to_string)
        .collect::<Vec<_>>()
        .join(DATE_SEPARATOR)
}

fn opt_f64(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Export the merged screen table.
///
/// Columns: Stock, Closing Price, Indicators File, EMA_Crossover,
/// MACD_Condition, RSI_Condition, Stoch_Crossover, Stoch_Crossover_Last_5_Days,
/// Total_Crossovers, Successful_Crossovers, Success_Rate,
/// Stochastic_Crossover_Dates, Successful_Crossover_Dates
pub fn export_screen_csv(rows: &[ScreenRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "Stock",
        "Closing Price",
        "Indicators File",
        "EMA_Crossover",
        "MACD_Condition",
        "RSI_Condition",
        "Stoch_Crossover",
        "Stoch_Crossover_Last_5_Days",
        "Total_Crossovers",
        "Successful_Crossovers",
        "Success_Rate",
        "Stochastic_Crossover_Dates",
        "Successful_Crossover_Dates",
    ])?;

    for r in rows {
        wtr.write_record([
            r.stock.clone(),
            format!("{:.2}", r.closing_price),
            r.indicators_file.clone(),
            r.ema_crossover.to_string(),
            r.macd_condition.to_string(),
            r.rsi_condition.to_string(),
            r.stoch_crossover.to_string(),
            yes_no(r.stoch_crossover_last_5_days).to_string(),
            r.total_crossovers.map(|v| v.to_string()).unwrap_or_default(),
            r.successful_crossovers.map(|v| v.to_string()).unwrap_or_default(),
            r.success_rate.map(|v| format!("{v:.2}")).unwrap_or_default(),
            join_dates(&r.crossover_dates),
            join_dates(&r.successful_dates),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-instrument summary (Stock, Closing Price, Indicators File).
pub fn export_summary_csv(summary: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Stock", "Closing Price", "Indicators File"])?;
    for s in summary {
        wtr.write_record([
            s.stock.clone(),
            format!("{:.2}", s.closing_price),
            s.indicators_file.clone(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Indicator column names for a parameter set, e.g. `EMA_5`, `EMA_13`, `EMA_26`.
pub fn indicator_headers(params: &IndicatorParams) -> Vec<String> {
    vec![
        "Date".to_string(),
        format!("EMA_{}", params.ema_short),
        format!("EMA_{}", params.ema_medium),
        format!("EMA_{}", params.ema_long),
        "MACD".to_string(),
        "MACD_Signal".to_string(),
        "MACD_Hist".to_string(),
        "RSI".to_string(),
        "Stoch_K".to_string(),
        "Stoch_D".to_string(),
    ]
}

/// Export indicator rows, one line per date.
pub fn export_indicators_csv(rows: &[IndicatorRow], params: &IndicatorParams) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(indicator_headers(params))?;
    for r in rows {
        wtr.write_record([
            r.date.to_string(),
            opt_f64(r.ema_short),
            opt_f64(r.ema_medium),
            opt_f64(r.ema_long),
            opt_f64(r.macd),
            opt_f64(r.macd_signal),
            opt_f64(r.macd_hist),
            opt_f64(r.rsi),
            opt_f64(r.stoch_k),
            opt_f64(r.stoch_d),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the full artifact set into `output_dir` (created if needed).
pub fn save_artifacts(
    report: &ScreenReport,
    params: &IndicatorParams,
    output_dir: &Path,
) -> Result<()> {
    if let Some(bad) = report
        .summary
        .iter()
        .find(|s| !is_plain_file_name(&s.indicators_file))
    {
        bail!(
            "refusing to write indicators for '{}': '{}' is not a plain file name",
            bad.stock,
            bad.indicators_file
        );
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    std::fs::write(output_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(output_dir.join("screen.csv"), export_screen_csv(&report.rows)?)?;
    std::fs::write(
        output_dir.join("summary_indicators.csv"),
        export_summary_csv(&report.summary)?,
    )?;

    for (summary, rows) in report
        .summary
        .iter()
        .filter_map(|s| report.indicators.get(&s.stock).map(|rows| (s, rows)))
    {
        let path = output_dir.join(&summary.indicators_file);
        std::fs::write(&path, export_indicators_csv(rows, params)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(
        dir = %output_dir.display(),
        instruments = report.summary.len(),
        "artifacts written"
    );
    Ok(())
}

/// True when `name` is a single path component that stays inside its directory.
fn is_plain_file_name(name: &str) -> bool {
    let mut parts = Path::new(name).components();
    matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None))
        && !name.contains(['/', '\\'])
}

/// Load a `ScreenReport` from an artifact directory's report.json.
///
/// Rejects unknown schema versions.
pub fn load_report(dir: &Path) -> Result<ScreenReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

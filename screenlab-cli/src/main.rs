//! ScreenLab CLI — screen, indicators, monitoring and data generation commands.
//!
//! Commands:
//! - `screen` — screen a universe of price CSVs and write artifacts
//! - `indicators` — print the most recent indicator rows for one symbol
//! - `monitor add` / `monitor list` — manage the monitoring list
//! - `generate` — write deterministic synthetic price CSVs

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use screenlab_core::{IndicatorEngine, IndicatorRow};
use screenlab_runner::data_loader::{price_file, validate_symbol};
use screenlab_runner::{
    generate_synthetic_series_with, load_universe, run_screen, save_artifacts, selection_entries,
    write_series_csv, LoadOptions, LoadedData, MonitorLog, ScreenConfig, ScreenReport,
    SyntheticParams,
};

#[derive(Parser)]
#[command(
    name = "screenlab",
    about = "ScreenLab CLI — momentum screener with oversold-crossover backtests"
)]
struct Cli {
    /// Emit structured JSON logs instead of human-readable ones.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where prices come from. Flags override the config file.
#[derive(Args, Clone)]
struct DataArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding {SYMBOL}_prices.csv files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Evaluation end date (YYYY-MM-DD, exclusive). Defaults to the day after
    /// the latest bar.
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Generate synthetic data for symbols without a CSV.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a universe and write CSV/JSON artifacts.
    Screen {
        #[command(flatten)]
        data: DataArgs,

        /// Symbols to screen (comma separated). Defaults to every CSV in the data dir.
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Output directory for artifacts.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the most recent indicator rows for one symbol.
    Indicators {
        symbol: String,

        #[command(flatten)]
        data: DataArgs,

        /// Number of rows to print. Defaults to the configured indicator tail.
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Monitoring list commands.
    Monitor {
        #[command(subcommand)]
        action: MonitorAction,
    },
    /// Write deterministic synthetic price CSVs.
    Generate {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// First date (YYYY-MM-DD, inclusive).
        #[arg(long)]
        start: NaiveDate,

        /// Last date (YYYY-MM-DD, exclusive).
        #[arg(long)]
        end: NaiveDate,

        /// Output directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        dir: PathBuf,

        /// Mean daily return of the walk.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        drift: f64,

        /// Daily returns vary uniformly by this much around the drift.
        #[arg(long, default_value_t = 0.03)]
        volatility: f64,
    },
}

#[derive(Subcommand)]
enum MonitorAction {
    /// Add symbols with their latest close.
    Add {
        #[arg(required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        data: DataArgs,

        /// Monitoring CSV. Defaults to the configured monitor file.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List monitored symbols.
    List {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Monitoring CSV. Defaults to the configured monitor file.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Commands::Screen {
            data,
            symbols,
            output_dir,
        } => run_screen_cmd(data, symbols, output_dir),
        Commands::Indicators { symbol, data, rows } => run_indicators(symbol, data, rows),
        Commands::Monitor { action } => match action {
            MonitorAction::Add {
                symbols,
                data,
                file,
            } => run_monitor_add(symbols, data, file),
            MonitorAction::List { config, file } => run_monitor_list(config, file),
        },
        Commands::Generate {
            symbols,
            start,
            end,
            dir,
            drift,
            volatility,
        } => {
            let params = SyntheticParams {
                drift,
                volatility,
                ..SyntheticParams::default()
            };
            run_generate(&symbols, start, end, dir, &params)
        }
    }
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_logging(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ScreenConfig> {
    match path {
        Some(path) => ScreenConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ScreenConfig::default()),
    }
}

/// Apply command-line overrides on top of the config file.
fn resolve_config(args: &DataArgs) -> Result<ScreenConfig> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(dir) = &args.data_dir {
        config.data.dir = dir.clone();
    }
    if args.end_date.is_some() {
        config.data.end_date = args.end_date;
    }
    if args.synthetic {
        config.data.synthetic = true;
    }
    config.validate()?;
    Ok(config)
}

/// Load the requested symbols and settle the evaluation end date.
fn load_data(config: &ScreenConfig, symbols: &[String]) -> Result<(LoadedData, NaiveDate)> {
    let opts = LoadOptions {
        dir: config.data.dir.clone(),
        start: config.data.start_date,
        end: config.data.end_date,
        synthetic: config.data.synthetic,
    };
    let data = load_universe(symbols, &opts)
        .with_context(|| format!("failed to load prices from {}", opts.dir.display()))?;

    for symbol in &data.missing {
        warn!(symbol = %symbol, "no price data");
    }
    if data.series.is_empty() {
        bail!("no price data found in {}", opts.dir.display());
    }
    if data.has_synthetic {
        warn!("results are based on SYNTHETIC data");
    }

    let end = match config.data.end_date.or_else(|| data.default_end_date()) {
        Some(end) => end,
        None => bail!("cannot determine an evaluation end date"),
    };
    info!(instruments = data.series.len(), end = %end, "prices loaded");
    Ok((data, end))
}

fn run_screen_cmd(
    args: DataArgs,
    symbols: Vec<String>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = resolve_config(&args)?;
    if !symbols.is_empty() {
        config.data.symbols = symbols;
    }
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }

    let (data, end) = load_data(&config, &config.data.symbols)?;
    let report = run_screen(&config, &data, end)?;

    print_report(&report);

    save_artifacts(&report, &config.indicators, &config.output.dir)?;
    println!("Artifacts saved to: {}", config.output.dir.display());
    Ok(())
}

fn run_indicators(symbol: String, args: DataArgs, rows: Option<usize>) -> Result<()> {
    let config = resolve_config(&args)?;
    let (data, _) = load_data(&config, std::slice::from_ref(&symbol))?;
    let Some(series) = data.series.get(&symbol) else {
        bail!("no price data for '{symbol}'");
    };

    let engine = IndicatorEngine::new(config.indicators)?;
    let frame = engine.compute(series);
    let count = rows.unwrap_or(config.output.indicator_tail);

    let p = &config.indicators;
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>9} {:>9} {:>9} {:>7} {:>7} {:>7}",
        "Date",
        format!("EMA_{}", p.ema_short),
        format!("EMA_{}", p.ema_medium),
        format!("EMA_{}", p.ema_long),
        "MACD",
        "Signal",
        "Hist",
        "RSI",
        "%K",
        "%D",
    );
    for row in frame.tail(count) {
        print_indicator_row(row);
    }
    Ok(())
}

fn run_monitor_add(symbols: Vec<String>, args: DataArgs, file: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(&args)?;
    let (data, end) = load_data(&config, &symbols)?;

    let entries = selection_entries(&symbols, &data.series, end)?;
    let log = MonitorLog::new(file.unwrap_or(config.output.monitor_file));
    let added = log
        .add(&entries)
        .with_context(|| format!("failed to update {}", log.path().display()))?;

    println!(
        "Added {added} of {} symbol(s) to {}",
        entries.len(),
        log.path().display()
    );
    Ok(())
}

fn run_monitor_list(config: Option<PathBuf>, file: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_ref())?;
    let log = MonitorLog::new(file.unwrap_or(config.output.monitor_file));
    let entries = log.load()?;

    if entries.is_empty() {
        println!("Monitoring list is empty: {}", log.path().display());
        return Ok(());
    }

    println!("{:<8} {:<12} {:>12}", "Stock", "Date Added", "Close");
    println!("{}", "-".repeat(34));
    for e in &entries {
        println!(
            "{:<8} {:<12} {:>12.2}",
            e.stock,
            e.date_added.to_string(),
            e.closing_price
        );
    }
    Ok(())
}

fn run_generate(
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    dir: PathBuf,
    params: &SyntheticParams,
) -> Result<()> {
    if start >= end {
        bail!("--start ({start}) must be before --end ({end})");
    }
    if !(params.volatility >= 0.0 && params.drift - params.volatility > -1.0) {
        bail!("--drift and --volatility must keep daily returns above -100%");
    }
    for symbol in symbols {
        validate_symbol(symbol)?;
    }
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    for symbol in symbols {
        let series = generate_synthetic_series_with(symbol, start, end, params)?;
        let path = price_file(&dir, symbol);
        write_series_csv(&path, &series)?;
        println!("{symbol}: {} bars -> {}", series.len(), path.display());
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, width: usize, precision: usize) -> String {
    match value {
        Some(v) => format!("{v:>width$.precision$}"),
        None => format!("{:>width$}", "-"),
    }
}

fn print_indicator_row(row: &IndicatorRow) {
    println!(
        "{} {} {} {} {} {} {} {} {} {}",
        row.date,
        fmt_opt(row.ema_short, 10, 2),
        fmt_opt(row.ema_medium, 10, 2),
        fmt_opt(row.ema_long, 10, 2),
        fmt_opt(row.macd, 9, 3),
        fmt_opt(row.macd_signal, 9, 3),
        fmt_opt(row.macd_hist, 9, 3),
        fmt_opt(row.rsi, 7, 1),
        fmt_opt(row.stoch_k, 7, 1),
        fmt_opt(row.stoch_d, 7, 1),
    );
}

fn print_report(report: &ScreenReport) {
    println!();
    println!("=== Screen Result ===");
    println!("End date:       {}", report.end_date - Duration::days(1));
    println!("Instruments:    {}", report.summary.len());
    println!("Evaluated:      {}", report.records.len());
    println!("Passing:        {}", report.rows.len());
    println!();

    if report.rows.is_empty() {
        println!("No instruments met all conditions.");
    } else {
        println!(
            "{:<8} {:>10} {:>8} {:>7} {:>10} {:>7}",
            "Stock", "Close", "Recent", "Total", "Successful", "Rate"
        );
        println!("{}", "-".repeat(55));
        for r in &report.rows {
            let total = r.total_crossovers.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
            let successful = r
                .successful_crossovers
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".into());
            let rate = r
                .success_rate
                .map(|v| format!("{v:.1}%"))
                .unwrap_or_else(|| "-".into());
            println!(
                "{:<8} {:>10.2} {:>8} {:>7} {:>10} {:>7}",
                r.stock,
                r.closing_price,
                if r.stoch_crossover_last_5_days { "Yes" } else { "No" },
                total,
                successful,
                rate
            );
        }
    }

    if report.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

//! SettleLab CLI: settlement-day backtests on TAIFEX TX futures.
//!
//! Commands:
//! - `backtest`: run the settlement-day strategy and save artifacts
//! - `benchmark`: compare settlement days against ordinary weekdays
//! - `extract`: reduce a raw TAIFEX daily export to one front-month bar per session
//! - `report`: regenerate `report.md` from a saved run

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use settlelab_core::data::{extract_front_contract, ExpiryRule};
use settlelab_core::{CountingPeriod, OpeningPriceMode, PrevCloseMode, ZeroTrendPolicy};
use settlelab_runner::report::{fmt_opt, fmt_pct, fmt_pct_opt, fmt_rate};
use settlelab_runner::{
    generate_report, load_artifacts, run_backtest, save_artifacts, BacktestConfig,
    BacktestResult, WeekdayBenchmark,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "settlelab",
    version,
    about = "SettleLab CLI: TAIFEX settlement-day backtester"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the settlement-day backtest.
    Backtest {
        #[command(flatten)]
        run: RunArgs,

        /// Do not write manifest/CSV/report artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,

        /// Also run the fixed-weekday benchmark.
        #[arg(long, default_value_t = false)]
        benchmark: bool,

        /// Minimum trades for a filter combination to be ranked.
        #[arg(long)]
        min_cell_trades: Option<usize>,
    },
    /// Compare settlement days against Mondays, Tuesdays, Thursdays and Fridays.
    Benchmark {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Extract the front-month contract from a raw TAIFEX daily CSV.
    Extract {
        /// Raw TAIFEX daily futures CSV.
        raw: PathBuf,

        /// Output price CSV.
        out: PathBuf,

        /// Contract code to keep.
        #[arg(long, default_value = "TX")]
        contract: String,

        /// Which monthly expiry to keep: latest | nearest.
        #[arg(long, default_value = "latest")]
        expiry: ExpiryRule,
    },
    /// Regenerate report.md from a saved run directory.
    Report {
        /// Directory containing manifest.json.
        run_dir: PathBuf,
    },
}

/// Flags shared by `backtest` and `benchmark`. Each overrides the config file.
#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Price CSV (trade_date, session, open, high, low, close, volume).
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Settlement calendar CSV (settlement_date, contract_code).
    #[arg(long)]
    calendar: Option<PathBuf>,

    /// weekly | monthly
    #[arg(long)]
    counting_period: Option<CountingPeriod>,

    /// standard | night
    #[arg(long)]
    opening_price_calc: Option<OpeningPriceMode>,

    /// standard | night | settlement_open
    #[arg(long)]
    prev_close_calc: Option<PrevCloseMode>,

    /// skip | long | short
    #[arg(long)]
    zero_trend: Option<ZeroTrendPolicy>,

    /// First settlement date (YYYY-MM-DD).
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last settlement date (YYYY-MM-DD).
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Generate synthetic bars when the price file is missing.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Directory holding the default price file.
    #[arg(long, env = "TX_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for run artifacts.
    #[arg(long, env = "TX_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
}

impl RunArgs {
    fn into_config(self) -> Result<BacktestConfig> {
        let config = match &self.config {
            Some(path) => BacktestConfig::from_file(path)?,
            None => BacktestConfig::default(),
        };
        let mut config =
            config.with_directories(self.data_dir.as_deref(), self.output_dir.as_deref());

        if let Some(prices) = self.prices {
            config.data.prices = prices;
        }
        if let Some(calendar) = self.calendar {
            config.data.calendar = Some(calendar);
        }
        if self.synthetic {
            config.data.synthetic = true;
        }
        let bt = &mut config.backtest;
        if let Some(period) = self.counting_period {
            bt.counting_period = period;
        }
        if let Some(mode) = self.opening_price_calc {
            bt.opening_price_calc = mode;
        }
        if let Some(mode) = self.prev_close_calc {
            bt.prev_close_calc = mode;
        }
        if let Some(policy) = self.zero_trend {
            bt.zero_trend = policy;
        }
        if let Some(start) = self.start_date {
            bt.start_date = start;
        }
        if let Some(end) = self.end_date {
            bt.end_date = end;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "settlelab=debug"
    } else {
        "settlelab=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Backtest {
            run,
            no_artifacts,
            benchmark,
            min_cell_trades,
        } => {
            let mut config = run.into_config()?;
            if benchmark {
                config.output.benchmark = true;
            }
            if let Some(n) = min_cell_trades {
                config.output.min_cell_trades = n;
            }
            run_backtest_cmd(&config, !no_artifacts)
        }
        Commands::Benchmark { run } => {
            let mut config = run.into_config()?;
            config.output.benchmark = true;
            run_benchmark_cmd(&config)
        }
        Commands::Extract {
            raw,
            out,
            contract,
            expiry,
        } => run_extract(&raw, &out, &contract, expiry),
        Commands::Report { run_dir } => run_report(&run_dir),
    }
}

fn run_backtest_cmd(config: &BacktestConfig, save: bool) -> Result<()> {
    let result = run_backtest(config)?;
    print_summary(&result);
    if let Some(bench) = &result.benchmark {
        print_benchmark(bench);
    }

    if save {
        let run_dir = save_artifacts(&result, &config.output.dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_benchmark_cmd(config: &BacktestConfig) -> Result<()> {
    let result = run_backtest(config)?;
    if result.has_synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
    }
    match &result.benchmark {
        Some(bench) => print_benchmark(bench),
        None => println!("No benchmark was produced."),
    }
    Ok(())
}

fn run_extract(raw: &Path, out: &Path, contract: &str, expiry: ExpiryRule) -> Result<()> {
    let reader = File::open(raw).with_context(|| format!("failed to open {}", raw.display()))?;
    let writer = BufWriter::new(
        File::create(out).with_context(|| format!("failed to create {}", out.display()))?,
    );
    let summary = extract_front_contract(reader, writer, contract, expiry)?;
    info!(
        rows_read = summary.rows_read,
        rows_written = summary.rows_written,
        "extraction complete"
    );

    println!("Rows read:           {}", summary.rows_read);
    println!("Rows for {contract}:        {}", summary.rows_matching_contract);
    println!("Rows without prices: {}", summary.rows_without_prices);
    println!("Bars written:        {}", summary.rows_written);
    println!("Output:              {}", out.display());
    Ok(())
}

fn run_report(run_dir: &Path) -> Result<()> {
    let result = load_artifacts(run_dir)?;
    let path = run_dir.join("report.md");
    std::fs::write(&path, generate_report(&result))
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Report written to: {}", path.display());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let bt = &result.config.backtest;
    let s = &result.summary;

    println!();
    println!("=== Settlement-Day Backtest ===");
    println!("Window:         {} to {}", bt.start_date, bt.end_date);
    println!(
        "Modes:          period={} opening={} prev_close={} zero_trend={}",
        bt.counting_period.as_str(),
        bt.opening_price_calc.as_str(),
        bt.prev_close_calc.as_str(),
        bt.zero_trend.as_str()
    );
    println!(
        "Events:         {} ({} traded, {} skipped)",
        result.candidate_events,
        result.trades.len(),
        result.skipped.len()
    );
    println!(
        "Event Rate:     {}",
        result
            .event_rate
            .map_or_else(|| "N/A".to_string(), fmt_rate)
    );
    println!();

    if s.is_empty() {
        println!("No trades were generated.");
    } else {
        println!("--- Performance ---");
        println!("Win Rate:       {}", fmt_rate(s.win_rate));
        println!("Net Profit:     {}", fmt_pct(s.net_profit));
        println!("Total Profit:   {}", fmt_pct(s.total_profit));
        println!("Total Loss:     {}", fmt_pct(s.total_loss));
        println!("Avg Trade:      {}", fmt_pct(s.avg_trade));
        println!("P/L Ratio:      {}", fmt_opt(s.pl_ratio, 3));
        println!("Kelly:          {}", fmt_pct_opt(s.kelly_pct));
        println!("Max Drawdown:   {}", fmt_pct(s.max_drawdown));
        println!("Sharpe:         {}", fmt_opt(s.sharpe, 3));
        println!("Sortino:        {}", fmt_opt(s.sortino, 3));
        println!("Calmar:         {}", fmt_opt(s.calmar, 3));
        println!("VaR 95%:        {}", fmt_pct_opt(s.var_95));
        println!("Max Consec Win: {}", s.max_consecutive_wins);
        println!("Max Consec Loss:{}", s.max_consecutive_losses);
    }

    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &result.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
}

fn print_benchmark(bench: &WeekdayBenchmark) {
    println!("--- Weekday Benchmark ---");
    println!(
        "{:<16} {:>10} {:>8} {:>10} {:>10} {:>12}",
        "Day", "Candidates", "Trades", "Rate", "Win Rate", "Net Profit"
    );
    println!("{}", "-".repeat(71));
    for w in std::iter::once(&bench.settlement).chain(&bench.weekdays) {
        println!(
            "{:<16} {:>10} {:>8} {:>10} {:>10} {:>12}",
            w.label,
            w.candidates,
            w.summary.total_trades,
            w.event_rate.map_or_else(|| "N/A".to_string(), fmt_rate),
            fmt_rate(w.summary.win_rate),
            fmt_pct(w.summary.net_profit),
        );
    }
    let better: Vec<&str> = bench.outperformers().map(|w| w.label.as_str()).collect();
    if !better.is_empty() {
        println!("Higher win rate than settlement days: {}", better.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_flags_use_config_names() {
        let cli = Cli::try_parse_from([
            "settlelab",
            "benchmark",
            "--prev-close-calc",
            "settlement_open",
            "--zero-trend",
            "long",
        ])
        .unwrap();
        let Commands::Benchmark { run } = cli.command else {
            panic!("expected benchmark");
        };
        assert_eq!(run.prev_close_calc, Some(PrevCloseMode::SettlementOpen));
        assert_eq!(run.zero_trend, Some(ZeroTrendPolicy::Long));

        let cli = Cli::try_parse_from(["settlelab", "extract", "raw.csv", "out.csv"]).unwrap();
        let Commands::Extract { expiry, .. } = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(expiry, ExpiryRule::Latest);

        assert!(Cli::try_parse_from([
            "settlelab",
            "backtest",
            "--opening-price-calc",
            "vwap",
        ])
        .is_err());
    }

    #[test]
    fn flags_override_config_defaults() {
        let cli = Cli::try_parse_from([
            "settlelab",
            "backtest",
            "--counting-period",
            "monthly",
            "--prev-close-calc",
            "night",
            "--start-date",
            "2020-01-01",
            "--prices",
            "tx.csv",
        ])
        .unwrap();
        let Commands::Backtest { run, .. } = cli.command else {
            panic!("expected backtest");
        };
        let config = run.into_config().unwrap();
        assert_eq!(config.backtest.counting_period, CountingPeriod::Monthly);
        assert_eq!(config.backtest.prev_close_calc, PrevCloseMode::Night);
        assert_eq!(
            config.backtest.start_date,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
        assert_eq!(config.data.prices, PathBuf::from("tx.csv"));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let cli = Cli::try_parse_from([
            "settlelab",
            "benchmark",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2023-01-01",
        ])
        .unwrap();
        let Commands::Benchmark { run } = cli.command else {
            panic!("expected benchmark");
        };
        assert!(run.into_config().is_err());
    }
}

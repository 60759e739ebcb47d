//! SettleLab Runner: configuration, statistics, analyses and reports.
//!
//! This crate builds on `settlelab-core` to provide:
//! - TOML configuration with CLI/env overrides
//! - Data loading with an opt-in synthetic fallback
//! - The performance statistics engine and tail risk
//! - Filter, seasonal and volatility analyses
//! - The fixed-weekday benchmark
//! - JSON/CSV/Markdown artifacts

pub mod benchmark;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod filters;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod seasonal;
pub mod tail_metrics;
pub mod volatility;

pub use benchmark::{run_weekday_benchmark, WeekdayBenchmark, WeekdayResult};
pub use config::{BacktestConfig, ConfigError, RunId};
pub use data_loader::{load_market_data, LoadedData};
pub use export::{load_artifacts, save_artifacts};
pub use filters::{analyze_filters, FilterAnalysis, FilterDimension};
pub use metrics::{compute_stats, PerformanceSummary};
pub use report::generate_report;
pub use runner::{run_backtest, run_backtest_from_data, BacktestResult, RunError};
pub use seasonal::{analyze_seasonal, SeasonalBreakdown};
pub use volatility::{compare_volatility, VolatilityComparison};

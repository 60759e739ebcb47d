//! Backtest runner: wires together data loading, the settlement calendar,
//! the simulator, and every analysis.
//!
//! Two entry points:
//! - `run_backtest()`: loads data from the configured files, then runs. Used by CLI.
//! - `run_backtest_from_data()`: takes pre-loaded data. No I/O.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use settlelab_core::{
    resolve_settlement_events, LoadError, SettlementEvent, SkippedEvent, Simulator, TradeRecord,
};
use thiserror::Error;
use tracing::info;

use crate::benchmark::{event_rate, run_weekday_benchmark, WeekdayBenchmark};
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_market_data, LoadedData};
use crate::filters::{analyze_filters, FilterAnalysis};
use crate::metrics::{compute_stats, PerformanceSummary};
use crate::seasonal::{analyze_seasonal, SeasonalBreakdown};
use crate::volatility::{compare_volatility, VolatilityComparison};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub data_start: Option<NaiveDate>,
    pub data_end: Option<NaiveDate>,
    pub bar_count: usize,
    pub trading_days: usize,
    /// Settlement events inside the window after the counting-period filter.
    pub candidate_events: usize,
    /// trades / candidate_events.
    pub event_rate: Option<f64>,
    pub skipped: Vec<SkippedEvent>,
    pub trades: Vec<TradeRecord>,
    pub summary: PerformanceSummary,
    pub filters: FilterAnalysis,
    pub seasonal: SeasonalBreakdown,
    pub volatility: VolatilityComparison,
    pub benchmark: Option<WeekdayBenchmark>,
    pub data_quality_warnings: Vec<String>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load the configured data and run the backtest.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_market_data(
        &config.data,
        config.backtest.start_date,
        config.backtest.end_date,
    )?;
    run_backtest_from_data(config, &loaded)
}

/// Settlement events for the run window, plus the settlement immediately
/// before the window (the first window's opening anchor).
pub fn select_events(
    config: &BacktestConfig,
    all_events: &[SettlementEvent],
) -> (Vec<SettlementEvent>, Option<NaiveDate>) {
    let period = config.backtest.counting_period;
    let (start, end) = (config.backtest.start_date, config.backtest.end_date);

    let counted: Vec<&SettlementEvent> = all_events
        .iter()
        .filter(|e| period.admits(e.kind))
        .collect();
    let anchor = counted
        .iter()
        .map(|e| e.settlement_date)
        .filter(|d| *d < start)
        .max();
    let selected = counted
        .into_iter()
        .filter(|e| (start..=end).contains(&e.settlement_date))
        .cloned()
        .collect();
    (selected, anchor)
}

/// Run a backtest with pre-loaded data. No I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    loaded: &LoadedData,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let table = &loaded.table;
    let all_events = resolve_settlement_events(table, loaded.calendar.as_deref());
    let (events, anchor) = select_events(config, &all_events);

    let sim_config = config.simulation();
    let simulation = Simulator::new(table, sim_config)
        .with_anchor(anchor)
        .run(&events);
    let candidate_events = simulation.candidates();

    info!(
        events = candidate_events,
        trades = simulation.trades.len(),
        skipped = simulation.skipped.len(),
        period = config.backtest.counting_period.as_str(),
        "settlement simulation complete"
    );

    let summary = compute_stats(&simulation.trades);
    let filters = analyze_filters(&simulation.trades);
    let seasonal = analyze_seasonal(&simulation.trades);
    let settlement_dates: BTreeSet<NaiveDate> =
        all_events.iter().map(|e| e.settlement_date).collect();
    let volatility = compare_volatility(table, &settlement_dates);
    let benchmark = config.output.benchmark.then(|| {
        run_weekday_benchmark(
            table,
            sim_config,
            &simulation,
            &settlement_dates,
            config.backtest.start_date,
            config.backtest.end_date,
        )
    });

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        config: config.clone(),
        dataset_hash: loaded.dataset_hash.clone(),
        has_synthetic: loaded.has_synthetic,
        data_start: table.first_trading_day(),
        data_end: table.last_trading_day(),
        bar_count: table.len(),
        trading_days: table.trading_day_count(),
        candidate_events,
        event_rate: event_rate(simulation.trades.len(), candidate_events),
        skipped: simulation.skipped,
        trades: simulation.trades,
        summary,
        filters,
        seasonal,
        volatility,
        benchmark,
        data_quality_warnings: loaded.data_quality_warnings.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use settlelab_core::{CountingPeriod, SettlementKind};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn event(date: NaiveDate, kind: SettlementKind) -> SettlementEvent {
        SettlementEvent {
            settlement_date: date,
            contract_code: None,
            kind,
        }
    }

    #[test]
    fn selection_applies_period_window_and_anchor() {
        let events = vec![
            event(d(2023, 12, 20), SettlementKind::Monthly),
            event(d(2023, 12, 27), SettlementKind::Weekly),
            event(d(2024, 1, 3), SettlementKind::Weekly),
            event(d(2024, 1, 17), SettlementKind::Monthly),
            event(d(2024, 2, 21), SettlementKind::Monthly),
        ];
        let mut config = BacktestConfig::default();
        config.backtest.start_date = d(2024, 1, 1);
        config.backtest.end_date = d(2024, 1, 31);

        let (weekly, anchor) = select_events(&config, &events);
        assert_eq!(weekly.len(), 2);
        assert_eq!(anchor, Some(d(2023, 12, 27)));

        config.backtest.counting_period = CountingPeriod::Monthly;
        let (monthly, anchor) = select_events(&config, &events);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].settlement_date, d(2024, 1, 17));
        assert_eq!(anchor, Some(d(2023, 12, 20)));
    }

    #[test]
    fn inverted_window_is_a_config_error() {
        let mut config = BacktestConfig::default();
        config.backtest.start_date = d(2024, 2, 1);
        config.backtest.end_date = d(2024, 1, 1);
        assert!(matches!(
            run_backtest(&config),
            Err(RunError::Config(ConfigError::InvalidDateRange { .. }))
        ));
    }
}

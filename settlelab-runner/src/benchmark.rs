//! Fixed-weekday benchmark.
//!
//! Runs the settlement-day strategy on ordinary Mondays, Tuesdays, Thursdays
//! and Fridays to check whether the settlement-day edge is specific to
//! settlement days. Each target's window opens on the first trading day on or
//! after `target − 7 days`. Settlement dates are excluded from every weekday.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use settlelab_core::{PriceTable, Simulation, SimulationConfig, Simulator};
use tracing::info;

use crate::metrics::{compute_stats, PerformanceSummary};

pub const BENCHMARK_WEEKDAYS: [Weekday; 4] =
    [Weekday::Mon, Weekday::Tue, Weekday::Thu, Weekday::Fri];
pub const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayResult {
    pub label: String,
    /// Candidate dates of this weekday inside the window.
    pub candidates: usize,
    /// trades / candidates.
    pub event_rate: Option<f64>,
    pub summary: PerformanceSummary,
}

impl WeekdayResult {
    pub fn from_simulation(label: impl Into<String>, sim: &Simulation) -> Self {
        let candidates = sim.candidates();
        Self {
            label: label.into(),
            candidates,
            event_rate: event_rate(sim.trades.len(), candidates),
            summary: compute_stats(&sim.trades),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBenchmark {
    pub settlement: WeekdayResult,
    pub weekdays: Vec<WeekdayResult>,
}

impl WeekdayBenchmark {
    /// Weekdays whose win rate beats the settlement days.
    pub fn outperformers(&self) -> impl Iterator<Item = &WeekdayResult> {
        let base = self.settlement.summary.win_rate;
        self.weekdays
            .iter()
            .filter(move |w| !w.summary.is_empty() && w.summary.win_rate > base)
    }
}

pub fn event_rate(trades: usize, candidates: usize) -> Option<f64> {
    (candidates > 0).then(|| trades as f64 / candidates as f64)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Benchmark every non-settlement weekday in `[start, end]` against the
/// settlement-day simulation already computed for the same window.
///
/// `settlement_dates` holds every settlement in the calendar, counted or not.
pub fn run_weekday_benchmark(
    table: &PriceTable,
    config: SimulationConfig,
    settlement: &Simulation,
    settlement_dates: &BTreeSet<NaiveDate>,
    start: NaiveDate,
    end: NaiveDate,
) -> WeekdayBenchmark {
    let exclude: BTreeSet<NaiveDate> = settlement_dates
        .iter()
        .filter(|d| (start..=end).contains(*d))
        .copied()
        .collect();
    let simulator = Simulator::new(table, config);

    let weekdays: Vec<WeekdayResult> = BENCHMARK_WEEKDAYS
        .par_iter()
        .map(|&weekday| {
            let mut sim = simulator.run_fixed_weekday(weekday, &exclude, LOOKBACK_DAYS);
            sim.trades.retain(|t| (start..=end).contains(&t.settlement_date));
            sim.skipped.retain(|s| (start..=end).contains(&s.date));
            WeekdayResult::from_simulation(weekday_name(weekday), &sim)
        })
        .collect();

    let benchmark = WeekdayBenchmark {
        settlement: WeekdayResult::from_simulation("Settlement day", settlement),
        weekdays,
    };
    info!(
        settlement_win_rate = benchmark.settlement.summary.win_rate,
        outperformers = benchmark.outperformers().count(),
        "weekday benchmark complete"
    );
    benchmark
}

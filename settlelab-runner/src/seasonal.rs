//! Seasonal breakdown of settlement-day trades by month, quarter and year.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use settlelab_core::TradeRecord;

use crate::metrics::{compute_stats, PerformanceSummary};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalBreakdown {
    /// Calendar month (1–12).
    pub by_month: BTreeMap<u32, PerformanceSummary>,
    /// Quarter (1–4).
    pub by_quarter: BTreeMap<u32, PerformanceSummary>,
    pub by_year: BTreeMap<i32, PerformanceSummary>,
}

pub fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

/// Bucket trades by settlement date. Only buckets with trades appear.
pub fn analyze_seasonal(trades: &[TradeRecord]) -> SeasonalBreakdown {
    let mut months: BTreeMap<u32, Vec<TradeRecord>> = BTreeMap::new();
    let mut quarters: BTreeMap<u32, Vec<TradeRecord>> = BTreeMap::new();
    let mut years: BTreeMap<i32, Vec<TradeRecord>> = BTreeMap::new();

    for trade in trades {
        let date = trade.settlement_date;
        months.entry(date.month()).or_default().push(trade.clone());
        quarters
            .entry(quarter_of(date.month()))
            .or_default()
            .push(trade.clone());
        years.entry(date.year()).or_default().push(trade.clone());
    }

    SeasonalBreakdown {
        by_month: summarize(months),
        by_quarter: summarize(quarters),
        by_year: summarize(years),
    }
}

fn summarize<K: Ord>(buckets: BTreeMap<K, Vec<TradeRecord>>) -> BTreeMap<K, PerformanceSummary> {
    buckets
        .into_iter()
        .map(|(key, trades)| (key, compute_stats(&trades)))
        .collect()
}

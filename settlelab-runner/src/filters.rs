//! Filter / segmentation analysis.
//!
//! Trades are bucketed by four tags: trend direction, the prior day's candle
//! colour, the opening gap, and the settlement kind. Every single dimension,
//! every pair and every triple is evaluated; each bucket gets its own
//! [`PerformanceSummary`].
//!
//! Filter names join dimensions with `+` (`"trend+candle"`), category keys
//! join values with `/` (`"up/red"`). Single-factor filters list every
//! category even when empty, so their counts always add up to the total.
//! Empty multi-factor cells are left out.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use settlelab_core::TradeRecord;
use tracing::debug;

use crate::metrics::{compute_stats, PerformanceSummary};

/// A trade tag used for segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    Trend,
    Candle,
    Gap,
    Settlement,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 4] = [
        FilterDimension::Trend,
        FilterDimension::Candle,
        FilterDimension::Gap,
        FilterDimension::Settlement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterDimension::Trend => "trend",
            FilterDimension::Candle => "candle",
            FilterDimension::Gap => "gap",
            FilterDimension::Settlement => "settlement",
        }
    }

    /// Report heading.
    pub fn title(self) -> &'static str {
        match self {
            FilterDimension::Trend => "Trend Direction (趨勢方向)",
            FilterDimension::Candle => "Previous Candle (昨日K線)",
            FilterDimension::Gap => "Opening Position (開盤位置)",
            FilterDimension::Settlement => "Settlement Type (結算類型)",
        }
    }

    pub fn categories(self) -> &'static [&'static str] {
        match self {
            FilterDimension::Trend => &["up", "down"],
            FilterDimension::Candle => &["red", "black"],
            FilterDimension::Gap => &["high", "low"],
            FilterDimension::Settlement => &["weekly", "monthly"],
        }
    }

    pub fn category_of(self, trade: &TradeRecord) -> &'static str {
        match self {
            FilterDimension::Trend => trade.trend_direction().as_str(),
            FilterDimension::Candle => trade.candle_color.as_str(),
            FilterDimension::Gap => trade.opening_gap.as_str(),
            FilterDimension::Settlement => trade.settlement_kind.as_str(),
        }
    }
}

/// Display label for a category value.
pub fn category_label(category: &str) -> &str {
    match category {
        "up" => "Up (往上)",
        "down" => "Down (往下)",
        "red" => "Red (紅K)",
        "black" => "Black (黑K)",
        "high" => "High Open (高開)",
        "low" => "Low Open (低開)",
        "weekly" => "Weekly (週選)",
        "monthly" => "Monthly (月選)",
        other => other,
    }
}

/// One bucket in the ranking.
#[derive(Debug, Clone, Copy)]
pub struct RankedCell<'a> {
    pub filter: &'a str,
    pub category: &'a str,
    pub summary: &'a PerformanceSummary,
}

/// Filter name → category → statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterAnalysis {
    pub groups: BTreeMap<String, BTreeMap<String, PerformanceSummary>>,
}

impl FilterAnalysis {
    pub fn get(&self, filter: &str, category: &str) -> Option<&PerformanceSummary> {
        self.groups.get(filter)?.get(category)
    }

    pub fn single(&self, dim: FilterDimension) -> Option<&BTreeMap<String, PerformanceSummary>> {
        self.groups.get(dim.name())
    }

    /// Multi-factor cells with at least `min_trades` trades, best win rate
    /// first, ties broken by trade count and then by name.
    pub fn ranked(&self, min_trades: usize) -> Vec<RankedCell<'_>> {
        let mut cells: Vec<RankedCell<'_>> = self
            .groups
            .iter()
            .filter(|(filter, _)| filter.contains('+'))
            .flat_map(|(filter, cats)| {
                cats.iter().map(move |(category, summary)| RankedCell {
                    filter,
                    category,
                    summary,
                })
            })
            .filter(|cell| cell.summary.total_trades >= min_trades.max(1))
            .collect();

        cells.sort_by(|a, b| {
            b.summary
                .win_rate
                .total_cmp(&a.summary.win_rate)
                .then(b.summary.total_trades.cmp(&a.summary.total_trades))
                .then(a.filter.cmp(b.filter))
                .then(a.category.cmp(b.category))
        });
        cells
    }
}

/// All 1-, 2- and 3-dimension combinations, in dimension order.
pub fn dimension_combinations() -> Vec<Vec<FilterDimension>> {
    let n = FilterDimension::ALL.len();
    (1u32..(1 << n))
        .filter(|mask| (1..=3).contains(&mask.count_ones()))
        .map(|mask| {
            FilterDimension::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, dim)| *dim)
                .collect()
        })
        .collect()
}

pub fn filter_name(dims: &[FilterDimension]) -> String {
    dims.iter().map(|d| d.name()).collect::<Vec<_>>().join("+")
}

/// Segment `trades` by every dimension combination.
pub fn analyze_filters(trades: &[TradeRecord]) -> FilterAnalysis {
    let groups: BTreeMap<String, BTreeMap<String, PerformanceSummary>> =
        dimension_combinations()
            .par_iter()
            .map(|dims| (filter_name(dims), analyze_combination(trades, dims)))
            .collect();
    debug!(filters = groups.len(), trades = trades.len(), "filter analysis complete");
    FilterAnalysis { groups }
}

fn analyze_combination(
    trades: &[TradeRecord],
    dims: &[FilterDimension],
) -> BTreeMap<String, PerformanceSummary> {
    let mut buckets: BTreeMap<String, Vec<TradeRecord>> = BTreeMap::new();
    if let [only] = dims {
        for category in only.categories() {
            buckets.insert((*category).to_string(), Vec::new());
        }
    }
    for trade in trades {
        let key = dims
            .iter()
            .map(|d| d.category_of(trade))
            .collect::<Vec<_>>()
            .join("/");
        buckets.entry(key).or_default().push(trade.clone());
    }
    buckets
        .into_iter()
        .map(|(category, bucket)| (category, compute_stats(&bucket)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::trade_at;
    use settlelab_core::{CandleColor, OpeningGap, SettlementKind};

    fn tagged(
        week: i64,
        pnl: f64,
        trend: f64,
        candle: CandleColor,
        gap: OpeningGap,
        kind: SettlementKind,
    ) -> TradeRecord {
        let mut t = trade_at(week, pnl);
        t.trend_value = trend;
        t.candle_color = candle;
        t.opening_gap = gap;
        t.settlement_kind = kind;
        t
    }

    fn sample() -> Vec<TradeRecord> {
        use CandleColor::*;
        use OpeningGap::*;
        use SettlementKind::*;
        vec![
            tagged(0, 1.0, 50.0, Red, High, Weekly),
            tagged(1, -0.5, -20.0, Black, Low, Weekly),
            tagged(2, 0.7, 30.0, Red, Low, Monthly),
            tagged(3, 0.2, 10.0, Red, High, Weekly),
            tagged(4, -0.3, -5.0, Red, High, Weekly),
        ]
    }

    #[test]
    fn fourteen_filters() {
        let combos = dimension_combinations();
        assert_eq!(combos.len(), 14);
        assert_eq!(combos.iter().filter(|c| c.len() == 2).count(), 6);
        assert_eq!(combos.iter().filter(|c| c.len() == 3).count(), 4);
        let analysis = analyze_filters(&sample());
        assert_eq!(analysis.groups.len(), 14);
        assert!(analysis.groups.contains_key("trend+candle"));
        assert!(analysis.groups.contains_key("candle+gap+settlement"));
    }

    #[test]
    fn single_factor_counts_sum_to_total() {
        let trades = sample();
        let analysis = analyze_filters(&trades);
        for dim in FilterDimension::ALL {
            let cats = analysis.single(dim).unwrap();
            assert_eq!(cats.len(), 2, "{} lists both categories", dim.name());
            let total: usize = cats.values().map(|s| s.total_trades).sum();
            assert_eq!(total, trades.len());
        }
    }

    #[test]
    fn empty_single_category_is_present_but_empty() {
        let trades: Vec<_> = sample()
            .into_iter()
            .filter(|t| t.settlement_kind == SettlementKind::Weekly)
            .collect();
        let analysis = analyze_filters(&trades);
        let monthly = analysis.get("settlement", "monthly").unwrap();
        assert!(monthly.is_empty());
    }

    #[test]
    fn multi_factor_cells_skip_empty_combinations() {
        let analysis = analyze_filters(&sample());
        let cells = &analysis.groups["trend+candle"];
        // down/red: trade 4 (trend −5, red); down/black: trade 1; up/red: 0, 2, 3
        assert_eq!(cells.len(), 3);
        assert_eq!(cells["up/red"].total_trades, 3);
        assert!(!cells.contains_key("up/black"));
    }

    #[test]
    fn ranking_orders_by_win_rate_then_count() {
        let analysis = analyze_filters(&sample());
        let ranked = analysis.ranked(2);
        assert!(!ranked.is_empty());
        assert!(ranked.iter().all(|c| c.filter.contains('+')));
        assert!(ranked.iter().all(|c| c.summary.total_trades >= 2));
        for pair in ranked.windows(2) {
            let (a, b) = (pair[0].summary, pair[1].summary);
            assert!(
                a.win_rate > b.win_rate
                    || (a.win_rate == b.win_rate && a.total_trades >= b.total_trades)
            );
        }
        assert_eq!(ranked[0].summary.win_rate, 1.0);
    }

    #[test]
    fn analysis_is_deterministic() {
        let trades = sample();
        assert_eq!(analyze_filters(&trades), analyze_filters(&trades));
    }

    #[test]
    fn no_trades_gives_empty_singles() {
        let analysis = analyze_filters(&[]);
        assert_eq!(analysis.single(FilterDimension::Trend).unwrap().len(), 2);
        assert!(analysis.groups["trend+gap"].is_empty());
    }
}

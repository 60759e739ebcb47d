//! Markdown report for a single backtest run.
//!
//! Percentages print with two decimals and a `%` suffix, ratios with three.
//! Undefined values print as `N/A`.

use std::collections::BTreeMap;

use crate::filters::{category_label, FilterDimension};
use crate::metrics::PerformanceSummary;
use crate::runner::BacktestResult;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ─── Formatting helpers ─────────────────────────────────────────────

/// `value` with `decimals` places, or `N/A`.
pub fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => "N/A".to_string(),
    }
}

/// A value already in percent units.
pub fn fmt_pct(value: f64) -> String {
    format!("{value:.2}%")
}

pub fn fmt_pct_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), fmt_pct)
}

/// A fraction rendered as a percentage (`0.55` → `55.00%`).
pub fn fmt_rate(value: f64) -> String {
    fmt_pct(value * 100.0)
}

// ─── Report ─────────────────────────────────────────────────────────

/// Generate the Markdown report for a backtest result.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(8192);
    let cfg = &result.config;

    md.push_str("# Settlement-Day Backtest Report (結算日回測報告)\n\n");

    if result.has_synthetic {
        md.push_str(
            "> **WARNING:** results were produced on SYNTHETIC data and say nothing \
             about the real market.\n\n",
        );
    }

    // Metadata
    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push_str(&format!(
        "| Window | {} to {} |\n",
        cfg.backtest.start_date, cfg.backtest.end_date
    ));
    md.push_str(&format!(
        "| Counting Period | {} |\n",
        cfg.backtest.counting_period.as_str()
    ));
    md.push_str(&format!(
        "| Opening Price | {} |\n",
        cfg.backtest.opening_price_calc.as_str()
    ));
    md.push_str(&format!(
        "| Previous Close | {} |\n",
        cfg.backtest.prev_close_calc.as_str()
    ));
    md.push_str(&format!(
        "| Zero Trend | {} |\n",
        cfg.backtest.zero_trend.as_str()
    ));
    if let (Some(first), Some(last)) = (result.data_start, result.data_end) {
        md.push_str(&format!("| Data | {first} to {last} |\n"));
    }
    md.push_str(&format!(
        "| Bars | {} ({} trading days) |\n",
        result.bar_count, result.trading_days
    ));
    md.push_str(&format!(
        "| Settlement Events | {} |\n",
        result.candidate_events
    ));
    md.push_str(&format!(
        "| Event Rate | {} |\n",
        result
            .event_rate
            .map_or_else(|| "N/A".to_string(), fmt_rate)
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data Source | **SYNTHETIC** |\n");
    }
    md.push('\n');

    // Performance
    let s = &result.summary;
    md.push_str("## Performance Summary (績效摘要)\n\n");
    if s.is_empty() {
        md.push_str("No trades were generated.\n\n");
    } else {
        push_performance(&mut md, s);
        push_risk(&mut md, s);
    }

    // Single-factor filters
    md.push_str("## Filter Analysis (篩選分析)\n\n");
    for dim in FilterDimension::ALL {
        let Some(cats) = result.filters.single(dim) else {
            continue;
        };
        md.push_str(&format!("### {}\n\n", dim.title()));
        push_bucket_table(
            &mut md,
            "Category",
            dim.categories()
                .iter()
                .filter_map(|c| cats.get(*c).map(|s| (category_label(c).to_string(), s))),
        );
    }

    // Best multi-factor cells
    let min_trades = cfg.output.min_cell_trades;
    let top: Vec<_> = result
        .filters
        .ranked(min_trades)
        .into_iter()
        .take(cfg.output.top_cells)
        .collect();
    md.push_str(&format!(
        "### Best Combinations (min {min_trades} trades)\n\n"
    ));
    if top.is_empty() {
        md.push_str("No combination reaches the minimum trade count.\n\n");
    } else {
        md.push_str("| Filter | Category | Trades | Win Rate | Net Profit | P/L Ratio |\n");
        md.push_str("| --- | --- | ---: | ---: | ---: | ---: |\n");
        for cell in &top {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                cell.filter,
                cell.category,
                cell.summary.total_trades,
                fmt_rate(cell.summary.win_rate),
                fmt_pct(cell.summary.net_profit),
                fmt_opt(cell.summary.pl_ratio, 3),
            ));
        }
        md.push('\n');
    }

    // Seasonal
    if !result.seasonal.by_year.is_empty() {
        md.push_str("## Seasonal Breakdown (季節性分析)\n\n");
        md.push_str("### By Month\n\n");
        push_bucket_table(
            &mut md,
            "Month",
            labelled(&result.seasonal.by_month, |m| {
                MONTH_NAMES
                    .get((*m as usize).wrapping_sub(1))
                    .map_or_else(|| m.to_string(), |name| name.to_string())
            }),
        );
        md.push_str("### By Quarter\n\n");
        push_bucket_table(
            &mut md,
            "Quarter",
            labelled(&result.seasonal.by_quarter, |q| format!("Q{q}")),
        );
        md.push_str("### By Year\n\n");
        push_bucket_table(
            &mut md,
            "Year",
            labelled(&result.seasonal.by_year, |y| y.to_string()),
        );
    }

    // Volatility
    let v = &result.volatility;
    md.push_str("## Volatility (波動度)\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Settlement-Day Volatility | {} ({} days) |\n",
        fmt_pct_opt(v.settlement_day_volatility),
        v.settlement_days
    ));
    md.push_str(&format!(
        "| Normal-Day Volatility | {} ({} days) |\n",
        fmt_pct_opt(v.normal_day_volatility),
        v.normal_days
    ));
    md.push_str(&format!("| Ratio | {} |\n", fmt_opt(v.ratio, 3)));
    md.push('\n');

    // Weekday benchmark
    if let Some(bench) = &result.benchmark {
        md.push_str("## Weekday Benchmark (星期比較)\n\n");
        md.push_str("| Day | Candidates | Trades | Event Rate | Win Rate | Net Profit | Max Drawdown |\n");
        md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: |\n");
        for w in std::iter::once(&bench.settlement).chain(&bench.weekdays) {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                w.label,
                w.candidates,
                w.summary.total_trades,
                w.event_rate.map_or_else(|| "N/A".to_string(), fmt_rate),
                fmt_rate(w.summary.win_rate),
                fmt_pct(w.summary.net_profit),
                fmt_pct(w.summary.max_drawdown),
            ));
        }
        md.push('\n');
        let better: Vec<&str> = bench.outperformers().map(|w| w.label.as_str()).collect();
        if better.is_empty() {
            md.push_str("No weekday beats the settlement-day win rate.\n\n");
        } else {
            md.push_str(&format!(
                "Weekdays with a higher win rate: {}\n\n",
                better.join(", ")
            ));
        }
    }

    // Skipped events
    if !result.skipped.is_empty() {
        let mut by_reason: BTreeMap<&str, usize> = BTreeMap::new();
        for skip in &result.skipped {
            *by_reason.entry(skip.reason.as_str()).or_default() += 1;
        }
        md.push_str("## Skipped Events\n\n");
        for (reason, count) in by_reason {
            md.push_str(&format!("- {reason}: {count}\n"));
        }
        md.push('\n');
    }

    // Data Quality
    if !result.data_quality_warnings.is_empty() {
        md.push_str("## Data Quality\n\n");
        for warn in &result.data_quality_warnings {
            md.push_str(&format!("- {warn}\n"));
        }
        md.push('\n');
    }

    md
}

fn push_performance(md: &mut String, s: &PerformanceSummary) {
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Total Trades (總交易次數) | {} |\n", s.total_trades));
    md.push_str(&format!(
        "| Wins / Losses / Breakeven | {} / {} / {} |\n",
        s.win_count, s.loss_count, s.breakeven_count
    ));
    md.push_str(&format!("| Win Rate (勝率) | {} |\n", fmt_rate(s.win_rate)));
    md.push_str(&format!("| Net Profit (淨利) | {} |\n", fmt_pct(s.net_profit)));
    md.push_str(&format!(
        "| Total Profit (總獲利) | {} |\n",
        fmt_pct(s.total_profit)
    ));
    md.push_str(&format!("| Total Loss (總虧損) | {} |\n", fmt_pct(s.total_loss)));
    md.push_str(&format!("| Average Trade | {} |\n", fmt_pct(s.avg_trade)));
    md.push_str(&format!("| Average Win | {} |\n", fmt_pct(s.avg_win)));
    md.push_str(&format!("| Average Loss | {} |\n", fmt_pct(s.avg_loss)));
    md.push_str(&format!("| Best Trade | {} |\n", fmt_pct(s.max_profit)));
    md.push_str(&format!("| Worst Trade | {} |\n", fmt_pct(s.max_loss)));
    md.push_str(&format!(
        "| P/L Ratio (盈虧比) | {} |\n",
        fmt_opt(s.pl_ratio, 3)
    ));
    md.push_str(&format!("| Kelly (凱利) | {} |\n", fmt_pct_opt(s.kelly_pct)));
    md.push_str(&format!(
        "| Max Drawdown (最大回撤) | {} |\n",
        fmt_pct(s.max_drawdown)
    ));
    md.push_str(&format!(
        "| Max Consecutive Wins | {} |\n",
        s.max_consecutive_wins
    ));
    md.push_str(&format!(
        "| Max Consecutive Losses | {} |\n",
        s.max_consecutive_losses
    ));
    md.push('\n');
}

fn push_risk(md: &mut String, s: &PerformanceSummary) {
    md.push_str("### Risk Metrics (風險指標)\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Years Spanned | {:.2} |\n", s.spanned_years));
    md.push_str(&format!(
        "| Annualized Return | {} |\n",
        fmt_pct_opt(s.annualized_return)
    ));
    md.push_str(&format!(
        "| Annualized Volatility | {} |\n",
        fmt_pct_opt(s.annualized_volatility)
    ));
    md.push_str(&format!("| Sharpe | {} |\n", fmt_opt(s.sharpe, 3)));
    md.push_str(&format!(
        "| Downside Deviation | {} |\n",
        fmt_pct_opt(s.downside_deviation)
    ));
    md.push_str(&format!("| Sortino | {} |\n", fmt_opt(s.sortino, 3)));
    md.push_str(&format!("| Calmar | {} |\n", fmt_opt(s.calmar, 3)));
    md.push_str(&format!("| VaR 95% | {} |\n", fmt_pct_opt(s.var_95)));
    md.push_str(&format!("| CVaR 95% | {} |\n", fmt_pct_opt(s.cvar_95)));
    md.push('\n');
}

fn labelled<'a, K>(
    buckets: &'a BTreeMap<K, PerformanceSummary>,
    label: impl Fn(&K) -> String + 'a,
) -> impl Iterator<Item = (String, &'a PerformanceSummary)> + 'a {
    buckets.iter().map(move |(k, s)| (label(k), s))
}

fn push_bucket_table<'a>(
    md: &mut String,
    heading: &str,
    rows: impl Iterator<Item = (String, &'a PerformanceSummary)>,
) {
    md.push_str(&format!(
        "| {heading} | Trades | Win Rate | Net Profit | Avg Trade | P/L Ratio | Max Drawdown |\n"
    ));
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for (label, s) in rows {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            label,
            s.total_trades,
            fmt_rate(s.win_rate),
            fmt_pct(s.net_profit),
            fmt_pct(s.avg_trade),
            fmt_opt(s.pl_ratio, 3),
            fmt_pct(s.max_drawdown),
        ));
    }
    md.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BacktestConfig;
    use crate::data_loader::LoadedData;
    use crate::runner::run_backtest_from_data;
    use chrono::NaiveDate;
    use settlelab_core::data::generate_synthetic_bars;
    use settlelab_core::PriceTable;

    fn sample_result(benchmark: bool) -> BacktestResult {
        let mut config = BacktestConfig::default();
        config.backtest.start_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        config.backtest.end_date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        config.output.benchmark = benchmark;
        config.output.min_cell_trades = 1;

        let bars = generate_synthetic_bars(
            "TX",
            NaiveDate::from_ymd_opt(2022, 12, 1).unwrap(),
            config.backtest.end_date,
        );
        let table = PriceTable::from_bars(bars);
        let loaded = LoadedData {
            dataset_hash: table.dataset_hash(),
            table,
            calendar: None,
            has_synthetic: true,
            data_quality_warnings: vec!["synthetic".into()],
        };
        run_backtest_from_data(&config, &loaded).unwrap()
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(fmt_opt(None, 3), "N/A");
        assert_eq!(fmt_opt(Some(1.23456), 3), "1.235");
        assert_eq!(fmt_pct(-0.5), "-0.50%");
        assert_eq!(fmt_rate(0.5), "50.00%");
        assert_eq!(fmt_pct_opt(None), "N/A");
    }

    #[test]
    fn report_has_sections() {
        let md = generate_report(&sample_result(false));
        assert!(md.contains("# Settlement-Day Backtest Report"));
        assert!(md.contains("SYNTHETIC"));
        assert!(md.contains("## Run"));
        assert!(md.contains("| Counting Period | weekly |"));
        assert!(md.contains("Net Profit (淨利)"));
        assert!(md.contains("### Risk Metrics"));
        assert!(md.contains("### Trend Direction (趨勢方向)"));
        assert!(md.contains("Up (往上)"));
        assert!(md.contains("### Best Combinations"));
        assert!(md.contains("### By Quarter"));
        assert!(md.contains("## Volatility"));
        assert!(md.contains("## Data Quality"));
        assert!(!md.contains("## Weekday Benchmark"));
    }

    #[test]
    fn report_includes_benchmark_when_present() {
        let md = generate_report(&sample_result(true));
        assert!(md.contains("## Weekday Benchmark"));
        assert!(md.contains("| Settlement day |"));
        assert!(md.contains("| Friday |"));
    }

    #[test]
    fn empty_run_says_no_trades() {
        let mut result = sample_result(false);
        result.trades.clear();
        result.summary = PerformanceSummary::empty();
        let md = generate_report(&result);
        assert!(md.contains("No trades were generated."));
        assert!(!md.contains("### Risk Metrics"));
    }
}

//! Performance statistics: pure functions over settlement-day trades.
//!
//! All pnl values are percentages (`0.75` = 0.75%), so net profit and
//! drawdown are in percentage points. Ratios that would divide by zero are
//! `None` and render as `N/A`; NaN and infinity never leave this module.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use settlelab_core::TradeRecord;

use crate::tail_metrics::{cvar_95, var_95};

const DAYS_PER_YEAR: f64 = 365.25;

/// Aggregate statistics for a set of trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub breakeven_count: usize,
    /// Fraction of winners, `0.0..=1.0`.
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_trade: f64,
    pub pl_ratio: Option<f64>,
    pub net_profit: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    /// Kelly fraction in percent.
    pub kelly_pct: Option<f64>,
    /// Worst peak-to-trough of the cumulative pnl curve; always `<= 0`.
    pub max_drawdown: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub spanned_years: f64,
    pub annualized_return: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub sharpe: Option<f64>,
    pub downside_deviation: Option<f64>,
    pub sortino: Option<f64>,
    pub calmar: Option<f64>,
    pub var_95: Option<f64>,
    pub cvar_95: Option<f64>,
}

impl PerformanceSummary {
    /// Summary of zero trades.
    pub fn empty() -> Self {
        Self {
            total_trades: 0,
            win_count: 0,
            loss_count: 0,
            breakeven_count: 0,
            win_rate: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            avg_trade: 0.0,
            pl_ratio: None,
            net_profit: 0.0,
            total_profit: 0.0,
            total_loss: 0.0,
            max_profit: 0.0,
            max_loss: 0.0,
            kelly_pct: None,
            max_drawdown: 0.0,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
            spanned_years: 0.0,
            annualized_return: None,
            annualized_volatility: None,
            sharpe: None,
            downside_deviation: None,
            sortino: None,
            calmar: None,
            var_95: None,
            cvar_95: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_trades == 0
    }
}

/// Compute every statistic for `trades`, which must be in chronological order.
pub fn compute_stats(trades: &[TradeRecord]) -> PerformanceSummary {
    if trades.is_empty() {
        return PerformanceSummary::empty();
    }

    let pnl: Vec<f64> = trades.iter().map(|t| t.pnl_pct).collect();
    let wins: Vec<f64> = pnl.iter().copied().filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = pnl.iter().copied().filter(|p| *p < 0.0).collect();

    let total_trades = pnl.len();
    let win_rate = wins.len() as f64 / total_trades as f64;
    let avg_win = mean_f64(&wins);
    let avg_loss = mean_f64(&losses);
    let total_profit: f64 = wins.iter().sum();
    let total_loss: f64 = losses.iter().sum();
    let net_profit: f64 = pnl.iter().sum();
    let pl_ratio = pl_ratio(avg_win, avg_loss, wins.len(), losses.len());

    let years = spanned_years(trades);
    let per_year = (years > 0.0).then(|| total_trades as f64 / years);
    let annualized_return = (years > 0.0).then(|| net_profit / years);
    let annualized_volatility = annualized_std(&pnl, per_year);
    let downside_deviation = annualized_std(&losses, per_year);
    let max_dd = max_drawdown(&pnl);

    PerformanceSummary {
        total_trades,
        win_count: wins.len(),
        loss_count: losses.len(),
        breakeven_count: total_trades - wins.len() - losses.len(),
        win_rate,
        avg_win,
        avg_loss,
        avg_trade: net_profit / total_trades as f64,
        pl_ratio,
        net_profit,
        total_profit,
        total_loss,
        max_profit: pnl.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        max_loss: pnl.iter().copied().fold(f64::INFINITY, f64::min),
        kelly_pct: kelly_pct(win_rate, pl_ratio),
        max_drawdown: max_dd,
        max_consecutive_wins: max_consecutive(&pnl, |p| p > 0.0),
        max_consecutive_losses: max_consecutive(&pnl, |p| p < 0.0),
        spanned_years: years,
        annualized_return,
        annualized_volatility,
        sharpe: ratio(annualized_return, annualized_volatility),
        downside_deviation,
        sortino: ratio(annualized_return, downside_deviation),
        calmar: ratio(annualized_return, (max_dd < 0.0).then(|| max_dd.abs())),
        var_95: var_95(&pnl),
        cvar_95: cvar_95(&pnl),
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// avg_win / |avg_loss|; undefined unless there are both winners and losers.
pub fn pl_ratio(avg_win: f64, avg_loss: f64, win_count: usize, loss_count: usize) -> Option<f64> {
    if win_count == 0 || loss_count == 0 || avg_loss == 0.0 {
        return None;
    }
    Some(avg_win / avg_loss.abs())
}

/// Kelly fraction `(p − q / b) × 100` with `b` the P/L ratio.
pub fn kelly_pct(win_rate: f64, pl_ratio: Option<f64>) -> Option<f64> {
    let b = pl_ratio?;
    Some((win_rate - (1.0 - win_rate) / b) * 100.0)
}

/// Maximum drawdown of the cumulative pnl curve.
///
/// `min_t(equity[t] − max(equity[0..=t]))`; the running peak starts at the
/// first equity point, so a losing first trade is not a drawdown.
pub fn max_drawdown(pnl: &[f64]) -> f64 {
    let mut equity = 0.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for p in pnl {
        equity += p;
        peak = peak.max(equity);
        max_dd = max_dd.min(equity - peak);
    }
    max_dd
}

/// Calendar years between the first and last settlement date.
pub fn spanned_years(trades: &[TradeRecord]) -> f64 {
    let dates = trades.iter().map(|t| t.settlement_date);
    let (Some(first), Some(last)) = (dates.clone().min(), dates.max()) else {
        return 0.0;
    };
    years_between(first, last)
}

pub fn years_between(first: NaiveDate, last: NaiveDate) -> f64 {
    (last - first).num_days() as f64 / DAYS_PER_YEAR
}

fn annualized_std(values: &[f64], per_year: Option<f64>) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    per_year.map(|n| std_dev(values) * n.sqrt())
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d.abs() < 1e-15 {
        return None;
    }
    Some(n / d)
}

fn max_consecutive(pnl: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for &p in pnl {
        if pred(p) {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

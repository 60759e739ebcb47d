//! Property tests for the statistics engine and the filter analyzer.
//!
//! Uses proptest to verify:
//! 1. wins + losses + breakevens == total trades
//! 2. net profit == total profit + total loss
//! 3. max drawdown is never positive and never below the sum of losses
//! 4. Single-factor buckets partition the trades
//! 5. Every undefined ratio is `None`, never NaN or infinite; P/L ratio and
//!    Kelly need both winners and losers
//! 6. The analysis is deterministic

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use settlelab_core::{
    CandleColor, Direction, OpeningGap, SettlementKind, TradeRecord,
};
use settlelab_runner::{analyze_filters, compute_stats, FilterDimension};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Weekly trades with random pnl (including exact zeros) and random tags.
fn arb_trades() -> impl Strategy<Value = Vec<TradeRecord>> {
    prop::collection::vec(
        (
            prop_oneof![Just(0.0_f64), -3.0..3.0_f64],
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
        ),
        0..80,
    )
    .prop_map(|rows| {
        let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (pnl, up, red, high, monthly))| {
                let date = first + Duration::weeks(i as i64);
                let trend = if up { 50.0 } else { -50.0 };
                TradeRecord {
                    settlement_date: date,
                    settlement_kind: if monthly {
                        SettlementKind::Monthly
                    } else {
                        SettlementKind::Weekly
                    },
                    opening_date: date - Duration::days(6),
                    prev_date: date - Duration::days(1),
                    opening_price: 17_000.0,
                    prev_close: 17_000.0 + trend,
                    trend_value: trend,
                    direction: if up { Direction::Long } else { Direction::Short },
                    entry_price: 17_000.0,
                    exit_price: 17_000.0,
                    pnl_pct: pnl,
                    candle_color: if red { CandleColor::Red } else { CandleColor::Black },
                    opening_gap: if high { OpeningGap::High } else { OpeningGap::Low },
                    body_ratio: 0.5,
                }
            })
            .collect()
    })
}

/// Weekly long trades with the given pnl values.
fn trades_with_pnl(pnls: &[f64]) -> Vec<TradeRecord> {
    let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    pnls.iter()
        .enumerate()
        .map(|(i, &pnl)| {
            let date = first + Duration::weeks(i as i64);
            TradeRecord {
                settlement_date: date,
                settlement_kind: SettlementKind::Weekly,
                opening_date: date - Duration::days(6),
                prev_date: date - Duration::days(1),
                opening_price: 17_000.0,
                prev_close: 17_050.0,
                trend_value: 50.0,
                direction: Direction::Long,
                entry_price: 17_000.0,
                exit_price: 17_000.0,
                pnl_pct: pnl,
                candle_color: CandleColor::Red,
                opening_gap: OpeningGap::High,
                body_ratio: 0.5,
            }
        })
        .collect()
}

fn finite_or_none(value: Option<f64>) -> bool {
    value.map_or(true, f64::is_finite)
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn counts_partition_the_trades(trades in arb_trades()) {
        let s = compute_stats(&trades);
        prop_assert_eq!(s.total_trades, trades.len());
        prop_assert_eq!(s.win_count + s.loss_count + s.breakeven_count, s.total_trades);
        prop_assert!((0.0..=1.0).contains(&s.win_rate));
    }

    #[test]
    fn net_profit_splits_into_profit_and_loss(trades in arb_trades()) {
        let s = compute_stats(&trades);
        prop_assert!((s.net_profit - (s.total_profit + s.total_loss)).abs() < 1e-9);
        prop_assert!(s.total_profit >= 0.0);
        prop_assert!(s.total_loss <= 0.0);
    }

    #[test]
    fn drawdown_is_bounded(trades in arb_trades()) {
        let s = compute_stats(&trades);
        prop_assert!(s.max_drawdown <= 0.0);
        prop_assert!(s.max_drawdown >= s.total_loss - 1e-9);
    }

    #[test]
    fn ratios_are_finite_or_undefined(trades in arb_trades()) {
        let s = compute_stats(&trades);
        for value in [
            s.pl_ratio,
            s.kelly_pct,
            s.annualized_return,
            s.annualized_volatility,
            s.sharpe,
            s.downside_deviation,
            s.sortino,
            s.calmar,
            s.var_95,
            s.cvar_95,
        ] {
            prop_assert!(finite_or_none(value));
        }
        if s.win_count == 0 || s.loss_count == 0 {
            prop_assert!(s.pl_ratio.is_none());
            prop_assert!(s.kelly_pct.is_none());
        } else {
            prop_assert!(s.pl_ratio.is_some_and(|b| b > 0.0));
        }
    }

    #[test]
    fn all_losing_tapes_have_no_pl_ratio(
        losses in prop::collection::vec(-3.0..-0.01_f64, 1..40),
    ) {
        let trades: Vec<TradeRecord> = trades_with_pnl(&losses);
        let s = compute_stats(&trades);
        prop_assert_eq!(s.win_count, 0);
        prop_assert!(s.pl_ratio.is_none());
        prop_assert!(s.kelly_pct.is_none());
    }

    #[test]
    fn single_factor_buckets_sum_to_total(trades in arb_trades()) {
        let analysis = analyze_filters(&trades);
        for dim in FilterDimension::ALL {
            let cats = analysis.single(dim).unwrap();
            let total: usize = cats.values().map(|c| c.total_trades).sum();
            prop_assert_eq!(total, trades.len());
        }
    }

    #[test]
    fn analysis_is_deterministic(trades in arb_trades()) {
        prop_assert_eq!(analyze_filters(&trades), analyze_filters(&trades));
        prop_assert_eq!(compute_stats(&trades), compute_stats(&trades));
    }
}

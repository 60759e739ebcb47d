//! Property tests for calendar and simulator invariants.
//!
//! Uses proptest to verify:
//! 1. Derived settlements are always trading-day Wednesdays, in order
//! 2. Monthly settlements are exactly the third Wednesdays
//! 3. Trade direction agrees with the sign of the trend
//! 4. pnl sign agrees with direction and the open/close move
//! 5. Skipped + traded events account for every input event

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use settlelab_core::calendar::is_third_wednesday;
use settlelab_core::{
    resolve_settlement_events, Direction, PriceBar, PriceTable, Session, SettlementKind,
    SimulationConfig, Simulator,
};

// ── Strategies (proptest) ────────────────────────────────────────────

/// A run of daily closes with random holidays knocked out.
fn arb_table() -> impl Strategy<Value = PriceTable> {
    (
        prop::collection::vec((-150.0..150.0_f64, -80.0..80.0_f64, any::<bool>()), 20..120),
        0..365i64,
    )
        .prop_map(|(steps, offset)| {
            let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + Duration::days(offset);
            let mut price = 17_000.0_f64;
            let mut bars = Vec::new();
            for (i, (drift, intraday, open_market)) in steps.into_iter().enumerate() {
                let date = start + Duration::days(i as i64);
                price = (price + drift).max(1_000.0);
                if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || !open_market {
                    continue;
                }
                let open = price.round();
                let close = (price + intraday).max(1_000.0).round();
                bars.push(PriceBar {
                    date,
                    session: Session::Regular,
                    open,
                    high: open.max(close) + 10.0,
                    low: open.min(close) - 10.0,
                    close,
                    volume: 1_000,
                });
                bars.push(PriceBar {
                    date,
                    session: Session::AfterHours,
                    open: open - 5.0,
                    high: open + 5.0,
                    low: open - 15.0,
                    close: open - 2.0,
                    volume: 100,
                });
            }
            PriceTable::from_bars(bars)
        })
}

proptest! {
    #[test]
    fn derived_events_are_ordered_trading_wednesdays(table in arb_table()) {
        let events = resolve_settlement_events(&table, None);
        for pair in events.windows(2) {
            prop_assert!(pair[0].settlement_date < pair[1].settlement_date);
        }
        for event in &events {
            prop_assert_eq!(event.settlement_date.weekday(), Weekday::Wed);
            prop_assert!(table.is_trading_day(event.settlement_date));
            let monthly = event.kind == SettlementKind::Monthly;
            prop_assert_eq!(monthly, is_third_wednesday(event.settlement_date));
        }
    }

    #[test]
    fn direction_follows_trend_and_pnl_follows_direction(table in arb_table()) {
        let events = resolve_settlement_events(&table, None);
        let sim = Simulator::new(&table, SimulationConfig::default()).run(&events);

        prop_assert_eq!(sim.candidates(), events.len());
        for t in &sim.trades {
            match t.direction {
                Direction::Long => prop_assert!(t.trend_value > 0.0),
                Direction::Short => prop_assert!(t.trend_value < 0.0),
            }
            let move_up = t.exit_price > t.entry_price;
            let move_down = t.exit_price < t.entry_price;
            match t.direction {
                Direction::Long => {
                    prop_assert_eq!(t.pnl_pct > 0.0, move_up);
                    prop_assert_eq!(t.pnl_pct < 0.0, move_down);
                }
                Direction::Short => {
                    prop_assert_eq!(t.pnl_pct > 0.0, move_down);
                    prop_assert_eq!(t.pnl_pct < 0.0, move_up);
                }
            }
            prop_assert!(t.opening_date <= t.settlement_date);
            prop_assert!(t.prev_date < t.settlement_date);
            prop_assert!(t.opening_date <= t.prev_date);
            prop_assert!((0.0..=1.0).contains(&t.body_ratio));
        }
    }
}

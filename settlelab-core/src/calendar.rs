//! Settlement calendar: which dates the simulator trades.
//!
//! Two sources, in priority order:
//! 1. An explicit calendar (contract codes classify weekly vs monthly).
//! 2. Derivation from price data: every Wednesday that traded is a weekly
//!    settlement, the third Wednesday of a month is the monthly one.
//!
//! Either way a settlement date must be a trading day in the price table;
//! anything else (holidays, gaps in the data) is dropped without error.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::PriceTable;
use crate::domain::names::{normalize, unknown};
use crate::domain::{CalendarEntry, ParseNameError, SettlementEvent, SettlementKind};

/// Which settlements a run counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingPeriod {
    /// Every settlement, weekly and monthly.
    #[default]
    Weekly,
    /// Monthly settlements only.
    Monthly,
}

impl CountingPeriod {
    pub fn admits(self, kind: SettlementKind) -> bool {
        match self {
            CountingPeriod::Weekly => true,
            CountingPeriod::Monthly => kind == SettlementKind::Monthly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CountingPeriod::Weekly => "weekly",
            CountingPeriod::Monthly => "monthly",
        }
    }
}

impl FromStr for CountingPeriod {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "weekly" => Ok(CountingPeriod::Weekly),
            "monthly" => Ok(CountingPeriod::Monthly),
            _ => Err(unknown("counting period", s, "weekly, monthly")),
        }
    }
}

/// Classify a TXO contract code.
///
/// `YYYYMM` is a monthly contract, `YYYYMMWn` a weekly one. Anything else is
/// treated as weekly rather than rejected.
pub fn classify_contract_code(code: &str) -> SettlementKind {
    let code = code.trim();
    let bytes = code.as_bytes();
    let year_month = bytes.len() >= 6 && bytes[..6].iter().all(u8::is_ascii_digit);
    if year_month && bytes.len() == 6 {
        SettlementKind::Monthly
    } else {
        SettlementKind::Weekly
    }
}

/// Third Wednesday of the month: a Wednesday falling on day 15–21.
pub fn is_third_wednesday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Wed && (15..=21).contains(&date.day())
}

/// Resolve the ordered settlement events for a run.
///
/// A non-empty `explicit` calendar is authoritative; otherwise events are
/// derived from the trading days in `table`. When an explicit calendar lists
/// the same date twice, one event is emitted and monthly wins.
pub fn resolve_settlement_events(
    table: &PriceTable,
    explicit: Option<&[CalendarEntry]>,
) -> Vec<SettlementEvent> {
    match explicit {
        Some(entries) if !entries.is_empty() => from_calendar(table, entries),
        _ => derive_from_prices(table),
    }
}

fn from_calendar(table: &PriceTable, entries: &[CalendarEntry]) -> Vec<SettlementEvent> {
    let mut by_date: BTreeMap<NaiveDate, SettlementEvent> = BTreeMap::new();
    let mut not_trading = 0usize;

    for entry in entries {
        if !table.is_trading_day(entry.settlement_date) {
            not_trading += 1;
            continue;
        }
        let kind = classify_contract_code(&entry.contract_code);
        let event = SettlementEvent {
            settlement_date: entry.settlement_date,
            contract_code: Some(entry.contract_code.clone()),
            kind,
        };
        match by_date.get(&entry.settlement_date) {
            Some(existing) if existing.kind >= kind => {}
            _ => {
                by_date.insert(entry.settlement_date, event);
            }
        }
    }

    if not_trading > 0 {
        debug!(skipped = not_trading, "calendar entries on non-trading days");
    }
    by_date.into_values().collect()
}

fn derive_from_prices(table: &PriceTable) -> Vec<SettlementEvent> {
    table
        .trading_days()
        .filter(|date| date.weekday() == Weekday::Wed)
        .map(|date| SettlementEvent {
            settlement_date: date,
            contract_code: None,
            kind: if is_third_wednesday(date) {
                SettlementKind::Monthly
            } else {
                SettlementKind::Weekly
            },
        })
        .collect()
}

//! Signal & trade simulator.
//!
//! For every settlement date `D` the trend since the previous settlement is
//! measured as `prev_close − opening_price`, and one intraday trade in that
//! direction is taken from `D`'s regular open to `D`'s regular close.
//!
//! Events that cannot be priced are skipped with a [`SkipReason`]; the run
//! never fails because of missing bars.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::PriceTable;
use crate::domain::names::{normalize, unknown};
use crate::domain::{
    Direction, OpeningGap, ParseNameError, SettlementEvent, SettlementKind, TradeRecord,
};

/// Where the opening price of the counting window comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningPriceMode {
    /// Regular-session open of the opening day.
    #[default]
    Standard,
    /// After-hours open of the session filed under the opening day.
    Night,
}

impl OpeningPriceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OpeningPriceMode::Standard => "standard",
            OpeningPriceMode::Night => "night",
        }
    }
}

impl FromStr for OpeningPriceMode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "standard" => Ok(OpeningPriceMode::Standard),
            "night" => Ok(OpeningPriceMode::Night),
            _ => Err(unknown("opening price mode", s, "standard, night")),
        }
    }
}

/// Where the previous close (end of the counting window) comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrevCloseMode {
    /// Regular-session close of the last trading day before `D`.
    #[default]
    Standard,
    /// After-hours close of the session filed under `D`.
    Night,
    /// Regular-session open of `D` itself.
    SettlementOpen,
}

impl PrevCloseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PrevCloseMode::Standard => "standard",
            PrevCloseMode::Night => "night",
            PrevCloseMode::SettlementOpen => "settlement_open",
        }
    }
}

impl FromStr for PrevCloseMode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "standard" => Ok(PrevCloseMode::Standard),
            "night" => Ok(PrevCloseMode::Night),
            "settlement_open" => Ok(PrevCloseMode::SettlementOpen),
            _ => Err(unknown(
                "previous close mode",
                s,
                "standard, night, settlement_open",
            )),
        }
    }
}

/// What to do when `prev_close == opening_price`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroTrendPolicy {
    #[default]
    Skip,
    Long,
    Short,
}

impl ZeroTrendPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ZeroTrendPolicy::Skip => "skip",
            ZeroTrendPolicy::Long => "long",
            ZeroTrendPolicy::Short => "short",
        }
    }
}

impl FromStr for ZeroTrendPolicy {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "skip" => Ok(ZeroTrendPolicy::Skip),
            "long" => Ok(ZeroTrendPolicy::Long),
            "short" => Ok(ZeroTrendPolicy::Short),
            _ => Err(unknown("zero-trend policy", s, "skip, long, short")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub opening_price: OpeningPriceMode,
    #[serde(default)]
    pub prev_close: PrevCloseMode,
    #[serde(default)]
    pub zero_trend: ZeroTrendPolicy,
}

/// Why an event produced no trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoOpeningDay,
    MissingOpeningPrice,
    NoPriorTradingDay,
    /// No trading day between the previous settlement and this one.
    EmptyWindow,
    MissingPrevClose,
    MissingSettlementBar,
    InvalidEntryPrice,
    ZeroTrend,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoOpeningDay => "no opening day",
            SkipReason::MissingOpeningPrice => "missing opening price",
            SkipReason::NoPriorTradingDay => "no prior trading day",
            SkipReason::EmptyWindow => "empty counting window",
            SkipReason::MissingPrevClose => "missing previous close",
            SkipReason::MissingSettlementBar => "missing settlement-day bar",
            SkipReason::InvalidEntryPrice => "invalid entry price",
            SkipReason::ZeroTrend => "zero trend",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEvent {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Trades plus the events that could not be traded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedEvent>,
}

impl Simulation {
    /// Number of candidate events (traded + skipped).
    pub fn candidates(&self) -> usize {
        self.trades.len() + self.skipped.len()
    }
}

/// Runs the settlement-day strategy over a price table.
#[derive(Debug, Clone)]
pub struct Simulator<'a> {
    table: &'a PriceTable,
    config: SimulationConfig,
    anchor: Option<NaiveDate>,
}

impl<'a> Simulator<'a> {
    pub fn new(table: &'a PriceTable, config: SimulationConfig) -> Self {
        Self {
            table,
            config,
            anchor: None,
        }
    }

    /// Settlement date preceding the first event. Without one, the first
    /// event's window opens on the first trading day of the table.
    pub fn with_anchor(mut self, anchor: Option<NaiveDate>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn config(&self) -> SimulationConfig {
        self.config
    }

    /// Simulate chronologically ordered settlement events.
    pub fn run(&self, events: &[SettlementEvent]) -> Simulation {
        let mut sim = Simulation::default();
        let mut previous = self.anchor;

        for event in events {
            let date = event.settlement_date;
            let opening = match previous {
                Some(prev) => self.table.first_trading_day_after(prev),
                None => self.table.first_trading_day(),
            }
            .filter(|o| *o <= date);

            let outcome = match opening {
                Some(opening_date) => self.evaluate(date, event.kind, opening_date),
                None => Err(SkipReason::NoOpeningDay),
            };
            record(&mut sim, date, outcome);
            previous = Some(date);
        }
        sim
    }

    /// Apply the same strategy to every non-settlement `weekday` in the
    /// table. The window opens on the first trading day on or after
    /// `target − lookback_days`.
    pub fn run_fixed_weekday(
        &self,
        weekday: Weekday,
        exclude: &BTreeSet<NaiveDate>,
        lookback_days: i64,
    ) -> Simulation {
        let mut sim = Simulation::default();
        let targets: Vec<NaiveDate> = self
            .table
            .trading_days()
            .filter(|d| d.weekday() == weekday && !exclude.contains(d))
            .collect();

        for date in targets {
            let opening = self
                .table
                .first_trading_day_on_or_after(date - Duration::days(lookback_days))
                .filter(|o| *o < date);
            let outcome = match opening {
                Some(opening_date) => self.evaluate(date, SettlementKind::Weekly, opening_date),
                None => Err(SkipReason::NoOpeningDay),
            };
            record(&mut sim, date, outcome);
        }
        sim
    }

    /// Price a single target date given its window opening day.
    pub fn evaluate(
        &self,
        date: NaiveDate,
        kind: SettlementKind,
        opening_date: NaiveDate,
    ) -> Result<TradeRecord, SkipReason> {
        let day = self
            .table
            .regular(date)
            .ok_or(SkipReason::MissingSettlementBar)?;

        let opening_price = match self.config.opening_price {
            OpeningPriceMode::Standard => self.table.regular(opening_date),
            OpeningPriceMode::Night => self.table.after_hours(opening_date),
        }
        .map(|bar| bar.open)
        .ok_or(SkipReason::MissingOpeningPrice)?;

        let prev_date = self
            .table
            .prev_trading_day(date)
            .ok_or(SkipReason::NoPriorTradingDay)?;
        if prev_date < opening_date {
            return Err(SkipReason::EmptyWindow);
        }
        let prev = self
            .table
            .regular(prev_date)
            .ok_or(SkipReason::NoPriorTradingDay)?;

        let prev_close = match self.config.prev_close {
            PrevCloseMode::Standard => Some(prev.close),
            PrevCloseMode::Night => self.table.after_hours(date).map(|bar| bar.close),
            PrevCloseMode::SettlementOpen => Some(day.open),
        }
        .ok_or(SkipReason::MissingPrevClose)?;

        let trend_value = prev_close - opening_price;
        let direction = direction_for(trend_value, self.config.zero_trend)
            .ok_or(SkipReason::ZeroTrend)?;

        let (entry_price, exit_price) = (day.open, day.close);
        if entry_price <= 0.0 || !entry_price.is_finite() {
            return Err(SkipReason::InvalidEntryPrice);
        }

        Ok(TradeRecord {
            settlement_date: date,
            settlement_kind: kind,
            opening_date,
            prev_date,
            opening_price,
            prev_close,
            trend_value,
            direction,
            entry_price,
            exit_price,
            pnl_pct: direction.pnl_pct(entry_price, exit_price),
            candle_color: prev.candle_color(),
            opening_gap: if day.open > prev.close {
                OpeningGap::High
            } else {
                OpeningGap::Low
            },
            body_ratio: prev.body_ratio(),
        })
    }
}

fn direction_for(trend_value: f64, policy: ZeroTrendPolicy) -> Option<Direction> {
    if trend_value > 0.0 {
        Some(Direction::Long)
    } else if trend_value < 0.0 {
        Some(Direction::Short)
    } else {
        match policy {
            ZeroTrendPolicy::Skip => None,
            ZeroTrendPolicy::Long => Some(Direction::Long),
            ZeroTrendPolicy::Short => Some(Direction::Short),
        }
    }
}

fn record(sim: &mut Simulation, date: NaiveDate, outcome: Result<TradeRecord, SkipReason>) {
    match outcome {
        Ok(trade) => sim.trades.push(trade),
        Err(reason) => {
            debug!(%date, reason = reason.as_str(), "event skipped");
            sim.skipped.push(SkippedEvent { date, reason });
        }
    }
}

/// Simulate `events` and return only the trades.
pub fn simulate(
    events: &[SettlementEvent],
    table: &PriceTable,
    opening_price: OpeningPriceMode,
    prev_close: PrevCloseMode,
) -> Vec<TradeRecord> {
    let config = SimulationConfig {
        opening_price,
        prev_close,
        ..SimulationConfig::default()
    };
    Simulator::new(table, config).run(events).trades
}

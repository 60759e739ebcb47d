//! TradeRecord: the outcome of one simulated settlement-day trade.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::settlement::SettlementKind;

/// Side of the intraday trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Signed percentage return of an open-to-close trade.
    pub fn pnl_pct(self, entry: f64, exit: f64) -> f64 {
        match self {
            Direction::Long => (exit - entry) / entry * 100.0,
            Direction::Short => (entry - exit) / entry * 100.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

/// Sign of the trend signal: up iff `trend_value > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
        }
    }
}

/// Colour of the prior trading day's regular-session candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleColor {
    Red,
    Black,
}

impl CandleColor {
    pub fn as_str(self) -> &'static str {
        match self {
            CandleColor::Red => "red",
            CandleColor::Black => "black",
        }
    }
}

/// Whether the settlement day opened above the prior regular close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningGap {
    High,
    Low,
}

impl OpeningGap {
    pub fn as_str(self) -> &'static str {
        match self {
            OpeningGap::High => "high",
            OpeningGap::Low => "low",
        }
    }
}

/// A completed settlement-day trade with its classification tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub settlement_date: NaiveDate,
    pub settlement_kind: SettlementKind,
    /// First trading day after the previous settlement.
    pub opening_date: NaiveDate,
    /// Last trading day before the settlement date.
    pub prev_date: NaiveDate,
    pub opening_price: f64,
    pub prev_close: f64,
    /// `prev_close − opening_price`.
    pub trend_value: f64,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Percentage return, e.g. `0.75` = 0.75%.
    pub pnl_pct: f64,
    pub candle_color: CandleColor,
    pub opening_gap: OpeningGap,
    pub body_ratio: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.pnl_pct > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl_pct < 0.0
    }

    pub fn trend_direction(&self) -> TrendDirection {
        if self.trend_value > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        }
    }
}

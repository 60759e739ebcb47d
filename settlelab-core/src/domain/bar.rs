//! PriceBar: one trading session of TX futures OHLCV data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trade::CandleColor;

/// Trading session of a bar.
///
/// TAIFEX files the after-hours (night) session under the *next* trading
/// date, so the after-hours bar recorded under `D` is the session that closes
/// before `D`'s regular open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    Regular,
    AfterHours,
}

impl Session {
    /// Parse a session label. Accepts English names and the TAIFEX
    /// labels `一般` (regular) and `盤後` (after-hours).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "regular" | "day" | "一般" => Some(Session::Regular),
            "after_hours" | "after-hours" | "afterhours" | "night" | "盤後" => {
                Some(Session::AfterHours)
            }
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Session::Regular => "regular",
            Session::AfterHours => "after_hours",
        }
    }
}

/// OHLCV bar for a single `(date, session)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub session: Session,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Basic OHLC sanity check: finite, positive, high above low.
    pub fn is_sane(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.open > 0.0
            && self.close > 0.0
            && self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }

    /// Red when the bar closed above its open (Taiwan colour convention).
    pub fn candle_color(&self) -> CandleColor {
        if self.close > self.open {
            CandleColor::Red
        } else {
            CandleColor::Black
        }
    }

    /// |close − open| / (high − low); 0 when the bar has no range.
    pub fn body_ratio(&self) -> f64 {
        let range = self.high - self.low;
        if range <= 0.0 {
            return 0.0;
        }
        (self.close - self.open).abs() / range
    }

    /// Close-to-close return against a previous close, in percent.
    pub fn return_pct_from(&self, prev_close: f64) -> Option<f64> {
        if prev_close > 0.0 {
            Some((self.close - prev_close) / prev_close * 100.0)
        } else {
            None
        }
    }
}

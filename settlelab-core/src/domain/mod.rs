//! Domain types for SettleLab

pub mod bar;
pub mod names;
pub mod settlement;
pub mod trade;

pub use bar::{PriceBar, Session};
pub use names::ParseNameError;
pub use settlement::{CalendarEntry, SettlementEvent, SettlementKind};
pub use trade::{CandleColor, Direction, OpeningGap, TradeRecord, TrendDirection};

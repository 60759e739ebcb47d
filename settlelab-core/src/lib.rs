//! SettleLab Core: domain types, price data, settlement calendar, simulator.
//!
//! This crate contains everything needed to turn TX futures bars into
//! settlement-day trades:
//! - Domain types (price bars, settlement events, trade records)
//! - CSV loading (normalized files, TAIFEX exports, explicit calendars)
//! - Deterministic synthetic bars for development runs
//! - Settlement calendar resolution (explicit or derived from Wednesdays)
//! - The trend-following settlement-day trade simulator

pub mod calendar;
pub mod data;
pub mod domain;
pub mod simulator;

pub use calendar::{classify_contract_code, resolve_settlement_events, CountingPeriod};
pub use data::{LoadError, PriceTable};
pub use domain::{
    CalendarEntry, CandleColor, Direction, OpeningGap, ParseNameError, PriceBar, Session,
    SettlementEvent, SettlementKind, TradeRecord, TrendDirection,
};
pub use simulator::{
    simulate, OpeningPriceMode, PrevCloseMode, Simulation, SimulationConfig, Simulator,
    SkipReason, SkippedEvent, ZeroTrendPolicy,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: result types can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceBar>();
        require_sync::<PriceBar>();
        require_send::<PriceTable>();
        require_sync::<PriceTable>();
        require_send::<SettlementEvent>();
        require_sync::<SettlementEvent>();
        require_send::<TradeRecord>();
        require_sync::<TradeRecord>();
        require_send::<Simulation>();
        require_sync::<Simulation>();
        require_send::<LoadError>();
        require_sync::<LoadError>();
    }
}

//! Settlement events and explicit calendar entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Weekly or monthly option settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementKind {
    Weekly,
    Monthly,
}

impl SettlementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SettlementKind::Weekly => "weekly",
            SettlementKind::Monthly => "monthly",
        }
    }
}

/// A settlement day the simulator trades on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEvent {
    pub settlement_date: NaiveDate,
    /// Contract code from an explicit calendar; `None` when derived from prices.
    pub contract_code: Option<String>,
    pub kind: SettlementKind,
}

/// One row of an explicit settlement calendar file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub settlement_date: NaiveDate,
    pub contract_code: String,
}

//! Settlement-day versus normal-day volatility.
//!
//! Uses close-to-close returns of the regular session between consecutive
//! trading days. A return belongs to the day it ends on.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use settlelab_core::PriceTable;

use crate::metrics::std_dev;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolatilityComparison {
    /// Sample stdev of settlement-day returns, in percent.
    pub settlement_day_volatility: Option<f64>,
    pub normal_day_volatility: Option<f64>,
    /// settlement / normal.
    pub ratio: Option<f64>,
    pub settlement_days: usize,
    pub normal_days: usize,
}

pub fn compare_volatility(
    table: &PriceTable,
    settlement_dates: &BTreeSet<NaiveDate>,
) -> VolatilityComparison {
    let mut settlement = Vec::new();
    let mut normal = Vec::new();

    let days: Vec<NaiveDate> = table.trading_days().collect();
    for pair in days.windows(2) {
        let (Some(prev), Some(cur)) = (table.regular(pair[0]), table.regular(pair[1])) else {
            continue;
        };
        let Some(ret) = cur.return_pct_from(prev.close) else {
            continue;
        };
        if settlement_dates.contains(&pair[1]) {
            settlement.push(ret);
        } else {
            normal.push(ret);
        }
    }

    let settlement_vol = (settlement.len() >= 2).then(|| std_dev(&settlement));
    let normal_vol = (normal.len() >= 2).then(|| std_dev(&normal));
    let ratio = match (settlement_vol, normal_vol) {
        (Some(s), Some(n)) if n > 1e-15 => Some(s / n),
        _ => None,
    };

    VolatilityComparison {
        settlement_day_volatility: settlement_vol,
        normal_day_volatility: normal_vol,
        ratio,
        settlement_days: settlement.len(),
        normal_days: normal.len(),
    }
}

//! PriceTable: bars indexed by `(date, session)` with trading-day lookups.
//!
//! A *trading day* is a date that has a regular-session bar. After-hours bars
//! alone never make a date tradable.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

use chrono::NaiveDate;

use crate::domain::{PriceBar, Session};

/// Both sessions recorded under one date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBars {
    pub regular: Option<PriceBar>,
    pub after_hours: Option<PriceBar>,
}

impl DayBars {
    fn slot(&mut self, session: Session) -> &mut Option<PriceBar> {
        match session {
            Session::Regular => &mut self.regular,
            Session::AfterHours => &mut self.after_hours,
        }
    }
}

/// Immutable bar index for one run.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    days: BTreeMap<NaiveDate, DayBars>,
    bar_count: usize,
    duplicate_count: usize,
}

impl PriceTable {
    /// Index bars by `(date, session)`. The first bar for a key wins; later
    /// duplicates are counted and discarded.
    pub fn from_bars(bars: impl IntoIterator<Item = PriceBar>) -> Self {
        let mut table = PriceTable::default();
        for bar in bars {
            let slot = table.days.entry(bar.date).or_default().slot(bar.session);
            if slot.is_some() {
                table.duplicate_count += 1;
                continue;
            }
            *slot = Some(bar);
            table.bar_count += 1;
        }
        table
    }

    pub fn bar(&self, date: NaiveDate, session: Session) -> Option<&PriceBar> {
        let day = self.days.get(&date)?;
        match session {
            Session::Regular => day.regular.as_ref(),
            Session::AfterHours => day.after_hours.as_ref(),
        }
    }

    pub fn regular(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.bar(date, Session::Regular)
    }

    pub fn after_hours(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.bar(date, Session::AfterHours)
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.regular(date).is_some()
    }

    /// Trading days in ascending order.
    pub fn trading_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days
            .iter()
            .filter(|(_, day)| day.regular.is_some())
            .map(|(date, _)| *date)
    }

    pub fn first_trading_day(&self) -> Option<NaiveDate> {
        self.trading_days().next()
    }

    pub fn last_trading_day(&self) -> Option<NaiveDate> {
        self.days
            .iter()
            .rev()
            .find(|(_, day)| day.regular.is_some())
            .map(|(date, _)| *date)
    }

    /// First trading day strictly after `date`.
    pub fn first_trading_day_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.days
            .range((Excluded(date), Unbounded))
            .find(|(_, day)| day.regular.is_some())
            .map(|(d, _)| *d)
    }

    /// First trading day on or after `date`.
    pub fn first_trading_day_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.days
            .range((Included(date), Unbounded))
            .find(|(_, day)| day.regular.is_some())
            .map(|(d, _)| *d)
    }

    /// Last trading day strictly before `date`.
    pub fn prev_trading_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.days
            .range(..date)
            .rev()
            .find(|(_, day)| day.regular.is_some())
            .map(|(d, _)| *d)
    }

    /// All bars ordered by date, regular session first.
    pub fn bars(&self) -> impl Iterator<Item = &PriceBar> + '_ {
        self.days
            .values()
            .flat_map(|day| day.regular.iter().chain(day.after_hours.iter()))
    }

    pub fn len(&self) -> usize {
        self.bar_count
    }

    pub fn is_empty(&self) -> bool {
        self.bar_count == 0
    }

    pub fn trading_day_count(&self) -> usize {
        self.trading_days().count()
    }

    /// Number of bars discarded because their `(date, session)` key repeated.
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_count
    }

    /// Deterministic BLAKE3 fingerprint over every bar in key order.
    pub fn dataset_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for bar in self.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(bar.session.as_str().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

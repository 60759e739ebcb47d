//! Extraction of one continuous contract series from a raw TAIFEX daily
//! futures export.
//!
//! The raw export lists every contract (`契約`) and expiry (`到期月份(週別)`)
//! per date and session. For a single product this keeps exactly one row per
//! `(date, session)`, chosen among plain `YYYYMM` expiries by [`ExpiryRule`].
//! Weekly or spread expiries are used only when no monthly row exists.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::columns::{self, cell, line_of, parse_date, parse_price, parse_volume, Columns};
use super::prices::write_prices;
use super::LoadError;
use crate::domain::names::{normalize, unknown};
use crate::domain::{ParseNameError, PriceBar, Session};

/// Which monthly expiry represents a `(date, session)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryRule {
    /// Greatest `YYYYMM` listed for the key.
    #[default]
    Latest,
    /// Smallest `YYYYMM` listed for the key (front month).
    Nearest,
}

impl FromStr for ExpiryRule {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "latest" => Ok(ExpiryRule::Latest),
            "nearest" => Ok(ExpiryRule::Nearest),
            _ => Err(unknown("expiry rule", s, "latest, nearest")),
        }
    }
}

/// Row counts from one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractSummary {
    pub rows_read: usize,
    pub rows_matching_contract: usize,
    pub rows_without_prices: usize,
    pub rows_written: usize,
}

struct Candidate {
    expiry: Option<u32>,
    bar: PriceBar,
}

/// Parse a plain `YYYYMM` expiry. Weekly (`202401W2`) and spread
/// (`202401/202402`) codes return `None`.
pub fn parse_monthly_expiry(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = raw.parse().ok()?;
    let month = value % 100;
    (1..=12).contains(&month).then_some(value)
}

/// Filter `reader` down to one row per `(date, session)` of `contract` and
/// write a normalized price CSV to `writer`.
pub fn extract_front_contract<R: Read, W: Write>(
    reader: R,
    writer: W,
    contract: &str,
    rule: ExpiryRule,
) -> Result<ExtractSummary, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let cols = Columns::new(rdr.headers()?);
    let date_idx = cols.require(columns::DATE)?;
    let contract_idx = cols.require(columns::CONTRACT)?;
    let expiry_idx = cols.require(columns::EXPIRY)?;
    let open_idx = cols.require(columns::OPEN)?;
    let high_idx = cols.require(columns::HIGH)?;
    let low_idx = cols.require(columns::LOW)?;
    let close_idx = cols.require(columns::CLOSE)?;
    let session_idx = cols.find(columns::SESSION);
    let volume_idx = cols.find(columns::VOLUME);

    let mut summary = ExtractSummary::default();
    let mut chosen: BTreeMap<(NaiveDate, Session), Candidate> = BTreeMap::new();

    for record in rdr.records() {
        let record = record?;
        summary.rows_read += 1;
        if cell(&record, contract_idx) != contract {
            continue;
        }
        summary.rows_matching_contract += 1;

        let raw_date = cell(&record, date_idx);
        let date = parse_date(raw_date).ok_or_else(|| LoadError::BadDate {
            line: line_of(&record),
            value: raw_date.to_string(),
        })?;
        let session = session_idx
            .and_then(|idx| Session::parse(cell(&record, idx)))
            .unwrap_or(Session::Regular);

        let (Some(open), Some(high), Some(low), Some(close)) = (
            parse_price(cell(&record, open_idx)),
            parse_price(cell(&record, high_idx)),
            parse_price(cell(&record, low_idx)),
            parse_price(cell(&record, close_idx)),
        ) else {
            summary.rows_without_prices += 1;
            continue;
        };

        let candidate = Candidate {
            expiry: parse_monthly_expiry(cell(&record, expiry_idx)),
            bar: PriceBar {
                date,
                session,
                open,
                high,
                low,
                close,
                volume: volume_idx.map_or(0, |idx| parse_volume(cell(&record, idx))),
            },
        };

        match chosen.get(&(date, session)) {
            Some(current) if !replaces(&candidate, current, rule) => {}
            _ => {
                chosen.insert((date, session), candidate);
            }
        }
    }

    summary.rows_written = chosen.len();
    write_prices(chosen.values().map(|c| &c.bar), writer)?;
    info!(
        contract,
        read = summary.rows_read,
        matched = summary.rows_matching_contract,
        written = summary.rows_written,
        "extracted contract series"
    );
    Ok(summary)
}

fn replaces(candidate: &Candidate, current: &Candidate, rule: ExpiryRule) -> bool {
    match (candidate.expiry, current.expiry) {
        (Some(new), Some(old)) => match rule {
            ExpiryRule::Latest => new > old,
            ExpiryRule::Nearest => new < old,
        },
        (Some(_), None) => true,
        (None, _) => false,
    }
}

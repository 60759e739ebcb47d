//! Explicit settlement calendar reader (`settlement_date, contract_code`).

use std::io::Read;
use std::path::Path;

use super::columns::{self, cell, line_of, parse_date, Columns};
use super::{open_file, LoadError};
use crate::domain::CalendarEntry;

pub fn load_calendar(path: &Path) -> Result<Vec<CalendarEntry>, LoadError> {
    read_calendar(open_file(path)?)
}

/// Read calendar rows. Blank date cells are skipped; an unparseable date is
/// an error. Contract codes are kept verbatim and classified later.
pub fn read_calendar<R: Read>(reader: R) -> Result<Vec<CalendarEntry>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let cols = Columns::new(rdr.headers()?);
    let date_idx = cols.require(columns::SETTLEMENT_DATE)?;
    let code_idx = cols.require(columns::CONTRACT_CODE)?;

    let mut entries = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let raw_date = cell(&record, date_idx);
        if raw_date.is_empty() {
            continue;
        }
        let settlement_date = parse_date(raw_date).ok_or_else(|| LoadError::BadDate {
            line: line_of(&record),
            value: raw_date.to_string(),
        })?;
        entries.push(CalendarEntry {
            settlement_date,
            contract_code: cell(&record, code_idx).to_string(),
        });
    }
    Ok(entries)
}

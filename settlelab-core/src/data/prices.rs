//! Normalized price CSV reader and writer.
//!
//! Expected columns: `trade_date, session, open, high, low, close, volume`
//! (TAIFEX Chinese headers are accepted too). `session` is optional and
//! defaults to the regular session. Rows with an unparseable price or an
//! unknown session label are dropped and counted, not fatal.

use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, warn};

use super::columns::{self, cell, line_of, parse_date, parse_price, parse_volume, Columns};
use super::{open_file, LoadError};
use crate::domain::{PriceBar, Session};

/// Bars read from a file plus data-quality counters.
#[derive(Debug, Clone, Default)]
pub struct ParsedPrices {
    pub bars: Vec<PriceBar>,
    /// Rows dropped for missing/invalid prices or unknown sessions.
    pub dropped_rows: usize,
}

/// Load a normalized price CSV from disk.
pub fn load_prices(path: &Path) -> Result<ParsedPrices, LoadError> {
    let file = open_file(path)?;
    let parsed = read_prices(file)?;
    debug!(
        path = %path.display(),
        bars = parsed.bars.len(),
        dropped = parsed.dropped_rows,
        "loaded price file"
    );
    Ok(parsed)
}

/// Read a price CSV from any reader.
pub fn read_prices<R: Read>(reader: R) -> Result<ParsedPrices, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let cols = Columns::new(rdr.headers()?);

    let date_idx = cols.require(columns::DATE)?;
    let open_idx = cols.require(columns::OPEN)?;
    let high_idx = cols.require(columns::HIGH)?;
    let low_idx = cols.require(columns::LOW)?;
    let close_idx = cols.require(columns::CLOSE)?;
    let session_idx = cols.find(columns::SESSION);
    let volume_idx = cols.find(columns::VOLUME);

    let mut parsed = ParsedPrices::default();
    for record in rdr.records() {
        let record = record?;
        let raw_date = cell(&record, date_idx);
        if raw_date.is_empty() {
            continue;
        }
        let date = parse_date(raw_date).ok_or_else(|| LoadError::BadDate {
            line: line_of(&record),
            value: raw_date.to_string(),
        })?;

        let session = match session_idx {
            Some(idx) => match Session::parse(cell(&record, idx)) {
                Some(s) => s,
                None => {
                    parsed.dropped_rows += 1;
                    continue;
                }
            },
            None => Session::Regular,
        };

        let prices = (
            parse_price(cell(&record, open_idx)),
            parse_price(cell(&record, high_idx)),
            parse_price(cell(&record, low_idx)),
            parse_price(cell(&record, close_idx)),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = prices else {
            parsed.dropped_rows += 1;
            continue;
        };

        parsed.bars.push(PriceBar {
            date,
            session,
            open,
            high,
            low,
            close,
            volume: volume_idx.map_or(0, |idx| parse_volume(cell(&record, idx))),
        });
    }

    if parsed.dropped_rows > 0 {
        warn!(dropped = parsed.dropped_rows, "dropped price rows with missing values");
    }
    Ok(parsed)
}

/// Write bars as a normalized price CSV.
pub fn write_prices<'a, W: Write>(
    bars: impl IntoIterator<Item = &'a PriceBar>,
    writer: W,
) -> Result<(), LoadError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["trade_date", "session", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        wtr.write_record([
            bar.date.to_string(),
            bar.session.as_str().to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

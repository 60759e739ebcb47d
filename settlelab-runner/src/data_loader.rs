//! Price and calendar loading for the runner.
//!
//! Implements the fallback policy:
//! 1. If the price file exists → use it
//! 2. If it is missing and `synthetic` is enabled → generate synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only debug mode. Results produced on it
//! carry `has_synthetic = true` and a report warning.

use chrono::{Duration, NaiveDate};
use settlelab_core::data::{generate_synthetic_bars, load_calendar, load_prices};
use settlelab_core::{CalendarEntry, LoadError, PriceTable};
use tracing::{info, warn};

use crate::config::DataSection;

/// Seed label for synthetic TX bars.
const SYNTHETIC_LABEL: &str = "TX";

/// Loaded inputs for one run, with provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub table: PriceTable,
    /// Explicit calendar rows, when a calendar file is configured.
    pub calendar: Option<Vec<CalendarEntry>>,
    /// BLAKE3 hash over all bars.
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub data_quality_warnings: Vec<String>,
}

/// Load the price table (and calendar, if configured) for `[start, end]`.
pub fn load_market_data(
    data: &DataSection,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LoadedData, LoadError> {
    let mut warnings = Vec::new();
    let mut has_synthetic = false;

    let table = match load_prices(&data.prices) {
        Ok(parsed) => {
            if parsed.dropped_rows > 0 {
                warnings.push(format!(
                    "{} price rows dropped for missing or invalid values",
                    parsed.dropped_rows
                ));
            }
            PriceTable::from_bars(parsed.bars)
        }
        Err(LoadError::NotFound { path }) if data.synthetic => {
            warn!(
                path = %path.display(),
                "price file missing, generating synthetic data; results will be tagged"
            );
            has_synthetic = true;
            // one month of lead-in so the first window has history
            let bars = generate_synthetic_bars(SYNTHETIC_LABEL, start - Duration::days(31), end);
            PriceTable::from_bars(bars)
        }
        Err(e) => return Err(e),
    };

    if table.duplicate_count() > 0 {
        let msg = format!(
            "{} duplicate (date, session) rows ignored; first occurrence kept",
            table.duplicate_count()
        );
        warn!("{msg}");
        warnings.push(msg);
    }
    let insane = table.bars().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        let msg = format!("{insane} bars fail OHLC sanity checks");
        warn!("{msg}");
        warnings.push(msg);
    }

    let calendar = match &data.calendar {
        Some(path) => Some(load_calendar(path)?),
        None => None,
    };

    let dataset_hash = table.dataset_hash();
    info!(
        bars = table.len(),
        trading_days = table.trading_day_count(),
        calendar_entries = calendar.as_ref().map_or(0, Vec::len),
        synthetic = has_synthetic,
        "market data loaded"
    );

    Ok(LoadedData {
        table,
        calendar,
        dataset_hash,
        has_synthetic,
        data_quality_warnings: warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn missing_file_without_synthetic_fails() {
        let data = DataSection {
            prices: PathBuf::from("/nonexistent/tx.csv"),
            calendar: None,
            synthetic: false,
        };
        let err = load_market_data(&data, d(2024, 1, 1), d(2024, 3, 31)).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn missing_file_with_synthetic_is_tagged() {
        let data = DataSection {
            prices: PathBuf::from("/nonexistent/tx.csv"),
            calendar: None,
            synthetic: true,
        };
        let loaded = load_market_data(&data, d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        assert!(loaded.has_synthetic);
        assert!(!loaded.table.is_empty());
        assert!(loaded.table.first_trading_day().unwrap() < d(2024, 1, 1));
        assert_eq!(loaded.dataset_hash.len(), 64);
    }

    #[test]
    fn dropped_rows_and_duplicates_become_warnings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "trade_date,session,open,high,low,close,volume\n\
             2024-01-02,regular,100,101,99,100,1\n\
             2024-01-02,regular,100,101,99,100,1\n\
             2024-01-03,regular,-,-,-,-,0\n"
        )
        .unwrap();
        let data = DataSection {
            prices: file.path().to_path_buf(),
            calendar: None,
            synthetic: false,
        };
        let loaded = load_market_data(&data, d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert!(!loaded.has_synthetic);
        assert_eq!(loaded.data_quality_warnings.len(), 2);
    }
}

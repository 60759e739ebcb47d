//! Price and calendar data: CSV loading, TAIFEX extraction, synthetic bars,
//! and the `(date, session)` price index.

pub(crate) mod columns;
pub mod calendar_file;
pub mod prices;
pub mod synthetic;
pub mod table;
pub mod taifex;

use std::path::PathBuf;

use thiserror::Error;

pub use calendar_file::{load_calendar, read_calendar};
pub use prices::{load_prices, read_prices, write_prices, ParsedPrices};
pub use synthetic::generate_synthetic_bars;
pub use table::{DayBars, PriceTable};
pub use taifex::{extract_front_contract, ExpiryRule, ExtractSummary};

/// Errors from reading price or calendar files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found: {} (use --synthetic for synthetic data)", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: invalid date '{value}'")]
    BadDate { line: u64, value: String },
}

pub(crate) fn open_file(path: &std::path::Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

//! Serializable backtest configuration.
//!
//! Loaded from TOML with three sections. Every field has a default, so an
//! empty file is a valid configuration:
//!
//! ```toml
//! [backtest]
//! counting_period = "weekly"        # weekly | monthly
//! opening_price_calc = "standard"   # standard | night
//! prev_close_calc = "standard"      # standard | night | settlement_open
//! zero_trend = "skip"               # skip | long | short
//! start_date = "2017-05-16"
//! end_date = "2024-12-31"
//!
//! [data]
//! prices = "data/filtered_tx_all_years.csv"
//! calendar = "data/settlement_calendar.csv"   # optional
//! synthetic = false
//!
//! [output]
//! dir = "output"
//! min_cell_trades = 5
//! top_cells = 10
//! benchmark = false
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use settlelab_core::{
    CountingPeriod, OpeningPriceMode, PrevCloseMode, SimulationConfig, ZeroTrendPolicy,
};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

pub const DEFAULT_PRICES_FILE: &str = "filtered_tx_all_years.csv";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Full configuration of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub data: DataSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub counting_period: CountingPeriod,
    pub opening_price_calc: OpeningPriceMode,
    pub prev_close_calc: PrevCloseMode,
    pub zero_trend: ZeroTrendPolicy,
    /// Inclusive lower bound on settlement dates.
    pub start_date: NaiveDate,
    /// Inclusive upper bound on settlement dates.
    pub end_date: NaiveDate,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            counting_period: CountingPeriod::default(),
            opening_price_calc: OpeningPriceMode::default(),
            prev_close_calc: PrevCloseMode::default(),
            zero_trend: ZeroTrendPolicy::default(),
            start_date: NaiveDate::from_ymd_opt(2017, 5, 16).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Normalized price CSV.
    pub prices: PathBuf,
    /// Optional explicit settlement calendar.
    pub calendar: Option<PathBuf>,
    /// Generate synthetic bars when `prices` does not exist.
    pub synthetic: bool,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            prices: Path::new(DEFAULT_DATA_DIR).join(DEFAULT_PRICES_FILE),
            calendar: None,
            synthetic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    /// Minimum trades for a multi-factor cell to appear in the ranking.
    pub min_cell_trades: usize,
    /// Number of ranked cells shown in the report.
    pub top_cells: usize,
    /// Also run the fixed-weekday benchmark.
    pub benchmark: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            min_cell_trades: 5,
            top_cells: 10,
            benchmark: false,
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (start, end) = (self.backtest.start_date, self.backtest.end_date);
        if start > end {
            return Err(ConfigError::InvalidDateRange { start, end });
        }
        Ok(())
    }

    /// Re-root the default price path and output dir under the given
    /// directories. Explicit non-default paths are left alone.
    pub fn with_directories(mut self, data_dir: Option<&Path>, output_dir: Option<&Path>) -> Self {
        let defaults = DataSection::default();
        if let Some(dir) = data_dir {
            if self.data.prices == defaults.prices {
                self.data.prices = dir.join(DEFAULT_PRICES_FILE);
            }
        }
        if let Some(dir) = output_dir {
            if self.output.dir == OutputSection::default().dir {
                self.output.dir = dir.to_path_buf();
            }
        }
        self
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            opening_price: self.backtest.opening_price_calc,
            prev_close: self.backtest.prev_close_calc,
            zero_trend: self.backtest.zero_trend,
        }
    }

    /// Deterministic hash of the strategy-relevant settings.
    ///
    /// Two runs with identical settings and data paths share a RunId.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

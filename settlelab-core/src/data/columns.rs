//! Header aliases and cell parsers shared by the CSV readers.
//!
//! TAIFEX exports use Chinese headers, numbers with thousands separators, and
//! `-` for prices that did not trade. Normalized files use English headers.

use chrono::NaiveDate;

use super::LoadError;

pub(crate) const DATE: &[&str] = &["trade_date", "date", "交易日期"];
pub(crate) const SESSION: &[&str] = &["session", "交易時段"];
pub(crate) const OPEN: &[&str] = &["open", "開盤價"];
pub(crate) const HIGH: &[&str] = &["high", "最高價"];
pub(crate) const LOW: &[&str] = &["low", "最低價"];
pub(crate) const CLOSE: &[&str] = &["close", "收盤價"];
pub(crate) const VOLUME: &[&str] = &["volume", "成交量"];
pub(crate) const CONTRACT: &[&str] = &["contract", "契約"];
pub(crate) const EXPIRY: &[&str] = &["expiry", "expiry_month", "到期月份(週別)"];
pub(crate) const SETTLEMENT_DATE: &[&str] = &["settlement_date", "最後結算日"];
pub(crate) const CONTRACT_CODE: &[&str] = &["contract_code", "契約月份"];

/// Column positions resolved from a header row.
pub(crate) struct Columns {
    names: Vec<String>,
}

impl Columns {
    pub(crate) fn new(headers: &csv::StringRecord) -> Self {
        let names = headers
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();
        Self { names }
    }

    pub(crate) fn find(&self, aliases: &[&str]) -> Option<usize> {
        self.names
            .iter()
            .position(|name| aliases.iter().any(|alias| name == alias))
    }

    pub(crate) fn require(&self, aliases: &[&'static str]) -> Result<usize, LoadError> {
        self.find(aliases)
            .ok_or(LoadError::MissingColumn(aliases[0]))
    }
}

pub(crate) fn cell<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).map(str::trim).unwrap_or("")
}

pub(crate) fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Parse `YYYY-MM-DD`, `YYYY/MM/DD` or `YYYYMMDD`.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Parse a price cell. `-`, blanks and garbage yield `None`.
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a volume cell; missing volume counts as zero.
pub(crate) fn parse_volume(raw: &str) -> u64 {
    let cleaned = raw.trim().replace(',', "");
    if let Ok(v) = cleaned.parse::<u64>() {
        return v;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_in_all_taifex_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 17);
        assert_eq!(parse_date("2024/01/17"), expected);
        assert_eq!(parse_date("2024-01-17"), expected);
        assert_eq!(parse_date("20240117"), expected);
        assert_eq!(parse_date("17/01/2024"), None);
    }

    #[test]
    fn prices_with_separators_and_dashes() {
        assert_eq!(parse_price("17,523"), Some(17523.0));
        assert_eq!(parse_price(" 17523.5 "), Some(17523.5));
        assert_eq!(parse_price("-"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("NaN"), None);
    }

    #[test]
    fn volume_defaults_to_zero() {
        assert_eq!(parse_volume("12,345"), 12345);
        assert_eq!(parse_volume(""), 0);
        assert_eq!(parse_volume("-"), 0);
        assert_eq!(parse_volume("10.0"), 10);
    }

    #[test]
    fn header_lookup_ignores_bom_and_case() {
        let headers = csv::StringRecord::from(vec!["\u{feff}交易日期", "Open", " Close "]);
        let cols = Columns::new(&headers);
        assert_eq!(cols.find(DATE), Some(0));
        assert_eq!(cols.find(OPEN), Some(1));
        assert_eq!(cols.find(CLOSE), Some(2));
        assert!(cols.require(HIGH).is_err());
    }
}

//! Artifact export: JSON manifest, CSV tables, and the report bundle.
//!
//! All persisted manifests include a `schema_version` field. Newer versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use settlelab_core::TradeRecord;
use tracing::info;

use crate::filters::FilterAnalysis;
use crate::report::{fmt_opt, generate_report};
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the trade tape.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "settlement_date",
        "settlement_kind",
        "opening_date",
        "prev_date",
        "opening_price",
        "prev_close",
        "trend_value",
        "direction",
        "entry_price",
        "exit_price",
        "pnl_pct",
        "candle_color",
        "opening_gap",
        "body_ratio",
    ])?;

    for t in trades {
        wtr.write_record(&[
            t.settlement_date.to_string(),
            t.settlement_kind.as_str().to_string(),
            t.opening_date.to_string(),
            t.prev_date.to_string(),
            format!("{:.2}", t.opening_price),
            format!("{:.2}", t.prev_close),
            format!("{:.2}", t.trend_value),
            t.direction.as_str().to_string(),
            format!("{:.2}", t.entry_price),
            format!("{:.2}", t.exit_price),
            format!("{:.2}", t.pnl_pct),
            t.candle_color.as_str().to_string(),
            t.opening_gap.as_str().to_string(),
            format!("{:.3}", t.body_ratio),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export every filter bucket as one row, rounded like the report:
/// percentages to 2 decimals, the P/L ratio to 3.
pub fn export_filters_csv(filters: &FilterAnalysis) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "filter",
        "category",
        "trades",
        "win_rate_pct",
        "net_profit_pct",
        "avg_trade_pct",
        "pl_ratio",
        "kelly_pct",
        "max_drawdown_pct",
    ])?;
    for (filter, cats) in &filters.groups {
        for (category, s) in cats {
            wtr.write_record(&[
                filter.clone(),
                category.clone(),
                s.total_trades.to_string(),
                format!("{:.2}", s.win_rate * 100.0),
                format!("{:.2}", s.net_profit),
                format!("{:.2}", s.avg_trade),
                fmt_opt(s.pl_ratio, 3),
                fmt_opt(s.kelly_pct, 2),
                format!("{:.2}", s.max_drawdown),
            ])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{output_dir}/{run_id[..12]}/` containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `trades.csv`: trade tape
/// - `filters.csv`: every filter bucket
/// - `report.md`: human-readable report
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let short_id = result.run_id.get(..12).unwrap_or(&result.run_id);
    let run_dir = output_dir.join(short_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("manifest.json"), &export_json(result)?)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write(&run_dir.join("filters.csv"), &export_filters_csv(&result.filters)?)?;
    write(&run_dir.join("report.md"), &generate_report(result))?;

    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::analyze_filters;
    use crate::metrics::test_support::trades;

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = export_trades_csv(&trades(&[0.5, -0.25])).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("settlement_date,settlement_kind,opening_date"));
        assert!(lines[1].starts_with("2024-01-03,weekly,"));
        assert!(lines[2].contains(",-0.25,"));
    }

    #[test]
    fn filters_csv_marks_undefined_ratios() {
        let analysis = analyze_filters(&trades(&[0.5, 0.25]));
        let csv = export_filters_csv(&analysis).unwrap();
        let up = csv
            .lines()
            .find(|l| l.starts_with("trend,up,"))
            .unwrap();
        assert!(up.starts_with("trend,up,2,100.00,0.75,"));
        assert!(up.contains(",N/A,N/A,"));
        assert!(csv.starts_with("filter,category,trades,win_rate_pct,"));
    }
}

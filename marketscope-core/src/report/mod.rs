//! Report generation — read-only views over the persisted store.
//!
//! Each view is a denormalized observation ⋈ profile projection filtered to
//! a trailing window, recomputed per report run and never written back as
//! source of truth.

pub mod competitive;
pub mod executive;
pub mod risk;
pub mod timeseries;

pub use competitive::{competitive_view, CompetitiveRow};
pub use executive::{
    executive_view, performance_category, risk_category, ExecutiveRow, PerformanceCategory,
    RiskCategory,
};
pub use risk::{risk_level, risk_view, RiskLevel, RiskRow};
pub use timeseries::{timeseries_view, TimeseriesRow};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::collect::CollectSummary;
use crate::config::AnalysisConfig;
use crate::store::{MarketStore, StoreError};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("report csv failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Paths of the four generated report CSVs.
#[derive(Debug)]
pub struct ReportPaths {
    pub executive: PathBuf,
    pub competitive: PathBuf,
    pub risk: PathBuf,
    pub timeseries: PathBuf,
}

/// Generate all report views from the store and write them as CSVs.
///
/// `as_of` anchors the trailing window: rows older than
/// `as_of - report_window_days` are excluded.
pub fn write_report_csvs(
    store: &MarketStore,
    config: &AnalysisConfig,
    as_of: NaiveDate,
    out_dir: &Path,
) -> Result<ReportPaths, ReportError> {
    std::fs::create_dir_all(out_dir)?;

    let since = as_of - chrono::Duration::days(config.report_window_days);
    let joined = store.joined_rows(since)?;

    let executive = out_dir.join("executive_summary.csv");
    write_csv(
        &executive,
        &executive_view(&joined, &config.risk, &config.performance),
    )?;

    let competitive = out_dir.join("competitive_analysis.csv");
    write_csv(&competitive, &competitive_view(&joined, &config.focus_symbol))?;

    let risk = out_dir.join("risk_analysis.csv");
    write_csv(
        &risk,
        &risk_view(&joined, &config.risk_levels, store.total_market_cap()?),
    )?;

    let timeseries = out_dir.join("timeseries_data.csv");
    write_csv(&timeseries, &timeseries_view(&joined))?;

    Ok(ReportPaths {
        executive,
        competitive,
        risk,
        timeseries,
    })
}

fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render the plain-text collection report printed (and saved) after a run.
pub fn render_collection_report(
    config: &AnalysisConfig,
    summary: &CollectSummary,
    profiles_collected: usize,
    run_at: NaiveDateTime,
) -> String {
    let mut report = format!(
        "MARKET INTELLIGENCE DATA COLLECTION REPORT\n\
         ==========================================\n\
         Collection Date: {}\n\
         \n\
         SUMMARY:\n\
         - Target Companies: {}\n\
         - Price Data Collected: {} companies\n\
         - Fundamentals Collected: {} companies\n\
         - Data Period: {} days\n\
         - Success Rate: {:.1}%\n",
        run_at.format("%Y-%m-%d %H:%M:%S"),
        summary.total,
        summary.succeeded,
        profiles_collected,
        config.lookback_days,
        summary.success_rate(),
    );

    if summary.metric_fallbacks > 0 {
        report.push_str(&format!(
            "- Metric Fallbacks: {} companies kept raw rows\n",
            summary.metric_fallbacks
        ));
    }

    if !summary.errors.is_empty() {
        report.push_str("\nSKIPPED:\n");
        for (symbol, err) in &summary.errors {
            report.push_str(&format!("  {symbol}: {}\n", err.truncated()));
        }
    }

    report.push_str("\nCOMPANIES TRACKED:\n");
    for (symbol, company) in &config.universe.companies {
        report.push_str(&format!("  {symbol}: {company}\n"));
    }

    report
}

//! Flat-file snapshot export.
//!
//! Writes each batch as CSV twice: a timestamped file per run and a
//! `_latest` file that is always overwritten. Both hold identical data;
//! the latest file gives downstream tools a stable path.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{EntityProfile, MetricRow};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The pair of files one snapshot write produces.
#[derive(Debug)]
pub struct SnapshotPaths {
    pub timestamped: PathBuf,
    pub latest: PathBuf,
}

/// Write the observation batch as `stock_prices_<stamp>.csv` plus
/// `stock_prices_latest.csv`.
pub fn write_price_snapshots(
    dir: &Path,
    rows: &[MetricRow],
    run_at: NaiveDateTime,
) -> Result<SnapshotPaths, ExportError> {
    write_snapshots(dir, "stock_prices", rows, run_at)
}

/// Write the profile batch as `company_fundamentals_<stamp>.csv` plus
/// `company_fundamentals_latest.csv`.
pub fn write_profile_snapshots(
    dir: &Path,
    profiles: &[EntityProfile],
    run_at: NaiveDateTime,
) -> Result<SnapshotPaths, ExportError> {
    write_snapshots(dir, "company_fundamentals", profiles, run_at)
}

fn write_snapshots<T: Serialize>(
    dir: &Path,
    prefix: &str,
    records: &[T],
    run_at: NaiveDateTime,
) -> Result<SnapshotPaths, ExportError> {
    std::fs::create_dir_all(dir)?;

    let stamp = run_at.format("%Y%m%d_%H%M%S");
    let timestamped = dir.join(format!("{prefix}_{stamp}.csv"));
    let latest = dir.join(format!("{prefix}_latest.csv"));

    write_csv(&timestamped, records)?;
    write_csv(&latest, records)?;

    Ok(SnapshotPaths { timestamped, latest })
}

fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

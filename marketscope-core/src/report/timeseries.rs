//! Time series view — per-row cumulative returns for trend charts.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::JoinedRow;

/// One row of the time series export.
#[derive(Debug, Clone, Serialize)]
pub struct TimeseriesRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub close_price: f64,
    pub daily_return_pct: Option<f64>,
    pub volume_millions: f64,
    pub ma_7_days: Option<f64>,
    pub ma_30_days: Option<f64>,
    /// Return vs. the first close inside the window, as a percentage.
    pub cumulative_return_pct: Option<f64>,
}

/// Build the time series view. Input rows are expected ordered by symbol
/// then date (the store's join order); the cumulative return baselines on
/// each symbol's first row within the window.
pub fn timeseries_view(rows: &[JoinedRow]) -> Vec<TimeseriesRow> {
    let mut first_close: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        first_close.entry(row.symbol.as_str()).or_insert(row.close);
    }

    rows.iter()
        .map(|row| {
            let base = first_close[row.symbol.as_str()];
            let cumulative_return_pct = if base != 0.0 {
                Some((row.close / base - 1.0) * 100.0)
            } else {
                None
            };

            TimeseriesRow {
                date: row.date,
                symbol: row.symbol.clone(),
                company: row.company.clone(),
                sector: row.sector.clone(),
                close_price: row.close,
                daily_return_pct: row.daily_change.map(|c| c * 100.0),
                volume_millions: row.volume as f64 / 1e6,
                ma_7_days: row.ma_7,
                ma_30_days: row.ma_30,
                cumulative_return_pct,
            }
        })
        .collect()
}

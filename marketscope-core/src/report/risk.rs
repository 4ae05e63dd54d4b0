//! Risk analysis view — one row per observation with a parametric VaR
//! estimate, portfolio weight, and a four-tier risk label.
//!
//! The VaR window is a trailing 30 rows including the current one; until 30
//! rows exist the estimate runs over whatever rows are available, the way
//! a SQL `ROWS 29 PRECEDING` frame does.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::config::RiskLevelThresholds;
use crate::store::JoinedRow;

/// Trailing row count (current row inclusive) for the VaR estimate.
const VAR_WINDOW: usize = 30;

/// One-sided 95% quantile of the standard normal.
const VAR_Z_95: f64 = 1.645;

/// Four-tier risk label on volatility percent.
///
/// Strict-greater thresholds in descending order, first match wins; a
/// missing volatility (warmup rows) falls through to Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "Very High Risk")]
    VeryHigh,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "Low Risk")]
    Low,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::VeryHigh => "Very High Risk",
            Self::High => "High Risk",
            Self::Medium => "Medium Risk",
            Self::Low => "Low Risk",
        };
        f.write_str(s)
    }
}

pub fn risk_level(volatility_pct: Option<f64>, thresholds: &RiskLevelThresholds) -> RiskLevel {
    match volatility_pct {
        Some(vol) if vol > thresholds.very_high => RiskLevel::VeryHigh,
        Some(vol) if vol > thresholds.high => RiskLevel::High,
        Some(vol) if vol > thresholds.medium => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// One row of the risk analysis export.
#[derive(Debug, Clone, Serialize)]
pub struct RiskRow {
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub date: NaiveDate,
    pub daily_return_pct: Option<f64>,
    pub volatility_pct: Option<f64>,
    pub volume_millions: f64,
    pub market_cap_billions: f64,
    /// Parametric 95% VaR: mean return minus 1.645 stddev over the trailing
    /// window; None until the window holds at least one return.
    pub var_95_pct: Option<f64>,
    /// Entity's share of the total tracked market cap.
    pub portfolio_weight_pct: Option<f64>,
    pub risk_level: RiskLevel,
}

/// Build the risk view. Input rows are expected ordered by symbol then date
/// (the store's join order); `total_market_cap` sums over all tracked
/// profiles and anchors the portfolio weights.
pub fn risk_view(
    rows: &[JoinedRow],
    thresholds: &RiskLevelThresholds,
    total_market_cap: i64,
) -> Vec<RiskRow> {
    let mut view = Vec::with_capacity(rows.len());

    let mut start = 0;
    while start < rows.len() {
        let symbol = rows[start].symbol.as_str();
        let end = rows[start..]
            .iter()
            .position(|r| r.symbol != symbol)
            .map_or(rows.len(), |off| start + off);

        let group = &rows[start..end];
        for (i, row) in group.iter().enumerate() {
            let window_start = (i + 1).saturating_sub(VAR_WINDOW);
            let var_95_pct = trailing_var(&group[window_start..=i]);

            let volatility_pct = row.volatility_30d.map(|v| v * 100.0);
            let portfolio_weight_pct = if total_market_cap > 0 {
                Some(row.market_cap as f64 / total_market_cap as f64 * 100.0)
            } else {
                None
            };

            view.push(RiskRow {
                symbol: row.symbol.clone(),
                company: row.company.clone(),
                sector: row.sector.clone(),
                date: row.date,
                daily_return_pct: row.daily_change.map(|c| c * 100.0),
                volatility_pct,
                volume_millions: row.volume as f64 / 1e6,
                market_cap_billions: row.market_cap as f64 / 1e9,
                var_95_pct,
                portfolio_weight_pct,
                risk_level: risk_level(volatility_pct, thresholds),
            });
        }

        start = end;
    }

    view
}

/// VaR over one trailing window: mean − 1.645 × population stddev of the
/// returns present in the window. Warmup rows with no return are skipped,
/// the way SQL aggregates skip NULL; an all-missing window yields None.
fn trailing_var(window: &[JoinedRow]) -> Option<f64> {
    let returns_pct: Vec<f64> = window
        .iter()
        .filter_map(|r| r.daily_change)
        .map(|c| c * 100.0)
        .collect();
    if returns_pct.is_empty() {
        return None;
    }

    let n = returns_pct.len() as f64;
    let mean = returns_pct.iter().sum::<f64>() / n;
    let variance = returns_pct.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    Some(mean - VAR_Z_95 * variance.sqrt())
}

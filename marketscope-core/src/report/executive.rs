//! Executive summary view — one row per observation, joined to the profile,
//! with read-time performance and risk buckets.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::config::{PerformanceThresholds, RiskThresholds};
use crate::store::JoinedRow;

/// Daily performance bucket.
///
/// Thresholds evaluated in declaration order, first match wins: a return
/// above `strong` is Strong Up, above zero is Up, below `-strong` is Strong
/// Down, everything else (zero, small losses, missing) is Down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceCategory {
    #[serde(rename = "Strong Up")]
    StrongUp,
    Up,
    #[serde(rename = "Strong Down")]
    StrongDown,
    Down,
}

impl fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StrongUp => "Strong Up",
            Self::Up => "Up",
            Self::StrongDown => "Strong Down",
            Self::Down => "Down",
        };
        f.write_str(s)
    }
}

/// Risk bucket from rolling volatility.
///
/// Strict-greater thresholds in descending order, first match wins:
/// volatility exactly at the high threshold is Medium, not High. A missing
/// volatility (warmup rows) falls through to Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskCategory {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "Low Risk")]
    Low,
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "High Risk",
            Self::Medium => "Medium Risk",
            Self::Low => "Low Risk",
        };
        f.write_str(s)
    }
}

pub fn performance_category(
    daily_change: Option<f64>,
    thresholds: &PerformanceThresholds,
) -> PerformanceCategory {
    match daily_change {
        Some(change) if change > thresholds.strong => PerformanceCategory::StrongUp,
        Some(change) if change > 0.0 => PerformanceCategory::Up,
        Some(change) if change < -thresholds.strong => PerformanceCategory::StrongDown,
        _ => PerformanceCategory::Down,
    }
}

pub fn risk_category(volatility: Option<f64>, thresholds: &RiskThresholds) -> RiskCategory {
    match volatility {
        Some(vol) if vol > thresholds.high => RiskCategory::High,
        Some(vol) if vol > thresholds.medium => RiskCategory::Medium,
        _ => RiskCategory::Low,
    }
}

/// One row of the executive summary.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveRow {
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub market_cap_billions: f64,
    pub date: NaiveDate,
    pub close_price: f64,
    pub daily_return_pct: Option<f64>,
    pub volume_millions: f64,
    pub volatility_pct: Option<f64>,
    pub ma_7_days: Option<f64>,
    pub ma_30_days: Option<f64>,
    pub performance_category: PerformanceCategory,
    pub risk_category: RiskCategory,
}

/// Build the executive view from joined rows, ordered date descending then
/// market cap descending.
pub fn executive_view(
    rows: &[JoinedRow],
    risk: &RiskThresholds,
    performance: &PerformanceThresholds,
) -> Vec<ExecutiveRow> {
    let mut view: Vec<ExecutiveRow> = rows
        .iter()
        .map(|row| ExecutiveRow {
            symbol: row.symbol.clone(),
            company: row.company.clone(),
            sector: row.sector.clone(),
            market_cap_billions: row.market_cap as f64 / 1e9,
            date: row.date,
            close_price: row.close,
            daily_return_pct: row.daily_change.map(|c| c * 100.0),
            volume_millions: row.volume as f64 / 1e6,
            volatility_pct: row.volatility_30d.map(|v| v * 100.0),
            ma_7_days: row.ma_7,
            ma_30_days: row.ma_30,
            performance_category: performance_category(row.daily_change, performance),
            risk_category: risk_category(row.volatility_30d, risk),
        })
        .collect();

    view.sort_by(|a, b| {
        b.date.cmp(&a.date).then(
            b.market_cap_billions
                .partial_cmp(&a.market_cap_billions)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    view
}

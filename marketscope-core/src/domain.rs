//! Domain types: observations, entity profiles, and metric rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entity's measured values for one trading day.
///
/// Immutable once fetched. (symbol, date) pairs are unique within a single
/// collection run — providers return one bar per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Descriptive snapshot of a tracked company.
///
/// Refreshed wholesale on every collection run — last write wins, no history.
/// Missing upstream fields default to 0 / "Unknown" rather than failing the
/// profile fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityProfile {
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub industry: String,
    pub country: String,
    pub market_cap: i64,
    pub revenue: i64,
    pub employees: i64,
    pub collected_at: NaiveDate,
}

/// An observation augmented with derived rolling metrics.
///
/// Derived fields are `None` until their window is full: the first
/// `window - 1` rows of a symbol's series have no rolling value, and
/// `daily_change` / `daily_change_abs` are `None` for the first row.
/// Column names carry the default window sizes (7-day short, 30-day long).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub daily_change: Option<f64>,
    pub daily_change_abs: Option<f64>,
    pub volatility_30d: Option<f64>,
    pub ma_7: Option<f64>,
    pub ma_30: Option<f64>,
    pub volume_ma_7: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub daily_range: Option<f64>,
}

impl MetricRow {
    /// Wrap a raw observation with no derived metrics.
    ///
    /// This is the compute-failure fallback: when metric derivation cannot
    /// run, the batch keeps the raw rows instead of dropping the entity.
    pub fn from_observation(obs: Observation) -> Self {
        Self {
            symbol: obs.symbol,
            date: obs.date,
            open: obs.open,
            high: obs.high,
            low: obs.low,
            close: obs.close,
            volume: obs.volume,
            daily_change: None,
            daily_change_abs: None,
            volatility_30d: None,
            ma_7: None,
            ma_30: None,
            volume_ma_7: None,
            volume_ratio: None,
            daily_range: None,
        }
    }
}

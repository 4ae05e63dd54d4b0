//! Competitive analysis view — per-entity aggregates over the trailing
//! window, with competition-style ranks.
//!
//! Ranking uses competition semantics (SQL `RANK()`): tied values share the
//! best rank and the following rank skips (1, 1, 3). Row order breaks ties
//! by symbol, the natural key.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::store::JoinedRow;

/// Per-entity aggregate row.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitiveRow {
    pub symbol: String,
    pub company: String,
    pub sector: String,
    /// "Focus" for the configured focus symbol, "Competitor" for the rest.
    pub company_type: &'static str,
    pub market_cap_billions: f64,
    /// Mean daily return (%) over the window; None if no return data.
    pub avg_daily_return_pct: Option<f64>,
    /// Population stddev of daily returns (%); None if no return data.
    pub volatility_pct: Option<f64>,
    /// (max close − min close) / min close, as a percentage.
    pub total_return_pct: Option<f64>,
    pub avg_volume_millions: f64,
    /// Share of observed days with a positive return.
    pub positive_days_pct: f64,
    /// Competition rank by mean daily return, descending (1 = best).
    pub performance_rank: usize,
    /// Competition rank by return volatility, ascending (1 = steadiest).
    pub stability_rank: usize,
}

/// Aggregate joined rows into one row per entity and rank them.
///
/// `focus_symbol` marks one entity as the subject of the comparison; every
/// other entity is labeled a competitor.
pub fn competitive_view(rows: &[JoinedRow], focus_symbol: &str) -> Vec<CompetitiveRow> {
    // BTreeMap keys give deterministic symbol order, which is also the
    // tie-break for equal aggregates.
    let mut groups: BTreeMap<&str, Vec<&JoinedRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.symbol.as_str()).or_default().push(row);
    }

    let mut view: Vec<CompetitiveRow> = groups
        .values()
        .map(|group| aggregate(group, focus_symbol))
        .collect();

    let returns: Vec<Option<f64>> = view.iter().map(|r| r.avg_daily_return_pct).collect();
    let volatilities: Vec<Option<f64>> = view.iter().map(|r| r.volatility_pct).collect();
    let performance_ranks = competition_ranks(&returns, RankOrder::Descending);
    let stability_ranks = competition_ranks(&volatilities, RankOrder::Ascending);

    for (i, row) in view.iter_mut().enumerate() {
        row.performance_rank = performance_ranks[i];
        row.stability_rank = stability_ranks[i];
    }

    view
}

fn aggregate(group: &[&JoinedRow], focus_symbol: &str) -> CompetitiveRow {
    let first = group[0];
    let n = group.len() as f64;
    let company_type = if first.symbol == focus_symbol {
        "Focus"
    } else {
        "Competitor"
    };

    // Aggregates over returns ignore warmup rows with no daily change,
    // the way SQL aggregates ignore NULL.
    let returns_pct: Vec<f64> = group
        .iter()
        .filter_map(|r| r.daily_change)
        .map(|c| c * 100.0)
        .collect();

    let (avg_return, return_stddev) = if returns_pct.is_empty() {
        (None, None)
    } else {
        let mean = returns_pct.iter().sum::<f64>() / returns_pct.len() as f64;
        let variance = returns_pct.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / returns_pct.len() as f64;
        (Some(mean), Some(variance.sqrt()))
    };

    let min_close = group.iter().map(|r| r.close).fold(f64::INFINITY, f64::min);
    let max_close = group
        .iter()
        .map(|r| r.close)
        .fold(f64::NEG_INFINITY, f64::max);
    let total_return_pct = if min_close > 0.0 {
        Some((max_close - min_close) / min_close * 100.0)
    } else {
        None
    };

    let avg_volume_millions = group.iter().map(|r| r.volume as f64 / 1e6).sum::<f64>() / n;

    // Positive days are counted against all rows in the window, warmup
    // rows included.
    let positive_days = group
        .iter()
        .filter(|r| r.daily_change.is_some_and(|c| c > 0.0))
        .count();
    let positive_days_pct = positive_days as f64 * 100.0 / n;

    CompetitiveRow {
        symbol: first.symbol.clone(),
        company: first.company.clone(),
        sector: first.sector.clone(),
        company_type,
        market_cap_billions: first.market_cap as f64 / 1e9,
        avg_daily_return_pct: avg_return,
        volatility_pct: return_stddev,
        total_return_pct,
        avg_volume_millions,
        positive_days_pct,
        performance_rank: 0,
        stability_rank: 0,
    }
}

#[derive(Debug, Clone, Copy)]
enum RankOrder {
    /// Larger values rank first.
    Descending,
    /// Smaller values rank first.
    Ascending,
}

/// Competition ranking: rank = 1 + number of strictly better values.
///
/// Missing values rank after every present value; equal missing values tie.
fn competition_ranks(values: &[Option<f64>], order: RankOrder) -> Vec<usize> {
    let beats = |a: f64, b: f64| match order {
        RankOrder::Descending => a > b,
        RankOrder::Ascending => a < b,
    };

    values
        .iter()
        .map(|value| {
            let better = values
                .iter()
                .filter(|other| match (value, other) {
                    (Some(v), Some(o)) => beats(*o, *v),
                    (None, Some(_)) => true,
                    _ => false,
                })
                .count();
            better + 1
        })
        .collect()
}

//! Rolling metric derivation — the transformer stage.
//!
//! Takes one symbol's observations in ascending date order (assumed sorted
//! and gap-free) and produces the same rows augmented with derived metrics:
//! moving averages, rolling volatility, daily changes, volume ratio, and
//! the normalized intraday range.
//!
//! Edge-case policy: a rolling statistic is `None` until its window is full,
//! `daily_change` is `None` for the first row, and any ratio whose
//! denominator is zero or missing propagates `None` rather than raising.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MetricRow, Observation};

/// Window sizes for rolling metrics.
///
/// The short window drives the fast moving average and the volume average;
/// the long window drives the slow moving average and volatility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricConfig {
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    #[serde(default = "default_long_window")]
    pub long_window: usize,
}

fn default_short_window() -> usize {
    7
}

fn default_long_window() -> usize {
    30
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            long_window: default_long_window(),
        }
    }
}

/// Metric derivation failure.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("invalid rolling window: {0} (must be >= 1)")]
    InvalidWindow(usize),
}

/// Derive rolling metrics for one symbol's ordered observation series.
///
/// Output rows are one-to-one with the input. The first `window - 1` values
/// of each rolling metric are `None` — window not yet full.
pub fn enrich(
    observations: &[Observation],
    config: &MetricConfig,
) -> Result<Vec<MetricRow>, ComputeError> {
    if config.short_window == 0 {
        return Err(ComputeError::InvalidWindow(config.short_window));
    }
    if config.long_window == 0 {
        return Err(ComputeError::InvalidWindow(config.long_window));
    }

    let closes: Vec<f64> = observations.iter().map(|o| o.close).collect();
    let volumes: Vec<f64> = observations.iter().map(|o| o.volume as f64).collect();

    let ma_short = rolling_mean(&closes, config.short_window);
    let ma_long = rolling_mean(&closes, config.long_window);
    let volatility = rolling_std(&closes, config.long_window);
    let volume_ma = rolling_mean(&volumes, config.short_window);

    let rows = observations
        .iter()
        .enumerate()
        .map(|(i, obs)| {
            let prev_close = if i > 0 { Some(closes[i - 1]) } else { None };
            let daily_change = prev_close.and_then(|p| safe_div(obs.close - p, p));
            let daily_change_abs = prev_close.map(|p| obs.close - p);
            let volume_ratio = volume_ma[i].and_then(|ma| safe_div(volumes[i], ma));
            let daily_range = safe_div(obs.high - obs.low, obs.close).map(|r| r * 100.0);

            MetricRow {
                symbol: obs.symbol.clone(),
                date: obs.date,
                open: obs.open,
                high: obs.high,
                low: obs.low,
                close: obs.close,
                volume: obs.volume,
                daily_change,
                daily_change_abs,
                volatility_30d: volatility[i],
                ma_7: ma_short[i],
                ma_30: ma_long[i],
                volume_ma_7: volume_ma[i],
                volume_ratio,
                daily_range,
            }
        })
        .collect();

    Ok(rows)
}

/// Division that propagates `None` instead of producing infinities.
fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Rolling arithmetic mean over a trailing window.
///
/// `None` until `window` values are available (first valid index: window - 1).
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    let mut sum: f64 = values.iter().take(window).sum();
    result[window - 1] = Some(sum / window as f64);

    for i in window..n {
        sum = sum - values[i - window] + values[i];
        result[i] = Some(sum / window as f64);
    }

    result
}

/// Rolling population standard deviation over a trailing window.
///
/// Each window is recomputed directly from its values (no running sums).
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
        result[i] = Some(variance.sqrt());
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EPSILON: f64 = 1e-10;

    fn make_observations(closes: &[f64]) -> Vec<Observation> {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Observation {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "assert_approx failed: actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn rolling_mean_basic() {
        let result = rolling_mean(&[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert_approx(result[2].unwrap(), 11.0);
        assert_approx(result[3].unwrap(), 12.0);
        assert_approx(result[4].unwrap(), 13.0);
    }

    #[test]
    fn rolling_mean_of_constant_is_constant() {
        let result = rolling_mean(&[100.0; 10], 7);
        for v in &result[..6] {
            assert!(v.is_none());
        }
        for v in &result[6..] {
            assert_approx(v.unwrap(), 100.0);
        }
    }

    #[test]
    fn rolling_mean_too_few_values() {
        let result = rolling_mean(&[1.0, 2.0], 5);
        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn rolling_std_of_constant_is_zero() {
        let result = rolling_std(&[42.0; 8], 5);
        for v in &result[..4] {
            assert!(v.is_none());
        }
        for v in &result[4..] {
            assert_approx(v.unwrap(), 0.0);
        }
    }

    #[test]
    fn rolling_std_population() {
        // Population stddev of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = rolling_std(&values, 8);
        assert_approx(result[7].unwrap(), 2.0);
    }

    #[test]
    fn enrich_percent_change_exact() {
        let obs = make_observations(&[100.0, 105.0]);
        let rows = enrich(&obs, &MetricConfig::default()).unwrap();
        assert!(rows[0].daily_change.is_none());
        assert!(rows[0].daily_change_abs.is_none());
        assert_approx(rows[1].daily_change.unwrap(), 0.05);
        assert_approx(rows[1].daily_change_abs.unwrap(), 5.0);
    }

    #[test]
    fn enrich_warmup_boundaries() {
        let config = MetricConfig {
            short_window: 3,
            long_window: 5,
        };
        let obs = make_observations(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let rows = enrich(&obs, &config).unwrap();

        // Short-window metrics defined from index 2.
        assert!(rows[1].ma_7.is_none());
        assert!(rows[2].ma_7.is_some());
        assert!(rows[1].volume_ratio.is_none());
        assert!(rows[2].volume_ratio.is_some());

        // Long-window metrics defined from index 4.
        assert!(rows[3].ma_30.is_none());
        assert!(rows[4].ma_30.is_some());
        assert!(rows[3].volatility_30d.is_none());
        assert!(rows[4].volatility_30d.is_some());
    }

    #[test]
    fn enrich_constant_volume_ratio_is_one() {
        let config = MetricConfig {
            short_window: 3,
            long_window: 5,
        };
        let obs = make_observations(&[100.0; 6]);
        let rows = enrich(&obs, &config).unwrap();
        for row in &rows[2..] {
            assert_approx(row.volume_ratio.unwrap(), 1.0);
        }
    }

    #[test]
    fn enrich_daily_range_normalized() {
        let obs = make_observations(&[50.0]);
        let rows = enrich(&obs, &MetricConfig::default()).unwrap();
        // high - low = 2.0, close = 50.0 → 4%
        assert_approx(rows[0].daily_range.unwrap(), 4.0);
    }

    #[test]
    fn enrich_zero_close_propagates_none() {
        let mut obs = make_observations(&[0.0, 10.0]);
        obs[0].high = 1.0;
        obs[0].low = 0.0;
        let rows = enrich(&obs, &MetricConfig::default()).unwrap();
        // pct change vs a zero close and range over a zero close are undefined
        assert!(rows[0].daily_range.is_none());
        assert!(rows[1].daily_change.is_none());
        assert_approx(rows[1].daily_change_abs.unwrap(), 10.0);
    }

    #[test]
    fn enrich_zero_volume_ratio_is_none() {
        let config = MetricConfig {
            short_window: 2,
            long_window: 5,
        };
        let mut obs = make_observations(&[10.0, 11.0, 12.0]);
        for o in &mut obs {
            o.volume = 0;
        }
        let rows = enrich(&obs, &config).unwrap();
        // Rolling volume mean is zero, so the ratio is undefined.
        assert!(rows[2].volume_ma_7.is_some());
        assert!(rows[2].volume_ratio.is_none());
    }

    #[test]
    fn enrich_rejects_zero_window() {
        let config = MetricConfig {
            short_window: 0,
            long_window: 30,
        };
        let obs = make_observations(&[1.0, 2.0]);
        assert!(matches!(
            enrich(&obs, &config),
            Err(ComputeError::InvalidWindow(0))
        ));
    }

    #[test]
    fn enrich_empty_series() {
        let rows = enrich(&[], &MetricConfig::default()).unwrap();
        assert!(rows.is_empty());
    }
}

//! End-to-end pipeline tests: mock provider → collect → persist → report.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use marketscope_core::collect::collect_universe;
use marketscope_core::config::{AnalysisConfig, Universe};
use marketscope_core::data::provider::{FetchError, MarketDataProvider, SilentProgress};
use marketscope_core::domain::{EntityProfile, Observation};
use marketscope_core::metrics::MetricConfig;
use marketscope_core::report::{
    competitive_view, executive_view, risk_view, timeseries_view, RiskLevel,
};
use marketscope_core::store::MarketStore;

/// Provider backed by canned series; symbols absent from the map return
/// an empty result (NoData).
struct MockProvider {
    series: BTreeMap<String, Vec<f64>>,
}

impl MockProvider {
    fn new(series: &[(&str, Vec<f64>)]) -> Self {
        Self {
            series: series
                .iter()
                .map(|(s, v)| (s.to_string(), v.clone()))
                .collect(),
        }
    }
}

impl MarketDataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        _lookback_days: u32,
    ) -> Result<Vec<Observation>, FetchError> {
        let closes = self.series.get(symbol).ok_or_else(|| FetchError::NoData {
            symbol: symbol.to_string(),
        })?;

        let base_date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        Ok(closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Observation {
                symbol: symbol.to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect())
    }

    fn fetch_profile(&self, symbol: &str, company: &str) -> Result<EntityProfile, FetchError> {
        Ok(EntityProfile {
            symbol: symbol.to_string(),
            company: company.to_string(),
            sector: "Technology".into(),
            industry: "Hardware".into(),
            country: "United States".into(),
            market_cap: 1_000_000_000,
            revenue: 0,
            employees: 0,
            collected_at: NaiveDate::from_ymd_opt(2025, 8, 30).unwrap(),
        })
    }
}

fn universe_of(symbols: &[&str]) -> Universe {
    Universe {
        companies: symbols
            .iter()
            .map(|s| (s.to_string(), format!("{s} Corp")))
            .collect(),
    }
}

fn test_config(symbols: &[&str], short_window: usize, long_window: usize) -> AnalysisConfig {
    AnalysisConfig {
        universe: universe_of(symbols),
        metric: MetricConfig {
            short_window,
            long_window,
        },
        ..AnalysisConfig::default()
    }
}

#[test]
fn scenario_constant_series_produces_flat_metrics() {
    // 3 entities, 10 days of constant close 100 and volume 1000.
    let provider = MockProvider::new(&[
        ("AAA", vec![100.0; 10]),
        ("BBB", vec![100.0; 10]),
        ("CCC", vec![100.0; 10]),
    ]);
    let config = test_config(&["AAA", "BBB", "CCC"], 7, 7);

    let outcome = collect_universe(&provider, &config, &SilentProgress);
    assert_eq!(outcome.summary.succeeded, 3);
    assert_eq!(outcome.rows.len(), 30);

    for chunk in outcome.rows.chunks(10) {
        // Rolling mean equals the constant once the window is full.
        for row in &chunk[..6] {
            assert!(row.ma_7.is_none());
            assert!(row.volume_ratio.is_none());
        }
        for row in &chunk[6..] {
            assert!((row.ma_7.unwrap() - 100.0).abs() < 1e-10);
            assert!((row.volume_ratio.unwrap() - 1.0).abs() < 1e-10);
            assert!(row.volatility_30d.unwrap().abs() < 1e-10);
        }

        // Percent change is zero for every row after the first.
        assert!(chunk[0].daily_change.is_none());
        for row in &chunk[1..] {
            assert!(row.daily_change.unwrap().abs() < 1e-12);
        }
    }
}

#[test]
fn scenario_empty_fetch_is_skipped_not_fatal() {
    // GONE has no series: the provider reports NoData and the batch moves on.
    let provider = MockProvider::new(&[
        ("AAA", vec![100.0, 101.0, 102.0]),
        ("BBB", vec![50.0, 51.0, 52.0]),
    ]);
    let config = test_config(&["AAA", "BBB", "GONE"], 2, 3);

    let outcome = collect_universe(&provider, &config, &SilentProgress);
    assert_eq!(outcome.summary.total, 3);
    assert_eq!(outcome.summary.succeeded, 2);
    assert_eq!(outcome.summary.failed, 1);
    assert_eq!(outcome.summary.errors.len(), 1);
    assert_eq!(outcome.summary.errors[0].0, "GONE");
    assert!(matches!(
        outcome.summary.errors[0].1,
        FetchError::NoData { .. }
    ));

    // The persisted store has no rows for the skipped symbol.
    let mut store = MarketStore::open_in_memory().unwrap();
    store.replace_observations(&outcome.rows).unwrap();
    store.replace_profiles(&outcome.profiles).unwrap();
    store.create_indexes().unwrap();

    assert_eq!(store.symbol_count().unwrap(), 2);
    assert_eq!(store.observation_count().unwrap(), 6);

    let joined = store
        .joined_rows(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        .unwrap();
    assert!(joined.iter().all(|r| r.symbol != "GONE"));
}

#[test]
fn scenario_profile_collected_despite_history_failure() {
    // History and profiles are fetched independently: a symbol whose history
    // fetch fails still gets its profile attempted, while contributing no
    // observation rows.
    let provider = MockProvider::new(&[("AAA", vec![100.0, 101.0, 102.0])]);
    let config = test_config(&["AAA", "GONE"], 2, 3);

    let outcome = collect_universe(&provider, &config, &SilentProgress);
    assert_eq!(outcome.summary.succeeded, 1);
    assert_eq!(outcome.summary.failed, 1);

    assert!(outcome.profiles.iter().any(|p| p.symbol == "GONE"));
    assert!(outcome.rows.iter().all(|r| r.symbol != "GONE"));
}

#[test]
fn scenario_tied_mean_returns_share_competition_rank() {
    // AAA and CCC both gain 2% per day, BBB loses 1% per day.
    let step = |start: f64, rate: f64, n: usize| -> Vec<f64> {
        (0..n).map(|i| start * (1.0 + rate).powi(i as i32)).collect()
    };
    let provider = MockProvider::new(&[
        ("AAA", step(100.0, 0.02, 5)),
        ("BBB", step(100.0, -0.01, 5)),
        ("CCC", step(200.0, 0.02, 5)),
    ]);
    let config = test_config(&["AAA", "BBB", "CCC"], 2, 3);

    let outcome = collect_universe(&provider, &config, &SilentProgress);
    let mut store = MarketStore::open_in_memory().unwrap();
    store.replace_observations(&outcome.rows).unwrap();
    store.replace_profiles(&outcome.profiles).unwrap();

    let joined = store
        .joined_rows(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        .unwrap();
    let view = competitive_view(&joined, "AAPL");

    let ranks: BTreeMap<&str, usize> = view
        .iter()
        .map(|r| (r.symbol.as_str(), r.performance_rank))
        .collect();
    // Competition ranking: tied best entities share rank 1, next gets 3.
    assert_eq!(ranks["AAA"], 1);
    assert_eq!(ranks["CCC"], 1);
    assert_eq!(ranks["BBB"], 3);
}

#[test]
fn full_pipeline_to_report_views() {
    let provider = MockProvider::new(&[
        ("AAA", vec![100.0, 110.0, 99.0, 120.0, 121.0]),
        ("BBB", vec![50.0, 50.5, 50.2, 50.1, 50.3]),
    ]);
    let config = test_config(&["AAA", "BBB"], 2, 3);

    let outcome = collect_universe(&provider, &config, &SilentProgress);
    assert!(outcome.summary.all_succeeded());
    assert_eq!(outcome.summary.metric_fallbacks, 0);

    let mut store = MarketStore::open_in_memory().unwrap();
    store.replace_observations(&outcome.rows).unwrap();
    store.replace_profiles(&outcome.profiles).unwrap();
    store.create_indexes().unwrap();

    let joined = store
        .joined_rows(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        .unwrap();
    assert_eq!(joined.len(), 10);

    let executive = executive_view(&joined, &config.risk, &config.performance);
    assert_eq!(executive.len(), 10);
    // Ordered date descending: first rows are the last trading day.
    assert_eq!(
        executive[0].date,
        NaiveDate::from_ymd_opt(2025, 6, 6).unwrap()
    );

    let timeseries = timeseries_view(&joined);
    let aaa_last = timeseries
        .iter()
        .filter(|r| r.symbol == "AAA")
        .next_back()
        .unwrap();
    assert!((aaa_last.cumulative_return_pct.unwrap() - 21.0).abs() < 1e-9);

    let competitive = competitive_view(&joined, "AAA");
    assert_eq!(competitive.len(), 2);
    // AAA swings far more than BBB, so BBB is the stability leader.
    let bbb = competitive.iter().find(|r| r.symbol == "BBB").unwrap();
    assert_eq!(bbb.stability_rank, 1);
    assert_eq!(bbb.company_type, "Competitor");
    let aaa = competitive.iter().find(|r| r.symbol == "AAA").unwrap();
    assert_eq!(aaa.company_type, "Focus");

    let risk = risk_view(&joined, &config.risk_levels, store.total_market_cap().unwrap());
    assert_eq!(risk.len(), 10);
    // Each entity holds half the tracked market cap.
    for row in &risk {
        assert!((row.portfolio_weight_pct.unwrap() - 50.0).abs() < 1e-9);
    }
    // Warmup rows have no volatility and land in the lowest tier.
    let bbb_first = risk.iter().find(|r| r.symbol == "BBB").unwrap();
    assert!(bbb_first.volatility_pct.is_none());
    assert_eq!(bbb_first.risk_level, RiskLevel::Low);
    // Once returns exist, the VaR estimate is defined.
    let aaa_last = risk.iter().filter(|r| r.symbol == "AAA").next_back().unwrap();
    assert!(aaa_last.var_95_pct.is_some());
}

#[test]
fn trailing_window_excludes_old_rows() {
    let provider = MockProvider::new(&[("AAA", vec![100.0; 10])]);
    let config = test_config(&["AAA"], 2, 3);

    let outcome = collect_universe(&provider, &config, &SilentProgress);
    let mut store = MarketStore::open_in_memory().unwrap();
    store.replace_observations(&outcome.rows).unwrap();
    store.replace_profiles(&outcome.profiles).unwrap();

    // Series spans 2025-06-02..=2025-06-11; cut the first five days off.
    let since = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
    let joined = store.joined_rows(since).unwrap();
    assert_eq!(joined.len(), 5);
    assert!(joined.iter().all(|r| r.date >= since));
}

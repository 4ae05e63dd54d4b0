//! Batch collection driver — coordinates the per-entity fetch/transform loop.
//!
//! Entities are processed strictly one at a time. Every per-entity failure is
//! recorded and skipped; one bad symbol never aborts the batch. The only
//! aggregate failure signal is the attempted/succeeded summary.

use crate::config::AnalysisConfig;
use crate::data::provider::{CollectProgress, FetchError, MarketDataProvider};
use crate::domain::{EntityProfile, MetricRow};
use crate::metrics;

/// Everything a collection run produced: transformed rows, profile
/// snapshots, and the batch summary.
#[derive(Debug)]
pub struct CollectOutcome {
    pub rows: Vec<MetricRow>,
    pub profiles: Vec<EntityProfile>,
    pub summary: CollectSummary,
}

/// Summary of a batch collection run.
#[derive(Debug)]
pub struct CollectSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entities whose metric derivation fell back to raw rows.
    pub metric_fallbacks: usize,
    pub errors: Vec<(String, FetchError)>,
}

impl CollectSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64 * 100.0
        }
    }
}

/// Collect history and profiles for every symbol in the configured universe.
///
/// Per entity: fetch history → derive metrics → fetch profile. History and
/// profile are collected independently: a history failure marks the entity
/// failed but the profile is still attempted, and a profile failure alone
/// never fails the entity. A metric-derivation failure keeps the raw rows
/// unenriched rather than dropping the entity.
pub fn collect_universe(
    provider: &dyn MarketDataProvider,
    config: &AnalysisConfig,
    progress: &dyn CollectProgress,
) -> CollectOutcome {
    let total = config.universe.len();
    let mut rows: Vec<MetricRow> = Vec::new();
    let mut profiles: Vec<EntityProfile> = Vec::new();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut metric_fallbacks = 0;
    let mut errors: Vec<(String, FetchError)> = Vec::new();

    for (i, (symbol, company)) in config.universe.companies.iter().enumerate() {
        progress.on_start(symbol, i, total);

        let result = provider
            .fetch_history(symbol, config.lookback_days)
            .map(|mut observations| {
                observations.sort_by_key(|o| o.date);
                observations
            });

        match result {
            Ok(observations) => {
                let day_count = observations.len();
                match metrics::enrich(&observations, &config.metric) {
                    Ok(enriched) => rows.extend(enriched),
                    Err(_) => {
                        // Named fallback: keep the raw rows unenriched.
                        metric_fallbacks += 1;
                        rows.extend(observations.into_iter().map(MetricRow::from_observation));
                    }
                }
                succeeded += 1;
                progress.on_complete(symbol, &Ok(day_count));
            }
            Err(e) => {
                failed += 1;
                let result: Result<usize, FetchError> = Err(e);
                progress.on_complete(symbol, &result);
                if let Err(e) = result {
                    errors.push((symbol.clone(), e));
                }
            }
        }

        // Profiles are best-effort: a missing profile does not fail the entity.
        if let Ok(profile) = provider.fetch_profile(symbol, company) {
            profiles.push(profile);
        }
    }

    progress.on_batch_complete(succeeded, failed, total);

    CollectOutcome {
        rows,
        profiles,
        summary: CollectSummary {
            total,
            succeeded,
            failed,
            metric_fallbacks,
            errors,
        },
    }
}

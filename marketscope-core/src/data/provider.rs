//! Data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over upstream sources so the batch
//! driver can be tested against a mock without touching the network.

use thiserror::Error;

use crate::domain::{EntityProfile, Observation};

/// Structured error types for fetch operations.
///
/// All variants are non-fatal at the batch level: the driver logs the error,
/// skips the entity, and continues.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no data for symbol: {symbol}")]
    NoData { symbol: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    ResponseFormat(String),
}

impl FetchError {
    /// Error message truncated for log lines.
    pub fn truncated(&self) -> String {
        let msg = self.to_string();
        if msg.chars().count() > 100 {
            let head: String = msg.chars().take(100).collect();
            format!("{head}...")
        } else {
            msg
        }
    }
}

/// Trait for market data sources (Yahoo Finance, mocks in tests).
///
/// Implementations handle the specifics of one upstream API. There is no
/// retry or rate limiting at this layer — a failed fetch surfaces as a
/// FetchError and the entity is skipped.
pub trait MarketDataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily observations for a symbol over a trailing window,
    /// ascending by date. An empty upstream result is `NoData`.
    fn fetch_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<Observation>, FetchError>;

    /// Fetch the descriptive profile snapshot for a symbol.
    fn fetch_profile(&self, symbol: &str, company: &str) -> Result<EntityProfile, FetchError>;
}

/// Progress callback for multi-symbol collection runs.
pub trait CollectProgress {
    /// Called when starting to process a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol finishes (fetch + transform).
    fn on_complete(&self, symbol: &str, result: &Result<usize, FetchError>);

    /// Called once the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl CollectProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Processing {symbol}...", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, result: &Result<usize, FetchError>) {
        match result {
            Ok(days) => println!("  SUCCESS: {symbol} - {days} days"),
            Err(e) => println!("  ERROR: {symbol} - {}", e.truncated()),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nCollection complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that stays quiet (tests, scripted runs).
pub struct SilentProgress;

impl CollectProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(&self, _symbol: &str, _result: &Result<usize, FetchError>) {}
    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_caps_long_messages() {
        let err = FetchError::Network("x".repeat(300));
        let msg = err.truncated();
        assert_eq!(msg.len(), 103); // 100 chars + "..."
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn truncated_keeps_short_messages() {
        let err = FetchError::NoData {
            symbol: "AAPL".into(),
        };
        assert_eq!(err.truncated(), "no data for symbol: AAPL");
    }
}

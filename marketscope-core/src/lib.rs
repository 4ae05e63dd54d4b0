//! MarketScope Core — market intelligence collection pipeline.
//!
//! This crate contains the four stages of the batch pipeline:
//! - Fetcher: the `MarketDataProvider` trait and its Yahoo Finance implementation
//! - Transformer: rolling metrics (moving averages, volatility, volume ratios)
//! - Persister: replace-all SQLite store plus timestamped/latest CSV snapshots
//! - Reporter: read-only denormalized views (executive, competitive, risk, time series)
//!
//! Everything runs single-threaded and blocking: entities are processed one
//! at a time, and a failure for one entity never aborts the batch.

pub mod collect;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod metrics;
pub mod report;
pub mod store;

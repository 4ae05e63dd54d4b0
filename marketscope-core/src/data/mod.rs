//! Data acquisition — provider trait and the Yahoo Finance implementation.

pub mod provider;
pub mod yahoo;

pub use provider::{CollectProgress, FetchError, MarketDataProvider, StdoutProgress};
pub use yahoo::YahooProvider;

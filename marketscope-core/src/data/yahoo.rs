//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV history from the v8 chart API and company profiles
//! from the v10 quoteSummary API. One blocking request per call, with a
//! defensive 30-second timeout.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes; parse failures surface as `FetchError::ResponseFormat`.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

use super::provider::{FetchError, MarketDataProvider};
use crate::domain::{EntityProfile, Observation};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance v10 quoteSummary API response.
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(rename = "summaryProfile")]
    summary_profile: Option<SummaryProfile>,
    price: Option<PriceModule>,
    #[serde(rename = "financialData")]
    financial_data: Option<FinancialData>,
}

#[derive(Debug, Deserialize)]
struct SummaryProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
    #[serde(rename = "fullTimeEmployees")]
    full_time_employees: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PriceModule {
    #[serde(rename = "marketCap")]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct FinancialData {
    #[serde(rename = "totalRevenue")]
    total_revenue: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .expect("failed to build HTTP client");

        Self { client }
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        let end_ts = end.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn summary_url(symbol: &str) -> String {
        format!(
            "https://query2.finance.yahoo.com/v10/finance/quoteSummary/{symbol}\
             ?modules=summaryProfile,price,financialData"
        )
    }

    /// Parse the chart API response into observations.
    fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<Observation>, FetchError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    FetchError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    FetchError::ResponseFormat(format!("{}: {}", err.code, err.description))
                }
            } else {
                FetchError::ResponseFormat("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormat("result array is empty".into()))?;

        let timestamps = data.timestamp.ok_or_else(|| FetchError::NoData {
            symbol: symbol.to_string(),
        })?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormat("no quote data".into()))?;

        let mut observations = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| FetchError::ResponseFormat(format!("invalid timestamp: {ts}")))?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Skip bars with no quote at all (holidays/non-trading days)
            let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
                continue;
            };

            observations.push(Observation {
                symbol: symbol.to_string(),
                date,
                open,
                high,
                low,
                close,
                volume: volume.unwrap_or(0),
            });
        }

        if observations.is_empty() {
            return Err(FetchError::NoData {
                symbol: symbol.to_string(),
            });
        }

        Ok(observations)
    }

    /// Parse the quoteSummary response into a profile snapshot.
    ///
    /// Missing modules/fields fall back to 0 / "Unknown" — a sparse profile
    /// is still a usable profile.
    fn parse_summary(
        symbol: &str,
        company: &str,
        resp: SummaryResponse,
        collected_at: NaiveDate,
    ) -> Result<EntityProfile, FetchError> {
        let result = resp.quote_summary.result.ok_or_else(|| {
            if let Some(err) = resp.quote_summary.error {
                FetchError::ResponseFormat(format!("{}: {}", err.code, err.description))
            } else {
                FetchError::NoData {
                    symbol: symbol.to_string(),
                }
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::ResponseFormat("summary result array is empty".into()))?;

        let profile = data.summary_profile;
        let unknown = || "Unknown".to_string();

        Ok(EntityProfile {
            symbol: symbol.to_string(),
            company: company.to_string(),
            sector: profile
                .as_ref()
                .and_then(|p| p.sector.clone())
                .unwrap_or_else(unknown),
            industry: profile
                .as_ref()
                .and_then(|p| p.industry.clone())
                .unwrap_or_else(unknown),
            country: profile
                .as_ref()
                .and_then(|p| p.country.clone())
                .unwrap_or_else(unknown),
            market_cap: data
                .price
                .and_then(|p| p.market_cap)
                .and_then(|v| v.raw)
                .map(|v| v as i64)
                .unwrap_or(0),
            revenue: data
                .financial_data
                .and_then(|f| f.total_revenue)
                .and_then(|v| v.raw)
                .map(|v| v as i64)
                .unwrap_or(0),
            employees: profile
                .as_ref()
                .and_then(|p| p.full_time_employees)
                .unwrap_or(0),
            collected_at,
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<T, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {status} for {symbol}")));
        }

        resp.json()
            .map_err(|e| FetchError::ResponseFormat(format!("parse response for {symbol}: {e}")))
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> Result<Vec<Observation>, FetchError> {
        let end = Utc::now().date_naive();
        let start = end - chrono::Duration::days(i64::from(lookback_days));
        let chart: ChartResponse = self.get_json(&Self::chart_url(symbol, start, end), symbol)?;
        let mut observations = Self::parse_chart(symbol, chart)?;
        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }

    fn fetch_profile(&self, symbol: &str, company: &str) -> Result<EntityProfile, FetchError> {
        let summary: SummaryResponse = self.get_json(&Self::summary_url(symbol), symbol)?;
        Self::parse_summary(symbol, company, summary, Utc::now().date_naive())
    }
}

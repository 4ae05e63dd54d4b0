//! Analysis configuration — company universe and pipeline parameters.
//!
//! The universe is stored as a TOML config file mapping ticker symbols to
//! company names. All thresholds and window sizes live here and are passed
//! into components explicitly; there is no process-wide constants table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::metrics::MetricConfig;

/// The universe of tracked companies: symbol → company name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Universe {
    pub companies: BTreeMap<String, String>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read universe file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse universe TOML: {e}"))
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize universe: {e}"))
    }

    /// All tracked symbols, in deterministic (sorted) order.
    pub fn symbols(&self) -> Vec<&str> {
        self.companies.keys().map(|s| s.as_str()).collect()
    }

    /// Company name for a symbol, if tracked.
    pub fn company(&self, symbol: &str) -> Option<&str> {
        self.companies.get(symbol).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// Default universe: technology companies and PC-market competitors.
    pub fn default_tech() -> Self {
        let pairs = [
            ("LNVGY", "Lenovo Group Limited"),
            ("AAPL", "Apple Inc."),
            ("MSFT", "Microsoft Corporation"),
            ("HPQ", "HP Inc."),
            ("DELL", "Dell Technologies Inc."),
            ("IBM", "International Business Machines"),
            ("INTC", "Intel Corporation"),
            ("AMD", "Advanced Micro Devices"),
            ("NVDA", "NVIDIA Corporation"),
            ("QCOM", "Qualcomm Incorporated"),
            ("SONY", "Sony Group Corporation"),
            ("GOOGL", "Alphabet Inc."),
            ("AMZN", "Amazon.com Inc."),
            ("TSLA", "Tesla Inc."),
            ("META", "Meta Platforms Inc."),
        ];
        Self {
            companies: pairs
                .into_iter()
                .map(|(s, c)| (s.to_string(), c.to_string()))
                .collect(),
        }
    }
}

/// Volatility thresholds for risk bucketing.
///
/// Strict-greater comparisons evaluated in descending order, first match
/// wins: volatility above `high` is High risk, above `medium` is Medium,
/// everything else (including exactly `high`) falls through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: 0.04,
            medium: 0.025,
        }
    }
}

/// Daily-return threshold separating Strong Up/Down from plain Up/Down.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    pub strong: f64,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self { strong: 0.02 }
    }
}

/// Four-tier thresholds for the risk analysis view, in volatility percent.
///
/// Same strict-greater, first-match-wins rule as `RiskThresholds`, one tier
/// deeper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub very_high: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            very_high: 4.0,
            high: 2.5,
            medium: 1.5,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub universe: Universe,
    /// Historical data period fetched per symbol.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default)]
    pub metric: MetricConfig,
    /// Trailing window applied by report views.
    #[serde(default = "default_report_window_days")]
    pub report_window_days: i64,
    #[serde(default)]
    pub risk: RiskThresholds,
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
    #[serde(default)]
    pub performance: PerformanceThresholds,
    /// Symbol the competitive view singles out against the rest of the
    /// universe (the original analysis tracked Lenovo vs. competitors).
    #[serde(default = "default_focus_symbol")]
    pub focus_symbol: String,
}

fn default_focus_symbol() -> String {
    "LNVGY".to_string()
}

fn default_lookback_days() -> u32 {
    90
}

fn default_report_window_days() -> i64 {
    90
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            universe: Universe::default_tech(),
            lookback_days: default_lookback_days(),
            metric: MetricConfig::default(),
            report_window_days: default_report_window_days(),
            risk: RiskThresholds::default(),
            risk_levels: RiskLevelThresholds::default(),
            performance: PerformanceThresholds::default(),
            focus_symbol: default_focus_symbol(),
        }
    }
}

impl AnalysisConfig {
    /// Load a full config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("parse config TOML: {e}"))
    }
}

use analysis_core::{AnalysisError, Bar};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Length of daily history requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRange {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
}

impl HistoryRange {
    /// Parse a Yahoo-style period string ("6mo", "1y", ...)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "1mo" => Some(HistoryRange::OneMonth),
            "3mo" => Some(HistoryRange::ThreeMonths),
            "6mo" => Some(HistoryRange::SixMonths),
            "1y" => Some(HistoryRange::OneYear),
            "2y" => Some(HistoryRange::TwoYears),
            "5y" => Some(HistoryRange::FiveYears),
            _ => None,
        }
    }

    pub fn as_yahoo(&self) -> &'static str {
        match self {
            HistoryRange::OneMonth => "1mo",
            HistoryRange::ThreeMonths => "3mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
            HistoryRange::TwoYears => "2y",
            HistoryRange::FiveYears => "5y",
        }
    }

    /// Calendar days covered by the range
    pub fn days(&self) -> i64 {
        match self {
            HistoryRange::OneMonth => 30,
            HistoryRange::ThreeMonths => 91,
            HistoryRange::SixMonths => 182,
            HistoryRange::OneYear => 365,
            HistoryRange::TwoYears => 730,
            HistoryRange::FiveYears => 1826,
        }
    }
}

impl Default for HistoryRange {
    fn default() -> Self {
        HistoryRange::OneYear
    }
}

/// A provider of daily OHLC history
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// Daily bars in chronological order. An empty vector means the provider
    /// knows nothing about the symbol.
    async fn daily_bars(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Bar>, AnalysisError>;
}

use analysis_core::{AnalysisError, Bar};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::source::{HistoryRange, PriceSource};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Secondary price source: Alpha Vantage daily series, scoped to one market.
#[derive(Clone)]
pub struct AlphaVantageSource {
    api_key: Option<String>,
    market: String,
    client: Client,
    base_url: String,
}

impl AlphaVantageSource {
    /// `market` is the exchange code Alpha Vantage uses for the market the
    /// dashboard tracks (e.g. `SAU`).
    pub fn new(api_key: Option<String>, market: impl Into<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            market: market.into(),
            client: Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Replace a symbol's exchange suffix with the configured market code:
/// `2222.SR` becomes `2222.SAU`.
pub fn scope_symbol(symbol: &str, market: &str) -> String {
    let market = market.trim();
    if market.is_empty() {
        return symbol.to_string();
    }

    let base = symbol.split_once('.').map(|(base, _)| base).unwrap_or(symbol);
    format!("{}.{}", base, market)
}

#[async_trait]
impl PriceSource for AlphaVantageSource {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    async fn daily_bars(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Bar>, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AnalysisError::NotConfigured("Alpha Vantage API key not set".to_string())
        })?;

        let scoped = scope_symbol(symbol, &self.market);
        tracing::debug!("Alpha Vantage lookup {} -> {}", symbol, scoped);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", scoped.as_str()),
                ("outputsize", "full"),
                ("apikey", api_key),
            ])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let since = (Utc::now() - Duration::days(range.days())).date_naive();
        parse_daily_series(&json, since)
    }
}

/// Parse a `TIME_SERIES_DAILY` payload, keeping bars on or after `since`.
pub fn parse_daily_series(json: &Value, since: NaiveDate) -> Result<Vec<Bar>, AnalysisError> {
    if let Some(error) = json.get("Error Message") {
        return Err(AnalysisError::ApiError(format!("Alpha Vantage error: {}", error)));
    }

    if let Some(note) = json.get("Note").or_else(|| json.get("Information")) {
        return Err(AnalysisError::ApiError(format!("Alpha Vantage rate limit: {}", note)));
    }

    let series = json
        .get("Time Series (Daily)")
        .and_then(|v| v.as_object())
        .ok_or_else(|| AnalysisError::InvalidData("No daily series found".to_string()))?;

    let field = |values: &Value, key: &str| -> Option<f64> {
        values.get(key).and_then(|v| v.as_str()).and_then(|s| s.parse().ok())
    };

    let mut bars = Vec::new();
    for (date, values) in series {
        let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            continue;
        };
        if day < since {
            continue;
        }
        let Some(timestamp) = day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()) else {
            continue;
        };
        let Some(close) = field(values, "4. close") else {
            continue;
        };

        bars.push(Bar {
            timestamp,
            open: field(values, "1. open").unwrap_or(close),
            high: field(values, "2. high").unwrap_or(close),
            low: field(values, "3. low").unwrap_or(close),
            close,
            volume: field(values, "5. volume").unwrap_or(0.0),
        });
    }

    // Provider returns most recent first
    bars.sort_by_key(|b| b.timestamp);

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_symbol_swaps_suffix() {
        assert_eq!(scope_symbol("2222.SR", "SAU"), "2222.SAU");
        assert_eq!(scope_symbol("1120", "SAU"), "1120.SAU");
        assert_eq!(scope_symbol("2222.SR", ""), "2222.SR");
    }

    #[test]
    fn test_parse_daily_series_orders_and_filters() {
        let json: Value = serde_json::from_str(
            r#"{
                "Meta Data": {"2. Symbol": "2222.SAU"},
                "Time Series (Daily)": {
                    "2024-05-03": {"1. open": "28.30", "2. high": "28.60", "3. low": "28.10", "4. close": "28.45", "5. volume": "1500000"},
                    "2024-05-02": {"1. open": "28.00", "2. high": "28.40", "3. low": "27.90", "4. close": "28.20", "5. volume": "1200000"},
                    "2023-01-02": {"1. open": "35.00", "2. high": "35.50", "3. low": "34.90", "4. close": "35.20", "5. volume": "900000"}
                }
            }"#,
        )
        .unwrap();

        let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = parse_daily_series(&json, since).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 28.20);
        assert_eq!(bars[1].close, 28.45);
        assert_eq!(bars[1].volume, 1_500_000.0);
    }

    #[test]
    fn test_parse_daily_series_surfaces_errors() {
        let json: Value = serde_json::from_str(
            r#"{"Error Message": "Invalid API call."}"#,
        )
        .unwrap();
        let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(parse_daily_series(&json, since).is_err());

        let json: Value = serde_json::from_str(r#"{"Note": "Thank you for using Alpha Vantage!"}"#).unwrap();
        let err = parse_daily_series(&json, since).unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let source = AlphaVantageSource::new(None, "SAU");
        let err = source.daily_bars("2222.SR", HistoryRange::OneYear).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NotConfigured(_)));
    }
}

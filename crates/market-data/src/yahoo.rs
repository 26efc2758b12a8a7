use analysis_core::{AnalysisError, Bar};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::source::{HistoryRange, PriceSource};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Primary price source: the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new() -> Self {
        Self::with_base_url(CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for YahooChartSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for YahooChartSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn daily_bars(&self, symbol: &str, range: HistoryRange) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!("{}/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", range.as_yahoo()), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let status = response.status();
        let json: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("HTTP {}: {}", status, e)))?;

        parse_chart(symbol, &json)
    }
}

/// Parse a chart payload into bars, auto-adjusting OHLC by the
/// adjusted-close ratio when the payload carries one.
pub fn parse_chart(symbol: &str, json: &Value) -> Result<Vec<Bar>, AnalysisError> {
    let chart = json
        .get("chart")
        .ok_or_else(|| AnalysisError::InvalidData("Missing chart object".to_string()))?;

    if let Some(error) = chart.get("error").filter(|e| !e.is_null()) {
        let description = error
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("unknown error");
        return Err(AnalysisError::ApiError(format!(
            "Yahoo error for {}: {}",
            symbol, description
        )));
    }

    let result = match chart
        .get("result")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
    {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };

    let timestamps = match result.get("timestamp").and_then(|v| v.as_array()) {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let quote = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::InvalidData("No quote data found".to_string()))?;

    let column = |name: &str| -> Vec<Option<f64>> {
        quote
            .get(name)
            .and_then(|v| v.as_array())
            .map(|values| values.iter().map(|v| v.as_f64()).collect())
            .unwrap_or_default()
    };

    let opens = column("open");
    let highs = column("high");
    let lows = column("low");
    let closes = column("close");
    let volumes = column("volume");

    let adj_closes: Option<Vec<Option<f64>>> = result
        .get("indicators")
        .and_then(|v| v.get("adjclose"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("adjclose"))
        .and_then(|v| v.as_array())
        .map(|values| values.iter().map(|v| v.as_f64()).collect());

    let mut bars = Vec::with_capacity(timestamps.len());

    for (i, ts) in timestamps.iter().enumerate() {
        // Rows with no close (holidays, partial sessions) carry no information
        let (Some(ts), Some(close)) = (ts.as_i64(), closes.get(i).copied().flatten()) else {
            continue;
        };
        let Some(timestamp) = DateTime::from_timestamp(ts, 0) else {
            continue;
        };

        let adjusted_close = adj_closes
            .as_ref()
            .and_then(|adj| adj.get(i).copied().flatten())
            .unwrap_or(close);
        let ratio = if close != 0.0 { adjusted_close / close } else { 1.0 };

        let open = opens.get(i).copied().flatten().unwrap_or(close);
        let high = highs.get(i).copied().flatten().unwrap_or(close);
        let low = lows.get(i).copied().flatten().unwrap_or(close);

        bars.push(Bar {
            timestamp,
            open: open * ratio,
            high: high * ratio,
            low: low * ratio,
            close: adjusted_close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0.0),
        });
    }

    Ok(bars)
}

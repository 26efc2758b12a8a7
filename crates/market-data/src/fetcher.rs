use analysis_core::{AnalysisError, PriceSeries, TtlCache};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::source::{HistoryRange, PriceSource};

/// Default freshness window for fetched series
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch {symbol}: {}", .errors.join("; "))]
    AllSourcesFailed { symbol: String, errors: Vec<String> },

    #[error("Failed to compute indicators for {symbol}: {source}")]
    Indicators {
        symbol: String,
        #[source]
        source: AnalysisError,
    },
}

/// Fetch-with-fallback front for the price sources, with a TTL cache keyed
/// by symbol.
pub struct MarketDataFetcher {
    primary: Arc<dyn PriceSource>,
    secondary: Option<Arc<dyn PriceSource>>,
    range: HistoryRange,
    cache: TtlCache<String, Arc<PriceSeries>>,
}

impl MarketDataFetcher {
    pub fn new(primary: Arc<dyn PriceSource>, secondary: Option<Arc<dyn PriceSource>>) -> Self {
        Self {
            primary,
            secondary,
            range: HistoryRange::default(),
            cache: TtlCache::new(DEFAULT_CACHE_TTL),
        }
    }

    pub fn with_range(mut self, range: HistoryRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    pub fn range(&self) -> HistoryRange {
        self.range
    }

    /// Daily history with RSI/MACD columns for `symbol`.
    ///
    /// Tries the primary source, then the secondary one. Only successes are
    /// cached, so a failed symbol is retried on the next call.
    pub async fn get_stock_data(&self, symbol: &str) -> Result<Arc<PriceSeries>, FetchError> {
        let symbol = symbol.trim().to_uppercase();

        if let Some(series) = self.cache.get(&symbol) {
            tracing::debug!("Price series cache hit for {}", symbol);
            return Ok(series);
        }

        let mut errors = Vec::new();
        let sources = std::iter::once(&self.primary).chain(self.secondary.iter());

        for source in sources {
            match source.daily_bars(&symbol, self.range).await {
                Ok(bars) if !bars.is_empty() => {
                    tracing::info!("Fetched {} bars for {} from {}", bars.len(), symbol, source.name());

                    let series = technical_analysis::augment(&symbol, source.name(), bars)
                        .map_err(|e| FetchError::Indicators {
                            symbol: symbol.clone(),
                            source: e,
                        })?;
                    let series = Arc::new(series);
                    self.cache.insert(symbol.clone(), series.clone());
                    return Ok(series);
                }
                Ok(_) => {
                    tracing::warn!("{} returned no data for {}", source.name(), symbol);
                    errors.push(format!("{}: no data found for {}", source.name(), symbol));
                }
                Err(e) => {
                    tracing::warn!("{} failed for {}: {}", source.name(), symbol, e);
                    errors.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(FetchError::AllSourcesFailed { symbol, errors })
    }

    /// Latest close for `symbol`, the live price used for valuation.
    pub async fn latest_close(&self, symbol: &str) -> Result<f64, FetchError> {
        let series = self.get_stock_data(symbol).await?;
        series.latest_close().ok_or_else(|| FetchError::AllSourcesFailed {
            symbol: series.symbol.clone(),
            errors: vec!["series has no bars".to_string()],
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("Price series cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::Bar;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Bars(usize),
        Empty,
        Fail(&'static str),
    }

    struct FakeSource {
        name: &'static str,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(name: &'static str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                name,
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for FakeSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn daily_bars(&self, _symbol: &str, _range: HistoryRange) -> Result<Vec<Bar>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Bars(n) => {
                    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
                    Ok((0..n)
                        .map(|i| {
                            let close = 30.0 + i as f64 * 0.1;
                            Bar {
                                timestamp: start + ChronoDuration::days(i as i64),
                                open: close,
                                high: close,
                                low: close,
                                close,
                                volume: 1000.0,
                            }
                        })
                        .collect())
                }
                Behaviour::Empty => Ok(Vec::new()),
                Behaviour::Fail(msg) => Err(AnalysisError::ApiError(msg.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = FakeSource::new("primary", Behaviour::Bars(40));
        let secondary = FakeSource::new("secondary", Behaviour::Bars(40));
        let fetcher = MarketDataFetcher::new(primary.clone(), Some(secondary.clone()));

        let series = fetcher.get_stock_data("2222.sr").await.unwrap();

        assert_eq!(series.symbol, "2222.SR");
        assert_eq!(series.source, "primary");
        assert_eq!(secondary.calls(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_errors() {
        let primary = FakeSource::new("primary", Behaviour::Fail("connection reset"));
        let secondary = FakeSource::new("secondary", Behaviour::Bars(40));
        let fetcher = MarketDataFetcher::new(primary, Some(secondary));

        let series = fetcher.get_stock_data("1120.SR").await.unwrap();
        assert_eq!(series.source, "secondary");
        assert!(series.latest().unwrap().rsi.is_some());
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_is_empty() {
        let primary = FakeSource::new("primary", Behaviour::Empty);
        let secondary = FakeSource::new("secondary", Behaviour::Bars(10));
        let fetcher = MarketDataFetcher::new(primary, Some(secondary));

        let series = fetcher.get_stock_data("1120.SR").await.unwrap();
        assert_eq!(series.source, "secondary");
        assert_eq!(series.len(), 10);
    }

    #[tokio::test]
    async fn test_both_failing_combines_errors() {
        let primary = FakeSource::new("primary", Behaviour::Empty);
        let secondary = FakeSource::new("secondary", Behaviour::Fail("rate limited"));
        let fetcher = MarketDataFetcher::new(primary, Some(secondary));

        let err = fetcher.get_stock_data("7010.SR").await.unwrap_err();
        let message = err.to_string();

        assert!(message.contains("7010.SR"));
        assert!(message.contains("primary: no data found"));
        assert!(message.contains("secondary: API error: rate limited"));
    }

    #[tokio::test]
    async fn test_success_is_cached_and_failure_is_not() {
        let primary = FakeSource::new("primary", Behaviour::Bars(30));
        let fetcher = MarketDataFetcher::new(primary.clone(), None);

        fetcher.get_stock_data("2222.SR").await.unwrap();
        fetcher.get_stock_data("2222.SR").await.unwrap();
        assert_eq!(primary.calls(), 1);

        fetcher.clear_cache();
        fetcher.get_stock_data("2222.SR").await.unwrap();
        assert_eq!(primary.calls(), 2);

        let failing = FakeSource::new("primary", Behaviour::Fail("down"));
        let fetcher = MarketDataFetcher::new(failing.clone(), None);
        assert!(fetcher.get_stock_data("2222.SR").await.is_err());
        assert!(fetcher.get_stock_data("2222.SR").await.is_err());
        assert_eq!(failing.calls(), 2);
    }

    #[tokio::test]
    async fn test_latest_close_reads_last_bar() {
        let primary = FakeSource::new("primary", Behaviour::Bars(11));
        let fetcher = MarketDataFetcher::new(primary, None);

        let price = fetcher.latest_close("2222.SR").await.unwrap();
        assert!((price - 31.0).abs() < 1e-9);
    }
}

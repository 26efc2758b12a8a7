use analysis_core::{AnalysisError, NewsArticle};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const SEARCH_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";

/// Provider of recent news headlines for a company
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn headlines(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, AnalysisError>;
}

/// Headlines from the Yahoo Finance search endpoint
#[derive(Clone)]
pub struct YahooNewsSource {
    client: Client,
    base_url: String,
}

impl YahooNewsSource {
    pub fn new() -> Self {
        Self::with_base_url(SEARCH_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for YahooNewsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HeadlineSource for YahooNewsSource {
    async fn headlines(&self, query: &str, limit: usize) -> Result<Vec<NewsArticle>, AnalysisError> {
        let count = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("newsCount", count.as_str()), ("quotesCount", "0")])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!("news search returned HTTP {}", status)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("news search: {}", e)))?;

        let mut articles = parse_search_news(&json)?;
        articles.truncate(limit);

        tracing::debug!("Fetched {} headlines for '{}'", articles.len(), query);
        Ok(articles)
    }
}

/// Extract headlines from a search payload. Items without a title are skipped.
pub fn parse_search_news(json: &Value) -> Result<Vec<NewsArticle>, AnalysisError> {
    let news = json
        .get("news")
        .and_then(|n| n.as_array())
        .ok_or_else(|| AnalysisError::InvalidData("Missing news array".to_string()))?;

    let articles = news
        .iter()
        .filter_map(|item| {
            let title = item.get("title")?.as_str()?.trim();
            if title.is_empty() {
                return None;
            }

            Some(NewsArticle {
                title: title.to_string(),
                publisher: item.get("publisher").and_then(|p| p.as_str()).map(String::from),
                published_utc: item
                    .get("providerPublishTime")
                    .and_then(|t| t.as_i64())
                    .and_then(|t| DateTime::from_timestamp(t, 0)),
                article_url: item.get("link").and_then(|l| l.as_str()).map(String::from),
            })
        })
        .collect();

    Ok(articles)
}

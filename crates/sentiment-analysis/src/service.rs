use analysis_core::{AnalysisError, NewsArticle, SentimentLabel, TtlCache};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::{aggregate, SentimentBreakdown};
use crate::classifier::HeadlineClassifier;
use crate::lexicon::LexiconClassifier;
use crate::news::HeadlineSource;

pub const DEFAULT_HEADLINE_LIMIT: usize = 10;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedHeadline {
    #[serde(flatten)]
    pub article: NewsArticle,
    pub label: SentimentLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentReport {
    pub stock_name: String,
    /// Name of the classifier that labelled the headlines
    pub classifier: String,
    pub breakdown: SentimentBreakdown,
    pub headlines: Vec<ClassifiedHeadline>,
    pub analyzed_at: DateTime<Utc>,
}

/// News sentiment per company name: fetch, classify, tally, cache.
pub struct SentimentService {
    source: Arc<dyn HeadlineSource>,
    hosted: Option<Arc<dyn HeadlineClassifier>>,
    fallback: LexiconClassifier,
    headline_limit: usize,
    cache: TtlCache<String, Arc<SentimentReport>>,
}

impl SentimentService {
    pub fn new(source: Arc<dyn HeadlineSource>, hosted: Option<Arc<dyn HeadlineClassifier>>) -> Self {
        Self {
            source,
            hosted,
            fallback: LexiconClassifier::new(),
            headline_limit: DEFAULT_HEADLINE_LIMIT,
            cache: TtlCache::new(DEFAULT_CACHE_TTL),
        }
    }

    pub fn with_headline_limit(mut self, limit: usize) -> Self {
        self.headline_limit = limit.max(1);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = TtlCache::new(ttl);
        self
    }

    pub async fn analyze(&self, stock_name: &str) -> Result<Arc<SentimentReport>, AnalysisError> {
        let stock_name = stock_name.trim();
        if stock_name.is_empty() {
            return Err(AnalysisError::InvalidData("stock name is required".to_string()));
        }

        let key = stock_name.to_lowercase();
        if let Some(report) = self.cache.get(&key) {
            tracing::debug!("Sentiment cache hit for '{}'", stock_name);
            return Ok(report);
        }

        let articles = self.source.headlines(stock_name, self.headline_limit).await?;
        let titles: Vec<String> = articles.iter().map(|a| a.title.clone()).collect();
        let (classifier, labels) = self.classify(&titles).await?;

        let breakdown = aggregate(&labels);
        tracing::info!(
            "Sentiment for '{}': {} ({} positive, {} neutral, {} negative) via {}",
            stock_name,
            breakdown.overall.as_str(),
            breakdown.positive,
            breakdown.neutral,
            breakdown.negative,
            classifier
        );

        let report = Arc::new(SentimentReport {
            stock_name: stock_name.to_string(),
            classifier,
            breakdown,
            headlines: articles
                .into_iter()
                .zip(labels)
                .map(|(article, label)| ClassifiedHeadline { article, label })
                .collect(),
            analyzed_at: Utc::now(),
        });

        self.cache.insert(key, Arc::clone(&report));
        Ok(report)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn classify(&self, titles: &[String]) -> Result<(String, Vec<SentimentLabel>), AnalysisError> {
        if let Some(hosted) = &self.hosted {
            match hosted.classify(titles).await {
                Ok(labels) if labels.len() == titles.len() => {
                    return Ok((hosted.name().to_string(), labels));
                }
                Ok(labels) => tracing::warn!(
                    "{} classifier returned {} labels for {} headlines, using lexicon",
                    hosted.name(),
                    labels.len(),
                    titles.len()
                ),
                Err(e) => tracing::warn!("{} classifier failed, using lexicon: {}", hosted.name(), e),
            }
        }

        let labels = self.fallback.classify(titles).await?;
        Ok((self.fallback.name().to_string(), labels))
    }
}

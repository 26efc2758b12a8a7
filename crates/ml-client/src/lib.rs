pub mod sentiment;
pub mod error;

pub use sentiment::{LabelScore, SentimentClient};
pub use error::{MLError, MLResult};

use std::time::Duration;

/// Configuration for the hosted headline classifier
#[derive(Debug, Clone)]
pub struct MLConfig {
    /// Full inference URL; the hosted classifier is disabled when unset
    pub sentiment_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl Default for MLConfig {
    fn default() -> Self {
        Self {
            sentiment_url: std::env::var("ML_SENTIMENT_URL").ok().filter(|u| !u.trim().is_empty()),
            api_token: std::env::var("ML_SENTIMENT_TOKEN").ok(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl MLConfig {
    /// Build a client when a model URL is configured
    pub fn sentiment_client(&self) -> MLResult<Option<SentimentClient>> {
        match &self.sentiment_url {
            Some(url) => Ok(Some(SentimentClient::new(
                url.clone(),
                self.api_token.clone(),
                self.timeout,
            )?)),
            None => Ok(None),
        }
    }
}

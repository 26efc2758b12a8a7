use analysis_core::{AnalysisError, SentimentLabel};
use async_trait::async_trait;
use ml_client::SentimentClient;

use crate::lexicon::LexiconClassifier;

/// Assigns one sentiment label per headline, in input order
#[async_trait]
pub trait HeadlineClassifier: Send + Sync {
    fn name(&self) -> &str;

    async fn classify(&self, headlines: &[String]) -> Result<Vec<SentimentLabel>, AnalysisError>;
}

/// Remote text-classification model reached through the ML client
pub struct HostedClassifier {
    client: SentimentClient,
}

impl HostedClassifier {
    pub fn new(client: SentimentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HeadlineClassifier for HostedClassifier {
    fn name(&self) -> &str {
        "hosted"
    }

    async fn classify(&self, headlines: &[String]) -> Result<Vec<SentimentLabel>, AnalysisError> {
        let labels = self
            .client
            .top_labels(headlines)
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        Ok(labels
            .iter()
            .map(|label| {
                SentimentLabel::from_model_label(label).unwrap_or_else(|| {
                    tracing::debug!("Unrecognized model label '{}', treating as neutral", label);
                    SentimentLabel::Neutral
                })
            })
            .collect())
    }
}

#[async_trait]
impl HeadlineClassifier for LexiconClassifier {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn classify(&self, headlines: &[String]) -> Result<Vec<SentimentLabel>, AnalysisError> {
        Ok(headlines.iter().map(|h| self.label(h)).collect())
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{MLError, MLResult};

/// One label/score pair from a text-classification model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a [String],
}

/// Inference endpoints answer a batch either with one score list per input
/// or, for a single input, with a flat score list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Batch(Vec<Vec<LabelScore>>),
    Single(Vec<LabelScore>),
    Error { error: String },
}

#[derive(Clone)]
pub struct SentimentClient {
    client: reqwest::Client,
    model_url: String,
    api_token: Option<String>,
}

impl SentimentClient {
    pub fn new(model_url: String, api_token: Option<String>, timeout: Duration) -> MLResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            model_url,
            api_token: api_token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn model_url(&self) -> &str {
        &self.model_url
    }

    /// Classify each text, returning the model's label scores per input
    pub async fn classify(&self, texts: &[String]) -> MLResult<Vec<Vec<LabelScore>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(&self.model_url)
            .json(&ClassifyRequest { inputs: texts });

        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ClassifyResponse>(&body) {
                Ok(ClassifyResponse::Error { error }) => error,
                _ => body.chars().take(200).collect(),
            };
            return Err(MLError::ServiceUnavailable(format!("Status: {} ({})", status, detail)));
        }

        parse_predictions(&body, texts.len())
    }

    /// Classify each text and keep only its highest-scoring label
    pub async fn top_labels(&self, texts: &[String]) -> MLResult<Vec<String>> {
        let predictions = self.classify(texts).await?;
        predictions
            .iter()
            .map(|scores| {
                top_label(scores)
                    .map(|s| s.label.clone())
                    .ok_or_else(|| MLError::InvalidResponse("empty score list".to_string()))
            })
            .collect()
    }
}

pub fn parse_predictions(body: &str, expected: usize) -> MLResult<Vec<Vec<LabelScore>>> {
    let predictions = match serde_json::from_str::<ClassifyResponse>(body)? {
        ClassifyResponse::Batch(batch) => batch,
        ClassifyResponse::Single(scores) if expected == 1 => vec![scores],
        ClassifyResponse::Single(scores) => {
            return Err(MLError::InvalidResponse(format!(
                "expected {} score lists, got one flat list of {}",
                expected,
                scores.len()
            )))
        }
        ClassifyResponse::Error { error } => return Err(MLError::ServiceUnavailable(error)),
    };

    if predictions.len() != expected {
        return Err(MLError::InvalidResponse(format!(
            "expected {} predictions, got {}",
            expected,
            predictions.len()
        )));
    }

    Ok(predictions)
}

pub fn top_label(scores: &[LabelScore]) -> Option<&LabelScore> {
    scores
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
}

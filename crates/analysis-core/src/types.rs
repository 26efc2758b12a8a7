use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A bar augmented with the indicator columns.
///
/// Indicator values are `None` while the indicator is still warming up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorPoint {
    #[serde(flatten)]
    pub bar: Bar,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
}

/// Daily price history for one symbol with RSI/MACD appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    /// Which provider produced the bars ("yahoo", "alpha_vantage", ...)
    pub source: String,
    pub points: Vec<IndicatorPoint>,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSeries {
    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.points.last()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.latest().map(|p| p.bar.close)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Three-way indicator recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Bullish,
    Neutral,
    Bearish,
}

impl Recommendation {
    /// Label shown in the market overview
    pub fn to_label(&self) -> &'static str {
        match self {
            Recommendation::Bullish => "🟢 Potential buy",
            Recommendation::Neutral => "⚪ Neutral",
            Recommendation::Bearish => "🔴 Potential sell",
        }
    }

    /// Label used in notification digests
    pub fn to_alert_label(&self) -> &'static str {
        match self {
            Recommendation::Bullish => "🟢 Strong potential buy signal",
            Recommendation::Neutral => "⚪ No signal",
            Recommendation::Bearish => "🔴 Strong potential sell signal",
        }
    }

    pub fn is_strong(&self) -> bool {
        !matches!(self, Recommendation::Neutral)
    }
}

/// News article headline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub publisher: Option<String>,
    pub published_utc: Option<DateTime<Utc>>,
    pub article_url: Option<String>,
}

/// Sentiment class of a single headline or an aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Normalize a model label. Accepts the common spellings emitted by
    /// hosted classifiers (`positive`, `POS`, `LABEL_2`, ...).
    pub fn from_model_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" | "pos" | "bullish" | "label_2" => Some(SentimentLabel::Positive),
            "negative" | "neg" | "bearish" | "label_0" => Some(SentimentLabel::Negative),
            "neutral" | "neu" | "label_1" => Some(SentimentLabel::Neutral),
            _ => None,
        }
    }

    /// Same spelling as the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

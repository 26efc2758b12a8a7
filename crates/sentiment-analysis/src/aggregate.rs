use analysis_core::SentimentLabel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub overall: SentimentLabel,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub total: usize,
}

/// Tally labels. The overall label is the class with the strictly highest
/// count; any tie for first place, or no labels at all, is neutral.
pub fn aggregate(labels: &[SentimentLabel]) -> SentimentBreakdown {
    let count = |wanted: SentimentLabel| labels.iter().filter(|&&l| l == wanted).count();
    let positive = count(SentimentLabel::Positive);
    let neutral = count(SentimentLabel::Neutral);
    let negative = count(SentimentLabel::Negative);

    let counts = [
        (SentimentLabel::Positive, positive),
        (SentimentLabel::Neutral, neutral),
        (SentimentLabel::Negative, negative),
    ];
    let top = positive.max(neutral).max(negative);
    let leaders: Vec<SentimentLabel> = counts
        .iter()
        .filter(|(_, c)| *c == top)
        .map(|(label, _)| *label)
        .collect();

    let overall = match leaders.as_slice() {
        [single] if top > 0 => *single,
        _ => SentimentLabel::Neutral,
    };

    SentimentBreakdown {
        overall,
        positive,
        neutral,
        negative,
        total: labels.len(),
    }
}

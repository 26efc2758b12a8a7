use analysis_core::SentimentLabel;
use std::collections::HashSet;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "gains", "profit", "growth", "beat",
    "upgrade", "outperform", "strong", "positive", "rise", "rises", "increase",
    "breakthrough", "success", "exceed", "momentum", "buy", "optimistic",
    "record", "high", "advance", "dividend", "buyback", "repurchase", "upside",
    "recovery", "rebound", "expansion", "robust", "accelerating", "overweight",
    "raised", "raises", "upgraded", "tailwind", "win", "wins", "award",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "declines", "loss", "losses", "fall", "falls", "plunge",
    "crash", "miss", "downgrade", "underperform", "weak", "negative", "drop",
    "drops", "decrease", "concern", "concerns", "risk", "fail", "disappoint",
    "slump", "slips", "sell", "warning", "pessimistic", "low", "retreat", "fear",
    "trouble", "dilution", "headwind", "lawsuit", "litigation", "recall",
    "investigation", "probe", "default", "bankruptcy", "layoff", "layoffs",
    "downside", "overvalued", "underweight", "lowered", "suspended", "cut", "cuts",
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't", "hardly",
    "barely", "neither", "nor", "without",
];

/// A negation flips polarity of a keyword up to this many words later
const NEGATION_WINDOW: usize = 3;

/// Keyword-count headline classifier, used when no hosted model is reachable
pub struct LexiconClassifier {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
    negation: HashSet<&'static str>,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
            negation: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    /// Net keyword score: +1 per positive word, -1 per negative word,
    /// inverted when a negation precedes it within the window.
    pub fn score(&self, text: &str) -> i32 {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '"' | '(' | ')'))
            .filter(|w| !w.is_empty())
            .collect();

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negation.contains(*w))
            .map(|(i, _)| i)
            .collect();

        let mut score = 0;

        for (i, word) in words.iter().enumerate() {
            let polarity = if self.positive.contains(*word) {
                1
            } else if self.negative.contains(*word) {
                -1
            } else {
                continue;
            };

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && (i - neg_pos) <= NEGATION_WINDOW);

            score += if negated { -polarity } else { polarity };
        }

        score
    }

    pub fn label(&self, text: &str) -> SentimentLabel {
        match self.score(text) {
            s if s > 0 => SentimentLabel::Positive,
            s if s < 0 => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(lexicon.label("Aramco profit beat estimates, shares rally"), SentimentLabel::Positive);
        assert_eq!(lexicon.label("Bank shares plunge on default fears and probe"), SentimentLabel::Negative);
        assert_eq!(lexicon.label("Company to hold annual general assembly"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_negation_flips_polarity() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(lexicon.score("results were strong"), 1);
        assert_eq!(lexicon.score("results were not strong"), -1);
        // Outside the window the negation no longer applies
        assert_eq!(lexicon.score("not that the board expected results this strong"), 1);
    }

    #[test]
    fn test_mixed_headline_balances_out() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(lexicon.label("Revenue growth offset by higher losses"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_punctuation_is_stripped() {
        let lexicon = LexiconClassifier::new();
        assert_eq!(lexicon.score("Rally!"), 1);
        assert_eq!(lexicon.score("(downgrade)"), -1);
    }
}

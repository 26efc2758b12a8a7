//! Headline sentiment for the experimental opportunities view.
//!
//! Recent headlines for a company name are labelled by a hosted model when one
//! is configured and reachable, otherwise by a local keyword lexicon, then
//! tallied into a single majority label.

pub mod aggregate;
pub mod classifier;
pub mod lexicon;
pub mod news;
pub mod service;

pub use aggregate::{aggregate, SentimentBreakdown};
pub use classifier::{HeadlineClassifier, HostedClassifier};
pub use lexicon::LexiconClassifier;
pub use news::{HeadlineSource, YahooNewsSource};
pub use service::{ClassifiedHeadline, SentimentReport, SentimentService, DEFAULT_CACHE_TTL, DEFAULT_HEADLINE_LIMIT};

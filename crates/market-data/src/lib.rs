//! Daily price history for the tracked symbols.
//!
//! A primary provider (Yahoo chart API) is tried first; a market-scoped
//! secondary provider (Alpha Vantage) is the fallback. Results carry RSI and
//! MACD columns and are cached for a fixed window.

pub mod alpha_vantage;
pub mod fetcher;
pub mod source;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageSource;
pub use fetcher::{FetchError, MarketDataFetcher, DEFAULT_CACHE_TTL};
pub use source::{HistoryRange, PriceSource};
pub use yahoo::YahooChartSource;

//! INI configuration shared by the API server and the batch notifier.
//!
//! Symbols come from either `[TadawulStocks]` (`symbol = display name`) or
//! `[Tadawul] symbols = ...` (whitespace-separated). Both may be present.

mod error;
mod logging;

pub use error::ConfigError;
pub use logging::init_tracing;

use ini::{Ini, ParseOption, Properties};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.ini";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:portfolio.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

const STOCKS_SECTION: &str = "TadawulStocks";
const SYMBOL_LIST_SECTION: &str = "Tadawul";
const DISPLAY_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    pub symbol: String,
    pub name: String,
}

impl StockEntry {
    /// `"SYMBOL - Name"`, as offered in pickers
    pub fn display(&self) -> String {
        format!("{}{}{}", self.symbol, DISPLAY_SEPARATOR, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub email_from: String,
    pub email_to: Vec<String>,
    pub email_password: Option<String>,
    pub smtp_server: String,
    pub smtp_port: u16,
}

#[derive(Debug, Clone)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub twilio_number: String,
    pub your_whatsapp: String,
}

#[derive(Debug, Clone)]
pub struct MarketSettings {
    /// Yahoo-style period: `6mo`, `1y`, ...
    pub history_range: String,
    /// Exchange code the secondary provider expects (`SAU` for Tadawul)
    pub secondary_market: String,
    pub alpha_vantage_key: Option<String>,
    pub cache_ttl_minutes: u64,
}

impl MarketSettings {
    pub fn cache_ttl(&self) -> Duration {
        minutes(self.cache_ttl_minutes)
    }
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            history_range: "1y".to_string(),
            secondary_market: "SAU".to_string(),
            alpha_vantage_key: None,
            cache_ttl_minutes: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentimentSettings {
    pub model_url: Option<String>,
    pub api_token: Option<String>,
    pub headline_limit: usize,
    pub cache_ttl_minutes: u64,
}

impl SentimentSettings {
    pub fn cache_ttl(&self) -> Duration {
        minutes(self.cache_ttl_minutes)
    }
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            model_url: None,
            api_token: None,
            headline_limit: 10,
            cache_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stocks: Vec<StockEntry>,
    pub email: Option<EmailSettings>,
    pub twilio: Option<TwilioSettings>,
    pub market: MarketSettings,
    pub sentiment: SentimentSettings,
    pub database_url: String,
    pub bind_addr: String,
}

impl AppConfig {
    /// Load `.env`, then the INI file named by `CONFIG_PATH` (default
    /// `config.ini`), then apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());

        tracing::info!(
            "Loaded {} symbols from {} (email: {}, whatsapp: {})",
            config.stocks.len(),
            path,
            config.email.is_some(),
            config.twilio.is_some()
        );

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: PathBuf::from(path),
            source,
        })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        // Passwords and tokens may contain backslashes and quotes
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(content, options)?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        Ok(Self {
            stocks: read_stocks(ini),
            email: read_email(ini)?,
            twilio: read_twilio(ini),
            market: read_market(ini)?,
            sentiment: read_sentiment(ini)?,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        })
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(addr) = get("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(key) = get("ALPHA_VANTAGE_API_KEY") {
            self.market.alpha_vantage_key = Some(key);
        }
        if let Some(url) = get("ML_SENTIMENT_URL") {
            self.sentiment.model_url = Some(url);
        }
        if let Some(token) = get("ML_SENTIMENT_TOKEN") {
            self.sentiment.api_token = Some(token);
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.stocks.iter().map(|s| s.symbol.clone()).collect()
    }

    pub fn display_list(&self) -> Vec<String> {
        self.stocks.iter().map(StockEntry::display).collect()
    }

    pub fn stock(&self, symbol: &str) -> Option<&StockEntry> {
        let symbol = symbol.trim();
        self.stocks.iter().find(|s| s.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Display name for a symbol, falling back to the symbol itself
    pub fn name_for(&self, symbol: &str) -> String {
        self.stock(symbol)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| symbol.trim().to_uppercase())
    }
}

/// Symbol part of a `"SYMBOL - Name"` string; plain symbols pass through.
pub fn symbol_from_display(display: &str) -> String {
    display
        .split(DISPLAY_SEPARATOR)
        .next()
        .unwrap_or(display)
        .trim()
        .to_uppercase()
}

fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}

fn non_empty(props: &Properties, key: &str) -> Option<String> {
    props
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(props: &Properties, section: &str, key: &str, default: T) -> Result<T, ConfigError> {
    match non_empty(props, key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn read_stocks(ini: &Ini) -> Vec<StockEntry> {
    let mut stocks: Vec<StockEntry> = Vec::new();

    if let Some(props) = ini.section(Some(STOCKS_SECTION)) {
        for (key, value) in props.iter() {
            let symbol = key.trim().to_uppercase();
            if symbol.is_empty() || stocks.iter().any(|s| s.symbol == symbol) {
                continue;
            }
            let name = value.trim();
            stocks.push(StockEntry {
                name: if name.is_empty() { symbol.clone() } else { name.to_string() },
                symbol,
            });
        }
    }

    if let Some(list) = ini.section(Some(SYMBOL_LIST_SECTION)).and_then(|p| p.get("symbols")) {
        for symbol in list.split_whitespace().map(str::to_uppercase) {
            if !stocks.iter().any(|s| s.symbol == symbol) {
                stocks.push(StockEntry {
                    name: symbol.clone(),
                    symbol,
                });
            }
        }
    }

    stocks
}

fn read_email(ini: &Ini) -> Result<Option<EmailSettings>, ConfigError> {
    let Some(props) = ini.section(Some("Email")) else {
        return Ok(None);
    };

    let (Some(email_from), Some(email_to), Some(smtp_server)) = (
        non_empty(props, "email_from"),
        non_empty(props, "email_to"),
        non_empty(props, "smtp_server"),
    ) else {
        tracing::warn!("[Email] needs email_from, email_to and smtp_server; email disabled");
        return Ok(None);
    };

    Ok(Some(EmailSettings {
        email_from,
        email_to: email_to
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        email_password: non_empty(props, "email_password"),
        smtp_server,
        smtp_port: parse_or(props, "Email", "smtp_port", 587)?,
    }))
}

fn read_twilio(ini: &Ini) -> Option<TwilioSettings> {
    let props = ini.section(Some("Twilio"))?;

    match (
        non_empty(props, "account_sid"),
        non_empty(props, "auth_token"),
        non_empty(props, "twilio_number"),
        non_empty(props, "your_whatsapp"),
    ) {
        (Some(account_sid), Some(auth_token), Some(twilio_number), Some(your_whatsapp)) => Some(TwilioSettings {
            account_sid,
            auth_token,
            twilio_number,
            your_whatsapp,
        }),
        _ => {
            tracing::warn!("[Twilio] is incomplete; WhatsApp disabled");
            None
        }
    }
}

fn read_market(ini: &Ini) -> Result<MarketSettings, ConfigError> {
    let defaults = MarketSettings::default();
    let Some(props) = ini.section(Some("MarketData")) else {
        return Ok(defaults);
    };

    Ok(MarketSettings {
        history_range: non_empty(props, "history_range").unwrap_or(defaults.history_range),
        secondary_market: non_empty(props, "secondary_market")
            .map(|m| m.to_uppercase())
            .unwrap_or(defaults.secondary_market),
        alpha_vantage_key: non_empty(props, "alpha_vantage_key"),
        cache_ttl_minutes: parse_or(props, "MarketData", "cache_ttl_minutes", defaults.cache_ttl_minutes)?,
    })
}

fn read_sentiment(ini: &Ini) -> Result<SentimentSettings, ConfigError> {
    let defaults = SentimentSettings::default();
    let Some(props) = ini.section(Some("Sentiment")) else {
        return Ok(defaults);
    };

    Ok(SentimentSettings {
        model_url: non_empty(props, "model_url"),
        api_token: non_empty(props, "api_token"),
        headline_limit: parse_or(props, "Sentiment", "headline_limit", defaults.headline_limit)?,
        cache_ttl_minutes: parse_or(props, "Sentiment", "cache_ttl_minutes", defaults.cache_ttl_minutes)?,
    })
}

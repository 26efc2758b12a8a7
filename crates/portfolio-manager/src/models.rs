use serde::{Deserialize, Serialize};

/// One recorded buy transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Holding {
    pub id: i64,
    pub symbol: String,
    pub quantity: f64,
    pub buy_price: f64,
    pub commission: f64,
    pub buy_date: String,
    /// When set, supersedes the live price for valuation
    pub manual_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub symbol: String,
    pub quantity: f64,
    pub buy_price: f64,
    pub commission: Option<f64>,
    /// `YYYY-MM-DD`; today when absent
    pub buy_date: Option<String>,
}

/// Where a holding's valuation price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceOrigin {
    Manual,
    Live,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingValuation {
    #[serde(flatten)]
    pub holding: Holding,
    pub price_origin: PriceOrigin,
    pub current_price: Option<f64>,
    /// `None` when the amounts are too large to value exactly
    pub cost_basis: Option<f64>,
    pub market_value: Option<f64>,
    pub profit_loss: Option<f64>,
    pub profit_loss_percent: Option<f64>,
    /// Why no price could be resolved
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_holdings: usize,
    pub priced_holdings: usize,
    pub total_cost: f64,
    pub total_value: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percent: f64,
    pub holdings: Vec<HoldingValuation>,
    pub warnings: Vec<String>,
}

use analysis_core::Recommendation;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use technical_analysis::recommend_latest;

use crate::{ApiResponse, AppError, AppState};

pub const NO_MARKET_DATA: &str = "no data found for any symbol";

#[derive(Serialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub name: String,
    pub display: String,
}

#[derive(Serialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub source: String,
    pub as_of: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OverviewRow {
    pub symbol: String,
    pub display: String,
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub recommendation: Recommendation,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct SymbolError {
    pub symbol: String,
    pub error: String,
}

#[derive(Serialize)]
pub struct MarketOverview {
    pub rows: Vec<OverviewRow>,
    pub errors: Vec<SymbolError>,
    pub message: Option<String>,
}

pub fn market_routes() -> Router<AppState> {
    Router::new()
        .route("/api/symbols", get(get_symbols))
        .route("/api/market/overview", get(get_overview))
        .route("/api/market/:symbol/price", get(get_price))
}

async fn get_symbols(State(state): State<AppState>) -> Json<ApiResponse<Vec<SymbolInfo>>> {
    let symbols = state
        .config
        .stocks
        .iter()
        .map(|stock| SymbolInfo {
            symbol: stock.symbol.clone(),
            name: stock.name.clone(),
            display: stock.display(),
        })
        .collect();

    Json(ApiResponse::success(symbols))
}

async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<PriceQuote>>, AppError> {
    let series = state.market.get_stock_data(&symbol).await?;
    let latest = series
        .latest()
        .ok_or_else(|| anyhow::anyhow!("No price data available for {}", series.symbol))?;

    Ok(Json(ApiResponse::success(PriceQuote {
        symbol: series.symbol.clone(),
        price: latest.bar.close,
        source: series.source.clone(),
        as_of: latest.bar.timestamp,
    })))
}

async fn get_overview(State(state): State<AppState>) -> Json<ApiResponse<MarketOverview>> {
    let results = join_all(state.config.stocks.iter().map(|stock| {
        let market = state.market.clone();
        async move { (stock, market.get_stock_data(&stock.symbol).await) }
    }))
    .await;

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (stock, result) in results {
        match result {
            Ok(series) => {
                let Some(latest) = series.latest() else {
                    continue;
                };
                let recommendation = recommend_latest(&series);
                rows.push(OverviewRow {
                    symbol: stock.symbol.clone(),
                    display: stock.display(),
                    price: latest.bar.close,
                    rsi: latest.rsi,
                    macd: latest.macd,
                    macd_signal: latest.macd_signal,
                    recommendation,
                    label: recommendation.to_label(),
                });
            }
            Err(e) => {
                tracing::warn!("Overview skipped {}: {}", stock.symbol, e);
                errors.push(SymbolError {
                    symbol: stock.symbol.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let message = rows.is_empty().then(|| NO_MARKET_DATA.to_string());

    Json(ApiResponse::success(MarketOverview { rows, errors, message }))
}

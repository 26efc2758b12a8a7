use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use futures_util::future::join_all;
use portfolio_manager::*;
use serde::Deserialize;

use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize)]
pub struct AddTransactionRequest {
    /// Bare symbol; takes precedence over `display`
    pub symbol: Option<String>,
    /// `"SYMBOL - Name"` as offered by `/api/symbols`
    pub display: Option<String>,
    pub quantity: f64,
    /// Defaults to the current market price
    pub buy_price: Option<f64>,
    pub commission: Option<f64>,
    pub buy_date: Option<String>,
}

#[derive(Deserialize)]
pub struct ManualPriceRequest {
    pub manual_price: Option<f64>,
}

pub fn portfolio_routes() -> Router<AppState> {
    Router::new()
        .route("/api/portfolio", get(get_portfolio))
        .route("/api/portfolio/transactions", post(add_transaction))
        .route("/api/portfolio/transactions/:id/manual-price", put(set_manual_price))
}

async fn get_portfolio(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PortfolioSummary>>, AppError> {
    let holdings = state.portfolio.get_portfolio().await?;

    let valuations = join_all(holdings.into_iter().map(|holding| {
        let market = state.market.clone();
        async move {
            // Manual overrides skip the network entirely
            let live = match holding.manual_price {
                Some(_) => None,
                None => Some(market.latest_close(&holding.symbol).await.map_err(|e| e.to_string())),
            };
            value_holding(holding, live)
        }
    }))
    .await;

    let summary = summarize(valuations);
    for warning in &summary.warnings {
        tracing::warn!("{}", warning);
    }

    Ok(Json(ApiResponse::success(summary)))
}

async fn add_transaction(
    State(state): State<AppState>,
    Json(req): Json<AddTransactionRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let symbol = req
        .symbol
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .or_else(|| req.display.as_deref().map(app_config::symbol_from_display))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("symbol is required"))?;

    let buy_price = match req.buy_price {
        Some(price) => price,
        None => state.market.latest_close(&symbol).await.map_err(|e| {
            AppError::bad_request(format!("No buy price given and no market price available: {}", e))
        })?,
    };

    let id = state
        .portfolio
        .add_transaction(NewTransaction {
            symbol,
            quantity: req.quantity,
            buy_price,
            commission: req.commission,
            buy_date: req.buy_date,
        })
        .await?;

    Ok(Json(ApiResponse::success(serde_json::json!({ "id": id, "buy_price": buy_price }))))
}

async fn set_manual_price(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ManualPriceRequest>,
) -> Result<Json<ApiResponse<Holding>>, AppError> {
    state.portfolio.set_manual_price(id, req.manual_price).await?;

    let holding = state
        .portfolio
        .get_holding(id)
        .await?
        .ok_or(PortfolioError::NotFound(id))?;

    Ok(Json(ApiResponse::success(holding)))
}

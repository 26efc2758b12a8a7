//! Experimental news-sentiment view ("AI opportunities").

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sentiment_analysis::SentimentReport;

use crate::{ApiResponse, AppError, AppState};

/// Either a company name or a configured symbol, whose display name is used
#[derive(Deserialize)]
pub struct SentimentQuery {
    pub name: Option<String>,
    pub symbol: Option<String>,
}

pub fn sentiment_routes() -> Router<AppState> {
    Router::new().route("/api/opportunities/sentiment", get(get_sentiment))
}

async fn get_sentiment(
    State(state): State<AppState>,
    Query(query): Query<SentimentQuery>,
) -> Result<Json<ApiResponse<SentimentReport>>, AppError> {
    let name = match (query.name, query.symbol) {
        (Some(name), _) if !name.trim().is_empty() => name,
        (_, Some(symbol)) if !symbol.trim().is_empty() => state.config.name_for(&symbol),
        _ => return Err(AppError::bad_request("name or symbol is required")),
    };

    let report = state.sentiment.analyze(&name).await?;

    Ok(Json(ApiResponse::success(report.as_ref().clone())))
}

use std::sync::Arc;

use analysis_core::{AnalysisError, Bar, NewsArticle};
use app_config::AppConfig;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use market_data::{HistoryRange, MarketDataFetcher, PriceSource};
use portfolio_manager::{PortfolioDb, PortfolioManager};
use sentiment_analysis::{HeadlineSource, SentimentService};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{build_router, AppState};

/// Serves a steady uptrend ending at 159.0 for `2222.SR`; everything else fails
struct FakePrices;

#[async_trait]
impl PriceSource for FakePrices {
    fn name(&self) -> &str {
        "fake"
    }

    async fn daily_bars(&self, symbol: &str, _range: HistoryRange) -> Result<Vec<Bar>, AnalysisError> {
        if symbol != "2222.SR" {
            return Err(AnalysisError::ApiError(format!("unknown symbol {}", symbol)));
        }

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Ok((0..60)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    timestamp: start + Duration::days(i),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect())
    }
}

struct FakeNews;

#[async_trait]
impl HeadlineSource for FakeNews {
    async fn headlines(&self, _query: &str, _limit: usize) -> Result<Vec<NewsArticle>, AnalysisError> {
        Ok(["Profit beat estimates", "Shares rally", "Outlook weak"]
            .iter()
            .map(|t| NewsArticle {
                title: t.to_string(),
                publisher: None,
                published_utc: None,
                article_url: None,
            })
            .collect())
    }
}

const CONFIG: &str = "[TadawulStocks]\n2222.SR = Saudi Aramco\n9999.SR = Missing Co\n";

async fn app_with_config(config: &str) -> Router {
    let config = AppConfig::parse(config).unwrap();
    let db = PortfolioDb::new("sqlite::memory:").await.unwrap();
    let market = MarketDataFetcher::new(Arc::new(FakePrices), None);
    let sentiment = SentimentService::new(Arc::new(FakeNews), None);

    build_router(AppState::new(config, PortfolioManager::new(db), market, sentiment))
}

async fn app() -> Router {
    app_with_config(CONFIG).await
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_add_transaction_and_value_portfolio() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/portfolio/transactions",
        Some(json!({
            "display": "2222.SR - Saudi Aramco",
            "quantity": 10.0,
            "buy_price": 150.0,
            "commission": 5.0,
            "buy_date": "2024-03-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);

    let (status, body) = send(&app, "GET", "/api/portfolio", None).await;
    assert_eq!(status, StatusCode::OK);

    let summary = &body["data"];
    assert_eq!(summary["total_holdings"], 1);
    assert_eq!(summary["priced_holdings"], 1);

    let holding = &summary["holdings"][0];
    assert_eq!(holding["symbol"], "2222.SR");
    assert_eq!(holding["price_origin"], "live");
    assert_eq!(holding["current_price"], 159.0);
    // 10 * 159 - (10 * 150 + 5)
    assert_eq!(holding["profit_loss"], 85.0);
}

#[tokio::test]
async fn test_buy_price_defaults_to_market_price() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/portfolio/transactions",
        Some(json!({ "symbol": "2222.sr", "quantity": 2.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["buy_price"], 159.0);
}

#[tokio::test]
async fn test_missing_price_is_a_bad_request() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/portfolio/transactions",
        Some(json!({ "symbol": "9999.SR", "quantity": 2.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("9999.SR"));
}

#[tokio::test]
async fn test_invalid_quantity_is_a_bad_request() {
    let app = app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/portfolio/transactions",
        Some(json!({ "symbol": "2222.SR", "quantity": -1.0, "buy_price": 10.0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_price_override() {
    let app = app().await;
    send(
        &app,
        "POST",
        "/api/portfolio/transactions",
        Some(json!({ "symbol": "9999.SR", "quantity": 4.0, "buy_price": 20.0 })),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/portfolio", None).await;
    assert_eq!(body["data"]["priced_holdings"], 0);
    assert_eq!(body["data"]["warnings"].as_array().unwrap().len(), 1);
    assert!(body["data"]["holdings"][0]["profit_loss"].is_null());

    let (status, body) = send(
        &app,
        "PUT",
        "/api/portfolio/transactions/1/manual-price",
        Some(json!({ "manual_price": 25.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["manual_price"], 25.0);

    let (_, body) = send(&app, "GET", "/api/portfolio", None).await;
    let holding = &body["data"]["holdings"][0];
    assert_eq!(holding["price_origin"], "manual");
    assert_eq!(holding["profit_loss"], 20.0);
    assert!(body["data"]["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_manual_price_errors() {
    let app = app().await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/portfolio/transactions/42/manual-price",
        Some(json!({ "manual_price": 25.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(
        &app,
        "POST",
        "/api/portfolio/transactions",
        Some(json!({ "symbol": "2222.SR", "quantity": 1.0, "buy_price": 20.0 })),
    )
    .await;
    let (status, _) = send(
        &app,
        "PUT",
        "/api/portfolio/transactions/1/manual-price",
        Some(json!({ "manual_price": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_symbols() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/symbols", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["symbol"], "2222.SR");
    assert_eq!(body["data"][0]["display"], "2222.SR - Saudi Aramco");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_price_quote() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/api/market/2222.SR/price", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], 159.0);
    assert_eq!(body["data"]["source"], "fake");

    let (status, body) = send(&app, "GET", "/api/market/9999.SR/price", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("unknown symbol"));
}

#[tokio::test]
async fn test_market_overview_reports_rows_and_errors() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/market/overview", None).await;

    assert_eq!(status, StatusCode::OK);
    let overview = &body["data"];
    assert_eq!(overview["rows"].as_array().unwrap().len(), 1);
    assert_eq!(overview["rows"][0]["display"], "2222.SR - Saudi Aramco");
    assert_eq!(overview["rows"][0]["price"], 159.0);
    // A steady rise is overbought but MACD stays above its signal
    assert_eq!(overview["rows"][0]["recommendation"], "neutral");
    assert_eq!(overview["errors"][0]["symbol"], "9999.SR");
    assert!(overview["message"].is_null());
}

#[tokio::test]
async fn test_market_overview_without_data() {
    let app = app_with_config("[TadawulStocks]\n9999.SR = Missing Co\n").await;
    let (_, body) = send(&app, "GET", "/api/market/overview", None).await;

    assert!(body["data"]["rows"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["message"], crate::market_routes::NO_MARKET_DATA);
}

#[tokio::test]
async fn test_sentiment() {
    let app = app().await;

    let (status, body) = send(&app, "GET", "/api/opportunities/sentiment?symbol=2222.SR", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock_name"], "Saudi Aramco");
    assert_eq!(body["data"]["classifier"], "lexicon");
    assert_eq!(body["data"]["breakdown"]["overall"], "positive");
    assert_eq!(body["data"]["breakdown"]["total"], 3);

    let (status, _) = send(&app, "GET", "/api/opportunities/sentiment", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_clear_cache() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/api/cache/clear", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Caches cleared");
}

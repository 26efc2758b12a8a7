pub mod market_routes;
pub mod portfolio_routes;
pub mod sentiment_routes;

#[cfg(test)]
mod api_tests;

use analysis_core::AnalysisError;
use app_config::AppConfig;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use market_data::{AlphaVantageSource, HistoryRange, MarketDataFetcher, PriceSource, YahooChartSource};
use portfolio_manager::{PortfolioDb, PortfolioError, PortfolioManager};
use sentiment_analysis::{HeadlineClassifier, HostedClassifier, SentimentService, YahooNewsSource};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub portfolio: Arc<PortfolioManager>,
    pub market: Arc<MarketDataFetcher>,
    pub sentiment: Arc<SentimentService>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        portfolio: PortfolioManager,
        market: MarketDataFetcher,
        sentiment: SentimentService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            portfolio: Arc::new(portfolio),
            market: Arc::new(market),
            sentiment: Arc::new(sentiment),
        }
    }

    /// Open the database and wire the live providers described by `config`
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let db = PortfolioDb::new(&config.database_url).await?;
        tracing::info!("Portfolio database ready at {}", config.database_url);

        let range = HistoryRange::parse(&config.market.history_range).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown history_range '{}', using {}",
                config.market.history_range,
                HistoryRange::default().as_yahoo()
            );
            HistoryRange::default()
        });

        let secondary: Arc<dyn PriceSource> = Arc::new(AlphaVantageSource::new(
            config.market.alpha_vantage_key.clone(),
            config.market.secondary_market.clone(),
        ));
        let market = MarketDataFetcher::new(Arc::new(YahooChartSource::new()), Some(secondary))
            .with_range(range)
            .with_cache_ttl(config.market.cache_ttl());

        let ml_config = ml_client::MLConfig {
            sentiment_url: config.sentiment.model_url.clone(),
            api_token: config.sentiment.api_token.clone(),
            ..Default::default()
        };
        let hosted = ml_config.sentiment_client()?.map(|client| {
            tracing::info!("Hosted sentiment model at {}", client.model_url());
            Arc::new(HostedClassifier::new(client)) as Arc<dyn HeadlineClassifier>
        });
        if hosted.is_none() {
            tracing::info!("No sentiment model configured, using the keyword lexicon");
        }

        let sentiment = SentimentService::new(Arc::new(YahooNewsSource::new()), hosted)
            .with_headline_limit(config.sentiment.headline_limit)
            .with_cache_ttl(config.sentiment.cache_ttl());

        Ok(Self::new(config, PortfolioManager::new(db), market, sentiment))
    }
}

/// Response envelope for every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error rendered as `{success: false, error}` with a status code
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }
}

fn status_for(error: &anyhow::Error) -> StatusCode {
    if let Some(e) = error.downcast_ref::<PortfolioError>() {
        return match e {
            PortfolioError::Validation(_) => StatusCode::BAD_REQUEST,
            PortfolioError::NotFound(_) => StatusCode::NOT_FOUND,
            PortfolioError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
    }

    if let Some(AnalysisError::InvalidData(_)) = error.downcast_ref::<AnalysisError>() {
        return StatusCode::BAD_REQUEST;
    }

    StatusCode::INTERNAL_SERVER_ERROR
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        Self {
            status: status_for(&error),
            error,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.error);
        }

        (self.status, Json(ApiResponse::<()>::error(self.error.to_string()))).into_response()
    }
}

async fn health() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn clear_cache(State(state): State<AppState>) -> Json<ApiResponse<serde_json::Value>> {
    state.market.clear_cache();
    state.sentiment.clear_cache();
    tracing::info!("Market and sentiment caches cleared");

    Json(ApiResponse::success(serde_json::json!({ "message": "Caches cleared" })))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/cache/clear", post(clear_cache))
        .merge(portfolio_routes::portfolio_routes())
        .merge(market_routes::market_routes())
        .merge(sentiment_routes::sentiment_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    app_config::init_tracing();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let state = AppState::from_config(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Smart portfolio API listening on {}", bind_addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

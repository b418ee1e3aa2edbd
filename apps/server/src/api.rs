use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderValue,
    routing::get,
    Json, Router,
};
use quotehub_market_data::{
    CandleData, CandleRequest, DataType, Interval, ProviderDescriptor, QuoteRequest, SymbolInfo,
    TickData,
};
use serde::Deserialize;
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

const DEFAULT_CANDLE_LIMIT: u32 = 100;

pub async fn healthz() -> &'static str {
    "ok"
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderDescriptor>> {
    let descriptors = state
        .market_data
        .registry()
        .descriptors()
        .into_iter()
        .cloned()
        .collect();
    Json(descriptors)
}

#[derive(Deserialize)]
struct CandlesQuery {
    symbol: String,
    interval: String,
    limit: Option<u32>,
    from: Option<i64>,
    to: Option<i64>,
    provider: Option<String>,
}

async fn get_candles(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CandlesQuery>,
) -> ApiResult<Json<Vec<CandleData>>> {
    let interval: Interval = q.interval.parse()?;
    let mut request = CandleRequest::new(q.symbol, interval, q.limit.unwrap_or(DEFAULT_CANDLE_LIMIT))
        .with_range(q.from, q.to);
    if let Some(provider) = q.provider {
        request = request.with_preferred_provider(provider);
    }
    let candles = state.market_data.fetch_candles(request).await?;
    Ok(Json(candles))
}

#[derive(Deserialize)]
struct QuoteQuery {
    symbol: String,
    provider: Option<String>,
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(q): Query<QuoteQuery>,
) -> ApiResult<Json<TickData>> {
    let mut request = QuoteRequest::new(q.symbol);
    if let Some(provider) = q.provider {
        request = request.with_preferred_provider(provider);
    }
    let tick = state.market_data.fetch_quote(request).await?;
    Ok(Json(tick))
}

#[derive(Deserialize)]
struct SearchQuery {
    query: String,
}

async fn search_symbols(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SymbolInfo>>> {
    if q.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }
    Ok(Json(state.market_data.search_symbols(&q.query).await))
}

#[derive(Deserialize)]
struct SymbolQuery {
    symbol: String,
}

async fn get_order_book(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> ApiResult<Json<Value>> {
    state.market_data.ensure_supported(DataType::OrderBook)?;
    Err(ApiError::NotImplemented(format!(
        "Order book for '{}' is not available",
        q.symbol
    )))
}

async fn stream_quotes(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SymbolQuery>,
) -> ApiResult<Json<Value>> {
    state.market_data.ensure_supported(DataType::Stream)?;
    Err(ApiError::NotImplemented(format!(
        "Streaming for '{}' is not available",
        q.symbol
    )))
}

/// Requests carry no overall deadline; each upstream call is bounded by the
/// transport timeout.
pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| o.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let api = Router::new()
        .route("/healthz", get(healthz))
        .route("/providers", get(list_providers))
        .route("/candles", get(get_candles))
        .route("/quote", get(get_quote))
        .route("/search", get(search_symbols))
        .route("/orderbook", get(get_order_book))
        .route("/stream", get(stream_quotes))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

use crate::config::{RetryPolicy, DEFAULT_SYMBOL, DEFAULT_WINDOW_SIZE};
use crate::dashboard::{self, CycleRequest, DashboardSnapshot};
use crate::error::ChainError;
use crate::nse_client::NSEClient;
use crate::processor::{self, AtmLocation};
use crate::retry;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OptionChainQuery {
    pub symbol: Option<String>,
    pub strike: Option<f64>,
    pub window: Option<usize>,
    pub expiry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StrikesQuery {
    pub symbol: Option<String>,
    pub expiry: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn from_result(result: Result<T, ChainError>, start_time: Instant) -> Self {
        let processing_time_ms = Some(start_time.elapsed().as_millis() as u64);
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                error_kind: None,
                processing_time_ms,
            },
            Err(e) => Self {
                success: false,
                data: None,
                error: Some(e.user_message()),
                error_kind: Some(e.kind()),
                processing_time_ms,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    client: Arc<NSEClient>,
    retry: RetryPolicy,
}

impl AppState {
    pub fn new(client: NSEClient, retry: RetryPolicy) -> Self {
        Self {
            client: Arc::new(client),
            retry,
        }
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/option-chain?symbol=NIFTY&strike=25000&window=10 - Full dashboard snapshot
async fn get_option_chain(
    Query(query): Query<OptionChainQuery>,
    State(app_state): State<AppState>,
) -> Json<ApiResponse<DashboardSnapshot>> {
    let start_time = Instant::now();

    let request = CycleRequest {
        symbol: query.symbol.unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
        reference_strike: query.strike,
        window_size: query.window.unwrap_or(DEFAULT_WINDOW_SIZE),
        expiry: query.expiry.filter(|e| !e.trim().is_empty()),
    };

    let result = dashboard::run_cycle(&app_state.client, &request, &app_state.retry).await;
    Json(ApiResponse::from_result(result, start_time))
}

/// GET /api/strikes?symbol=NIFTY&expiry=24-Oct-2024 - ATM strike and strike list for selector controls
async fn get_strikes(
    Query(query): Query<StrikesQuery>,
    State(app_state): State<AppState>,
) -> Json<ApiResponse<AtmLocation>> {
    let start_time = Instant::now();
    let symbol = query.symbol.unwrap_or_else(|| DEFAULT_SYMBOL.to_string());

    let expiry = query.expiry.filter(|e| !e.trim().is_empty());

    let result = retry::fetch_with_retry(&app_state.client, &symbol, &app_state.retry)
        .await
        .and_then(|mut chain| {
            if let Some(expiry) = &expiry {
                chain.retain_expiry(expiry);
            }
            processor::locate_atm(&chain)
        });

    Json(ApiResponse::from_result(result, start_time))
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/option-chain", get(get_option_chain))
        .route("/api/strikes", get(get_strikes))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server(port: u16, app_state: AppState) -> Result<()> {
    let app = build_router(app_state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "Option chain API listening");
    println!("🚀 Option Chain API running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET  /api/health");
    println!("   GET  /api/option-chain?symbol=NIFTY&strike=25000&window=10");
    println!("   GET  /api/strikes?symbol=NIFTY&expiry=24-Oct-2024");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}

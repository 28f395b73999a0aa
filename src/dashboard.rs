use crate::config::{RetryPolicy, DEFAULT_WINDOW_SIZE};
use crate::error::ChainError;
use crate::models::OptionChain;
use crate::nse_client::NSEClient;
use crate::processor::{self, AggregateResult};
use crate::retry;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// What one fetch-compute cycle should produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRequest {
    pub symbol: String,
    /// Strike to centre the table on; defaults to the ATM strike.
    pub reference_strike: Option<f64>,
    pub window_size: usize,
    pub expiry: Option<String>,
}

impl CycleRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reference_strike: None,
            window_size: DEFAULT_WINDOW_SIZE,
            expiry: None,
        }
    }
}

/// Everything a renderer needs for one refresh
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub symbol: String,
    pub timestamp: Option<String>,
    pub fetched_at: DateTime<Local>,
    pub expiry: Option<String>,
    /// Every expiry NSE lists for the symbol, whatever `expiry` selected
    pub expiry_dates: Vec<String>,
    pub underlying_value: f64,
    pub atm_strike: f64,
    pub strikes: Vec<f64>,
    pub analysis: AggregateResult,
}

/// Fetch, then shape. Nothing downstream runs when the fetch fails.
pub async fn run_cycle(
    client: &NSEClient,
    request: &CycleRequest,
    policy: &RetryPolicy,
) -> Result<DashboardSnapshot, ChainError> {
    let chain = retry::fetch_with_retry(client, &request.symbol, policy).await?;
    build_snapshot(chain, request)
}

pub fn build_snapshot(
    mut chain: OptionChain,
    request: &CycleRequest,
) -> Result<DashboardSnapshot, ChainError> {
    if let Some(expiry) = &request.expiry {
        chain.retain_expiry(expiry);
    }

    let location = processor::locate_atm(&chain)?;
    let reference = request
        .reference_strike
        .filter(|strike| strike.is_finite())
        .unwrap_or(location.atm_strike);
    let analysis = processor::aggregate(&chain, reference, request.window_size);

    Ok(DashboardSnapshot {
        symbol: request.symbol.trim().to_string(),
        timestamp: chain.records.timestamp,
        fetched_at: Local::now(),
        expiry: request.expiry.clone(),
        expiry_dates: chain.records.expiry_dates,
        underlying_value: location.underlying_price,
        atm_strike: location.atm_strike,
        strikes: location.strikes,
        analysis,
    })
}

pub mod api_server_axum;
pub mod app_config;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod models;
pub mod nse_client;
pub mod processor;
pub mod retry;

// Re-exports for convenience
pub use config::{FetcherConfig, RetryPolicy};
pub use dashboard::{build_snapshot, run_cycle, CycleRequest, DashboardSnapshot};
pub use error::ChainError;
pub use models::{OptionChain, OptionData, OptionDetail, Records};
pub use nse_client::{FixtureTransport, NSEClient, RawResponse, Transport, TransportError};
pub use processor::{
    aggregate, locate_atm, nearest_strike, AggregateResult, AtmLocation, PutCallRatio, StrikeRow,
    StrikeWindow, DEFAULT_WINDOW_SIZE,
};

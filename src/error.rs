use thiserror::Error;

/// Failure of one fetch-compute cycle. None of these are fatal; callers show
/// `user_message()` and skip rendering for the cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("request blocked by exchange: HTTP {status}")]
    FetchBlocked { status: u16 },

    #[error("exchange unavailable: {0}")]
    FetchUnavailable(String),

    #[error("malformed option chain payload: {0}")]
    FetchMalformed(String),

    #[error("empty option chain: {0}")]
    EmptyChain(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl ChainError {
    /// Stable tag for API consumers that branch on the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::InvalidSymbol(_) => "invalid_symbol",
            ChainError::FetchBlocked { .. } => "fetch_blocked",
            ChainError::FetchUnavailable(_) => "fetch_unavailable",
            ChainError::FetchMalformed(_) => "fetch_malformed",
            ChainError::EmptyChain(_) => "empty_chain",
            ChainError::ClientBuild(_) => "client_build",
        }
    }

    /// Rate limits, server errors and network failures are worth another try.
    /// Other client errors (403 in particular) fail fast.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChainError::FetchBlocked { status } => *status == 429 || *status >= 500,
            ChainError::FetchUnavailable(_) => true,
            _ => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ChainError::InvalidSymbol(symbol) => {
                format!("'{}' is not a valid symbol. Enter an index name such as NIFTY.", symbol)
            }
            ChainError::FetchBlocked { status: 403 } => {
                "NSE rejected the request (HTTP 403). The exchange blocks automated traffic; try again in a moment.".to_string()
            }
            ChainError::FetchBlocked { status } => {
                format!("Failed to fetch data from NSE: HTTP {}", status)
            }
            ChainError::FetchUnavailable(msg) => {
                format!("NSE could not be reached ({}). Check your connection and retry.", msg)
            }
            ChainError::FetchMalformed(_) => {
                "NSE returned data in an unexpected format. Try again shortly.".to_string()
            }
            ChainError::EmptyChain(_) => {
                "NSE returned an empty option chain for this symbol.".to_string()
            }
            ChainError::ClientBuild(msg) => format!("HTTP client setup failed: {}", msg),
        }
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::FetchMalformed(err.to_string())
    }
}

use std::str::FromStr;
use std::time::Duration;

// -----------------------------------------------
// NSE API ENDPOINTS
// -----------------------------------------------
pub const NSE_BASE_URL: &str = "https://www.nseindia.com";

pub fn nse_option_chain_url(base_url: &str, symbol: &str) -> String {
    format!(
        "{}/api/option-chain-indices?symbol={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(symbol)
    )
}

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "en-IN,en;q=0.9",
];

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// -----------------------------------------------
// SESSION WARMUP
// -----------------------------------------------
pub const WARMUP_DELAY_MS: u64 = 200;

// -----------------------------------------------
// RETRY CONFIG (caller policy, never inside the fetcher)
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 200;
pub const RETRY_FACTOR: u64 = 3;
pub const RETRY_MAX_DELAY_SECS: u64 = 5;
pub const MAX_FETCH_RETRIES: usize = 3;

// -----------------------------------------------
// HTTP HEADERS
// -----------------------------------------------
pub const HEADER_REFERER: &str = "https://www.nseindia.com/option-chain";
pub const HEADER_ACCEPT_HTML: &str = "text/html";
pub const HEADER_CONNECTION: &str = "keep-alive";

// -----------------------------------------------
// DASHBOARD DEFAULTS
// -----------------------------------------------
pub const DEFAULT_SYMBOL: &str = "NIFTY";
pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_REFRESH_MINS: u64 = 5;
pub const MIN_REFRESH_MINS: u64 = 1;
pub const MAX_REFRESH_MINS: u64 = 60;
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_LOG_DIR: &str = "./logs";

/// Everything the fetcher needs to look like a browser, passed in at construction.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: String,
    pub user_agent: String,
    pub accept_languages: Vec<String>,
    pub referer: String,
    pub timeout: Duration,
    pub warmup: bool,
    pub warmup_delay: Duration,
    pub proxy: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: NSE_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            accept_languages: ACCEPT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            referer: HEADER_REFERER.to_string(),
            timeout: HTTP_TIMEOUT,
            warmup: true,
            warmup_delay: Duration::from_millis(WARMUP_DELAY_MS),
            proxy: None,
        }
    }
}

impl FetcherConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_string("NSE_BASE_URL").unwrap_or(defaults.base_url),
            user_agent: env_string("NSE_USER_AGENT").unwrap_or(defaults.user_agent),
            accept_languages: defaults.accept_languages,
            referer: env_string("NSE_REFERER").unwrap_or(defaults.referer),
            timeout: Duration::from_secs(env_or("NSE_HTTP_TIMEOUT_SECS", HTTP_TIMEOUT.as_secs())),
            warmup: env_or("NSE_WARMUP", true),
            warmup_delay: defaults.warmup_delay,
            proxy: env_string("NSE_PROXY"),
        }
    }

    pub fn option_chain_url(&self, symbol: &str) -> String {
        nse_option_chain_url(&self.base_url, symbol)
    }
}

/// Exponential backoff applied by callers around a single fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub base_delay_ms: u64,
    pub factor: u64,
    pub max_delay: Duration,
    /// Retries after the first attempt, so at most `max_retries + 1` fetches.
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: RETRY_BASE_DELAY_MS,
            factor: RETRY_FACTOR,
            max_delay: Duration::from_secs(RETRY_MAX_DELAY_SECS),
            max_retries: MAX_FETCH_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// No retries: a single attempt only.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn from_env() -> Self {
        Self {
            max_retries: env_or("NSE_MAX_RETRIES", MAX_FETCH_RETRIES),
            ..Self::default()
        }
    }
}

// -----------------------------------------------
// ENV HELPERS
// -----------------------------------------------

/// Non-empty env var, trimmed.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an env var, falling back to `default` when unset or unparseable.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env_parse(key).unwrap_or(default)
}

/// Parse an optional env var. Unparseable values are logged and treated as unset.
pub fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|raw| parse_env_value(key, &raw))
}

fn parse_env_value<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

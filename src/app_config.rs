use crate::config::{self, env_or, env_parse, env_string, FetcherConfig, RetryPolicy};
use crate::dashboard::CycleRequest;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fetch once and print
    Single,
    /// Refresh on an interval until Ctrl-C
    Watch,
    /// JSON API for a dashboard front-end
    Server,
}

impl std::str::FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Mode::Single),
            "watch" => Ok(Mode::Watch),
            "server" => Ok(Mode::Server),
            other => bail!("Invalid mode '{}'. Use 'single', 'watch' or 'server'", other),
        }
    }
}

/// Application configuration handler
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    pub symbol: String,
    pub window_size: usize,
    pub reference_strike: Option<f64>,
    pub expiry: Option<String>,
    pub refresh_minutes: u64,
    pub port: u16,
    pub fixture: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub fetcher: FetcherConfig,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// `NSE_LOG_DIR` alone, so logging can start before the rest of the
    /// environment is parsed and its warnings are kept.
    pub fn log_dir_from_env() -> PathBuf {
        PathBuf::from(env_string("NSE_LOG_DIR").unwrap_or_else(|| config::DEFAULT_LOG_DIR.to_string()))
    }

    /// Create new configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mode = match env_string("NSE_MODE") {
            Some(raw) => raw.parse()?,
            None => Mode::Single,
        };

        Ok(Self {
            mode,
            symbol: env_string("NSE_SYMBOL").unwrap_or_else(|| config::DEFAULT_SYMBOL.to_string()),
            window_size: env_or("NSE_WINDOW", config::DEFAULT_WINDOW_SIZE),
            reference_strike: env_parse("NSE_STRIKE"),
            expiry: env_string("NSE_EXPIRY"),
            refresh_minutes: env_or("NSE_REFRESH_MINS", config::DEFAULT_REFRESH_MINS),
            port: env_or("NSE_PORT", config::DEFAULT_PORT),
            fixture: env_string("NSE_FIXTURE").map(PathBuf::from),
            log_dir: Self::log_dir_from_env(),
            fetcher: FetcherConfig::from_env(),
            retry: RetryPolicy::from_env(),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            bail!("NSE_SYMBOL must not be empty");
        }
        if !(config::MIN_REFRESH_MINS..=config::MAX_REFRESH_MINS).contains(&self.refresh_minutes) {
            bail!(
                "NSE_REFRESH_MINS must be between {} and {}, got {}",
                config::MIN_REFRESH_MINS,
                config::MAX_REFRESH_MINS,
                self.refresh_minutes
            );
        }
        if self.fetcher.timeout.is_zero() {
            bail!("NSE_HTTP_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes * 60)
    }

    pub fn cycle_request(&self) -> CycleRequest {
        CycleRequest {
            symbol: self.symbol.clone(),
            reference_strike: self.reference_strike,
            window_size: self.window_size,
            expiry: self.expiry.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            mode: Mode::Single,
            symbol: "NIFTY".to_string(),
            window_size: 10,
            reference_strike: None,
            expiry: None,
            refresh_minutes: 5,
            port: 3001,
            fixture: None,
            log_dir: PathBuf::from("./logs"),
            fetcher: FetcherConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("server".parse::<Mode>().unwrap(), Mode::Server);
        assert_eq!("WATCH".parse::<Mode>().unwrap(), Mode::Watch);
        assert!("batch".parse::<Mode>().is_err());
    }

    #[test]
    fn test_validate_refresh_range() {
        assert!(sample().validate().is_ok());

        let mut cfg = sample();
        cfg.refresh_minutes = 0;
        assert!(cfg.validate().is_err());

        cfg.refresh_minutes = 61;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_symbol() {
        let mut cfg = sample();
        cfg.symbol = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_cycle_request_carries_selection() {
        let mut cfg = sample();
        cfg.reference_strike = Some(25_000.0);
        cfg.window_size = 4;
        let req = cfg.cycle_request();
        assert_eq!(req.reference_strike, Some(25_000.0));
        assert_eq!(req.window_size, 4);
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(300));
    }
}

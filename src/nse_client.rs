use crate::config::{self, FetcherConfig};
use crate::error::ChainError;
use crate::models::OptionChain;
use async_trait::async_trait;
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

// -----------------------------------------------
// TRANSPORT SEAM
// -----------------------------------------------

/// Status and body of one upstream GET
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Network-level failure: the request never produced a status.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// How a GET reaches NSE. Proxies, header rotation and headless rendering
/// live behind this trait, never in the pipeline.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError>;
}

// -----------------------------------------------
// REQWEST TRANSPORT WITH SESSION STATE
// -----------------------------------------------
pub struct ReqwestTransport {
    client: Client,
    config: FetcherConfig,
    warmed_up: RwLock<bool>,
}

impl ReqwestTransport {
    pub fn new(config: FetcherConfig) -> Result<Self, ChainError> {
        Ok(Self {
            client: build_client(&config)?,
            config,
            warmed_up: RwLock::new(false),
        })
    }

    /// Load the NSE home page once so the cookie store holds a session.
    async fn warmup_if_needed(&self) -> Result<(), TransportError> {
        if !self.config.warmup || *self.warmed_up.read().await {
            return Ok(());
        }

        let mut warmed = self.warmed_up.write().await;
        if !*warmed {
            debug!(url = %self.config.base_url, "Warming up NSE session");
            self.client
                .get(&self.config.base_url)
                .header(header::ACCEPT, config::HEADER_ACCEPT_HTML)
                .send()
                .await
                .map_err(|e| TransportError(format!("session warmup failed: {}", describe(&e))))?;

            tokio::time::sleep(self.config.warmup_delay).await;
            *warmed = true;
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.warmup_if_needed().await?;

        let res = self
            .client
            .get(url)
            .header(header::REFERER, &self.config.referer)
            .send()
            .await
            .map_err(|e| TransportError(describe(&e)))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read body: {}", describe(&e))))?;

        Ok(RawResponse { status, body })
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

// -----------------------------------------------
// FIXTURE TRANSPORT
// -----------------------------------------------

/// Serves one canned response for every request. Used for offline runs and tests.
#[derive(Debug, Clone)]
pub struct FixtureTransport {
    response: Result<RawResponse, TransportError>,
}

impl FixtureTransport {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            response: Ok(RawResponse { status, body: body.into() }),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(TransportError(message.into())),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let body = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read fixture {}: {}", path.display(), e))?;
        Ok(Self::ok(body))
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, _url: &str) -> Result<RawResponse, TransportError> {
        self.response.clone()
    }
}

// -----------------------------------------------
// FETCHER
// -----------------------------------------------
pub struct NSEClient {
    config: FetcherConfig,
    transport: Box<dyn Transport>,
}

impl NSEClient {
    pub fn new(config: FetcherConfig) -> Result<Self, ChainError> {
        let transport = ReqwestTransport::new(config.clone())?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: FetcherConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    /// Fetch the option chain for `symbol`. One attempt, no caching.
    pub async fn fetch(&self, symbol: &str) -> Result<OptionChain, ChainError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ChainError::InvalidSymbol(symbol.to_string()));
        }

        let url = self.config.option_chain_url(symbol);
        debug!(%url, "Fetching option chain");

        let res = self.transport.get(&url).await.map_err(|e| {
            warn!(symbol, error = %e, "NSE unreachable");
            ChainError::FetchUnavailable(e.0)
        })?;

        info!(symbol, status = res.status, bytes = res.body.len(), "NSE responded");

        if res.status != 200 {
            warn!(symbol, status = res.status, "NSE rejected request");
            return Err(ChainError::FetchBlocked { status: res.status });
        }

        parse_option_chain(&res.body).inspect_err(|e| {
            warn!(symbol, error = %e, "Unparseable option chain");
        })
    }
}

/// Parse a 200 body; anything that is not the expected JSON is malformed.
pub fn parse_option_chain(body: &str) -> Result<OptionChain, ChainError> {
    let trimmed = body.trim();
    if !trimmed.starts_with('{') {
        let preview: String = trimmed.chars().take(200).collect();
        return Err(ChainError::FetchMalformed(format!("non-JSON response: {}", preview)));
    }

    Ok(serde_json::from_str(trimmed)?)
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client(config: &FetcherConfig) -> Result<Client, ChainError> {
    let mut headers = header::HeaderMap::new();

    // Rotating Accept-Language headers (fingerprint avoidance)
    let lang = config
        .accept_languages
        .choose(&mut thread_rng())
        .map(String::as_str)
        .unwrap_or(config::ACCEPT_LANGUAGES[0]);
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_str(lang).map_err(|e| ChainError::ClientBuild(e.to_string()))?,
    );
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));
    headers.insert(
        header::CONNECTION,
        header::HeaderValue::from_static(config::HEADER_CONNECTION),
    );

    // Accept-Encoding is set by reqwest from the gzip/brotli/deflate features
    let mut builder = Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .user_agent(&config.user_agent)
        .timeout(config.timeout);

    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| ChainError::ClientBuild(e.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| ChainError::ClientBuild(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_html() {
        let err = parse_option_chain("<html>Access Denied</html>").unwrap_err();
        assert!(matches!(err, ChainError::FetchMalformed(ref m) if m.contains("Access Denied")));
    }

    #[test]
    fn test_parse_soft_block_is_empty_document() {
        let chain = parse_option_chain("{}").unwrap();
        assert!(chain.records.data.is_empty());
        assert!(chain.records.underlying_value.is_none());
    }

    #[test]
    fn test_build_client_with_defaults() {
        assert!(build_client(&FetcherConfig::default()).is_ok());
    }
}

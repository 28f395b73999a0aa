use crate::config::RetryPolicy;
use crate::error::ChainError;
use crate::models::OptionChain;
use crate::nse_client::NSEClient;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::warn;

/// Caller-side retry around a single `fetch`. Only retryable failures
/// (429, 5xx, network) are repeated; a 403 comes straight back.
pub async fn fetch_with_retry(
    client: &NSEClient,
    symbol: &str,
    policy: &RetryPolicy,
) -> Result<OptionChain, ChainError> {
    let backoff = ExponentialBackoff::from_millis(policy.base_delay_ms)
        .factor(policy.factor)
        .max_delay(policy.max_delay)
        .take(policy.max_retries);

    RetryIf::start(
        backoff,
        || client.fetch(symbol),
        |err: &ChainError| {
            let retry = err.is_retryable();
            if retry {
                warn!(symbol, error = %err, "Retrying option chain fetch");
            }
            retry
        },
    )
    .await
}

//! Startup connectivity gate
//!
//! Blocks until a probe against a well-known endpoint succeeds, retrying at a
//! fixed interval for as long as it takes.

use std::future::Future;
use std::time::Duration;

/// Upper bound on a single probe request
const PROBE_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll `probe` every `interval` until it reports success
///
/// Returns the number of failed attempts before the first success.
pub async fn wait_until<F, Fut>(mut probe: F, interval: Duration) -> u32
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut failures = 0u32;
    loop {
        if probe().await {
            return failures;
        }
        failures = failures.saturating_add(1);
        if failures == 1 {
            tracing::info!("waiting for network connectivity");
        } else {
            tracing::debug!(failures, "still offline");
        }
        tokio::time::sleep(interval).await;
    }
}

/// Whether `url` answers with 200 OK
pub async fn probe(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) => response.status() == reqwest::StatusCode::OK,
        Err(e) => {
            tracing::debug!(error = %e, url, "connectivity probe failed");
            false
        }
    }
}

/// Block until `url` is reachable
pub async fn wait_for_connection(client: &reqwest::Client, url: &str, interval: Duration) {
    let failures = wait_until(|| probe(client, url), interval).await;
    if failures > 0 {
        tracing::info!(failures, "network connection established");
    } else {
        tracing::debug!(url, "network reachable");
    }
}

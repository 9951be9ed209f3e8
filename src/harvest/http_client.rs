use crate::config::ScraperConfig;
use crate::harvest::identity::OutboundIdentity;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

/// Longest wait between two attempts at the same URL.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

pub struct HttpClient {
    inner: reqwest::Client,
    max_retries: u32,
    retry_base_ms: u64,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            max_retries: config.max_retries,
            retry_base_ms: config.request_delay_ms.max(1),
        })
    }

    /// Fetch a URL as text, presenting `identity`. Non-2xx statuses are errors.
    ///
    /// Retries only when `max_retries` is configured above zero.
    pub async fn get_text(&self, url: &str, identity: &OutboundIdentity) -> Result<String> {
        let strategy = retry_delays(self.retry_base_ms, self.max_retries).map(jitter);

        let mut attempt = 0u32;
        Retry::spawn(strategy, || {
            attempt += 1;
            let n = attempt;
            async move {
                debug!("GET {} (attempt {})", url, n);
                let result = self.get_once(url, identity).await;
                if let Err(e) = &result {
                    if n <= self.max_retries {
                        warn!("GET {} failed on attempt {}: {:#}", url, n, e);
                    }
                }
                result
            }
        })
        .await
        .with_context(|| format!("GET {} failed", url))
    }

    async fn get_once(&self, url: &str, identity: &OutboundIdentity) -> Result<String> {
        let mut request = self.inner.get(url);
        for (name, value) in identity.headers() {
            request = request.header(name, value);
        }

        let resp = request.send().await.context("Request error")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {}", status);
        }
        resp.text().await.context("Failed to read response body")
    }
}

/// Doubling delays starting at `base_ms`, capped at [`MAX_RETRY_DELAY`]; one per retry.
fn retry_delays(base_ms: u64, retries: u32) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor((base_ms / 2).max(1))
        .max_delay(MAX_RETRY_DELAY)
        .take(retries as usize)
}

//! Fetching matched resources.
//!
//! [`HttpFetcher`] wraps reqwest with a timeout, a bounded redirect policy,
//! retry on 5xx and backoff on 429. Tests and embedders can supply their
//! own [`Fetcher`].

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{CaptureError, CaptureResult};

/// Body of a fetched resource.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

/// Anything that can turn a URL into its body text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> CaptureResult<FetchedResource>;
}

/// HTTP fetcher for descriptor payloads.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpFetcher {
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("camquiz/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_retries: 2,
        }
    }

    /// Override the number of retries on 5xx, 429 and connection errors.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> CaptureResult<FetchedResource> {
        let mut retries = 0u32;

        loop {
            let resp = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) => {
                    if retries < self.max_retries {
                        retries += 1;
                        tokio::time::sleep(backoff(retries)).await;
                        continue;
                    }
                    return Err(CaptureError::transport(url, e.to_string()));
                }
            };

            let status = resp.status().as_u16();

            if status >= 500 && retries < self.max_retries {
                retries += 1;
                tracing::debug!(url, status, retries, "retrying after server error");
                tokio::time::sleep(backoff(retries)).await;
                continue;
            }

            if status == 429 && retries < self.max_retries {
                retries += 1;
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                continue;
            }

            if !resp.status().is_success() {
                return Err(CaptureError::transport(url, format!("HTTP {status}")));
            }

            let final_url = resp.url().to_string();
            let body = resp
                .text()
                .await
                .map_err(|e| CaptureError::transport(url, e.to_string()))?;

            return Ok(FetchedResource {
                url: url.to_string(),
                final_url,
                status,
                body,
            });
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * 2u64.pow(attempt.saturating_sub(1)))
}

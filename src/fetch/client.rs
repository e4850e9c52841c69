//! HTTP fetcher implementation
//!
//! This module handles all page requests for the monitor:
//! - Building the HTTP client with browser-like headers and one overall timeout
//! - GET requests with a bounded number of attempts and a fixed delay
//! - Cheap reachability probes for flag images
//!
//! Exhausted retries produce an empty body rather than an error, so callers
//! treat "no data this cycle" as routine.

use crate::config::FetchConfig;
use crate::fetch::retry::{with_retry, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html, application/xhtml+xml, application/xml, application/json;q=0.9, */*;q=0.8";

/// Builds an HTTP client with proper configuration
///
/// The configured timeout covers connect and read together.
///
/// # Example
///
/// ```no_run
/// use numwatch::config::FetchConfig;
/// use numwatch::fetch::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(config.timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs page requests with retries
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay()),
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetches a URL and returns its body text
    ///
    /// Network errors and timeouts are retried up to the configured number of
    /// attempts. Any response that arrives counts as usable text regardless of
    /// its status code. After the last failed attempt an empty string is
    /// returned.
    pub async fn fetch(&self, url: &str) -> String {
        let client = &self.client;
        let result = with_retry("fetch", self.retry, |attempt| async move {
            tracing::trace!(%url, attempt, "GET");
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                tracing::debug!(%url, %status, "non-success status, using body anyway");
            }
            response.text().await
        })
        .await;

        match result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%url, error = %e, "giving up on request");
                String::new()
            }
        }
    }

    /// Fetches a URL for an API strategy
    ///
    /// Transport failures are retried like `fetch`. Unlike `fetch`, a
    /// non-success status is an error and is not retried, and the last error
    /// is returned instead of an empty body.
    pub async fn fetch_strict(&self, url: &str) -> Result<String, reqwest::Error> {
        let client = &self.client;
        let response = with_retry("fetch_strict", self.retry, |attempt| async move {
            tracing::trace!(%url, attempt, "GET");
            client.get(url).send().await
        })
        .await?;

        response.error_for_status()?.text().await
    }

    /// Checks whether a URL answers a HEAD request with a success status
    ///
    /// A single attempt is made; any error counts as unreachable.
    pub async fn is_reachable(&self, url: &str, timeout: Duration) -> bool {
        match self.client.head(url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(%url, error = %e, "probe failed");
                false
            }
        }
    }
}

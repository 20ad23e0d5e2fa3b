//! HTTP retrieval of product pages.
//!
//! Wraps a shared [`reqwest::Client`] with retry-with-backoff for transient
//! failures. Rate-limit responses honor the server's `Retry-After` header
//! when it asks for a longer wait than the computed backoff.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use fitdex_core::AppConfig;

/// Fallback wait when a 429 response carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Errors produced while fetching a product page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned 429 Too Many Requests.
    #[error("rate limited by {domain}, retry after {retry_after_secs}s")]
    RateLimited { domain: String, retry_after_secs: u64 },

    /// The page does not exist (404).
    #[error("page not found: {url}")]
    NotFound { url: String },

    /// Any other non-success status.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}

/// Whether an error is worth another attempt. 404s are final; server-side
/// errors and transport failures usually are not.
fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::RateLimited { .. } | FetchError::Http(_) => true,
        FetchError::UnexpectedStatus { status, .. } => *status >= 500,
        FetchError::NotFound { .. } => false,
    }
}

/// Minimum wait the server demanded, if the error carries one.
fn server_wait_secs(err: &FetchError) -> Option<u64> {
    match err {
        FetchError::RateLimited {
            retry_after_secs, ..
        } => Some(*retry_after_secs),
        _ => None,
    }
}

fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

/// Retries `operation` on retriable errors with exponential backoff.
///
/// Waits `backoff_base_secs * 2^attempt` between attempts, or longer when the
/// server's `Retry-After` exceeds that. `max_retries = 0` means a single
/// attempt with no retry.
async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                // Shift capped so the multiplier cannot overflow u64.
                let backoff_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
                let delay_secs =
                    server_wait_secs(&err).map_or(backoff_secs, |wait| wait.max(backoff_secs));
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_secs,
                    error = %err,
                    "transient fetch failure, backing off"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}

/// HTTP client for product pages with per-request retry.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl PageFetcher {
    /// Builds a fetcher from the application config.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying client cannot be
    /// constructed (for example an invalid user-agent string).
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries: config.fetch_max_retries,
            backoff_base_secs: config.fetch_backoff_base_secs,
        })
    }

    /// Fetches one product page and returns its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] for 404s, [`FetchError::RateLimited`]
    /// when retries are exhausted on 429s, [`FetchError::UnexpectedStatus`]
    /// for other non-success statuses, and [`FetchError::Http`] for
    /// transport failures.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
                    .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                    .send()
                    .await?;

                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|value| value.to_str().ok())
                        .and_then(|value| value.trim().parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    return Err(FetchError::RateLimited {
                        domain: domain_of(&url),
                        retry_after_secs,
                    });
                }
                if status == StatusCode::NOT_FOUND {
                    return Err(FetchError::NotFound { url });
                }
                if !status.is_success() {
                    return Err(FetchError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;

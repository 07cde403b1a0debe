//! HTTP fetcher for the platform's public JSON endpoints.

mod session;

use std::time::Duration;

use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use redharvest_core::AppConfig;

use crate::error::{is_blocking_status, ScraperError};
use crate::rate_limit::retry_with_backoff;

pub use session::{SessionLease, SessionPool};

/// Fetches JSON documents with browser-like headers, rotating sessions and
/// retrying transient failures.
///
/// Every attempt takes a session from the pool and waits a short random
/// pause first. A blocking response retires the session it was served to,
/// so the retry goes out under a different identity.
pub struct HttpFetcher {
    client: Client,
    sessions: SessionPool,
    max_retries: u32,
    backoff_base_ms: u64,
    pause_min_ms: u64,
    pause_max_ms: u64,
}

fn default_headers(origin: &str) -> Result<HeaderMap, ScraperError> {
    let invalid = |e: header::InvalidHeaderValue| ScraperError::InvalidUrl {
        url: origin.to_owned(),
        reason: e.to_string(),
    };
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(&format!("{origin}/")).map_err(invalid)?,
    );
    headers.insert(header::ORIGIN, HeaderValue::from_str(origin).map_err(invalid)?);
    Ok(headers)
}

impl HttpFetcher {
    /// Creates a fetcher from the transport settings in `config`.
    ///
    /// The session pool holds at least two sessions per concurrent request.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the configured origin cannot be
    /// used as a header value, or [`ScraperError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        config: &AppConfig,
        max_retries: u32,
        max_concurrency: usize,
    ) -> Result<Self, ScraperError> {
        let origin = config.platform_origin.trim_end_matches('/');
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .default_headers(default_headers(origin)?)
            .build()?;
        let pool_size = config
            .session_pool_size
            .max(max_concurrency.saturating_mul(2));
        Ok(Self {
            client,
            sessions: SessionPool::new(pool_size, config.session_max_usage),
            max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            pause_min_ms: config.pause_min_ms,
            pause_max_ms: config.pause_max_ms,
        })
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionPool {
        &self.sessions
    }

    /// Fetches `url` and parses the body as JSON, retrying transient errors
    /// up to the configured number of times.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::Blocked`]: another blocking status after all retries.
    /// - [`ScraperError::NotFound`]: HTTP 404 (not retried).
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status (not retried).
    /// - [`ScraperError::Http`]: network failure after all retries.
    /// - [`ScraperError::Deserialize`]: the body is not JSON (not retried).
    pub async fn fetch_json(&self, url: &str) -> Result<Value, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || self.attempt(url)).await
    }

    async fn attempt(&self, url: &str) -> Result<Value, ScraperError> {
        let lease = self.sessions.acquire();
        self.pause().await;

        let result = self.request(url, &lease).await;
        if let Err(err) = &result {
            if err.marks_session_bad() {
                self.sessions.mark_bad(&lease);
            }
        }
        result
    }

    async fn pause(&self) {
        let ms = if self.pause_max_ms > self.pause_min_ms {
            rand::rng().random_range(self.pause_min_ms..=self.pause_max_ms)
        } else {
            self.pause_min_ms
        };
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    async fn request(&self, url: &str, lease: &SessionLease) -> Result<Value, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(header::USER_AGENT, lease.user_agent)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(0);
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }
        if is_blocking_status(status.as_u16()) {
            return Err(ScraperError::Blocked {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ScraperError::Deserialize {
            context: url.to_owned(),
            source: e,
        })
    }
}

// src/edgar/client.rs
use crate::utils::error::{RetrievalError, Transient};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

type EdgarRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

// SEC asks for 10 requests/second max. Be conservative. >100ms delay.
pub const EDGAR_REQUEST_DELAY: Duration = Duration::from_millis(150);

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Plain GET capability used by every EDGAR stage.
///
/// Transport failures are errors; any HTTP status (including non-2xx)
/// is a response. Callers decide what a status means.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, RetrievalError>;
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    #[cfg(test)]
    pub const fn none() -> Self {
        Self { max_retries: 0, base_backoff: Duration::ZERO }
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2_u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, base_backoff: Duration::from_millis(500) }
    }
}

/// Runs `op` until it succeeds, fails permanently, or the retry budget is spent.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                tracing::warn!(
                    "Transient failure for {} (retry {}/{} in {:?}): {}",
                    label,
                    attempt,
                    policy.max_retries,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// GETs `url` and returns the body, treating anything but 200 as a failure.
pub async fn fetch_success(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, RetrievalError> {
    with_retry(policy, url, move || async move {
        let response = fetcher.get(url).await?;
        if response.status != 200 {
            tracing::error!("HTTP error status: {} for URL: {}", response.status, url);
            return Err(RetrievalError::Http {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response.body)
    })
    .await
}

/// reqwest-backed fetcher configured for EDGAR: mandatory User-Agent,
/// per-request timeout and a minimum spacing between requests.
pub struct EdgarHttpClient {
    client: reqwest::Client,
    user_agent: String,
    // None when the configured spacing is zero.
    rate_limiter: Option<EdgarRateLimiter>,
}

impl EdgarHttpClient {
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        min_interval: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent) // Set the required User-Agent
            .timeout(timeout)
            .build()?;

        // One request per `min_interval`, no bursts.
        let rate_limiter = Quota::with_period(min_interval).map(RateLimiter::direct);

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            rate_limiter,
        })
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl Fetcher for EdgarHttpClient {
    async fn get(&self, url: &str) -> Result<FetchResponse, RetrievalError> {
        self.throttle().await;

        tracing::debug!("GET {} (User-Agent: {})", url, self.user_agent);

        let network = |e: reqwest::Error| RetrievalError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json,text/html,text/plain,*/*")
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
        }

        let body = response.text().await.map_err(network)?;
        tracing::debug!("Received {} ({} bytes) from {}", status, body.len(), url);

        Ok(FetchResponse { status: status.as_u16(), body })
    }
}

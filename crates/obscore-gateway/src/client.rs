// crates/obscore-gateway/src/client.rs
// ============================================================================
// Module: Persistence Gateway Client
// Description: The sole outbound path to the persistence gateway — every
//              DecisionEvent an agent emits, and every read it performs for
//              an SLO enforcement or analysis request, goes through here.
// Purpose: Centralize retry, backoff, timeout, and auth policy so no call
//          site reimplements them.
// Dependencies: obscore-core, reqwest, tokio, tracing
// ============================================================================

//! ## Overview
//! [`GatewayClient`] wraps one [`reqwest::Client`] behind a fixed-size
//! connection pool and applies a uniform retry policy: transport failures
//! and `5xx` responses are retried with doubling backoff up to a
//! configured attempt count; `4xx` responses are never retried, since they
//! indicate a malformed request rather than a transient condition. The
//! pool is a `tokio::sync::Semaphore` sized to `pool_size`: every outbound
//! call acquires a permit before it sends a single byte and holds it
//! across retries, releasing it only once that logical call is done.
//! `Semaphore::acquire` queues waiters FIFO and wakes exactly the head of
//! the queue on release, so there is no pool-exhaustion error — only wait
//! time, bounded by the caller's own performance guard. Built via
//! [`GatewayClientBuilder`], in the style of a composite-broker builder:
//! accumulate fields, `build()` once.

use std::sync::Arc;
use std::time::Duration;

use obscore_core::decision::DecisionEvent;
use obscore_core::identity::ExecutionRef;
use reqwest::RequestBuilder;
use reqwest::Response;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::sync::SemaphorePermit;

use crate::error::GatewayError;
use crate::error::RuvectorError;

/// Builder for a [`GatewayClient`].
pub struct GatewayClientBuilder {
    service_url: Option<String>,
    api_key: Option<String>,
    user_agent: String,
    pool_size: usize,
    retry_attempts: u32,
    retry_delay: Duration,
    max_retry_delay: Duration,
    timeout: Duration,
    health_timeout: Duration,
}

impl Default for GatewayClientBuilder {
    fn default() -> Self {
        Self {
            service_url: None,
            api_key: None,
            user_agent: "obscore-agent/0.1.0".to_owned(),
            pool_size: 5,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1_000),
            max_retry_delay: Duration::from_millis(10_000),
            timeout: Duration::from_millis(30_000),
            health_timeout: Duration::from_millis(5_000),
        }
    }
}

impl GatewayClientBuilder {
    /// Creates a builder with default pool, retry, and timeout settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the gateway base URL.
    #[must_use]
    pub fn service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = Some(url.into());
        self
    }

    /// Sets the bearer token injected on every outbound request.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the `User-Agent` header, conventionally `<agent_name>/<version>`.
    #[must_use]
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent = value.into();
        self
    }

    /// Sets the fixed connection pool size.
    #[must_use]
    pub const fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Sets the maximum total attempts per outbound call.
    #[must_use]
    pub const fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Sets the initial retry backoff.
    #[must_use]
    pub const fn retry_delay_ms(mut self, millis: u64) -> Self {
        self.retry_delay = Duration::from_millis(millis);
        self
    }

    /// Sets the retry backoff cap.
    #[must_use]
    pub const fn max_retry_delay_ms(mut self, millis: u64) -> Self {
        self.max_retry_delay = Duration::from_millis(millis);
        self
    }

    /// Sets the per-attempt request timeout.
    #[must_use]
    pub const fn timeout_ms(mut self, millis: u64) -> Self {
        self.timeout = Duration::from_millis(millis);
        self
    }

    /// Sets the health-check timeout.
    #[must_use]
    pub const fn health_timeout_ms(mut self, millis: u64) -> Self {
        self.health_timeout = Duration::from_millis(millis);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    /// Returns [`GatewayError::Transport`] if the base URL or API key is
    /// unset, or if the underlying HTTP client cannot be constructed.
    pub fn build(self) -> Result<GatewayClient, GatewayError> {
        let base_url = self
            .service_url
            .ok_or_else(|| GatewayError::Transport("gateway service_url is required".to_owned()))?;
        let api_key = self
            .api_key
            .ok_or_else(|| GatewayError::Transport("gateway api_key is required".to_owned()))?;

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(self.pool_size)
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Ok(GatewayClient {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            retry_attempts: self.retry_attempts.max(1),
            retry_delay: self.retry_delay,
            max_retry_delay: self.max_retry_delay,
            health_timeout: self.health_timeout,
            pool: Arc::new(Semaphore::new(self.pool_size.max(1))),
        })
    }
}

/// Pooled client for the persistence gateway.
///
/// # Invariants
/// - Shared across requests within an agent process; never reconstructed
///   per request.
/// - `4xx` responses are returned to the caller on the first attempt, never
///   retried.
/// - No more than `pool_size` outbound calls are in flight at once; callers
///   beyond that suspend on `pool`'s FIFO wait queue rather than failing.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retry_attempts: u32,
    retry_delay: Duration,
    max_retry_delay: Duration,
    health_timeout: Duration,
    /// Fixed-size connection pool. One permit per logical outbound call,
    /// held across its retries, released when the call (success or
    /// failure) completes.
    pool: Arc<Semaphore>,
}

impl GatewayClient {
    /// Returns a builder seeded with default pool, retry, and timeout
    /// settings.
    #[must_use]
    pub fn builder() -> GatewayClientBuilder {
        GatewayClientBuilder::new()
    }

    /// Persists a single `DecisionEvent`.
    ///
    /// # Errors
    /// Returns [`GatewayError`] on a non-2xx response or exhausted retries.
    pub async fn persist_decision(&self, event: &DecisionEvent) -> Result<(), GatewayError> {
        let url = format!("{}/api/v1/decision-events", self.base_url);
        let body = serde_json::to_value(event).map_err(|err| GatewayError::Serialization(err.to_string()))?;
        let _permit = self.acquire().await?;
        let response = self
            .send_with_retry("persist_decision", || {
                self.http.post(&url).bearer_auth(&self.api_key).json(&body)
            })
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    /// Persists a batch of `DecisionEvent`s in one request, preserving
    /// order.
    ///
    /// # Errors
    /// Returns [`GatewayError`] on a non-2xx response or exhausted retries.
    pub async fn persist_decisions(&self, events: &[DecisionEvent]) -> Result<(), GatewayError> {
        let url = format!("{}/api/v1/decision-events/batch", self.base_url);
        let body = serde_json::json!({ "events": events });
        let _permit = self.acquire().await?;
        let response = self
            .send_with_retry("persist_decisions", || {
                self.http.post(&url).bearer_auth(&self.api_key).json(&body)
            })
            .await?;
        ensure_success(response).await.map(|_| ())
    }

    /// Reads decisions matching the given query parameters.
    ///
    /// # Errors
    /// Returns [`GatewayError`] on a non-2xx response, exhausted retries,
    /// or a response body that does not parse as a JSON array.
    pub async fn get_decisions(&self, query: &[(&str, &str)]) -> Result<Vec<Value>, GatewayError> {
        let url = format!("{}/api/v1/decision-events", self.base_url);
        let _permit = self.acquire().await?;
        let response = self
            .send_with_retry("get_decisions", || {
                self.http.get(&url).bearer_auth(&self.api_key).query(query)
            })
            .await?;
        let response = ensure_success(response).await?;
        response.json::<Vec<Value>>().await.map_err(|err| GatewayError::Serialization(err.to_string()))
    }

    /// Reads a single decision by its `execution_ref`, returning `None`
    /// when the gateway reports it does not exist.
    ///
    /// # Errors
    /// Returns [`GatewayError`] on a non-2xx, non-404 response, exhausted
    /// retries, or an unparseable response body.
    pub async fn get_decision_by_ref(
        &self,
        execution_ref: ExecutionRef,
    ) -> Result<Option<Value>, GatewayError> {
        let url = format!("{}/api/v1/decision-events/{execution_ref}", self.base_url);
        let _permit = self.acquire().await?;
        let response = self
            .send_with_retry("get_decision_by_ref", || self.http.get(&url).bearer_auth(&self.api_key))
            .await?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        let value =
            response.json::<Value>().await.map_err(|err| GatewayError::Serialization(err.to_string()))?;
        Ok(Some(value))
    }

    /// Requests a server-side aggregation over persisted decisions (used by
    /// the SLO enforcement and usage-analysis agents to pull historical
    /// context).
    ///
    /// # Errors
    /// Returns [`GatewayError`] on a non-2xx response, exhausted retries, or
    /// an unparseable response body.
    pub async fn aggregate(&self, query: &[(&str, &str)]) -> Result<Value, GatewayError> {
        let url = format!("{}/api/v1/decision-events/aggregate", self.base_url);
        let _permit = self.acquire().await?;
        let response = self
            .send_with_retry("aggregate", || {
                self.http.get(&url).bearer_auth(&self.api_key).query(query)
            })
            .await?;
        let response = ensure_success(response).await?;
        response.json::<Value>().await.map_err(|err| GatewayError::Serialization(err.to_string()))
    }

    /// Checks gateway reachability, bounded by the configured health
    /// timeout rather than the standard per-attempt timeout.
    ///
    /// # Errors
    /// Returns [`GatewayError`] if the gateway is unreachable or reports an
    /// unhealthy status.
    pub async fn health(&self) -> Result<(), GatewayError> {
        let url = format!("{}/health", self.base_url);
        let _permit = self.acquire().await?;
        let response = self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        ensure_success(response).await.map(|_| ())
    }

    /// Acquires one pool slot, suspending on the semaphore's FIFO wait
    /// queue when all `pool_size` slots are in use. The returned permit is
    /// held by the caller for the lifetime of its logical outbound call
    /// (including retries) and released on drop, handing the slot to the
    /// next queued waiter.
    ///
    /// # Errors
    /// Returns [`GatewayError::Transport`] if the pool has been closed —
    /// unreachable in practice, since nothing ever calls `Semaphore::close`.
    async fn acquire(&self) -> Result<SemaphorePermit<'_>, GatewayError> {
        self.pool.acquire().await.map_err(|_err| GatewayError::Transport("connection pool closed".to_owned()))
    }

    /// Sends a request with retry on transport failure or `5xx` response,
    /// doubling the backoff delay up to `max_retry_delay` between attempts.
    /// Returns the final response untouched for any status below `500` —
    /// the caller decides how to interpret `4xx`.
    async fn send_with_retry(
        &self,
        operation: &str,
        mut request_factory: impl FnMut() -> RequestBuilder,
    ) -> Result<Response, GatewayError> {
        let mut delay = self.retry_delay;
        let mut last_error = String::new();

        for attempt in 1..=self.retry_attempts {
            match request_factory().send().await {
                Ok(response) if response.status().as_u16() < 500 => return Ok(response),
                Ok(response) => {
                    last_error = format!("status {}", response.status());
                }
                Err(err) => {
                    last_error = err.to_string();
                }
            }

            if attempt < self.retry_attempts {
                tracing::warn!(operation, attempt, error = %last_error, "gateway attempt failed, retrying");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2).min(self.max_retry_delay);
            }
        }

        Err(GatewayError::RetriesExhausted { attempts: self.retry_attempts, last: last_error })
    }
}

/// Converts a non-2xx response into a [`GatewayError::Status`], consuming
/// the body as the error message.
async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status_code = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(GatewayError::Status(RuvectorError { status_code, message }))
}

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::GatewayClient;

    #[test]
    fn builder_requires_service_url_and_api_key() {
        let err = GatewayClient::builder().api_key("secret").build().unwrap_err();
        assert!(matches!(err, super::GatewayError::Transport(_)));
    }

    #[test]
    fn builder_succeeds_with_required_fields() {
        GatewayClient::builder()
            .service_url("https://gateway.internal")
            .api_key("secret")
            .build()
            .expect("minimal valid configuration builds");
    }

    #[tokio::test]
    async fn pool_blocks_beyond_its_size_and_releases_fifo() {
        let client = GatewayClient::builder()
            .service_url("https://gateway.internal")
            .api_key("secret")
            .pool_size(1)
            .build()
            .expect("minimal valid configuration builds");

        let first = client.acquire().await.expect("first permit acquires immediately");

        // The only slot is held, so a second acquire must not resolve yet.
        let second = tokio::time::timeout(std::time::Duration::from_millis(50), client.acquire()).await;
        assert!(second.is_err(), "second acquire should suspend while the sole permit is held");

        drop(first);

        // Releasing the held permit wakes the queued waiter.
        tokio::time::timeout(std::time::Duration::from_millis(50), client.acquire())
            .await
            .expect("acquire resolves once the prior permit is dropped")
            .expect("pool is not closed");
    }
}

//! Request execution: transport, configuration, and the retry orchestrator.
//!
//! This module turns a single logical request into one or more correlated
//! transport calls:
//!
//! ```text
//! connection/
//! ├── config    - ConnectionConfig (retry bounds, duration budget)
//! ├── manager   - ConnectionManager (capability checks, shared-state refcount)
//! ├── transport - HttpTransport (one GET/POST, status classification)
//! └── mod       - SfsConnection (bounded retries with exponential backoff)
//! ```
//!
//! # Retry Behavior
//!
//! A failed attempt is retried only when its failure classifies as retriable
//! (transient 5xx statuses, transport timeouts). The wait before retry `n`
//! (zero-indexed) is the server's `Retry-After` hint when the failed response
//! carried one, else `retry_delay * 2^n`. Before each wait the optional
//! total-duration budget is checked; once elapsed time exceeds it the call
//! fails without waiting further. At most `max_retries + 1` transport calls
//! are ever made for one logical request, and the correlation context is
//! advanced before every retry so the attempts stay linkable but distinct.

mod config;
mod manager;
mod transport;

pub use config::{ConnectionConfig, MAX_RETRIES_BOUND};
pub use transport::CORRELATION_VECTOR_HEADER;
pub(crate) use manager::ConnectionManager;
pub(crate) use transport::HttpTransport;

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::time::sleep;

use crate::correlation::CorrelationContext;
use crate::error::Result;
use crate::logging::{log_error, log_warn, LogHandler};

/// Exponential backoff delay for the given zero-indexed retry.
///
/// The exponent is capped so pathological retry indices cannot overflow the
/// multiplication.
fn exponential_backoff(retry_index: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.pow(retry_index.min(10)))
}

/// One logical-request executor: wraps single transport calls in the bounded
/// retry loop.
///
/// Holds no per-request state; a client may drive two logical requests from
/// two threads concurrently as long as each owns its own
/// [`CorrelationContext`].
#[derive(Debug)]
pub(crate) struct SfsConnection {
    transport: HttpTransport,
    config: ConnectionConfig,
    log: Arc<LogHandler>,
}

impl SfsConnection {
    pub(crate) fn new(
        transport: HttpTransport,
        config: ConnectionConfig,
        log: Arc<LogHandler>,
    ) -> Self {
        SfsConnection {
            transport,
            config,
            log,
        }
    }

    /// GET with retries.
    pub(crate) async fn get(
        &self,
        url: &str,
        correlation: &mut CorrelationContext,
    ) -> Result<Bytes> {
        self.execute(url, None, correlation).await
    }

    /// POST a JSON body with retries.
    pub(crate) async fn post(
        &self,
        url: &str,
        body: serde_json::Value,
        correlation: &mut CorrelationContext,
    ) -> Result<Bytes> {
        self.execute(url, Some(body), correlation).await
    }

    async fn execute(
        &self,
        url: &str,
        body: Option<serde_json::Value>,
        correlation: &mut CorrelationContext,
    ) -> Result<Bytes> {
        let started = Instant::now();
        let max_retries = self.config.clamped_max_retries();
        let mut attempt: u32 = 0;

        loop {
            // First call returns the vector unmodified; every later call
            // advances it, so each retry is distinguishable server-side.
            let vector = correlation.pop_latest();
            let outcome = match &body {
                Some(body) => self.transport.post(url, body, &vector).await,
                None => self.transport.get(url, &vector).await,
            };

            let err = match outcome {
                Ok(bytes) => return Ok(bytes),
                Err(err) => err,
            };

            if !err.is_retryable() {
                log_error!(self.log, "request to {url} failed: {err}");
                return Err(err);
            }
            if attempt >= max_retries {
                log_error!(
                    self.log,
                    "request to {url} failed after {} attempts: {err}",
                    attempt + 1
                );
                return Err(err);
            }

            let delay = err
                .retry_after()
                .unwrap_or_else(|| exponential_backoff(attempt, self.config.retry_delay));

            if let Some(budget) = self.config.max_request_duration {
                if started.elapsed() >= budget {
                    log_error!(
                        self.log,
                        "request to {url} exceeded its {budget:?} duration budget: {err}"
                    );
                    return Err(err);
                }
            }

            log_warn!(
                self.log,
                "attempt {} for {url} failed ({err}); retrying after {delay:?}",
                attempt + 1
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn connection(server_timeout: Duration, config: ConnectionConfig) -> SfsConnection {
        let manager = ConnectionManager::new(server_timeout).unwrap();
        SfsConnection::new(manager.make_transport(), config, Arc::new(LogHandler::new(None)))
    }

    fn fast_config(max_retries: u32) -> ConnectionConfig {
        ConnectionConfig {
            max_retries,
            retry_delay: Duration::from_millis(50),
            max_request_duration: None,
        }
    }

    #[test]
    fn test_exponential_backoff_schedule() {
        let base = Duration::from_millis(100);
        assert_eq!(exponential_backoff(0, base), Duration::from_millis(100));
        assert_eq!(exponential_backoff(1, base), Duration::from_millis(200));
        assert_eq!(exponential_backoff(2, base), Duration::from_millis(400));
        // Exponent cap keeps large indices finite.
        assert_eq!(exponential_backoff(40, base), base.saturating_mul(1024));
    }

    #[tokio::test]
    async fn test_success_is_single_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body("body")
            .expect(1)
            .create_async()
            .await;

        let connection = connection(Duration::from_secs(5), fast_config(3));
        let mut correlation = CorrelationContext::new();
        let body = connection
            .get(&format!("{}/ok", server.url()), &mut correlation)
            .await
            .unwrap();
        assert_eq!(&body[..], b"body");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_terminal_failure_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let connection = connection(Duration::from_secs(5), fast_config(3));
        let mut correlation = CorrelationContext::new();
        let err = connection
            .get(&format!("{}/missing", server.url()), &mut correlation)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::HttpNotFound);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retry_budget_is_never_exceeded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/busy")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let connection = connection(Duration::from_secs(5), fast_config(2));
        let mut correlation = CorrelationContext::new();
        let err = connection
            .get(&format!("{}/busy", server.url()), &mut correlation)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::HttpServiceNotAvailable);
        // max_retries = 2 means exactly 3 transport calls.
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/busy")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let connection = connection(Duration::from_secs(5), fast_config(0));
        let mut correlation = CorrelationContext::new();
        let err = connection
            .get(&format!("{}/busy", server.url()), &mut correlation)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_correlation_vector_advances_per_attempt() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/flaky")
            .match_header(CORRELATION_VECTOR_HEADER, "aaaaaaaaaaaaaaaa.0.0")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/flaky")
            .match_header(CORRELATION_VECTOR_HEADER, "aaaaaaaaaaaaaaaa.0.1")
            .with_status(200)
            .with_body("recovered")
            .expect(1)
            .create_async()
            .await;

        let connection = connection(Duration::from_secs(5), fast_config(3));
        let mut correlation = CorrelationContext::new();
        correlation.set_base("aaaaaaaaaaaaaaaa.0").unwrap();
        let body = connection
            .get(&format!("{}/flaky", server.url()), &mut correlation)
            .await
            .unwrap();
        assert_eq!(&body[..], b"recovered");
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_exponential_timing_and_retry_after_precedence() {
        let mut server = mockito::Server::new_async().await;
        // Attempt 0 carries a Retry-After hint; attempt 1 falls back to the
        // exponential schedule (which has advanced to 2^1 * base).
        let _with_hint = server
            .mock("GET", "/hinted")
            .match_header(CORRELATION_VECTOR_HEADER, "aaaaaaaaaaaaaaaa.0.0")
            .with_status(503)
            .with_header("Retry-After", "1")
            .expect(1)
            .create_async()
            .await;
        let _without_hint = server
            .mock("GET", "/hinted")
            .match_header(CORRELATION_VECTOR_HEADER, "aaaaaaaaaaaaaaaa.0.1")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let _success = server
            .mock("GET", "/hinted")
            .match_header(CORRELATION_VECTOR_HEADER, "aaaaaaaaaaaaaaaa.0.2")
            .with_status(200)
            .with_body("ok")
            .expect(1)
            .create_async()
            .await;

        let connection = connection(Duration::from_secs(5), fast_config(3));
        let mut correlation = CorrelationContext::new();
        correlation.set_base("aaaaaaaaaaaaaaaa.0").unwrap();

        let started = Instant::now();
        connection
            .get(&format!("{}/hinted", server.url()), &mut correlation)
            .await
            .unwrap();
        let elapsed = started.elapsed();

        // 1000ms (Retry-After) + 100ms (50ms * 2^1), within tolerance.
        assert!(elapsed >= Duration::from_millis(1100), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(2500), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_duration_budget_cuts_the_sequence_short() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/busy")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let config = ConnectionConfig {
            max_retries: 3,
            retry_delay: Duration::from_millis(200),
            max_request_duration: Some(Duration::from_millis(100)),
        };
        let connection = connection(Duration::from_secs(5), config);
        let mut correlation = CorrelationContext::new();

        let started = Instant::now();
        let err = connection
            .get(&format!("{}/busy", server.url()), &mut correlation)
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert_eq!(err.code(), ErrorCode::HttpServiceNotAvailable);
        // The budget expires after the first wait; the full schedule
        // (200 + 400 + 800ms) is never consumed.
        assert!(elapsed < Duration::from_millis(600), "elapsed {elapsed:?}");
        mock.assert_async().await;
    }
}

//! Single-attempt HTTP transport with status classification.
//!
//! [`HttpTransport`] performs exactly one GET or POST against a fully-formed
//! URL and reports the outcome as a typed result: the raw body on 200, or an
//! [`SfsError`] from the closed taxonomy otherwise. No transport-library
//! error type ever leaks past this module, and retriable statuses carry the
//! server's `Retry-After` hint for the orchestrator in
//! [`crate::connection`].

use std::time::Duration;

use bytes::Bytes;

use crate::error::{Result, SfsError};

/// Header carrying the correlation vector on every outbound request.
pub const CORRELATION_VECTOR_HEADER: &str = "MS-CV";

/// Builds the timeout failure text; callers rely on the "timed out after"
/// phrasing for diagnostics.
fn timeout_message(url: &str, timeout: Duration) -> String {
    format!("request to {url} timed out after {}ms", timeout.as_millis())
}

fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// One independent HTTP connection.
///
/// Cheap to create from a [`ConnectionManager`](super::ConnectionManager)
/// (the underlying pool is shared); each instance serves one in-flight call
/// at a time.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub(crate) fn new(client: reqwest::Client, request_timeout: Duration) -> Self {
        HttpTransport {
            client,
            request_timeout,
        }
    }

    /// Execute one GET, returning the response body on 200.
    pub(crate) async fn get(&self, url: &str, correlation_vector: &str) -> Result<Bytes> {
        let request = self
            .client
            .get(url)
            .header(CORRELATION_VECTOR_HEADER, correlation_vector);
        self.send(url, request).await
    }

    /// Execute one POST with a JSON body, returning the response body on 200.
    pub(crate) async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        correlation_vector: &str,
    ) -> Result<Bytes> {
        let request = self
            .client
            .post(url)
            .header(CORRELATION_VECTOR_HEADER, correlation_vector)
            .json(body);
        self.send(url, request).await
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> Result<Bytes> {
        tracing::debug!(target: "sfs_client", %url, "sending request");

        let response = request
            .send()
            .await
            .map_err(|err| self.classify_send_error(url, err))?;

        let status = response.status().as_u16();
        match status {
            200 => response
                .bytes()
                .await
                .map_err(|err| self.classify_send_error(url, err)),
            400 => Err(SfsError::HttpBadRequest(format!(
                "service rejected the request to {url}"
            ))),
            404 => Err(SfsError::HttpNotFound(format!(
                "resource not found at {url}"
            ))),
            502 | 503 => Err(SfsError::HttpServiceNotAvailable {
                message: format!("service returned {status} for {url}"),
                retry_after: parse_retry_after(&response),
            }),
            _ => Err(SfsError::HttpUnexpected {
                status,
                message: format!("service returned {status} for {url}"),
            }),
        }
    }

    fn classify_send_error(&self, url: &str, err: reqwest::Error) -> SfsError {
        if err.is_timeout() {
            SfsError::HttpTimeout(timeout_message(url, self.request_timeout))
        } else if err.is_connect() {
            SfsError::ConnectionSetupFailed(format!("could not connect to {url}: {err}"))
        } else {
            SfsError::Unexpected(format!("request to {url} failed: {err}"))
        }
    }
}

//! Error types and result handling.
//!
//! The crate exposes a single closed error taxonomy, [`SfsError`]. Every
//! public entry point returns [`Result`] and never lets a transport-specific
//! error type (or a panic) cross the API boundary.
//!
//! # Error Classification
//!
//! | Variant | Retriable | Typical cause |
//! |---------|-----------|---------------|
//! | [`SfsError::InvalidArgument`] | no | caller-supplied input violates a precondition |
//! | [`SfsError::NotImplemented`] | no | feature not yet supported |
//! | [`SfsError::ServiceInvalidResponse`] | no | response JSON fails schema validation |
//! | [`SfsError::ConnectionSetupFailed`] | no | transport capability missing at construction |
//! | [`SfsError::ConnectionUrlSetupFailed`] | no | malformed URL component |
//! | [`SfsError::HttpBadRequest`] | no | service rejected the request (400) |
//! | [`SfsError::HttpNotFound`] | no | product or version does not exist (404) |
//! | [`SfsError::HttpServiceNotAvailable`] | yes | transient service failure (502/503) |
//! | [`SfsError::HttpTimeout`] | yes | transport-level timeout |
//! | [`SfsError::HttpUnexpected`] | no | any other HTTP status |
//! | [`SfsError::Unexpected`] | no | unclassified internal failure |
//!
//! Retriable failures drive the backoff loop in [`crate::connection`] and are
//! surfaced to the caller only once the retry or duration budget is exhausted.

use std::time::Duration;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SfsError>;

/// Stable, machine-checkable code for each [`SfsError`] variant.
///
/// Messages are meant for humans and may change; codes are meant for
/// programmatic handling and will not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Caller-supplied input violates a precondition.
    InvalidArgument,
    /// Feature not yet supported.
    NotImplemented,
    /// The service returned a response whose JSON body fails schema validation.
    ServiceInvalidResponse,
    /// Transport capability preconditions unmet at construction time.
    ConnectionSetupFailed,
    /// A URL component was malformed at construction time.
    ConnectionUrlSetupFailed,
    /// HTTP 400.
    HttpBadRequest,
    /// HTTP 404.
    HttpNotFound,
    /// HTTP 502/503 (retriable).
    HttpServiceNotAvailable,
    /// Transport-level timeout (retriable).
    HttpTimeout,
    /// Any other HTTP status.
    HttpUnexpected,
    /// Unclassified internal failure.
    Unexpected,
}

/// Errors produced by the SFS client.
///
/// All variants carry a human-readable message; [`SfsError::code`] yields the
/// stable [`ErrorCode`] for machine checks and [`SfsError::is_retryable`]
/// reports whether the retry orchestrator may attempt the operation again.
#[derive(Debug, thiserror::Error)]
pub enum SfsError {
    /// Caller-supplied input violates a precondition (empty product name,
    /// malformed correlation vector, out-of-range retry configuration).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested feature is not supported yet.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// The service returned a syntactically valid HTTP response whose JSON
    /// body fails schema validation. The message names the offending field
    /// path.
    #[error("invalid service response: {0}")]
    ServiceInvalidResponse(String),

    /// The transport layer could not be brought up (missing TLS backend,
    /// unusable resolver).
    #[error("connection setup failed: {0}")]
    ConnectionSetupFailed(String),

    /// A URL component was malformed at construction time. Never retried:
    /// the failure is deterministic.
    #[error("connection URL setup failed: {0}")]
    ConnectionUrlSetupFailed(String),

    /// The service rejected the request as malformed (HTTP 400).
    #[error("bad request: {0}")]
    HttpBadRequest(String),

    /// The requested product or version does not exist (HTTP 404).
    #[error("not found: {0}")]
    HttpNotFound(String),

    /// The service is temporarily unavailable (HTTP 502/503). Carries the
    /// parsed `Retry-After` hint when the response supplied one.
    #[error("service not available: {message}")]
    HttpServiceNotAvailable {
        /// Human-readable failure description.
        message: String,
        /// Server-requested wait before the next attempt, if supplied.
        retry_after: Option<Duration>,
    },

    /// The transport call timed out. The message states the configured
    /// duration the call timed out after.
    #[error("timeout: {0}")]
    HttpTimeout(String),

    /// The service returned a status outside the classified set.
    #[error("unexpected HTTP status {status}: {message}")]
    HttpUnexpected {
        /// The raw HTTP status code.
        status: u16,
        /// Human-readable failure description.
        message: String,
    },

    /// Catch-all for unclassified internal failures.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl SfsError {
    /// The stable machine-checkable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SfsError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            SfsError::NotImplemented(_) => ErrorCode::NotImplemented,
            SfsError::ServiceInvalidResponse(_) => ErrorCode::ServiceInvalidResponse,
            SfsError::ConnectionSetupFailed(_) => ErrorCode::ConnectionSetupFailed,
            SfsError::ConnectionUrlSetupFailed(_) => ErrorCode::ConnectionUrlSetupFailed,
            SfsError::HttpBadRequest(_) => ErrorCode::HttpBadRequest,
            SfsError::HttpNotFound(_) => ErrorCode::HttpNotFound,
            SfsError::HttpServiceNotAvailable { .. } => ErrorCode::HttpServiceNotAvailable,
            SfsError::HttpTimeout(_) => ErrorCode::HttpTimeout,
            SfsError::HttpUnexpected { .. } => ErrorCode::HttpUnexpected,
            SfsError::Unexpected(_) => ErrorCode::Unexpected,
        }
    }

    /// Whether the retry orchestrator may attempt the failed call again.
    ///
    /// Only transient transport-layer failures qualify; everything else is
    /// terminal on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SfsError::HttpServiceNotAvailable { .. } | SfsError::HttpTimeout(_)
        )
    }

    /// The `Retry-After` hint attached to the failure, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SfsError::HttpServiceNotAvailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SfsError::HttpServiceNotAvailable {
            message: "503".to_string(),
            retry_after: None,
        }
        .is_retryable());
        assert!(SfsError::HttpTimeout("timed out after 5s".to_string()).is_retryable());
        assert!(!SfsError::HttpNotFound("missing".to_string()).is_retryable());
        assert!(!SfsError::HttpBadRequest("bad".to_string()).is_retryable());
        assert!(!SfsError::ServiceInvalidResponse("x".to_string()).is_retryable());
        assert!(!SfsError::ConnectionUrlSetupFailed("bad host".to_string()).is_retryable());
    }

    #[test]
    fn test_code_is_stable_per_variant() {
        assert_eq!(
            SfsError::InvalidArgument("x".to_string()).code(),
            ErrorCode::InvalidArgument
        );
        assert_eq!(
            SfsError::HttpUnexpected {
                status: 500,
                message: "boom".to_string()
            }
            .code(),
            ErrorCode::HttpUnexpected
        );
    }

    #[test]
    fn test_retry_after_only_on_service_not_available() {
        let err = SfsError::HttpServiceNotAvailable {
            message: "503".to_string(),
            retry_after: Some(Duration::from_secs(1)),
        };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(1)));
        assert_eq!(SfsError::HttpTimeout("t".to_string()).retry_after(), None);
    }

    #[test]
    fn test_display_includes_message() {
        let err = SfsError::ServiceInvalidResponse("Missing ContentId in response".to_string());
        assert!(err.to_string().contains("Missing ContentId in response"));
    }
}

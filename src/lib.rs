#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # Architecture
//!
//! One logical call ("give me the latest version of product X and its
//! files") flows through a small pipeline:
//!
//! 1. **Façade** ([`client`]) validates inputs and sequences the two phases
//!    (resolve version, then generate download info)
//! 2. **URL builder** ([`url_builder`]) composes the versioned REST
//!    endpoints with correct percent-encoding
//! 3. **Connection** ([`connection`]) executes each request with bounded
//!    exponential-backoff retries, honoring server `Retry-After` hints and
//!    an optional total-duration budget
//! 4. **Correlation** ([`correlation`]) threads an incrementable tracing
//!    vector through every attempt
//! 5. **Entities** (internal) validate the untrusted JSON responses field by
//!    field before anything reaches the public value objects in [`types`]
//!
//! Calls are strictly sequential within one logical request; the client
//! spawns no background work.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`SfsClient`] façade, configuration, request types |
//! | [`connection`] | Retry orchestration, transport, connection config |
//! | [`correlation`] | Correlation-vector parsing and per-request state |
//! | [`url_builder`] | Component-wise URL construction and SFS endpoints |
//! | [`types`] | Public value objects ([`Content`], [`File`], ...) |
//! | [`error`] | [`SfsError`] taxonomy and [`Result`] alias |
//! | [`logging`] | Structured log records and the callback hook |

pub mod client;
pub mod connection;
pub mod correlation;
pub mod error;
pub mod logging;
pub mod types;
pub mod url_builder;

mod entity;
#[cfg(any(test, feature = "test-overrides"))]
mod test_overrides;

pub use client::{ClientConfig, ProductRequest, RequestParams, SfsClient};
pub use connection::{ConnectionConfig, MAX_RETRIES_BOUND};
pub use correlation::{CorrelationContext, CorrelationVector};
pub use error::{ErrorCode, Result, SfsError};
pub use logging::{LogRecord, LogSeverity, LoggingCallback};
pub use types::{
    AppContent, AppFile, ApplicabilityDetails, Content, ContentId, DeliveryOptimizationData,
    File, HashType,
};

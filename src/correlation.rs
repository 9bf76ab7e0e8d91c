//! Correlation vectors for request tracing.
//!
//! A correlation vector is a structured, incrementable token that threads
//! together all HTTP requests belonging to one logical client operation, so
//! the service can link the initial attempt and its retries while still
//! telling them apart.
//!
//! # Format
//!
//! ```text
//! {base}.{counter}[.{counter}...]
//! ```
//!
//! The base is 16 characters of the base64 alphabet (`A-Z a-z 0-9 + /`);
//! each counter is a decimal number. Example: `PmvzQKgYek6Sdk/T.0.2` has base
//! `PmvzQKgYek6Sdk/T`, extended once, incremented twice.
//!
//! # Lifecycle
//!
//! One [`CorrelationContext`] belongs to one in-flight logical request. The
//! first [`CorrelationContext::pop_latest`] returns the vector unmodified
//! (the initial attempt); every later call increments first, so each retry
//! carries a distinguishable-but-linkable value. The context takes `&mut
//! self` and is deliberately not shareable across threads mid-request.
//!
//! # Examples
//!
//! ```
//! use sfs_client::correlation::CorrelationContext;
//!
//! let mut context = CorrelationContext::new();
//! let first = context.pop_latest();
//! let second = context.pop_latest();
//! assert_ne!(first, second);
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{Result, SfsError};

/// Length of the base segment, in characters.
const BASE_LENGTH: usize = 16;

/// Upper bound on the serialized vector length.
const MAX_VECTOR_LENGTH: usize = 127;

/// A parsed correlation vector: base segment plus ordered counters.
///
/// Immutable from the outside except through [`increment`](Self::increment)
/// and [`extend`](Self::extend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationVector {
    base: String,
    counters: Vec<u64>,
}

impl CorrelationVector {
    /// Create a fresh vector with a random base and a single zero counter.
    pub fn new() -> Self {
        // 12 random bytes encode to exactly 16 base64 characters, unpadded.
        let seed = uuid::Uuid::new_v4();
        let base = BASE64.encode(&seed.as_bytes()[..12]);
        debug_assert_eq!(base.len(), BASE_LENGTH);
        CorrelationVector {
            base,
            counters: vec![0],
        }
    }

    /// Parse and validate a serialized correlation vector.
    ///
    /// # Errors
    ///
    /// Returns [`SfsError::InvalidArgument`] naming the first violated rule:
    /// empty input, over-length input, malformed base segment, or a
    /// non-numeric counter segment.
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(SfsError::InvalidArgument(
                "correlation vector is empty".to_string(),
            ));
        }
        if value.len() > MAX_VECTOR_LENGTH {
            return Err(SfsError::InvalidArgument(format!(
                "correlation vector exceeds {MAX_VECTOR_LENGTH} characters: {value}"
            )));
        }

        let mut segments = value.split('.');
        let base = segments.next().unwrap_or_default();
        if base.len() != BASE_LENGTH {
            return Err(SfsError::InvalidArgument(format!(
                "correlation vector base must be {BASE_LENGTH} characters, got {} in '{value}'",
                base.len()
            )));
        }
        if !base
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
        {
            return Err(SfsError::InvalidArgument(format!(
                "correlation vector base contains characters outside the base64 alphabet: '{base}'"
            )));
        }

        let mut counters = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                return Err(SfsError::InvalidArgument(format!(
                    "correlation vector has an empty counter segment: '{value}'"
                )));
            }
            let counter: u64 = segment.parse().map_err(|_| {
                SfsError::InvalidArgument(format!(
                    "correlation vector counter '{segment}' is not a number in '{value}'"
                ))
            })?;
            counters.push(counter);
        }
        if counters.is_empty() {
            return Err(SfsError::InvalidArgument(format!(
                "correlation vector must have at least one counter segment: '{value}'"
            )));
        }

        Ok(CorrelationVector {
            base: base.to_string(),
            counters,
        })
    }

    /// Increment the last counter.
    pub fn increment(&mut self) {
        if let Some(last) = self.counters.last_mut() {
            *last += 1;
        }
    }

    /// Append a new zero counter segment.
    ///
    /// Used when adopting a vector received from elsewhere: increments then
    /// happen in the new segment, keeping the inherited prefix intact.
    pub fn extend(&mut self) {
        self.counters.push(0);
    }
}

impl Default for CorrelationVector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base)?;
        for counter in &self.counters {
            write!(f, ".{counter}")?;
        }
        Ok(())
    }
}

/// Per-request correlation state.
///
/// Produces the correlation-vector string for each attempt of one logical
/// request: the initial attempt reuses the vector unmodified, each retry
/// advances it first.
#[derive(Debug)]
pub struct CorrelationContext {
    vector: CorrelationVector,
    popped: bool,
}

impl CorrelationContext {
    /// Create a context with a freshly generated vector.
    pub fn new() -> Self {
        CorrelationContext {
            vector: CorrelationVector::new(),
            popped: false,
        }
    }

    /// Adopt `token` as the new root of this context.
    ///
    /// The token is validated, then extended with a fresh counter segment so
    /// that this client's increments stay linkable to the inherited prefix.
    /// Resets the first-call behavior of [`pop_latest`](Self::pop_latest).
    ///
    /// # Errors
    ///
    /// Returns [`SfsError::InvalidArgument`] carrying the underlying parse
    /// diagnostic when `token` is empty or malformed.
    pub fn set_base(&mut self, token: &str) -> Result<()> {
        let mut vector = CorrelationVector::parse(token).map_err(|err| {
            SfsError::InvalidArgument(format!("invalid base correlation vector: {err}"))
        })?;
        vector.extend();
        self.vector = vector;
        self.popped = false;
        Ok(())
    }

    /// Return the current vector string, advancing it first on every call
    /// after the first.
    pub fn pop_latest(&mut self) -> String {
        if self.popped {
            self.vector.increment();
        }
        self.popped = true;
        self.vector.to_string()
    }

    /// The current vector string, without advancing.
    pub fn latest(&self) -> String {
        self.vector.to_string()
    }
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}

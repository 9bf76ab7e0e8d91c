//! Environment-variable overrides for test runs.
//!
//! Compiled only for test builds and under the `test-overrides` feature;
//! production builds carry none of this. The overrides materially change
//! retry timing and request routing and are not part of the supported
//! external contract.

use std::time::Duration;

/// Overrides the service base URL (scheme + host + port).
pub(crate) const BASE_URL_ENV: &str = "SFS_TEST_OVERRIDE_BASE_URL";

/// Overrides the configured base retry delay, in milliseconds.
pub(crate) const RETRY_DELAY_ENV: &str = "SFS_TEST_OVERRIDE_RETRY_DELAY_MS";

pub(crate) fn base_url_override() -> Option<String> {
    std::env::var(BASE_URL_ENV).ok().filter(|value| !value.is_empty())
}

pub(crate) fn retry_delay_override() -> Option<Duration> {
    std::env::var(RETRY_DELAY_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

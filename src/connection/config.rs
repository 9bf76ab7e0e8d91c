//! Connection configuration.

use std::time::Duration;

use crate::error::Result;

/// Hard upper bound on configured retries.
pub const MAX_RETRIES_BOUND: u32 = 3;

/// Retry and timing configuration, supplied once at client construction and
/// read-only thereafter.
///
/// # Examples
///
/// ```
/// use sfs_client::ConnectionConfig;
/// use std::time::Duration;
///
/// let config = ConnectionConfig {
///     max_retries: 2,
///     max_request_duration: Some(Duration::from_secs(120)),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum retry attempts after the initial one. Clamped to
    /// [`MAX_RETRIES_BOUND`]; `0` means a single attempt, no retries.
    pub max_retries: u32,
    /// Base delay for the exponential backoff schedule. The production
    /// contract bounds it to `15s < delay <= 60s`.
    pub retry_delay: Duration,
    /// Soft cutoff on the total duration of one logical request, checked
    /// between retry attempts. `None` disables the cutoff.
    pub max_request_duration: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            max_retries: MAX_RETRIES_BOUND,
            retry_delay: Duration::from_secs(30),
            max_request_duration: None,
        }
    }
}

impl ConnectionConfig {
    /// Check the production bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SfsError::InvalidArgument`] when `retry_delay` falls outside
    /// the supported range. Test builds skip the range check so retry tests
    /// can run with millisecond delays.
    pub(crate) fn validate(&self) -> Result<()> {
        #[cfg(not(any(test, feature = "test-overrides")))]
        {
            const MIN_EXCLUSIVE: Duration = Duration::from_millis(15_000);
            const MAX_INCLUSIVE: Duration = Duration::from_millis(60_000);
            if self.retry_delay <= MIN_EXCLUSIVE || self.retry_delay > MAX_INCLUSIVE {
                return Err(crate::error::SfsError::InvalidArgument(format!(
                    "retry delay must be within ({MIN_EXCLUSIVE:?}, {MAX_INCLUSIVE:?}], got {:?}",
                    self.retry_delay
                )));
            }
        }
        Ok(())
    }

    /// `max_retries`, clamped to the supported bound.
    pub(crate) fn clamped_max_retries(&self) -> u32 {
        self.max_retries.min(MAX_RETRIES_BOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(30));
        assert!(config.max_request_duration.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_retries_is_clamped() {
        let config = ConnectionConfig {
            max_retries: 50,
            ..Default::default()
        };
        assert_eq!(config.clamped_max_retries(), MAX_RETRIES_BOUND);

        let config = ConnectionConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(config.clamped_max_retries(), 0);
    }
}

//! Transport manager: capability checks and shared-state lifecycle.
//!
//! A [`ConnectionManager`] owns one pooled HTTP client and hands out
//! independent [`HttpTransport`] connections. Runtime capability
//! preconditions (a working TLS backend, a usable async resolver) are
//! verified once, at construction, and fail fast with
//! [`SfsError::ConnectionSetupFailed`] instead of misbehaving on the first
//! request.
//!
//! Process-wide transport state is reference-counted across managers: the
//! first live manager performs the capability verification, later managers
//! reuse its result, and the state is torn down when the last manager drops.
//! Managers may be constructed and destroyed from any number of threads with
//! overlapping lifetimes.

use std::time::Duration;

use parking_lot::Mutex;

use super::transport::HttpTransport;
use crate::error::{Result, SfsError};

/// Shared transport-library state, guarded by one global mutex.
struct SharedTransportState {
    live_managers: usize,
    capabilities: Option<std::result::Result<(), String>>,
}

static SHARED_STATE: Mutex<SharedTransportState> = Mutex::new(SharedTransportState {
    live_managers: 0,
    capabilities: None,
});

/// Builds a throwaway TLS-enforcing client; a missing TLS backend or
/// unusable resolver surfaces here once instead of on the first request.
fn verify_capabilities() -> std::result::Result<(), String> {
    reqwest::Client::builder()
        .https_only(true)
        .build()
        .map(|_| ())
        .map_err(|err| format!("HTTP transport capabilities unavailable: {err}"))
}

/// RAII guard registering one live manager in the shared state.
#[derive(Debug)]
struct TransportInit;

impl TransportInit {
    fn acquire() -> Result<Self> {
        let mut state = SHARED_STATE.lock();
        if state.live_managers == 0 {
            state.capabilities = Some(verify_capabilities());
        }
        let verified = state
            .capabilities
            .clone()
            .unwrap_or_else(|| verify_capabilities());
        if let Err(reason) = verified {
            return Err(SfsError::ConnectionSetupFailed(reason));
        }
        state.live_managers += 1;
        Ok(TransportInit)
    }
}

impl Drop for TransportInit {
    fn drop(&mut self) {
        let mut state = SHARED_STATE.lock();
        state.live_managers -= 1;
        if state.live_managers == 0 {
            state.capabilities = None;
        }
    }
}

/// Produces independent HTTP connections over one shared pool.
#[derive(Debug)]
pub(crate) struct ConnectionManager {
    client: reqwest::Client,
    request_timeout: Duration,
    _init: TransportInit,
}

impl ConnectionManager {
    /// Verify transport capabilities and build the pooled client.
    ///
    /// # Errors
    ///
    /// Returns [`SfsError::ConnectionSetupFailed`] when the transport layer
    /// cannot be brought up.
    pub(crate) fn new(request_timeout: Duration) -> Result<Self> {
        let init = TransportInit::acquire()?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| {
                SfsError::ConnectionSetupFailed(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(ConnectionManager {
            client,
            request_timeout,
            _init: init,
        })
    }

    /// Create one independent connection. Connections from one manager may
    /// be used concurrently from different threads; a single connection
    /// serves one in-flight call at a time.
    pub(crate) fn make_transport(&self) -> HttpTransport {
        HttpTransport::new(self.client.clone(), self.request_timeout)
    }
}

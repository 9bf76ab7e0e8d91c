//! Structured logging with an instance-scoped callback hook.
//!
//! Internal diagnostics always flow through [`tracing`]. In addition, a
//! caller may install a logging callback on the client to receive structured
//! [`LogRecord`]s (for forwarding into its own telemetry pipeline).
//!
//! The callback lives in a mutex-guarded slot owned by the client instance;
//! there is no global state. The one mutex serializes callback
//! registration/replacement against callback invocation, so the hook can be
//! swapped or cleared from any thread without racing an in-flight emission.
//! Callbacks run synchronously on whichever thread produced the record and
//! are expected to return promptly.
//!
//! # Examples
//!
//! ```
//! use sfs_client::{ClientConfig, LogRecord};
//! use std::sync::Arc;
//!
//! let config = ClientConfig {
//!     account_id: "myaccount".to_string(),
//!     logging_callback: Some(Arc::new(|record: &LogRecord| {
//!         eprintln!("[{:?}] {} ({}:{})", record.severity, record.message, record.file, record.line);
//!     })),
//!     ..Default::default()
//! };
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

/// Severity of a [`LogRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Informational progress messages.
    Info,
    /// Recoverable anomalies (a retried attempt, a relaxed bound).
    Warning,
    /// Failures that will surface to the caller.
    Error,
}

/// One structured log line produced by the client.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Severity of the event.
    pub severity: LogSeverity,
    /// Human-readable message.
    pub message: String,
    /// Source file that produced the record.
    pub file: &'static str,
    /// Source line that produced the record.
    pub line: u32,
    /// Wall-clock time the record was produced.
    pub time: SystemTime,
}

/// Caller-installed logging hook.
pub type LoggingCallback = Arc<dyn Fn(&LogRecord) + Send + Sync>;

/// Mutex-guarded callback slot plus the tracing bridge.
///
/// Shared by the client and its connections via `Arc`; safe to use from any
/// thread.
pub(crate) struct LogHandler {
    callback: Mutex<Option<LoggingCallback>>,
}

impl LogHandler {
    pub(crate) fn new(callback: Option<LoggingCallback>) -> Self {
        LogHandler {
            callback: Mutex::new(callback),
        }
    }

    /// Replace (or clear) the installed callback.
    #[allow(dead_code)]
    pub(crate) fn set_callback(&self, callback: Option<LoggingCallback>) {
        *self.callback.lock() = callback;
    }

    /// Emit one record: tracing first, then the callback while the slot lock
    /// is held.
    pub(crate) fn log(&self, severity: LogSeverity, message: String, file: &'static str, line: u32) {
        match severity {
            LogSeverity::Info => tracing::info!(target: "sfs_client", "{message} ({file}:{line})"),
            LogSeverity::Warning => {
                tracing::warn!(target: "sfs_client", "{message} ({file}:{line})")
            }
            LogSeverity::Error => tracing::error!(target: "sfs_client", "{message} ({file}:{line})"),
        }

        let guard = self.callback.lock();
        if let Some(callback) = guard.as_ref() {
            let record = LogRecord {
                severity,
                message,
                file,
                line,
                time: SystemTime::now(),
            };
            callback(&record);
        }
    }
}

impl std::fmt::Debug for LogHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandler")
            .field("callback_installed", &self.callback.lock().is_some())
            .finish()
    }
}

/// Log an informational record through a [`LogHandler`], capturing file/line.
macro_rules! log_info {
    ($handler:expr, $($arg:tt)*) => {
        $handler.log(
            $crate::logging::LogSeverity::Info,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

/// Log a warning record through a [`LogHandler`], capturing file/line.
macro_rules! log_warn {
    ($handler:expr, $($arg:tt)*) => {
        $handler.log(
            $crate::logging::LogSeverity::Warning,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

/// Log an error record through a [`LogHandler`], capturing file/line.
macro_rules! log_error {
    ($handler:expr, $($arg:tt)*) => {
        $handler.log(
            $crate::logging::LogSeverity::Error,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

pub(crate) use {log_error, log_info, log_warn};

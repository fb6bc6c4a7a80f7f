//! Worker configuration.
//!
//! Configuration is only the constructor parameters; nothing is read from the
//! environment. [`WorkerConfig`] deserializes with defaults so callers can
//! keep it in their own config files:
//!
//! ```
//! use wsworker_client::WorkerConfig;
//!
//! let config: WorkerConfig =
//!     serde_json::from_str(r#"{"host": "10.0.0.2", "port": 8777, "id": "bob"}"#).unwrap();
//! assert!(!config.secure);
//! assert_eq!(config.endpoint().uri(), "ws://10.0.0.2:8777");
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::transport::Endpoint;

/// Connect, read and write timeout: effectively "block until the OS gives
/// up". A slow remote (e.g. a long training run) must never be cut off.
pub const TIMEOUT_INTERVAL: Duration = Duration::from_secs(9_999_999);

/// Pause before and after a reconnect, letting the remote release the old
/// socket.
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_millis(100);

/// Identifier used when none is configured.
pub const DEFAULT_WORKER_ID: &str = "0";

/// Settings for a [`WorkerProxy`](crate::WorkerProxy).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkerConfig {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Use `wss://` (certificate verification disabled).
    #[serde(default)]
    pub secure: bool,
    /// Identifier of this worker, shown in diagnostics and logs.
    #[serde(default = "default_id")]
    pub id: String,
    /// Keep every encoded outbound request in the message history.
    #[serde(default)]
    pub log_msgs: bool,
    /// Log every exchange at info level.
    #[serde(default)]
    pub verbose: bool,
    /// Socket timeout in milliseconds. Zero selects [`TIMEOUT_INTERVAL`].
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Reconnect pause in milliseconds.
    #[serde(default = "default_retry_pause_ms")]
    pub retry_pause_ms: u64,
}

fn default_id() -> String {
    DEFAULT_WORKER_ID.to_string()
}

fn default_timeout_ms() -> u64 {
    millis_rounded_up(TIMEOUT_INTERVAL)
}

fn default_retry_pause_ms() -> u64 {
    millis_rounded_up(DEFAULT_RETRY_PAUSE)
}

/// Whole milliseconds in `duration`, rounded up so a non-zero duration never
/// becomes zero.
pub(crate) fn millis_rounded_up(duration: Duration) -> u64 {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 && !duration.is_zero() {
        1
    } else if Duration::from_millis(millis) < duration {
        millis.saturating_add(1)
    } else {
        millis
    }
}

impl WorkerConfig {
    /// Create a config for a plain endpoint with all other settings at their
    /// defaults.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
            id: default_id(),
            log_msgs: false,
            verbose: false,
            timeout_ms: default_timeout_ms(),
            retry_pause_ms: default_retry_pause_ms(),
        }
    }

    /// Parse a config from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Endpoint described by `host`, `port` and `secure`.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port, self.secure)
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[inline]
    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }
}

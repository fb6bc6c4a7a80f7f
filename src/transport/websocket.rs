//! The production [`Transport`]: WebSocket over TCP, optionally TLS.

use std::time::Duration;

use async_trait::async_trait;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use super::{AsyncWsChannel, Endpoint, Transport, WsChannel};
use crate::config::TIMEOUT_INTERVAL;
use crate::error::Result;

/// Opens [`WsChannel`]s and [`AsyncWsChannel`]s.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketTransport {
    timeout: Duration,
}

impl WebSocketTransport {
    /// Create a transport applying `timeout` to connect, read and write.
    ///
    /// A zero timeout falls back to [`TIMEOUT_INTERVAL`]; sockets reject a
    /// zero read timeout.
    pub fn new(timeout: Duration) -> Self {
        let timeout = if timeout.is_zero() {
            TIMEOUT_INTERVAL
        } else {
            timeout
        };
        Self { timeout }
    }

    /// Timeout applied to every socket operation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(TIMEOUT_INTERVAL)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    type Channel = WsChannel;
    type AsyncChannel = AsyncWsChannel;

    fn open(&self, endpoint: &Endpoint) -> Result<WsChannel> {
        WsChannel::connect(endpoint, self.timeout)
    }

    async fn open_async(&self, endpoint: &Endpoint) -> Result<AsyncWsChannel> {
        AsyncWsChannel::connect(endpoint, self.timeout).await
    }
}

/// WebSocket settings shared by both channel styles: no size limits.
pub(crate) fn unbounded_config() -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = None;
    config.max_frame_size = None;
    config
}

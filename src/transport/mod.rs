//! Transport module - WebSocket channels to the remote worker.
//!
//! Two realizations of the same byte-level contract:
//! - [`Channel`] / [`WsChannel`] - blocking, used for ordinary calls
//! - [`AsyncChannel`] / [`AsyncWsChannel`] - cooperative, used only by the
//!   async `fit` path
//!
//! A [`Transport`] opens either kind against an [`Endpoint`]. The two are
//! never mixed within one exchange.
//!
//! # Example
//!
//! ```ignore
//! use wsworker_client::transport::{Channel, Endpoint, Transport, WebSocketTransport};
//!
//! let transport = WebSocketTransport::default();
//! let mut channel = transport.open(&Endpoint::new("localhost", 9000, false))?;
//! channel.send(b"payload")?;
//! let reply = channel.receive()?;
//! channel.close()?;
//! ```

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

mod blocking;
mod cooperative;
mod endpoint;
#[cfg(test)]
pub(crate) mod mock;
mod tls;
mod websocket;

pub use blocking::WsChannel;
pub use cooperative::AsyncWsChannel;
pub use endpoint::{Endpoint, Scheme};
pub use websocket::WebSocketTransport;

/// A blocking, connected channel.
pub trait Channel: Send {
    /// Write one frame.
    ///
    /// Fails with [`WorkerError::Transport`](crate::WorkerError::Transport)
    /// if the channel was closed.
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Block until a full data frame arrives and return its payload.
    fn receive(&mut self) -> Result<Bytes>;

    /// Whether the channel still considers the connection usable.
    ///
    /// Observed, not probed: this only reflects what previous operations saw.
    fn is_alive(&self) -> bool;

    /// Shut the connection down. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// A cooperative channel: suspends the task at I/O instead of the thread.
#[async_trait]
pub trait AsyncChannel: Send {
    /// Write one frame.
    async fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Wait for a full data frame and return its payload.
    async fn receive(&mut self) -> Result<Bytes>;

    /// Whether the channel still considers the connection usable.
    fn is_alive(&self) -> bool;

    /// Shut the connection down. Idempotent.
    async fn close(&mut self) -> Result<()>;
}

/// Opens channels of both styles to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Blocking channel type.
    type Channel: Channel;
    /// Cooperative channel type.
    type AsyncChannel: AsyncChannel;

    /// Open a blocking channel.
    ///
    /// Fails with [`WorkerError::Connect`](crate::WorkerError::Connect) if the
    /// endpoint is unreachable or the handshake fails.
    fn open(&self, endpoint: &Endpoint) -> Result<Self::Channel>;

    /// Open a cooperative channel.
    async fn open_async(&self, endpoint: &Endpoint) -> Result<Self::AsyncChannel>;
}

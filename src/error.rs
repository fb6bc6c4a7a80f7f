//! Error types for wsworker-client.

use std::io;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Main error type for all worker proxy operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Opening a connection failed (endpoint unreachable, TLS or WebSocket
    /// handshake rejected).
    #[error("failed to connect to {uri}: {reason}")]
    Connect { uri: String, reason: String },

    /// Send/receive on a closed connection, or the proxy was used as a
    /// message recipient. Never retried.
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer dropped the socket mid-exchange.
    #[error("connection closed by peer")]
    Disconnected,

    /// The reconnect-and-retry also failed.
    #[error("connection to {uri} lost and the retry failed")]
    ConnectionLost {
        uri: String,
        #[source]
        source: Option<Box<WorkerError>>,
    },

    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// WebSocket protocol error not classified as a disconnect.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// TLS configuration error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// JSON error (configuration loading).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Inbound text frame did not carry a valid hex envelope.
    #[error("invalid frame envelope: {0}")]
    Envelope(String),
}

impl WorkerError {
    /// Whether this error means the socket died under us, which the
    /// reconnect policy recovers from.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, WorkerError::Disconnected)
    }

    pub(crate) fn closed() -> Self {
        WorkerError::Transport("connection is not open".to_string())
    }
}

impl From<hex::FromHexError> for WorkerError {
    fn from(err: hex::FromHexError) -> Self {
        WorkerError::Envelope(err.to_string())
    }
}

/// Result type alias using WorkerError.
pub type Result<T> = std::result::Result<T, WorkerError>;

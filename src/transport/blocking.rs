//! Blocking WebSocket channel.
//!
//! Every frame is sent as text in the [`HexEnvelope`]. Inbound text frames are
//! unwrapped; binary frames are passed through as-is.

use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::stream::MaybeTlsStream;
use tokio_tungstenite::tungstenite::{self, Connector, Message, WebSocket};
use tracing::{debug, trace};

use super::tls::insecure_client_config;
use super::websocket::unbounded_config;
use super::{Channel, Endpoint};
use crate::codec::HexEnvelope;
use crate::error::{Result, WorkerError};

/// A blocking WebSocket connection.
pub struct WsChannel {
    socket: WebSocket<MaybeTlsStream<TcpStream>>,
    uri: String,
    /// Cleared once an operation observes the peer going away.
    alive: bool,
    /// Set by [`Channel::close`].
    closed: bool,
}

impl WsChannel {
    /// Connect to `endpoint`, applying `timeout` to connect, read and write.
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let uri = endpoint.uri();
        let connect_error = |reason: String| WorkerError::Connect {
            uri: uri.clone(),
            reason,
        };

        let stream = tcp_connect(endpoint, timeout).map_err(|e| connect_error(e.to_string()))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;

        let connector = if endpoint.is_secure() {
            Some(Connector::Rustls(insecure_client_config()?))
        } else {
            None
        };

        let (socket, _response) = tungstenite::client_tls_with_config(
            uri.as_str(),
            stream,
            Some(unbounded_config()),
            connector,
        )
        .map_err(|e| connect_error(e.to_string()))?;

        debug!(uri = %uri, "websocket connection opened");

        Ok(Self {
            socket,
            uri,
            alive: true,
            closed: false,
        })
    }

    /// URI this channel is connected to.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Convert a library error, marking the channel dead on disconnects.
    fn fail(&mut self, err: tungstenite::Error) -> WorkerError {
        let err = classify(err);
        if err.is_disconnect() {
            debug!(uri = %self.uri, "websocket connection dropped by peer");
            self.alive = false;
        }
        err
    }
}

impl Channel for WsChannel {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(WorkerError::closed());
        }

        trace!(uri = %self.uri, bytes = payload.len(), "sending frame");
        match self.socket.send(Message::Text(HexEnvelope::wrap(payload))) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn receive(&mut self) -> Result<Bytes> {
        if self.closed {
            return Err(WorkerError::closed());
        }

        loop {
            let message = match self.socket.read() {
                Ok(message) => message,
                Err(e) => return Err(self.fail(e)),
            };

            match message {
                Message::Text(text) => {
                    let payload = HexEnvelope::unwrap(&text)?;
                    trace!(uri = %self.uri, bytes = payload.len(), "received frame");
                    return Ok(Bytes::from(payload));
                }
                Message::Binary(data) => return Ok(Bytes::from(data)),
                Message::Close(frame) => {
                    debug!(uri = %self.uri, ?frame, "peer sent close frame");
                    self.alive = false;
                    return Err(WorkerError::Disconnected);
                }
                // Pings are answered by the library on the next read/write.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    fn is_alive(&self) -> bool {
        !self.closed && self.alive && self.socket.can_write()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.alive = false;

        // The peer may already be gone; a failed close frame is expected then.
        if let Err(e) = self.socket.close(None) {
            trace!(uri = %self.uri, error = %e, "close frame not delivered");
        }

        let shutdown = match self.socket.get_ref() {
            MaybeTlsStream::Plain(stream) => stream.shutdown(Shutdown::Both),
            MaybeTlsStream::Rustls(stream) => stream.get_ref().shutdown(Shutdown::Both),
            _ => Ok(()),
        };
        if let Err(e) = shutdown {
            trace!(uri = %self.uri, error = %e, "socket already shut down");
        }

        debug!(uri = %self.uri, "websocket connection closed");
        Ok(())
    }
}

/// Resolve the endpoint and connect to the first address that accepts.
fn tcp_connect(endpoint: &Endpoint, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (endpoint.host(), endpoint.port()).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "host resolved to no addresses")
    }))
}

/// Map library errors, folding every "socket went away" shape into
/// [`WorkerError::Disconnected`].
pub(crate) fn classify(err: tungstenite::Error) -> WorkerError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            WorkerError::Disconnected
        }
        tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
            WorkerError::Disconnected
        }
        tungstenite::Error::Io(e) if is_disconnect_kind(e.kind()) => WorkerError::Disconnected,
        other => WorkerError::WebSocket(other),
    }
}

fn is_disconnect_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected
    )
}

//! Cooperative WebSocket channel on tokio.
//!
//! Same envelope and close semantics as [`WsChannel`](super::WsChannel), but
//! the calling task is suspended at I/O instead of the thread. Requires a
//! tokio runtime with the time driver enabled.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use super::blocking::classify;
use super::tls::insecure_client_config;
use super::websocket::unbounded_config;
use super::{AsyncChannel, Endpoint};
use crate::codec::HexEnvelope;
use crate::error::{Result, WorkerError};

/// How long `close` waits for the peer to answer the close handshake.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// A cooperative WebSocket connection.
pub struct AsyncWsChannel {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    uri: String,
    timeout: Duration,
    alive: bool,
    closed: bool,
}

impl AsyncWsChannel {
    /// Connect to `endpoint`; `io_timeout` bounds the handshake and each
    /// later send or receive.
    pub async fn connect(endpoint: &Endpoint, io_timeout: Duration) -> Result<Self> {
        let uri = endpoint.uri();

        let connector = if endpoint.is_secure() {
            Some(Connector::Rustls(insecure_client_config()?))
        } else {
            None
        };

        let handshake = tokio_tungstenite::connect_async_tls_with_config(
            uri.as_str(),
            Some(unbounded_config()),
            true,
            connector,
        );

        let socket = match timeout(io_timeout, handshake).await {
            Ok(Ok((socket, _response))) => socket,
            Ok(Err(e)) => {
                return Err(WorkerError::Connect {
                    uri,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(WorkerError::Connect {
                    uri,
                    reason: format!("handshake timed out after {io_timeout:?}"),
                })
            }
        };

        debug!(uri = %uri, "cooperative websocket connection opened");

        Ok(Self {
            socket,
            uri,
            timeout: io_timeout,
            alive: true,
            closed: false,
        })
    }

    /// URI this channel is connected to.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn fail(&mut self, err: tungstenite::Error) -> WorkerError {
        let err = classify(err);
        if err.is_disconnect() {
            self.alive = false;
        }
        err
    }

    fn timed_out(&self, what: &str) -> WorkerError {
        WorkerError::Transport(format!("{what} on {} timed out after {:?}", self.uri, self.timeout))
    }
}

#[async_trait]
impl AsyncChannel for AsyncWsChannel {
    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(WorkerError::closed());
        }

        trace!(uri = %self.uri, bytes = payload.len(), "sending frame");
        let text = HexEnvelope::wrap(payload);
        match timeout(self.timeout, self.socket.send(Message::Text(text))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.fail(e)),
            Err(_) => Err(self.timed_out("send")),
        }
    }

    async fn receive(&mut self) -> Result<Bytes> {
        if self.closed {
            return Err(WorkerError::closed());
        }

        loop {
            let next = match timeout(self.timeout, self.socket.next()).await {
                Ok(next) => next,
                Err(_) => return Err(self.timed_out("receive")),
            };

            match next {
                None => {
                    self.alive = false;
                    return Err(WorkerError::Disconnected);
                }
                Some(Err(e)) => return Err(self.fail(e)),
                Some(Ok(Message::Text(text))) => {
                    return Ok(Bytes::from(HexEnvelope::unwrap(&text)?));
                }
                Some(Ok(Message::Binary(data))) => return Ok(Bytes::from(data)),
                Some(Ok(Message::Close(frame))) => {
                    debug!(uri = %self.uri, ?frame, "peer sent close frame");
                    self.alive = false;
                    return Err(WorkerError::Disconnected);
                }
                Some(Ok(_)) => continue,
            }
        }
    }

    fn is_alive(&self) -> bool {
        !self.closed && self.alive
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.alive = false;

        // Send our close frame, then drain until the peer answers and drops
        // the socket, so the connection is fully torn down on return.
        let handshake = async {
            if let Err(e) = self.socket.close(None).await {
                trace!(uri = %self.uri, error = %e, "close frame not delivered");
                return;
            }
            while let Some(Ok(_)) = self.socket.next().await {}
        };
        if timeout(CLOSE_TIMEOUT, handshake).await.is_err() {
            debug!(uri = %self.uri, "peer did not finish the close handshake");
        }

        debug!(uri = %self.uri, "cooperative websocket connection closed");
        Ok(())
    }
}

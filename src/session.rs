//! Connection session with the single-retry reconnect policy.
//!
//! The remote server can close the socket right after serving a request. A
//! [`Session`] absorbs that once per exchange:
//!
//! ```text
//! send ─► receive ─► alive? ──yes──► done
//!                      │no
//!                      ▼
//!   warn ─► close ─► pause ─► open ─► pause ─► send ─► receive ─► alive? ──yes──► done
//!                                                                   │no
//!                                                                   ▼
//!                                                          close, ConnectionLost
//! ```
//!
//! Anything other than a dead socket propagates unchanged.

use std::thread;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{Result, WorkerError};
use crate::transport::{Channel, Endpoint, Transport};

/// Owns the single live connection to one endpoint.
pub struct Session<T: Transport> {
    transport: T,
    endpoint: Endpoint,
    /// Identifier of the owning worker, attached to log events.
    worker_id: String,
    channel: Option<T::Channel>,
    retry_pause: Duration,
}

impl<T: Transport> Session<T> {
    /// Open a session; fails if the first connection cannot be established.
    pub fn open(
        transport: T,
        endpoint: Endpoint,
        worker_id: impl Into<String>,
        retry_pause: Duration,
    ) -> Result<Self> {
        let channel = transport.open(&endpoint)?;
        Ok(Self {
            transport,
            endpoint,
            worker_id: worker_id.into(),
            channel: Some(channel),
            retry_pause,
        })
    }

    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[inline]
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Whether a connection is held and still usable.
    pub fn is_open(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| c.is_alive())
    }

    /// Replace the current connection with a fresh one.
    ///
    /// The old connection is closed before the new one is opened, so two
    /// connections never coexist. On failure the session is left closed.
    pub fn connect(&mut self) -> Result<()> {
        self.close()?;
        self.channel = Some(self.transport.open(&self.endpoint)?);
        Ok(())
    }

    /// Close the current connection, if any. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        match self.channel.take() {
            Some(mut channel) => channel.close(),
            None => Ok(()),
        }
    }

    /// Send `request` and return the response, reconnecting and retrying
    /// exactly once if the connection turns out to be dead.
    ///
    /// # Errors
    ///
    /// - [`WorkerError::Transport`] if the session was closed beforehand
    /// - [`WorkerError::ConnectionLost`] if the retry also hit a dead
    ///   connection or the reconnect failed; the session is left closed
    /// - any other error from the channel, unchanged
    pub fn exchange(&mut self, request: &[u8]) -> Result<Bytes> {
        if let Some(response) = self.attempt(request)? {
            return Ok(response);
        }

        let uri = self.endpoint.uri();
        warn!(worker_id = %self.worker_id, uri = %uri, "websocket connection closed, reconnecting");
        self.discard();
        thread::sleep(self.retry_pause);

        match self.transport.open(&self.endpoint) {
            Ok(channel) => self.channel = Some(channel),
            Err(e) => {
                return Err(WorkerError::ConnectionLost {
                    uri,
                    source: Some(Box::new(e)),
                })
            }
        }
        warn!(worker_id = %self.worker_id, uri = %uri, "created new websocket connection");
        thread::sleep(self.retry_pause);

        match self.attempt(request) {
            Ok(Some(response)) => Ok(response),
            Ok(None) => {
                self.discard();
                Err(WorkerError::ConnectionLost { uri, source: None })
            }
            Err(e) => {
                self.discard();
                Err(e)
            }
        }
    }

    /// One send/receive. `Ok(None)` means the connection died during the
    /// exchange.
    fn attempt(&mut self, request: &[u8]) -> Result<Option<Bytes>> {
        let channel = self.channel.as_mut().ok_or_else(WorkerError::closed)?;

        let outcome = channel.send(request).and_then(|()| channel.receive());
        match outcome {
            Ok(response) if channel.is_alive() => Ok(Some(response)),
            Ok(_) => Ok(None),
            Err(e) if e.is_disconnect() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Close and drop the current connection, ignoring close errors.
    fn discard(&mut self) {
        if let Err(e) = self.close() {
            debug!(
                worker_id = %self.worker_id,
                uri = %self.endpoint,
                error = %e,
                "error closing dead connection"
            );
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.discard();
    }
}

//! Worker proxy and its builder.
//!
//! A [`WorkerProxy`] forwards messages to a remote worker server and returns
//! the decoded responses. It is a pure client: it never receives messages
//! addressed to it.
//!
//! # Example
//!
//! ```ignore
//! use wsworker_client::{protocol::Value, WorkerProxy};
//!
//! let mut bob = WorkerProxy::builder("localhost", 8777).id("bob").connect()?;
//!
//! let hits: Vec<Value> = bob.search(["#mnist", "#train"])?;
//! let count = bob.objects_count_remote()?;
//! println!("{} ({} matches)", bob.describe()?, hits.len());
//!
//! let model: Value = bob.synchronous_fit("mnist", None)?;
//! ```
//!
//! # One call at a time
//!
//! The protocol has no request ids, so responses are matched to requests by
//! order alone. Every operation takes `&mut self`, which rules out two calls
//! in flight on one proxy:
//!
//! ```compile_fail
//! # use wsworker_client::WorkerProxy;
//! # fn overlap(proxy: &mut WorkerProxy) {
//! std::thread::scope(|s| {
//!     s.spawn(|| proxy.objects_count_remote());
//!     s.spawn(|| proxy.objects_count_remote());
//! });
//! # }
//! ```
//!
//! Use one proxy per thread instead.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::codec::MsgPackCodec;
use crate::config::{millis_rounded_up, WorkerConfig};
use crate::error::{Result, WorkerError};
use crate::protocol::{Command, IdProvider, Message, ObjectId, RandomIdProvider};
use crate::session::Session;
use crate::store::ObjectStore;
use crate::transport::{AsyncChannel, Endpoint, Transport, WebSocketTransport};

/// Builder for configuring and connecting a [`WorkerProxy`].
pub struct WorkerBuilder {
    config: WorkerConfig,
    ids: Arc<dyn IdProvider>,
    objects: ObjectStore,
}

impl WorkerBuilder {
    /// Start from a plain endpoint with default settings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::from_config(WorkerConfig::new(host, port))
    }

    /// Start from a full configuration.
    pub fn from_config(config: WorkerConfig) -> Self {
        Self {
            config,
            ids: Arc::new(RandomIdProvider),
            objects: ObjectStore::new(),
        }
    }

    /// Use `wss://` with certificate verification disabled.
    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;
        self
    }

    /// Set the worker identifier.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.config.id = id.into();
        self
    }

    /// Keep every encoded outbound request in the message history.
    pub fn log_msgs(mut self, enabled: bool) -> Self {
        self.config.log_msgs = enabled;
        self
    }

    /// Log every exchange at info level.
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.config.verbose = enabled;
        self
    }

    /// Set the socket timeout, kept at millisecond precision (sub-millisecond
    /// remainders round up). Zero selects the default.
    ///
    /// Default: [`TIMEOUT_INTERVAL`](crate::TIMEOUT_INTERVAL)
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.timeout_ms = millis_rounded_up(timeout);
        self
    }

    /// Set the pause around a reconnect.
    ///
    /// Default: 100 ms
    pub fn retry_pause(mut self, pause: std::time::Duration) -> Self {
        self.config.retry_pause_ms = millis_rounded_up(pause);
        self
    }

    /// Use a specific id allocator for `fit` result ids.
    pub fn id_provider(mut self, ids: Arc<dyn IdProvider>) -> Self {
        self.ids = ids;
        self
    }

    /// Seed the local object registry.
    pub fn objects(mut self, objects: ObjectStore) -> Self {
        self.objects = objects;
        self
    }

    /// Connect over WebSocket. Fails if the endpoint is unreachable.
    pub fn connect(self) -> Result<WorkerProxy> {
        let transport = WebSocketTransport::new(self.config.timeout());
        self.connect_with(transport)
    }

    /// Connect through a custom transport.
    pub fn connect_with<T: Transport>(self, transport: T) -> Result<WorkerProxy<T>> {
        let endpoint = self.config.endpoint();
        let session = Session::open(
            transport,
            endpoint,
            self.config.id.clone(),
            self.config.retry_pause(),
        )?;
        debug!(worker_id = %self.config.id, uri = %session.endpoint(), "worker proxy connected");

        Ok(WorkerProxy {
            id: self.config.id,
            session,
            ids: self.ids,
            objects: self.objects,
            log_msgs: self.config.log_msgs,
            verbose: self.config.verbose,
            history: Vec::new(),
        })
    }
}

/// Client-side proxy for a remote worker.
pub struct WorkerProxy<T: Transport = WebSocketTransport> {
    id: String,
    session: Session<T>,
    ids: Arc<dyn IdProvider>,
    objects: ObjectStore,
    log_msgs: bool,
    verbose: bool,
    history: Vec<Bytes>,
}

impl WorkerProxy {
    /// Create a builder for `host:port`.
    pub fn builder(host: impl Into<String>, port: u16) -> WorkerBuilder {
        WorkerBuilder::new(host, port)
    }

    /// Connect with the given configuration.
    pub fn connect_config(config: WorkerConfig) -> Result<Self> {
        WorkerBuilder::from_config(config).connect()
    }
}

impl<T: Transport> WorkerProxy<T> {
    /// Worker identifier.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn endpoint(&self) -> &Endpoint {
        self.session.endpoint()
    }

    /// WebSocket URI of the remote worker.
    pub fn uri(&self) -> String {
        self.session.endpoint().uri()
    }

    /// Whether the ordinary connection is open and usable.
    pub fn is_connected(&self) -> bool {
        self.session.is_open()
    }

    /// Local object registry.
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectStore {
        &mut self.objects
    }

    /// Encoded requests sent so far, when `log_msgs` is enabled.
    pub fn message_history(&self) -> &[Bytes] {
        &self.history
    }

    /// (Re)open the ordinary connection, closing any current one first.
    pub fn connect(&mut self) -> Result<()> {
        self.session.connect()
    }

    /// Shut down the ordinary connection. Later calls fail with
    /// [`WorkerError::Transport`] until [`connect`](Self::connect).
    pub fn close(&mut self) -> Result<()> {
        debug!(worker_id = %self.id, "closing worker proxy connection");
        self.session.close()
    }

    /// Search the remote worker's objects.
    ///
    /// Returns whatever the remote sends back, usually a list of object
    /// references.
    pub fn search<R, I, S>(&mut self, query: I) -> Result<R>
    where
        R: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request(&Message::search(query))
    }

    /// List the remote worker's objects.
    pub fn list_objects_remote<R: DeserializeOwned>(&mut self) -> Result<R> {
        self.send_msg_and_deserialize(Command::new("list_objects"))
    }

    /// Number of objects held by the remote worker.
    pub fn objects_count_remote(&mut self) -> Result<usize> {
        self.send_msg_and_deserialize(Command::new("objects_count"))
    }

    /// Run an arbitrary command on the remote side.
    pub fn send_command<R: DeserializeOwned>(&mut self, command: Command) -> Result<R> {
        self.send_msg_and_deserialize(command)
    }

    /// Fetch the remote object stored under `id`.
    pub fn request_object<R: DeserializeOwned>(&mut self, id: impl Into<ObjectId>) -> Result<R> {
        self.request(&Message::object_request(id))
    }

    /// Train on the remote dataset `dataset_key` without blocking the async
    /// scheduler for the whole run.
    ///
    /// The ordinary connection is closed while a short-lived cooperative
    /// connection carries the `fit` command. Its acknowledgement is awaited
    /// and discarded; then the ordinary connection is reopened and the
    /// result is fetched by id.
    ///
    /// A fresh id is allocated when `return_ids` is `None`. If the
    /// cooperative leg fails the ordinary connection stays closed; call
    /// [`connect`](Self::connect) to resume.
    pub async fn fit<R: DeserializeOwned>(
        &mut self,
        dataset_key: &str,
        return_ids: Option<Vec<ObjectId>>,
    ) -> Result<R> {
        let return_ids = self.resolve_return_ids(return_ids);
        let result_id = return_ids[0].clone();
        let request = self.encode(&fit_message(dataset_key, return_ids))?;

        self.session.close()?;

        let mut channel = self
            .session
            .transport()
            .open_async(self.session.endpoint())
            .await?;
        let outcome = async {
            channel.send(&request).await?;
            channel.receive().await
        }
        .await;
        // Tear the cooperative connection down before anything else, even
        // when the exchange failed.
        let closed = channel.close().await;
        drop(channel);

        // The acknowledgement carries nothing; only its arrival matters.
        let ack = outcome?;
        closed?;
        debug!(worker_id = %self.id, bytes = ack.len(), "fit acknowledged");

        self.session.connect()?;
        self.request_object(result_id)
    }

    /// Blocking variant of [`fit`](Self::fit): both the command and the
    /// result fetch go over the ordinary connection.
    pub fn synchronous_fit<R: DeserializeOwned>(
        &mut self,
        dataset_key: &str,
        return_ids: Option<Vec<ObjectId>>,
    ) -> Result<R> {
        let return_ids = self.resolve_return_ids(return_ids);
        let result_id = return_ids[0].clone();

        self.round_trip(&fit_message(dataset_key, return_ids))?;
        self.request_object(result_id)
    }

    /// Diagnostic string including the remote object count.
    ///
    /// Unlike `Display`, this performs a network round trip.
    pub fn describe(&mut self) -> Result<String> {
        let remote = self.objects_count_remote()?;
        Ok(format!(
            "<WorkerProxy id:{} #objects local:{} #objects remote: {}>",
            self.id,
            self.objects.len(),
            remote
        ))
    }

    /// Entry point for messages addressed to this worker.
    ///
    /// Always fails: a proxy forwards messages, it never receives them.
    /// Reaching this means the proxy was installed as the local worker.
    pub fn recv_msg(&mut self, _message: &[u8]) -> Result<Bytes> {
        Err(WorkerError::Transport(format!(
            "recv_msg should never get called on a WorkerProxy (id: {}); \
             was it installed as the local worker?",
            self.id
        )))
    }

    fn send_msg_and_deserialize<R: DeserializeOwned>(&mut self, command: Command) -> Result<R> {
        self.request(&Message::execute(command))
    }

    fn request<R: DeserializeOwned>(&mut self, message: &Message) -> Result<R> {
        let response = self.round_trip(message)?;
        MsgPackCodec::decode(&response)
    }

    fn round_trip(&mut self, message: &Message) -> Result<Bytes> {
        let request = self.encode(message)?;
        if self.verbose {
            info!(worker_id = %self.id, kind = %message.kind(), bytes = request.len(), "sending message");
        }
        self.session.exchange(&request)
    }

    fn encode(&mut self, message: &Message) -> Result<Vec<u8>> {
        let request = MsgPackCodec::encode(message)?;
        if self.log_msgs {
            self.history.push(Bytes::copy_from_slice(&request));
        }
        Ok(request)
    }

    fn resolve_return_ids(&self, return_ids: Option<Vec<ObjectId>>) -> Vec<ObjectId> {
        match return_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => vec![self.ids.next_id()],
        }
    }
}

impl<T: Transport> fmt::Display for WorkerProxy<T> {
    /// Local-only summary; see [`WorkerProxy::describe`] for the remote count.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<WorkerProxy id:{} #objects local:{}>",
            self.id,
            self.objects.len()
        )
    }
}

impl<T: Transport> fmt::Debug for WorkerProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerProxy")
            .field("id", &self.id)
            .field("endpoint", self.session.endpoint())
            .field("connected", &self.session.is_open())
            .field("local_objects", &self.objects.len())
            .finish()
    }
}

fn fit_message(dataset_key: &str, return_ids: Vec<ObjectId>) -> Message {
    Message::execute(
        Command::new("fit")
            .return_ids(return_ids)
            .kwarg("dataset_key", dataset_key),
    )
}

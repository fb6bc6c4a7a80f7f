//! Scripted in-memory transport for unit tests.
//!
//! Every channel operation is appended to a shared event log, and receives
//! pop replies from a shared script, so tests can assert exactly which
//! network calls happened and how many connections were open at once.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use super::{AsyncChannel, Channel, Endpoint, Transport};
use crate::error::{Result, WorkerError};

/// Channel style an event happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    Blocking,
    Cooperative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Open(Style, usize),
    Send(Style, usize, Vec<u8>),
    Receive(Style, usize),
    Close(Style, usize),
}

/// Outcome of the next `receive`.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Payload arrives, connection stays up.
    Ok(Vec<u8>),
    /// Payload arrives but the connection is dead afterwards.
    DeadAfter(Vec<u8>),
    /// The peer dropped the socket.
    Disconnected,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    replies: VecDeque<Reply>,
    connections: usize,
    open_now: usize,
    max_open: usize,
    refuse_opens: usize,
}

#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Queue the outcome of a future `receive`.
    pub(crate) fn reply(&self, reply: Reply) -> &Self {
        self.lock().replies.push_back(reply);
        self
    }

    /// Make the next `n` opens fail with a connect error.
    pub(crate) fn refuse_opens(&self, n: usize) {
        self.lock().refuse_opens = n;
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub(crate) fn clear_events(&self) {
        self.lock().events.clear();
    }

    /// Connections opened so far, both styles.
    pub(crate) fn connections(&self) -> usize {
        self.lock().connections
    }

    pub(crate) fn open_now(&self) -> usize {
        self.lock().open_now
    }

    /// Highest number of simultaneously open connections seen.
    pub(crate) fn max_open(&self) -> usize {
        self.lock().max_open
    }

    pub(crate) fn pending_replies(&self) -> usize {
        self.lock().replies.len()
    }

    fn open_channel(&self, style: Style, endpoint: &Endpoint) -> Result<MockChannel> {
        let mut state = self.lock();
        if state.refuse_opens > 0 {
            state.refuse_opens -= 1;
            return Err(WorkerError::Connect {
                uri: endpoint.uri(),
                reason: "refused by script".into(),
            });
        }

        state.connections += 1;
        state.open_now += 1;
        state.max_open = state.max_open.max(state.open_now);
        let id = state.connections;
        state.events.push(Event::Open(style, id));

        Ok(MockChannel {
            id,
            style,
            state: self.state.clone(),
            alive: true,
            closed: false,
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Channel = MockChannel;
    type AsyncChannel = MockChannel;

    fn open(&self, endpoint: &Endpoint) -> Result<MockChannel> {
        self.open_channel(Style::Blocking, endpoint)
    }

    async fn open_async(&self, endpoint: &Endpoint) -> Result<MockChannel> {
        self.open_channel(Style::Cooperative, endpoint)
    }
}

pub(crate) struct MockChannel {
    id: usize,
    style: Style,
    state: Arc<Mutex<State>>,
    alive: bool,
    closed: bool,
}

impl MockChannel {
    fn do_send(&mut self, payload: &[u8]) -> Result<()> {
        if self.closed {
            return Err(WorkerError::closed());
        }
        let mut state = self.state.lock().unwrap();
        state
            .events
            .push(Event::Send(self.style, self.id, payload.to_vec()));
        Ok(())
    }

    fn do_receive(&mut self) -> Result<Bytes> {
        if self.closed {
            return Err(WorkerError::closed());
        }
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Receive(self.style, self.id));
        match state.replies.pop_front() {
            Some(Reply::Ok(payload)) => Ok(Bytes::from(payload)),
            Some(Reply::DeadAfter(payload)) => {
                self.alive = false;
                Ok(Bytes::from(payload))
            }
            Some(Reply::Disconnected) => {
                self.alive = false;
                Err(WorkerError::Disconnected)
            }
            None => Err(WorkerError::Transport("script exhausted".into())),
        }
    }

    fn do_close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.alive = false;
        let mut state = self.state.lock().unwrap();
        state.open_now -= 1;
        state.events.push(Event::Close(self.style, self.id));
        Ok(())
    }
}

impl Channel for MockChannel {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.do_send(payload)
    }

    fn receive(&mut self) -> Result<Bytes> {
        self.do_receive()
    }

    fn is_alive(&self) -> bool {
        self.alive && !self.closed
    }

    fn close(&mut self) -> Result<()> {
        self.do_close()
    }
}

#[async_trait]
impl AsyncChannel for MockChannel {
    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.do_send(payload)
    }

    async fn receive(&mut self) -> Result<Bytes> {
        self.do_receive()
    }

    fn is_alive(&self) -> bool {
        self.alive && !self.closed
    }

    async fn close(&mut self) -> Result<()> {
        self.do_close()
    }
}

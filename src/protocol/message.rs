//! Tagged protocol messages.
//!
//! Serialized externally tagged, so a message travels as a one-entry MsgPack
//! map keyed by its tag:
//!
//! ```text
//! {"SEARCH": ["tag:abc"]}
//! {"OBJECT_REQUEST": 42}
//! {"EXECUTE_COMMAND": {"name": "fit", "owner": "self", ...}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Command, ObjectId};

/// A request sent to the remote worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Search remote objects by query terms.
    Search(Vec<String>),
    /// Fetch the object stored under an id.
    ObjectRequest(ObjectId),
    /// Run a command.
    ExecuteCommand(Command),
}

/// Message tag, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Search,
    ObjectRequest,
    ExecuteCommand,
}

impl MessageKind {
    /// Wire tag of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Search => "SEARCH",
            MessageKind::ObjectRequest => "OBJECT_REQUEST",
            MessageKind::ExecuteCommand => "EXECUTE_COMMAND",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    /// Build a search message from query terms.
    pub fn search<I, S>(query: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Message::Search(query.into_iter().map(Into::into).collect())
    }

    /// Build an object request.
    pub fn object_request(id: impl Into<ObjectId>) -> Self {
        Message::ObjectRequest(id.into())
    }

    /// Wrap a command.
    pub fn execute(command: Command) -> Self {
        Message::ExecuteCommand(command)
    }

    /// Tag of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Search(_) => MessageKind::Search,
            Message::ObjectRequest(_) => MessageKind::ObjectRequest,
            Message::ExecuteCommand(_) => MessageKind::ExecuteCommand,
        }
    }
}

//! Protocol module - the messages exchanged with the remote worker.
//!
//! The remote server accepts exactly three message kinds:
//! - `SEARCH` - find remote objects by tag
//! - `OBJECT_REQUEST` - fetch an object by id
//! - `EXECUTE_COMMAND` - run a named command on a remote object
//!
//! Payload contents (arguments, results) are opaque to this crate and are
//! carried as [`Value`]s.

mod command;
mod message;
mod object_id;

pub use command::{Command, SELF_OWNER};
pub use message::{Message, MessageKind};
pub use object_id::{IdProvider, ObjectId, RandomIdProvider, SequentialIdProvider, ID_RANGE};

/// Dynamic value carried in command arguments and results.
pub use serde_json::Value;

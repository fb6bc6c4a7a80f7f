//! Command builder for `EXECUTE_COMMAND` messages.
//!
//! # Example
//!
//! ```
//! use wsworker_client::protocol::{Command, ObjectId, SELF_OWNER};
//!
//! let command = Command::new("fit")
//!     .return_ids(vec![ObjectId::Int(7)])
//!     .kwarg("dataset_key", "mnist");
//!
//! assert_eq!(command.owner, SELF_OWNER);
//! assert_eq!(command.kwargs["dataset_key"], "mnist");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ObjectId, Value};

/// Owner addressing the remote worker itself rather than one of its objects.
pub const SELF_OWNER: &str = "self";

/// A command to run on the remote worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command name, e.g. `"list_objects"` or `"fit"`.
    pub name: String,
    /// Target of the command: [`SELF_OWNER`] or a remote object reference.
    pub owner: String,
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments, ordered for a stable encoding.
    pub kwargs: BTreeMap<String, Value>,
    /// Ids under which the remote side stores the results.
    pub return_ids: Vec<ObjectId>,
}

impl Command {
    /// Create a command addressed to the remote worker itself.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: SELF_OWNER.to_string(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            return_ids: Vec::new(),
        }
    }

    /// Address the command to a specific remote object.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument, replacing any previous value.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Set the ids the results are stored under.
    pub fn return_ids(mut self, ids: Vec<ObjectId>) -> Self {
        self.return_ids = ids;
        self
    }
}

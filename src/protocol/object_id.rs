//! Object identifiers and the id allocator.
//!
//! Ids correlate a fire-and-forget remote operation (such as `fit`) with the
//! later fetch of its result. The allocator is injected rather than global so
//! tests can supply a deterministic sequence.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of randomly allocated ids.
pub const ID_RANGE: u64 = 10_000_000_000;

/// Opaque remote object identifier.
///
/// The remote framework accepts integer and string ids; both serialize
/// untagged so they travel as plain MsgPack ints or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    Int(u64),
    Str(String),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectId::Int(id) => write!(f, "{id}"),
            ObjectId::Str(id) => f.write_str(id),
        }
    }
}

impl From<u64> for ObjectId {
    fn from(id: u64) -> Self {
        ObjectId::Int(id)
    }
}

impl From<&str> for ObjectId {
    fn from(id: &str) -> Self {
        ObjectId::Str(id.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(id: String) -> Self {
        ObjectId::Str(id)
    }
}

/// Source of fresh object ids.
pub trait IdProvider: Send + Sync {
    /// Allocate the next id.
    fn next_id(&self) -> ObjectId;
}

/// Draws ids uniformly from `0..ID_RANGE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdProvider;

impl IdProvider for RandomIdProvider {
    fn next_id(&self) -> ObjectId {
        ObjectId::Int(rand::thread_rng().gen_range(0..ID_RANGE))
    }
}

/// Hands out consecutive integer ids starting at a fixed value.
#[derive(Debug)]
pub struct SequentialIdProvider {
    next: AtomicU64,
}

impl SequentialIdProvider {
    /// Create a provider whose first id is `start`.
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl IdProvider for SequentialIdProvider {
    fn next_id(&self) -> ObjectId {
        ObjectId::Int(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

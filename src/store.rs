//! Local object registry.
//!
//! The proxy keeps objects it holds locally next to the remote worker's
//! registry. Values are opaque serialized bytes.

use std::collections::HashMap;

use bytes::Bytes;

use crate::protocol::ObjectId;

/// Objects held on the local side, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, Bytes>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, returning the value it replaced.
    pub fn register(&mut self, id: impl Into<ObjectId>, value: impl Into<Bytes>) -> Option<Bytes> {
        self.objects.insert(id.into(), value.into())
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Bytes> {
        self.objects.get(id)
    }

    pub fn remove(&mut self, id: &ObjectId) -> Option<Bytes> {
        self.objects.remove(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Ids currently stored, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }
}

impl<I, V> FromIterator<(I, V)> for ObjectStore
where
    I: Into<ObjectId>,
    V: Into<Bytes>,
{
    fn from_iter<It: IntoIterator<Item = (I, V)>>(iter: It) -> Self {
        let mut store = Self::new();
        for (id, value) in iter {
            store.register(id, value);
        }
        store
    }
}

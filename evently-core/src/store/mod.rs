//! Keyed document store client.
//!
//! The store is a single JSON tree addressed by [`StorePath`]. Implementations
//! follow the hosted real-time database semantics the data was designed for:
//!
//! - `null` and empty objects do not exist; writing them deletes the node
//! - keys enumerate in sorted order, and generated push keys sort by creation time
//! - a subscription delivers the full snapshot at its path, first immediately
//!   and then after every write touching that path, an ancestor, or a descendant

mod file;
mod keys;
mod memory;
mod timed;
pub(crate) mod tree;

pub use file::FileStore;
pub use keys::PushKeyGenerator;
pub use memory::MemoryStore;
pub use timed::TimedStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::EventlyResult;
use crate::path::StorePath;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the subtree at `path` once.
    async fn get(&self, path: &StorePath) -> EventlyResult<Snapshot>;

    /// Overwrite the subtree at `path`.
    async fn set(&self, path: &StorePath, value: Value) -> EventlyResult<()>;

    /// Apply every write in the batch atomically, in order.
    async fn update(&self, batch: WriteBatch) -> EventlyResult<()>;

    async fn remove(&self, path: &StorePath) -> EventlyResult<()>;

    /// A new chronologically sortable key, generated without touching the store.
    fn generate_key(&self) -> String;

    /// Store `value` under a freshly generated child key of `path` and return the key.
    async fn push(&self, path: &StorePath, value: Value) -> EventlyResult<String>;

    /// Listen for changes at `path`. Dropping the subscription releases it.
    async fn subscribe(&self, path: &StorePath) -> EventlyResult<Subscription>;
}

/// The value found at a path (or its absence).
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: StorePath,
    pub value: Option<Value>,
}

impl Snapshot {
    pub fn new(path: StorePath, value: Option<Value>) -> Self {
        Snapshot { path, value }
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    /// Deserialize the value, `None` when nothing is stored at the path.
    pub fn deserialize<T: DeserializeOwned>(&self) -> EventlyResult<Option<T>> {
        match &self.value {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Child nodes in key order. Empty for leaves and missing nodes.
    pub fn children(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.value
            .as_ref()
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|map| map.iter())
    }
}

/// A set of writes applied as one atomic multi-path update.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<(StorePath, Option<Value>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        WriteBatch::default()
    }

    pub fn set(mut self, path: StorePath, value: Value) -> Self {
        self.writes.push((path, Some(value)));
        self
    }

    pub fn remove(mut self, path: StorePath) -> Self {
        self.writes.push((path, None));
        self
    }

    /// Partial update: each field of `partial` overwrites the matching child of `path`,
    /// siblings are left alone.
    pub fn merge(mut self, path: &StorePath, partial: Map<String, Value>) -> EventlyResult<Self> {
        for (key, value) in partial {
            let child = path.child(&key)?;
            if value.is_null() {
                self.writes.push((child, None));
            } else {
                self.writes.push((child, Some(value)));
            }
        }
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &StorePath> {
        self.writes.iter().map(|(path, _)| path)
    }

    pub fn into_writes(self) -> Vec<(StorePath, Option<Value>)> {
        self.writes
    }
}

/// A live listener on one path.
///
/// Every delivered snapshot replaces the previous one. The registration is
/// released as soon as this value is dropped.
#[derive(Debug)]
pub struct Subscription {
    path: StorePath,
    receiver: mpsc::UnboundedReceiver<Snapshot>,
}

impl Subscription {
    pub(crate) fn new(path: StorePath, receiver: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Subscription { path, receiver }
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    /// Wait for the next snapshot. `None` once the store has gone away.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Take a pending snapshot without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.receiver.try_recv().ok()
    }
}

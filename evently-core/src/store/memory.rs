//! In-process document store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::EventlyResult;
use crate::path::StorePath;
use crate::store::keys::PushKeyGenerator;
use crate::store::{DocumentStore, Snapshot, Subscription, WriteBatch, tree};

/// A complete store held in memory. Writes are serialized by a single lock,
/// which makes every [`WriteBatch`] atomic with respect to readers and listeners.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    keys: PushKeyGenerator,
}

#[derive(Debug)]
struct Inner {
    tree: Value,
    listeners: Vec<Listener>,
}

#[derive(Debug)]
struct Listener {
    path: StorePath,
    sender: mpsc::UnboundedSender<Snapshot>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::from_tree(Value::Object(Map::new()))
    }

    pub fn from_tree(tree: Value) -> Self {
        MemoryStore {
            inner: Mutex::new(Inner {
                tree: tree::normalize(tree).unwrap_or_else(|| Value::Object(Map::new())),
                listeners: Vec::new(),
            }),
            keys: PushKeyGenerator::new(),
        }
    }

    /// Copy of the whole tree.
    pub fn export(&self) -> Value {
        self.lock().tree.clone()
    }

    /// Number of live listeners. Dropped subscriptions are pruned first.
    pub fn listener_count(&self) -> usize {
        let mut inner = self.lock();
        inner.listeners.retain(|l| !l.sender.is_closed());
        inner.listeners.len()
    }

    fn apply(&self, writes: Vec<(StorePath, Option<Value>)>) {
        let mut inner = self.lock();
        for (path, value) in &writes {
            trace!(path = %path, delete = value.is_none(), "store write");
            tree::set(&mut inner.tree, path, value.clone());
        }
        inner.notify(writes.iter().map(|(path, _)| path));
    }

    /// Swap in a tree read from elsewhere. Listeners are not notified.
    pub(crate) fn replace(&self, tree: Value) {
        self.lock().tree = tree::normalize(tree).unwrap_or_else(|| Value::Object(Map::new()));
    }

    /// Install `tree`, already holding `changed`, and notify overlapping listeners.
    pub(crate) fn commit<'a>(&self, tree: Value, changed: impl Iterator<Item = &'a StorePath>) {
        let mut inner = self.lock();
        inner.tree = tree::normalize(tree).unwrap_or_else(|| Value::Object(Map::new()));
        inner.notify(changed);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Inner {
    fn snapshot(&self, path: &StorePath) -> Snapshot {
        Snapshot::new(path.clone(), tree::get(&self.tree, path).cloned())
    }

    fn notify<'a>(&mut self, changed: impl Iterator<Item = &'a StorePath>) {
        let changed: Vec<&StorePath> = changed.collect();
        let tree = &self.tree;
        self.listeners.retain(|listener| {
            if listener.sender.is_closed() {
                return false;
            }
            if !changed.iter().any(|path| path.overlaps(&listener.path)) {
                return true;
            }
            let snapshot = Snapshot::new(
                listener.path.clone(),
                tree::get(tree, &listener.path).cloned(),
            );
            listener.sender.send(snapshot).is_ok()
        });
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &StorePath) -> EventlyResult<Snapshot> {
        Ok(self.lock().snapshot(path))
    }

    async fn set(&self, path: &StorePath, value: Value) -> EventlyResult<()> {
        self.apply(vec![(path.clone(), Some(value))]);
        Ok(())
    }

    async fn update(&self, batch: WriteBatch) -> EventlyResult<()> {
        if !batch.is_empty() {
            self.apply(batch.into_writes());
        }
        Ok(())
    }

    async fn remove(&self, path: &StorePath) -> EventlyResult<()> {
        self.apply(vec![(path.clone(), None)]);
        Ok(())
    }

    fn generate_key(&self) -> String {
        self.keys.next_key()
    }

    async fn push(&self, path: &StorePath, value: Value) -> EventlyResult<String> {
        let key = self.generate_key();
        self.apply(vec![(path.child(&key)?, Some(value))]);
        Ok(key)
    }

    async fn subscribe(&self, path: &StorePath) -> EventlyResult<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        // Listeners get the current value right away, like any later change.
        let _ = sender.send(inner.snapshot(path));
        inner.listeners.retain(|l| !l.sender.is_closed());
        inner.listeners.push(Listener {
            path: path.clone(),
            sender,
        });
        Ok(Subscription::new(path.clone(), receiver))
    }
}

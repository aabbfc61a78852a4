//! Timeouts for outbound store calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::timeout;

use crate::constants::DEFAULT_STORE_TIMEOUT;
use crate::error::{EventlyError, EventlyResult};
use crate::path::StorePath;
use crate::store::{DocumentStore, Snapshot, Subscription, WriteBatch};

/// Wraps another store and fails any call that takes longer than `limit`
/// with [`EventlyError::StoreTimeout`].
pub struct TimedStore {
    inner: Arc<dyn DocumentStore>,
    limit: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn DocumentStore>, limit: Duration) -> Self {
        TimedStore { inner, limit }
    }

    pub fn with_default_timeout(inner: Arc<dyn DocumentStore>) -> Self {
        TimedStore::new(inner, DEFAULT_STORE_TIMEOUT)
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn call<T>(&self, fut: impl Future<Output = EventlyResult<T>>) -> EventlyResult<T> {
        timeout(self.limit, fut)
            .await
            .map_err(|_| EventlyError::StoreTimeout(self.limit.as_secs()))?
    }
}

#[async_trait]
impl DocumentStore for TimedStore {
    async fn get(&self, path: &StorePath) -> EventlyResult<Snapshot> {
        self.call(self.inner.get(path)).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> EventlyResult<()> {
        self.call(self.inner.set(path, value)).await
    }

    async fn update(&self, batch: WriteBatch) -> EventlyResult<()> {
        self.call(self.inner.update(batch)).await
    }

    async fn remove(&self, path: &StorePath) -> EventlyResult<()> {
        self.call(self.inner.remove(path)).await
    }

    fn generate_key(&self) -> String {
        self.inner.generate_key()
    }

    async fn push(&self, path: &StorePath, value: Value) -> EventlyResult<String> {
        self.call(self.inner.push(path, value)).await
    }

    async fn subscribe(&self, path: &StorePath) -> EventlyResult<Subscription> {
        self.call(self.inner.subscribe(path)).await
    }
}

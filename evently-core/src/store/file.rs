//! Document store persisted to a single JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{EventlyError, EventlyResult};
use crate::lockfile::FileLock;
use crate::path::StorePath;
use crate::store::{DocumentStore, MemoryStore, Snapshot, Subscription, WriteBatch, tree};

const TREE_FILE: &str = "tree.json";
const LOCK_FILE: &str = "tree.lock";

/// A [`MemoryStore`] mirroring `<dir>/tree.json`.
///
/// Every write takes an exclusive lock on `<dir>/tree.lock`, re-reads the file,
/// applies the change and writes it back before the in-memory copy and its
/// listeners see it. Reads refresh from the file under a shared lock, so
/// processes sharing the directory see each other's writes. Subscriptions only
/// hear about writes made through this instance.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    memory: MemoryStore,
}

impl FileStore {
    /// Open (or create) the store in `dir`.
    pub fn open(dir: &Path) -> EventlyResult<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(TREE_FILE);
        let lock_path = dir.join(LOCK_FILE);

        let tree = {
            let _lock = FileLock::shared(&lock_path)?;
            read_tree(&path)?
        };

        debug!(path = %path.display(), "opened file store");

        Ok(FileStore {
            path,
            lock_path,
            memory: MemoryStore::from_tree(tree),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.path
    }

    fn refresh(&self) -> EventlyResult<()> {
        let tree = {
            let _lock = FileLock::shared(&self.lock_path)?;
            read_tree(&self.path)?
        };
        self.memory.replace(tree);
        Ok(())
    }

    /// Apply `writes` to the file, then to memory.
    fn commit(&self, writes: Vec<(StorePath, Option<Value>)>) -> EventlyResult<()> {
        let _lock = FileLock::exclusive(&self.lock_path)?;

        let mut current = read_tree(&self.path)?;
        for (path, value) in &writes {
            tree::set(&mut current, path, value.clone());
        }
        write_tree(&self.path, &current)?;

        self.memory.commit(current, writes.iter().map(|(path, _)| path));
        Ok(())
    }
}

fn read_tree(path: &Path) -> EventlyResult<Value> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&content)
        .map_err(|e| EventlyError::Serialization(format!("{}: {}", path.display(), e)))
}

fn write_tree(path: &Path, tree: &Value) -> EventlyResult<()> {
    let content = serde_json::to_string_pretty(tree)?;
    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, path: &StorePath) -> EventlyResult<Snapshot> {
        self.refresh()?;
        self.memory.get(path).await
    }

    async fn set(&self, path: &StorePath, value: Value) -> EventlyResult<()> {
        self.commit(vec![(path.clone(), Some(value))])
    }

    async fn update(&self, batch: WriteBatch) -> EventlyResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.commit(batch.into_writes())
    }

    async fn remove(&self, path: &StorePath) -> EventlyResult<()> {
        self.commit(vec![(path.clone(), None)])
    }

    fn generate_key(&self) -> String {
        self.memory.generate_key()
    }

    async fn push(&self, path: &StorePath, value: Value) -> EventlyResult<String> {
        let key = self.generate_key();
        self.commit(vec![(path.child(&key)?, Some(value))])?;
        Ok(key)
    }

    async fn subscribe(&self, path: &StorePath) -> EventlyResult<Subscription> {
        self.refresh()?;
        self.memory.subscribe(path).await
    }
}

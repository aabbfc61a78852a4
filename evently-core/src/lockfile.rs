//! Advisory locks on sidecar files, so separate processes sharing a data
//! directory take turns reading and rewriting it.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::EventlyResult;

/// Held lock on a sidecar file. Released when dropped.
#[derive(Debug)]
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    /// Block until no other holder has the lock.
    pub(crate) fn exclusive(path: &Path) -> EventlyResult<Self> {
        let file = open(path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(FileLock { file })
    }

    /// Block until no exclusive holder has the lock; other readers may hold it too.
    pub(crate) fn shared(path: &Path) -> EventlyResult<Self> {
        let file = open(path)?;
        FileExt::lock_shared(&file)?;
        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open(path: &Path) -> EventlyResult<File> {
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}

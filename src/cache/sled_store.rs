use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use super::{CategoryStore, StoreError, StoredEntry};

/// Category store backed by a single sled database
///
/// Every write is flushed before `set` returns, so entries survive an
/// abrupt exit. The final flush happens once, on `close` or on drop.
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
    closed: AtomicBool,
}

impl SledStore {
    /// Opens (or creates) the database at `path`
    /// Creates the parent directory if it doesn't exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = sled::open(path)?;
        debug!(path = %path.display(), entries = db.len(), "opened sled store");

        Ok(Self {
            db,
            path: path.to_path_buf(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CategoryStore for SledStore {
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(key.as_bytes())?)
    }

    fn get(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, entry: &StoredEntry) -> Result<(), StoreError> {
        let value = serde_json::to_vec(entry)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.db.len())
    }

    fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.db.flush()?;
        debug!(path = %self.path.display(), entries = self.db.len(), "closed sled store");
        Ok(())
    }
}

impl Drop for SledStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "failed to flush store on drop");
        }
    }
}

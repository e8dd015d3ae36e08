//! Durable category store and the fetch-or-cache resolver built on it
//!
//! Each FRED category is stored under its decimal id. A stored entry holds
//! the records fetched for that category, or an empty list when the fetch
//! failed. Once a key is present the resolver serves it from the store and
//! never hits the network for it again.

mod json_store;
pub mod resolver;
mod sled_store;

pub use json_store::JsonStore;
pub use resolver::{CategoryCache, FailurePolicy, Resolution};
pub use sled_store::SledStore;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::data::SeriesRecord;

/// Default location of the sled database, relative to the working directory
pub const DEFAULT_SLED_PATH: &str = "store.db";

/// Errors raised by the durable store. These are never contained per
/// category: any of them aborts the run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The embedded database failed
    #[error("Store database error: {0}")]
    Sled(#[from] sled::Error),

    /// Reading or writing a store file failed
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry could not be encoded or decoded
    #[error("Failed to (de)serialize store entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a stored entry came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// The source answered, possibly with zero records
    Fetched,
    /// The source raised; the entry is an empty placeholder
    Failed,
}

/// Value persisted for a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub status: EntryStatus,
    pub records: Vec<SeriesRecord>,
    pub cached_at: DateTime<Utc>,
}

impl StoredEntry {
    /// Entry for a successful fetch
    pub fn fetched(records: Vec<SeriesRecord>) -> Self {
        Self {
            status: EntryStatus::Fetched,
            records,
            cached_at: Utc::now(),
        }
    }

    /// Empty placeholder for a failed fetch
    pub fn failed() -> Self {
        Self {
            status: EntryStatus::Failed,
            records: Vec::new(),
            cached_at: Utc::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == EntryStatus::Failed
    }
}

/// Canonical store key for a category id
pub fn category_key(category_id: u32) -> String {
    category_id.to_string()
}

/// A persistent string-keyed map of category entries
///
/// Implementations are opened once per run and closed exactly once:
/// `close` is idempotent, and a store dropped without being closed closes
/// itself.
pub trait CategoryStore: Send + Sync {
    /// Whether an entry exists for the key
    fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// Reads the entry for the key, if any
    fn get(&self, key: &str) -> Result<Option<StoredEntry>, StoreError>;

    /// Writes (or replaces) the entry for the key
    fn set(&self, key: &str, entry: &StoredEntry) -> Result<(), StoreError>;

    /// Number of stored entries
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Flushes pending writes and releases the store
    fn close(&self) -> Result<(), StoreError>;
}

/// Available store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreBackend {
    /// Single embedded database at one path
    #[default]
    Sled,
    /// One JSON file per category in a directory
    Json,
}

/// Opens the store for the chosen backend
///
/// Without an explicit path, sled uses `store.db` in the working directory
/// and the JSON backend uses the XDG cache directory (`~/.cache/fredcat/` on
/// Linux), falling back to `./store` when no home directory is available.
pub fn open_store(
    backend: StoreBackend,
    path: Option<PathBuf>,
) -> Result<Box<dyn CategoryStore>, StoreError> {
    match backend {
        StoreBackend::Sled => {
            let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_SLED_PATH));
            Ok(Box::new(SledStore::open(path)?))
        }
        StoreBackend::Json => {
            let store = match path {
                Some(dir) => JsonStore::with_dir(dir),
                None => JsonStore::new().unwrap_or_else(|| JsonStore::with_dir(PathBuf::from("store"))),
            };
            Ok(Box::new(store))
        }
    }
}

/// XDG cache directory used by the JSON backend
pub(crate) fn default_cache_dir() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "fredcat")?;
    Some(project_dirs.cache_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_category_key_is_decimal() {
        assert_eq!(category_key(0), "0");
        assert_eq!(category_key(10000), "10000");
    }

    #[test]
    fn test_failed_entry_is_empty() {
        let entry = StoredEntry::failed();
        assert!(entry.is_failed());
        assert!(entry.records.is_empty());
    }

    #[test]
    fn test_entry_status_serializes_snake_case() {
        let json = serde_json::to_string(&StoredEntry::fetched(vec![])).expect("serialize");
        assert!(json.contains("\"status\":\"fetched\""));
    }

    #[test]
    fn test_open_store_both_backends() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        for backend in [StoreBackend::Sled, StoreBackend::Json] {
            let path = temp_dir.path().join(format!("{:?}", backend));
            let store = open_store(backend, Some(path)).expect("open store");

            store
                .set("7", &StoredEntry::fetched(vec![SeriesRecord::new("A", "T", "U")]))
                .expect("set");
            assert!(store.contains("7").expect("contains"));
            assert_eq!(store.len().expect("len"), 1);
            store.close().expect("close");
        }
    }
}

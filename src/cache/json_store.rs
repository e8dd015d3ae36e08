//! Directory-of-JSON-files category store
//!
//! Stores each category entry as `<key>.json` in a cache directory. Useful
//! when the store should be inspectable or editable by hand, e.g. deleting
//! one file to force a category to be fetched again.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use super::{default_cache_dir, CategoryStore, StoreError, StoredEntry};

/// Category store writing one JSON file per key
#[derive(Debug)]
pub struct JsonStore {
    /// Directory where entry files are stored
    cache_dir: PathBuf,
    closed: AtomicBool,
}

impl JsonStore {
    /// Creates a JsonStore using the XDG-compliant cache directory
    ///
    /// Uses `~/.cache/fredcat/` on Linux, or equivalent XDG path on other platforms.
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        default_cache_dir().map(Self::with_dir)
    }

    /// Creates a JsonStore rooted at a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the path to the entry file for the given key
    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }
}

impl CategoryStore for JsonStore {
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entry_path(key).is_file())
    }

    fn get(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        let content = match fs::read_to_string(self.entry_path(key)) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn set(&self, key: &str, entry: &StoredEntry) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(entry)?;
        fs::write(self.entry_path(key), json)?;
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    fn close(&self) -> Result<(), StoreError> {
        // Entries are written through on `set`; nothing is buffered.
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(dir = %self.cache_dir.display(), "closed json store");
        }
        Ok(())
    }
}

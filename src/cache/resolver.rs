//! Fetch-or-cache resolution of a single category
//!
//! `CategoryCache::resolve` consults the store before any network call. On a
//! miss it pauses once through the throttle, fetches, and stores whatever
//! came back. A failed fetch is stored as an empty entry and reported as
//! `Resolution::Failed`; the fetch error never escapes. Store errors do.

use tracing::{debug, warn};

use super::{category_key, CategoryStore, StoreError, StoredEntry};
use crate::data::{SeriesRecord, SeriesSource};
use crate::throttle::Throttle;

/// What to do with stored entries whose fetch had failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// A failed category stays empty for the lifetime of the store
    #[default]
    Poison,
    /// A failed category is fetched again the next time it is resolved
    RetryOnNextRun,
}

/// Outcome of resolving one category
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Served from the store without touching the network. A category that
    /// previously failed is served here as an empty list.
    Cached(Vec<SeriesRecord>),
    /// Fetched from the source and stored
    Fetched(Vec<SeriesRecord>),
    /// The source raised; an empty entry was stored in its place
    Failed(String),
}

impl Resolution {
    /// Records produced by this resolution, empty for failures
    pub fn records(&self) -> &[SeriesRecord] {
        match self {
            Resolution::Cached(records) | Resolution::Fetched(records) => records,
            Resolution::Failed(_) => &[],
        }
    }

    pub fn into_records(self) -> Vec<SeriesRecord> {
        match self {
            Resolution::Cached(records) | Resolution::Fetched(records) => records,
            Resolution::Failed(_) => Vec::new(),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Resolution::Cached(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Resolution::Failed(_))
    }
}

/// Memoizes per-category fetches in a durable store
pub struct CategoryCache<'a, T> {
    store: &'a dyn CategoryStore,
    throttle: T,
    policy: FailurePolicy,
}

impl<'a, T: Throttle> CategoryCache<'a, T> {
    pub fn new(store: &'a dyn CategoryStore, throttle: T) -> Self {
        Self {
            store,
            throttle,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &'a dyn CategoryStore {
        self.store
    }

    pub fn throttle(&self) -> &T {
        &self.throttle
    }

    /// Resolves a category from the store, fetching it from `source` on a miss
    ///
    /// After `Ok` is returned the category's key is always present in the
    /// store.
    pub async fn resolve<S>(&self, category_id: u32, source: &S) -> Result<Resolution, StoreError>
    where
        S: SeriesSource + ?Sized,
    {
        let key = category_key(category_id);

        if let Some(entry) = self.store.get(&key)? {
            if !(entry.is_failed() && self.policy == FailurePolicy::RetryOnNextRun) {
                debug!(category_id, "fetching category from store");
                return Ok(Resolution::Cached(entry.records));
            }
            debug!(category_id, "retrying previously failed category");
        }

        self.throttle.pause().await;
        debug!(category_id, "fetching category from FRED");

        match source.fetch_by_category(category_id).await {
            Ok(records) => {
                self.store.set(&key, &StoredEntry::fetched(records.clone()))?;
                Ok(Resolution::Fetched(records))
            }
            Err(e) => {
                warn!(category_id, error = %e, "error fetching series");
                self.store.set(&key, &StoredEntry::failed())?;
                Ok(Resolution::Failed(e.to_string()))
            }
        }
    }
}

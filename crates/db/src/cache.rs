//! Leave type caching using Moka.
//!
//! Leave types are reference data read on every filing and edit. Entries
//! expire after a TTL so edits made through the seeder or SQL show up
//! without a restart.

use moka::future::Cache;
use std::time::Duration;

use kawani_core::leave::LeaveType;
use kawani_shared::types::LeaveTypeId;

/// Default cache capacity (number of leave types).
const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Cache of leave types by ID.
#[derive(Clone)]
pub struct LeaveTypeCache {
    cache: Cache<LeaveTypeId, LeaveType>,
}

impl LeaveTypeCache {
    /// Creates a cache with default settings.
    ///
    /// Default: 256 entries max, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom configuration.
    ///
    /// # Arguments
    ///
    /// * `max_capacity` - Maximum number of entries to cache
    /// * `ttl_secs` - Time-to-live in seconds for each entry
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns a cached leave type.
    pub async fn get(&self, id: LeaveTypeId) -> Option<LeaveType> {
        self.cache.get(&id).await
    }

    /// Caches a leave type under its ID.
    pub async fn insert(&self, leave_type: LeaveType) {
        self.cache.insert(leave_type.id, leave_type).await;
    }

    /// Drops one entry.
    pub async fn invalidate(&self, id: LeaveTypeId) {
        self.cache.invalidate(&id).await;
    }

    /// Invalidates all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for LeaveTypeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LeaveTypeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaveTypeCache")
            .field("entry_count", &self.entry_count())
            .finish()
    }
}

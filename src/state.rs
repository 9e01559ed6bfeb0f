//! Server state module
//!
//! Per-instance mutable state: the currently servable project root and the
//! byte-range cache. Owned by one `FileServer`, never process-global, so
//! independent servers (one per test, say) cannot share roots or caches.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;

use crate::config::Config;
use crate::http::cache::{CacheStats, RangeCache};
use crate::logger;

/// State owned by one server instance.
///
/// The root is written only by `set_project_path` and read by every request
/// handler. The cache's key map, recency list, and byte total are guarded
/// as one unit; `with_cache` closures run entirely under the lock and never
/// cross an await point.
pub struct ServerState {
    pub config: Config,
    root: RwLock<Option<PathBuf>>,
    cache: Mutex<RangeCache>,
}

impl ServerState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let cache = RangeCache::new(config.cache.max_entries, config.cache.max_bytes);
        Self {
            config,
            root: RwLock::new(None),
            cache: Mutex::new(cache),
        }
    }

    /// Current project root, or None when no project is open.
    pub async fn root(&self) -> Option<PathBuf> {
        self.root.read().await.clone()
    }

    /// Update the servable root directory.
    ///
    /// An existing path becomes the new root (resolved to an absolute
    /// path). A missing path or `None` clears the root, after which every
    /// file request is refused with 404.
    pub async fn set_project_path(&self, path: Option<&Path>) {
        let new_root = match path {
            Some(p) => match tokio::fs::canonicalize(p).await {
                Ok(resolved) => {
                    logger::log_root_updated(&resolved);
                    Some(resolved)
                }
                Err(_) => {
                    logger::log_invalid_root(p);
                    None
                }
            },
            None => {
                logger::log_root_cleared();
                None
            }
        };
        *self.root.write().await = new_root;
    }

    /// Run a closure against the cache under its lock.
    pub fn with_cache<R>(&self, f: impl FnOnce(&mut RangeCache) -> R) -> R {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cache)
    }

    /// Snapshot of the cache counters.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.with_cache(|c| c.stats())
    }
}

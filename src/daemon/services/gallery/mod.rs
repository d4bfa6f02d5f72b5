//! Paginated media listings over the configured roots.
//!
//! A listing request flows through the [`ResultCache`] first; on a miss the
//! indexer scans the requested subfolder and bounded top-K selection picks
//! the requested page. The result is cached for a short TTL, so rapid
//! client refreshes share one scan.
//!
//! # Async Usage
//!
//! Scans are blocking. [`GalleryService::list`] and
//! [`GalleryService::latest_modified`] run them on the blocking pool via
//! `spawn_blocking`; the `_blocking` variants are for callers already off
//! the runtime.

mod cache;
mod filters;
mod indexer;
mod probe;
mod selector;
mod types;


use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

pub use cache::{Clock, ResultCache, SystemClock};
pub use filters::{AUDIO_EXTENSIONS, FileClass, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
pub use indexer::resolve_dir;
pub use selector::{BoundedTopK, PageSelector};
pub use types::{
    EntryKind, EntryMeta, ListingQuery, ListingResult, MediaEntry, MediaKind, SourceKind,
};

use super::roots::MediaRoots;
use crate::daemon::metrics;
use crate::error::Result;

/// Listing service shared by the HTTP handlers and the change stream.
///
/// `GalleryService` is `Clone`; clones share the cache and scan counter.
#[derive(Debug, Clone)]
pub struct GalleryService {
    roots: MediaRoots,
    cache: Arc<ResultCache>,
    scans: Arc<AtomicU64>,
}

impl GalleryService {
    /// Service with a system-clock cache of the given TTL and capacity.
    pub fn new(roots: MediaRoots, cache_ttl: Duration, cache_capacity: usize) -> Self {
        Self::with_cache(roots, ResultCache::new(cache_ttl, cache_capacity))
    }

    /// Service around an explicitly constructed cache.
    pub fn with_cache(roots: MediaRoots, cache: ResultCache) -> Self {
        Self {
            roots,
            cache: Arc::new(cache),
            scans: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Configured roots.
    pub fn roots(&self) -> &MediaRoots {
        &self.roots
    }

    /// First-page query over `subfolder` of the `source` root.
    pub fn query(&self, source: SourceKind, subfolder: &str) -> ListingQuery {
        ListingQuery::new(self.roots.root(source), subfolder)
    }

    /// Number of directory scans performed so far (cache misses).
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Read-through listing on the current thread.
    ///
    /// # Errors
    ///
    /// Forbidden escapes, missing directories and unreadable targets.
    pub fn list_blocking(&self, query: &ListingQuery) -> Result<Arc<ListingResult>> {
        if let Some(hit) = self.cache.get(query) {
            metrics::record_listing_cache(true);
            return Ok(hit);
        }
        metrics::record_listing_cache(false);

        self.scans.fetch_add(1, Ordering::Relaxed);
        metrics::record_scan(query.recursive);
        let result = Arc::new(indexer::list(query)?);
        self.cache.put(query.clone(), Arc::clone(&result));

        debug!(
            subfolder = %query.subfolder,
            recursive = query.recursive,
            page = query.page,
            "Listing cached"
        );
        Ok(result)
    }

    /// Read-through listing on the blocking pool.
    ///
    /// # Errors
    ///
    /// As [`list_blocking`](Self::list_blocking), plus a worker error if the
    /// blocking task fails.
    pub async fn list(&self, query: ListingQuery) -> Result<Arc<ListingResult>> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.list_blocking(&query)).await?
    }

    /// Latest mtime under `subfolder`, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Forbidden escapes and missing directories.
    pub fn latest_modified_blocking(
        &self,
        source: SourceKind,
        subfolder: &str,
        recursive: bool,
        show_hidden: bool,
    ) -> Result<f64> {
        probe::latest_modified(self.roots.root(source), subfolder, recursive, show_hidden)
    }

    /// Latest mtime under `subfolder` on the blocking pool.
    ///
    /// # Errors
    ///
    /// As [`latest_modified_blocking`](Self::latest_modified_blocking).
    pub async fn latest_modified(
        &self,
        source: SourceKind,
        subfolder: String,
        recursive: bool,
        show_hidden: bool,
    ) -> Result<f64> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || {
            service.latest_modified_blocking(source, &subfolder, recursive, show_hidden)
        })
        .await?
    }

    /// Validate `subfolder` under the `source` root, returning its
    /// normalized form.
    ///
    /// # Errors
    ///
    /// Forbidden escapes and missing directories.
    pub fn check_dir(&self, source: SourceKind, subfolder: &str) -> Result<String> {
        resolve_dir(self.roots.root(source), subfolder).map(|(_, normalized)| normalized)
    }
}

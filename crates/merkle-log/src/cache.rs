use std::sync::Mutex;

use lru::LruCache;
use merkle_hash::Digest;

/// Point-in-time counters for the subroot cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Total bytes currently held by cached digests.
    pub size_bytes: u64,
    /// The configured byte capacity.
    pub capacity_bytes: u64,
    /// Number of `get_or_compute` calls served from the cache.
    pub hits: u64,
    /// Number of `get_or_compute` calls that recomputed the value.
    pub misses: u64,
}

struct Inner {
    entries: LruCache<(u64, u64), Digest>,
    size_bytes: u64,
    hits: u64,
    misses: u64,
}

/// A bounded, thread-safe, byte-accounted LRU cache of perfect subtree
/// digests, keyed by `(offset, width)`.
///
/// Entries are never invalidated: because the underlying leaf log is
/// append-only, a digest computed for a given `(offset, width)` remains
/// correct forever (I5). Eviction only ever happens to bound memory, not
/// for correctness.
pub struct SubrootCache {
    inner: Mutex<Inner>,
    capacity_bytes: u64,
    threshold: u64,
}

impl SubrootCache {
    /// Creates a cache with the given byte capacity and admission
    /// threshold (subtree widths below `threshold` bypass the cache).
    pub fn new(capacity_bytes: u64, threshold: u64) -> Self {
        SubrootCache {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                size_bytes: 0,
                hits: 0,
                misses: 0,
            }),
            capacity_bytes,
            threshold,
        }
    }

    /// Returns the cached digest for `(offset, width)`, computing and
    /// inserting it via `compute` on a miss. Widths below the admission
    /// threshold bypass the cache entirely and are always recomputed.
    ///
    /// `compute` runs outside the cache lock so that a recursive subroot
    /// computation (which may itself consult this cache) cannot deadlock;
    /// a benign race between two concurrent misses for the same key is
    /// resolved by keeping whichever insert lands first, since both
    /// results are identical by I5.
    pub fn get_or_compute(
        &self,
        offset: u64,
        width: u64,
        compute: impl FnOnce() -> Digest,
    ) -> Digest {
        if width < self.threshold {
            return compute();
        }
        let key = (offset, width);
        {
            let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(digest) = inner.entries.get(&key) {
                inner.hits += 1;
                return digest.clone();
            }
            inner.misses += 1;
        }
        let digest = compute();
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.entries.peek(&key).is_none() {
            inner.size_bytes += digest.len() as u64;
            inner.entries.put(key, digest.clone());
            while inner.size_bytes > self.capacity_bytes {
                match inner.entries.pop_lru() {
                    Some((evicted_key, evicted)) => {
                        inner.size_bytes -= evicted.len() as u64;
                        tracing::trace!(?evicted_key, "evicted subroot from cache");
                    }
                    None => break,
                }
            }
        }
        digest
    }

    /// Snapshot of the cache's counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        CacheStats {
            size_bytes: inner.size_bytes,
            capacity_bytes: self.capacity_bytes,
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    /// Discards all cached entries and resets the hit/miss counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.clear();
        inner.size_bytes = 0;
        inner.hits = 0;
        inner.misses = 0;
    }
}

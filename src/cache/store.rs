//! Frame blob cache implementation
//!
//! Bounded key→handle map with FIFO eviction by insertion order. The single
//! entry marked as "current" (the frame on screen) is skipped by eviction.

use bytes::Bytes;
use indexmap::IndexMap;

use crate::stats::CacheStats;

use super::blob::FrameHandle;
use super::key::FrameKey;

/// Default number of frames kept in memory
pub const DEFAULT_CACHE_SIZE: usize = 50;

#[derive(Debug)]
struct CacheEntry {
    handle: FrameHandle,
    insertion_order: u64,
}

/// Bounded cache of frame handles
///
/// Entries are kept in insertion order. Once the cache grows past
/// `max_size`, the oldest entry that is not the current frame is evicted
/// and its handle released, until the size is back within bounds.
#[derive(Debug)]
pub struct FrameBlobCache {
    entries: IndexMap<FrameKey, CacheEntry>,
    max_size: usize,
    next_order: u64,
    current: Option<FrameKey>,
    stats: CacheStats,
}

impl FrameBlobCache {
    /// Create a cache with the default size
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_CACHE_SIZE)
    }

    /// Create a cache holding at most `max_size` entries (minimum 1)
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_size: max_size.max(1),
            next_order: 0,
            current: None,
            stats: CacheStats::new(),
        }
    }

    /// Maximum number of entries
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check for a key without touching hit/miss counters
    pub fn contains(&self, key: &FrameKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a handle
    pub fn get(&mut self, key: &FrameKey) -> Option<FrameHandle> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.hits += 1;
                Some(entry.handle.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Install `data` under `key` and return its handle
    ///
    /// A handle already stored under `key` is released first. The entry
    /// moves to the back of the insertion order.
    pub fn set(&mut self, key: FrameKey, data: Bytes) -> FrameHandle {
        if let Some(old) = self.entries.shift_remove(&key) {
            self.stats.replacements += 1;
            self.release(&old.handle);
        }

        let handle = FrameHandle::new(key.clone(), data);
        let insertion_order = self.next_order;
        self.next_order += 1;

        self.entries.insert(
            key,
            CacheEntry {
                handle: handle.clone(),
                insertion_order,
            },
        );
        self.stats.inserts += 1;

        self.evict();
        handle
    }

    /// Install `data` under `key` and mark it as the current frame
    pub fn set_current(&mut self, key: FrameKey, data: Bytes) -> FrameHandle {
        self.current = Some(key.clone());
        self.set(key, data)
    }

    /// Mark `key` as the current frame, protecting it from eviction
    ///
    /// Passing `None` removes the protection.
    pub fn pin_current(&mut self, key: Option<FrameKey>) {
        self.current = key;
    }

    /// Key of the protected current frame
    pub fn current(&self) -> Option<&FrameKey> {
        self.current.as_ref()
    }

    /// Remove and release a single entry
    ///
    /// Returns `false` if the key was absent.
    pub fn remove(&mut self, key: &FrameKey) -> bool {
        if self.current.as_ref() == Some(key) {
            self.current = None;
        }

        match self.entries.shift_remove(key) {
            Some(entry) => {
                self.release(&entry.handle);
                true
            }
            None => false,
        }
    }

    /// Remove and release every entry belonging to `take_id`
    pub fn remove_take(&mut self, take_id: &str) -> usize {
        if self
            .current
            .as_ref()
            .is_some_and(|key| key.take_id == take_id)
        {
            self.current = None;
        }

        let before = self.entries.len();
        let mut released = Vec::new();
        self.entries.retain(|key, entry| {
            if key.take_id == take_id {
                released.push(entry.handle.clone());
                false
            } else {
                true
            }
        });

        for handle in &released {
            self.release(handle);
        }

        before - self.entries.len()
    }

    /// Release every entry
    pub fn clear(&mut self) {
        let drained: Vec<CacheEntry> = self.entries.drain(..).map(|(_, entry)| entry).collect();
        for entry in &drained {
            self.release(&entry.handle);
        }
        self.current = None;

        if !drained.is_empty() {
            tracing::debug!(released = drained.len(), "Frame cache cleared");
        }
    }

    /// Insertion sequence number of an entry
    pub fn insertion_order(&self, key: &FrameKey) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.insertion_order)
    }

    /// Keys from oldest to newest
    pub fn keys(&self) -> impl Iterator<Item = &FrameKey> {
        self.entries.keys()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn evict(&mut self) {
        while self.entries.len() > self.max_size {
            let victim = self
                .entries
                .keys()
                .position(|key| self.current.as_ref() != Some(key));

            let Some(index) = victim else {
                break;
            };

            if let Some((key, entry)) = self.entries.shift_remove_index(index) {
                self.stats.evictions += 1;
                self.release(&entry.handle);
                tracing::trace!(frame = %key, order = entry.insertion_order, "Frame evicted");
            }
        }
    }

    fn release(&mut self, handle: &FrameHandle) {
        if handle.release() {
            self.stats.releases += 1;
        } else {
            self.stats.double_releases += 1;
            tracing::error!(
                frame = %handle.key(),
                handle_id = handle.id(),
                "Frame handle released twice"
            );
            debug_assert!(false, "frame handle {} released twice", handle.id());
        }
    }
}

impl Default for FrameBlobCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FrameBlobCache {
    fn drop(&mut self) {
        self.clear();
    }
}

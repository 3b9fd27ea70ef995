//! Bounded frame cache keyed by quantized time and content version.
//!
//! Entries are never purged when the timeline changes. A bump of the
//! content version makes every older key unreachable, and LRU pressure
//! evicts them over time.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::Serialize;

use crate::frame::Frame;

/// Round a timeline time to the nearest quantum index.
pub fn quantize(t: f64, quantum: f64) -> i64 {
    if quantum <= 0.0 || !t.is_finite() {
        return 0;
    }
    (t / quantum).round() as i64
}

/// The time a quantum index stands for.
pub fn tick_time(tick: i64, quantum: f64) -> f64 {
    tick as f64 * quantum
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FrameKey {
    pub tick: i64,
    pub content_version: u64,
}

impl FrameKey {
    pub fn new(tick: i64, content_version: u64) -> Self {
        Self {
            tick,
            content_version,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.lookups();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
pub struct FrameCache {
    entries: LruCache<FrameKey, Arc<Frame>>,
    stats: CacheStats,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Look up a frame, marking it most recently used.
    pub fn get(&mut self, key: &FrameKey) -> Option<Arc<Frame>> {
        match self.entries.get(key) {
            Some(frame) => {
                self.stats.hits += 1;
                tracing::trace!(tick = key.tick, version = key.content_version, "Frame cache hit");
                Some(Arc::clone(frame))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Presence check that touches neither recency nor stats.
    pub fn contains(&self, key: &FrameKey) -> bool {
        self.entries.contains(key)
    }

    pub fn put(&mut self, key: FrameKey, frame: Arc<Frame>) {
        self.stats.inserts += 1;
        if let Some((evicted, _)) = self.entries.push(key, frame) {
            if evicted != key {
                self.stats.evictions += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::Mutex;

use crate::filter::context::Context;
use crate::filter::result::FilterResult;
use crate::foundation::math::Fnv1a64;

/// Identity of one filter node evaluated under one context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub node_id: u64,
    pub context_hash: u64,
}

impl CacheKey {
    /// Key for `node_id` under `ctx`: mapping, desired output, color space and the full pending
    /// state of the source.
    pub fn new(node_id: u64, ctx: &Context) -> Self {
        let mut h = Fnv1a64::new_default();
        ctx.mapping().hash_into(&mut h);

        let desired = ctx.desired_output().get();
        for v in [desired.left, desired.top, desired.right, desired.bottom] {
            h.write_i32(v);
        }
        h.write_u8(ctx.color_space() as u8);
        h.write_u8(ctx.color_type() as u8);

        let source = ctx.source();
        match source.image() {
            Some(image) => {
                h.write_u8(1);
                h.write_u64(image.unique_id());
                for c in source.transform().get().as_coeffs() {
                    h.write_f64(c);
                }
                let b = source.layer_bounds().get();
                for v in [b.left, b.top, b.right, b.bottom] {
                    h.write_i32(v);
                }
                source.sampling().hash_into(&mut h);
                match source.color_filter() {
                    Some(filter) => {
                        h.write_u8(1);
                        filter.hash_into(&mut h);
                    }
                    None => h.write_u8(0),
                }
            }
            None => h.write_u8(0),
        }

        Self {
            node_id,
            context_hash: h.finish(),
        }
    }
}

/// Dedup store for node results.
pub trait FilterCache: Send + Sync + Debug {
    fn get(&self, key: &CacheKey) -> Option<FilterResult>;
    fn put(&self, key: CacheKey, result: FilterResult);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FilterCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, FilterResult>,
    lru: VecDeque<CacheKey>,
    stats: FilterCacheStats,
}

impl CacheState {
    fn touch(&mut self, key: CacheKey) {
        if let Some(pos) = self.lru.iter().position(|k| *k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

/// Bounded least-recently-used [`FilterCache`].
#[derive(Debug)]
pub struct InMemoryFilterCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl Default for InMemoryFilterCache {
    fn default() -> Self {
        Self::from_env()
    }
}

impl InMemoryFilterCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Capacity from `LAYERFX_FILTER_CACHE_CAPACITY`, 256 entries otherwise.
    pub fn from_env() -> Self {
        let capacity = std::env::var("LAYERFX_FILTER_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(256);
        Self::new(capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> FilterCacheStats {
        let state = self.lock();
        FilterCacheStats {
            entries: state.entries.len(),
            ..state.stats
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.lru.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // A panic mid-update leaves at worst a stale LRU order.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FilterCache for InMemoryFilterCache {
    fn get(&self, key: &CacheKey) -> Option<FilterResult> {
        let mut state = self.lock();
        match state.entries.get(key).cloned() {
            Some(hit) => {
                state.stats.hits += 1;
                state.touch(*key);
                tracing::trace!(node = key.node_id, "filter cache hit");
                Some(hit)
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    fn put(&self, key: CacheKey, result: FilterResult) {
        let mut state = self.lock();
        state.entries.insert(key, result);
        state.touch(key);
        while state.lru.len() > self.capacity {
            if let Some(old) = state.lru.pop_front() {
                state.entries.remove(&old);
                state.stats.evictions += 1;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filter/cache.rs"]
mod tests;

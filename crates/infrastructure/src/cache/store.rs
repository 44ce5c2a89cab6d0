use super::entry::CacheEntry;
use super::key::CacheKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ferrous_resolver_domain::{DnsResponse, QuerySettings};
use rustc_hash::FxBuildHasher;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Concurrent response cache. Writers serialize per key through the map
/// shard; there is no global lock on the hot path and no cross-key
/// atomicity.
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Returns the cached response for `key` if one exists and has not
    /// expired. An expired entry is removed on the spot and reported as a
    /// miss, so callers never see stale data.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DnsResponse>> {
        match self.entries.entry(key.clone()) {
            Entry::Vacant(_) => None,
            Entry::Occupied(occupied) => {
                if occupied.get().is_expired_at(Instant::now()) {
                    occupied.remove();
                    None
                } else {
                    Some(Arc::clone(&occupied.get().response))
                }
            }
        }
    }

    /// Inserts `response` under `key`, deriving the entry TTL from the
    /// smallest record TTL (or the configured negative duration), clamped to
    /// the configured bounds. Uncacheable responses (zero TTL, not negative)
    /// are dropped silently.
    pub fn put(
        &self,
        key: CacheKey,
        response: &DnsResponse,
        negative: bool,
        settings: &QuerySettings,
    ) {
        let raw_ttl = if negative {
            settings.failed_results_cache_duration
        } else {
            match response.min_ttl() {
                Some(ttl) if ttl > 0 => Duration::from_secs(u64::from(ttl)),
                _ => {
                    debug!(%key, "response has zero TTL, not caching");
                    return;
                }
            }
        };

        let ttl = clamp_ttl(
            raw_ttl,
            settings.minimum_cache_timeout,
            settings.maximum_cache_timeout,
        );

        debug!(%key, ttl_secs = ttl.as_secs(), negative, "caching response");
        self.entries.insert(
            key,
            CacheEntry {
                response: Arc::new(response.clone()),
                expires_at: Instant::now() + ttl,
                negative,
            },
        );
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time until the entry under `key` expires. Mostly useful for
    /// diagnostics and tests.
    pub fn remaining_ttl(&self, key: &CacheKey) -> Option<Duration> {
        self.entries
            .get(key)
            .map(|entry| entry.expires_at().saturating_duration_since(Instant::now()))
    }

    /// Whether the entry under `key` is a negative entry.
    pub fn is_negative(&self, key: &CacheKey) -> Option<bool> {
        self.entries.get(key).map(|entry| entry.is_negative())
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_ttl(ttl: Duration, minimum: Option<Duration>, maximum: Option<Duration>) -> Duration {
    let mut ttl = ttl;
    if let Some(min) = minimum {
        ttl = ttl.max(min);
    }
    if let Some(max) = maximum {
        ttl = ttl.min(max);
    }
    ttl
}

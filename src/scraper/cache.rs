//! In-memory signal cache with TTL support.
//!
//! Fronts the expensive render path. Expiry is lazy: entries are
//! checked against their TTL at read time and stale entries simply
//! read as misses until the next successful scrape overwrites them.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::types::Signal;

/// Cache entry with its own TTL.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Signal,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

/// Venue-keyed signal cache.
///
/// Constructed explicitly and owned by the orchestrator; separate
/// orchestrators get separate caches.
#[derive(Debug)]
pub struct SignalCache {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl SignalCache {
    /// Create a cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a cache with the standard 2 hour TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(Duration::hours(2))
    }

    /// Get the cached signal for a key if it has not expired.
    pub fn get(&self, key: &str) -> Option<Signal> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Signal> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;

        let age = now - entry.cached_at;
        if age >= entry.ttl {
            return None;
        }

        debug!("cache hit for {} (age {}s)", key, age.num_seconds());
        Some(entry.payload.clone())
    }

    /// Store a signal under the default TTL, overwriting any entry.
    pub fn set(&self, key: &str, payload: Signal) {
        self.set_with_ttl(key, payload, self.default_ttl);
    }

    /// Store a signal with an explicit TTL.
    pub fn set_with_ttl(&self, key: &str, payload: Signal, ttl: Duration) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                cached_at: Utc::now(),
                ttl,
            },
        );
    }
}

impl Default for SignalCache {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BusynessSignal;

    fn signal(venue_id: &str) -> Signal {
        Signal::Busyness(BusynessSignal::from_percent(venue_id, 73, Utc::now()))
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = SignalCache::with_default_ttl();
        cache.set("v1", signal("v1"));
        assert!(cache.get("v1").is_some());
    }

    #[test]
    fn test_miss_for_unknown_key() {
        let cache = SignalCache::with_default_ttl();
        assert!(cache.get("v1").is_none());
    }

    #[test]
    fn test_expired_entry_reads_as_miss() {
        let cache = SignalCache::with_default_ttl();
        cache.set("v1", signal("v1"));
        let later = Utc::now() + Duration::hours(3);
        assert!(cache.get_at("v1", later).is_none());
    }

    #[test]
    fn test_per_entry_ttl_override() {
        let cache = SignalCache::with_default_ttl();
        cache.set_with_ttl("v1", signal("v1"), Duration::hours(24));
        let later = Utc::now() + Duration::hours(3);
        assert!(cache.get_at("v1", later).is_some());
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let cache = SignalCache::with_default_ttl();
        cache.set("v1", signal("v1"));
        cache.set(
            "v1",
            Signal::Busyness(BusynessSignal::from_percent("v1", 20, Utc::now())),
        );
        match cache.get("v1") {
            Some(Signal::Busyness(sig)) => assert_eq!(sig.raw_percent, Some(20)),
            other => panic!("unexpected cache content: {:?}", other),
        }
    }
}

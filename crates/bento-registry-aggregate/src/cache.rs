// crates/bento-registry-aggregate/src/cache.rs
// ============================================================================
// Module: TTL Cache
// Description: Mutex-guarded TTL cache for aggregation rounds.
// Purpose: Serve fresh aggregates without re-contacting downstream services.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A small TTL cache over a mutex-guarded map. Eviction is cooperative:
//! staleness is checked on read and expired entries are removed by an
//! opportunistic sweep after writes; there is no background timer. A TTL of
//! zero disables caching entirely (every read misses), which the tests rely
//! on to force fan-outs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

// ============================================================================
// SECTION: Cache Entry
// ============================================================================

/// One cached value together with its fetch timestamp.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    /// When the value was stored.
    fetched_at: Instant,
    /// The cached value.
    value: V,
}

// ============================================================================
// SECTION: TTL Cache
// ============================================================================

/// Mutex-guarded TTL cache keyed by a composite cache key.
///
/// # Invariants
/// - Keys covering caller-dependent values include the credential digest.
/// - Expired entries are never returned; they linger only until the next
///   sweep or overwrite.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    /// Time-to-live applied to every entry.
    ttl: Duration,
    /// Guarded entry map.
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a clone of the fresh value for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.lock();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Stores a value for `key`, stamping it with the current time.
    pub fn insert(&self, key: K, value: V) {
        self.lock().insert(
            key,
            CacheEntry {
                fetched_at: Instant::now(),
                value,
            },
        );
    }

    /// Removes one entry.
    pub fn remove(&self, key: &K) {
        self.lock().remove(key);
    }

    /// Removes every entry (topology-drift invalidation).
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Removes every expired entry (opportunistic post-write sweep).
    pub fn sweep_expired(&self) {
        let ttl = self.ttl;
        self.lock().retain(|_, entry| entry.fetched_at.elapsed() < ttl);
    }

    /// Returns the number of entries, fresh or expired.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Locks the entry map, recovering from a poisoned mutex.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use std::time::Duration;

    use super::TtlCache;

    #[test]
    fn fresh_entries_are_returned_and_cleared_entries_are_not() {
        let cache: TtlCache<String, u64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        cache.clear();
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache: TtlCache<String, u64> = TtlCache::new(Duration::ZERO);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 1);
        cache.sweep_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_drops_only_the_named_key() {
        let cache: TtlCache<&'static str, u64> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.remove(&"a");
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
    }
}

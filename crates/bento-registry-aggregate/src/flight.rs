// crates/bento-registry-aggregate/src/flight.rs
// ============================================================================
// Module: Single-Flight Coalescing
// Description: Coalesce concurrent identical fan-outs into one operation.
// Purpose: Guard against thundering-herd on concurrent cache misses.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! When several callers miss the same cache key at once, only one fan-out
//! may run; the rest must await the same in-flight operation and receive the
//! same result. Each key holds a shared [`tokio::sync::OnceCell`] slot: the
//! first caller initializes it by running the fetch, later callers await the
//! initialization. Slots are removed after completion so the next miss
//! starts a fresh round.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tokio::sync::OnceCell;

// ============================================================================
// SECTION: Flight Group
// ============================================================================

/// Coalesces concurrent operations that share a key.
///
/// # Invariants
/// - At most one fetch runs per key at any time.
/// - Every concurrent caller for a key observes the same result.
#[derive(Debug)]
pub struct FlightGroup<K, V> {
    /// In-flight slots keyed by operation identity.
    slots: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K: Eq + Hash + Clone, V: Clone> FlightGroup<K, V> {
    /// Creates an empty flight group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `fetch` for `key`, or awaits an identical in-flight run.
    pub async fn run<F, Fut>(&self, key: K, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut slots = self.lock();
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let value = cell.get_or_init(fetch).await.clone();
        let mut slots = self.lock();
        if let Some(current) = slots.get(&key)
            && Arc::ptr_eq(current, &cell)
        {
            slots.remove(&key);
        }
        value
    }

    /// Locks the slot map, recovering from a poisoned mutex.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<OnceCell<V>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for FlightGroup<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

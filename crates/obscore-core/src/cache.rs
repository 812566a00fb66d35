// crates/obscore-core/src/cache.rs
// ============================================================================
// Module: TTL Cache
// Description: Read-through in-process cache with absolute per-entry deadlines.
// Purpose: Memoize outbound read queries against the persistence gateway.
// Dependencies: std::sync
// ============================================================================

//! ## Overview
//! The cache is strictly read-through: it never influences correctness,
//! only avoids repeating an identical outbound read within its entry's
//! lifetime. Writes are single-writer-per-key: the last write under a given
//! key wins on a race, and no reader observes a partially-written entry. A
//! single lock covers every operation; there is no nested locking.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

/// Default entry lifetime: 60 seconds, per the read-through query cache
/// contract.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

struct Entry<V> {
    value: V,
    deadline: Instant,
}

/// A read-through cache keyed by `K`, storing values of type `V`, with a
/// fixed TTL applied to every entry at insertion time.
///
/// # Invariants
/// - A single [`Mutex`] covers both lookup and insertion; no nested locks.
/// - Expired entries are purged lazily, on the access that observes them.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: std::hash::Hash + Eq,
    V: Clone,
{
    /// Creates a new cache with the given entry lifetime.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Looks up `key`, returning `None` if absent or expired. An expired
    /// entry is removed as a side effect of the lookup.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.deadline > now => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Inserts `value` under `key` with a fresh deadline `now + ttl`,
    /// overwriting any existing entry. Last write wins on a race.
    pub fn put(&self, key: K, value: V) {
        let deadline = Instant::now() + self.ttl;
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key, Entry { value, deadline });
    }

    /// Read-through: returns the cached value if present and unexpired,
    /// otherwise computes `load`, caches it, and returns it.
    ///
    /// # Errors
    /// Propagates `load`'s error without caching anything.
    pub fn get_or_load<E>(&self, key: K, load: impl FnOnce() -> Result<V, E>) -> Result<V, E>
    where
        K: Clone,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = load()?;
        self.put(key, value.clone());
        Ok(value)
    }

    /// Returns the number of live (not-yet-expired) entries. Intended for
    /// tests and diagnostics; not on any hot path.
    #[must_use]
    pub fn len_unexpired(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.values().filter(|entry| entry.deadline > now).count()
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use super::TtlCache;

    #[test]
    fn returns_none_for_missing_key() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(&"missing"), None);
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.put("key", 42);
        assert_eq!(cache.get(&"key"), Some(42));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(10));
        cache.put("key", 42);
        sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"key"), None);
    }

    #[test]
    fn get_or_load_caches_the_result() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let mut calls = 0;
        let first: Result<u32, ()> = cache.get_or_load("key", || {
            calls += 1;
            Ok(7)
        });
        assert_eq!(first, Ok(7));
        let second: Result<u32, ()> = cache.get_or_load("key", || {
            calls += 1;
            Ok(99)
        });
        assert_eq!(second, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn last_write_wins_on_overwrite() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.put("key", 1);
        cache.put("key", 2);
        assert_eq!(cache.get(&"key"), Some(2));
    }
}

//! In-memory response cache with time-based expiry.
//!
//! The store maps a request target (path plus query string, verbatim) to the
//! last successfully fetched response body and the instant it was stored.
//! Entries are replaced wholesale on every write and are never deleted: a
//! stale entry is simply ignored by the freshness check and overwritten by
//! the next successful fetch. There is no size bound and no sweeper.
//!
//! Time is injected through the [`Clock`] trait so that expiry is
//! deterministic under test.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use bytes::Bytes;

/// A source of "now". Production code uses [`SystemClock`]; tests substitute
/// a manually advanced clock.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// The monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A cached response snapshot: the full body captured at fetch time, plus
/// the instant it was written. The timestamp is never mutated; a refetch
/// replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    body: Bytes,
    stored_at: Instant,
}

impl CacheEntry {
    /// Returns the cached response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the instant this entry was written.
    pub fn stored_at(&self) -> Instant {
        self.stored_at
    }
}

/// Process-wide response cache shared by every in-flight request.
///
/// Lookups and writes take a short read/write lock respectively; the lock is
/// never held across an await point. There is intentionally no per-key
/// mutual exclusion: two concurrent misses for the same key may both fetch
/// and both write, and the last write wins. Callers must not assume
/// at-most-one-fetch-per-key.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use rproxy::cache::CacheStore;
///
/// let store = CacheStore::new(Duration::from_secs(86400));
/// let now = Instant::now();
///
/// assert!(store.lookup("/a?x=1").is_none());
/// store.write("/a?x=1", "hello".into(), now);
///
/// let entry = store.lookup("/a?x=1").unwrap();
/// assert!(store.is_fresh(Some(&entry), now));
/// assert_eq!(entry.body().as_ref(), b"hello");
/// ```
#[derive(Debug)]
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl CacheStore {
    /// Creates an empty store whose entries expire `ttl` after being written.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the current entry for `key`, or `None` if never written.
    ///
    /// Read-only; stale entries are returned as-is — freshness is the
    /// caller's question, answered by [`is_fresh`](Self::is_fresh).
    pub fn lookup(&self, key: &str) -> Option<CacheEntry> {
        self.read_lock().get(key).cloned()
    }

    /// Returns `true` iff `entry` is present and its age is strictly less
    /// than the TTL. Total: an absent entry is simply not fresh, and a `now`
    /// earlier than the write instant saturates to age zero.
    pub fn is_fresh(&self, entry: Option<&CacheEntry>, now: Instant) -> bool {
        match entry {
            Some(entry) => now.saturating_duration_since(entry.stored_at) < self.ttl,
            None => false,
        }
    }

    /// Unconditionally replaces (or creates) the entry for `key` with the
    /// given body, timestamped `now`. Last writer wins; no merge semantics.
    pub fn write(&self, key: impl Into<String>, body: Bytes, now: Instant) {
        self.write_lock()
            .insert(key.into(), CacheEntry { body, stored_at: now });
    }

    /// Number of keys currently held (fresh or stale).
    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    /// Returns `true` if nothing has ever been written.
    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    // Entries are replaced wholesale, so the map stays valid even if a
    // panicking writer poisoned the lock; recover instead of propagating.
    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(86400);

    #[test]
    fn lookup_absent_returns_none() {
        let store = CacheStore::new(TTL);
        assert!(store.lookup("/missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn absent_entry_is_never_fresh() {
        let store = CacheStore::new(TTL);
        assert!(!store.is_fresh(None, Instant::now()));
    }

    #[test]
    fn fresh_immediately_after_write() {
        let store = CacheStore::new(TTL);
        let t0 = Instant::now();
        store.write("/a", "body".into(), t0);
        let entry = store.lookup("/a").unwrap();
        assert!(store.is_fresh(Some(&entry), t0));
    }

    #[test]
    fn stale_at_exactly_ttl() {
        // Freshness is strict: age == TTL is already stale.
        let store = CacheStore::new(TTL);
        let t0 = Instant::now();
        store.write("/a", "body".into(), t0);
        let entry = store.lookup("/a").unwrap();
        assert!(store.is_fresh(Some(&entry), t0 + TTL - Duration::from_secs(1)));
        assert!(!store.is_fresh(Some(&entry), t0 + TTL));
        assert!(!store.is_fresh(Some(&entry), t0 + TTL + Duration::from_secs(1)));
    }

    #[test]
    fn clock_before_write_saturates() {
        let store = CacheStore::new(TTL);
        let t0 = Instant::now() + Duration::from_secs(60);
        store.write("/a", "body".into(), t0);
        let entry = store.lookup("/a").unwrap();
        // `now` earlier than the write instant must not panic or report stale.
        assert!(store.is_fresh(Some(&entry), t0 - Duration::from_secs(30)));
    }

    #[test]
    fn write_replaces_wholesale() {
        let store = CacheStore::new(TTL);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(10);
        store.write("/a", "first".into(), t0);
        store.write("/a", "second".into(), t1);

        let entry = store.lookup("/a").unwrap();
        assert_eq!(entry.body().as_ref(), b"second");
        assert_eq!(entry.stored_at(), t1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn keys_are_independent() {
        let store = CacheStore::new(TTL);
        let t0 = Instant::now();
        store.write("/a?x=1", "one".into(), t0);
        store.write("/a?x=2", "two".into(), t0);

        assert_eq!(store.lookup("/a?x=1").unwrap().body().as_ref(), b"one");
        assert_eq!(store.lookup("/a?x=2").unwrap().body().as_ref(), b"two");
        assert!(store.lookup("/a").is_none());
    }

    #[test]
    fn concurrent_writers_leave_one_entry() {
        use std::sync::Arc;

        let store = Arc::new(CacheStore::new(TTL));
        let t0 = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store.write("/contended", format!("writer-{i}").into(), t0);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1);
        let body = store.lookup("/contended").unwrap();
        assert!(body.body().as_ref().starts_with(b"writer-"));
    }
}

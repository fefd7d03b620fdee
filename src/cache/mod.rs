//! Process-local TTL cache for expensive provider reads.
//!
//! The Monday and Redmine APIs are rate-limited and slow relative to a
//! dashboard refresh, so their normalized results are cached for a few
//! minutes. One slot per call class ("monday.projects", "redmine.threads"),
//! shared by the whole process: this is a single-tenant deployment by
//! design.
//!
//! Concurrent requests racing an expired slot may both fetch; the reads are
//! idempotent and the cost bounded, so the miss path is deliberately not
//! serialized behind a per-key lock. The cache is in-memory only and lost on
//! restart.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default freshness window for cached provider results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache key for the Monday projects call class.
pub const KEY_PROJECTS: &str = "monday.projects";

/// Cache key for the Redmine issue-thread call class.
pub const KEY_THREADS: &str = "redmine.threads";

struct Slot<T> {
    value: T,
    fetched_at: Instant,
}

/// A cache hit: the stored value plus how long ago it was fetched.
#[derive(Clone, Debug)]
pub struct CacheHit<T> {
    /// The cached value.
    pub value: T,
    /// Age of the value in whole seconds.
    pub age_seconds: u64,
}

/// Keyed TTL cache. Values are cloned out on every hit.
pub struct ResultCache<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
    ttl: Duration,
}

impl<T: Clone> ResultCache<T> {
    /// Create a cache with the default 5-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom TTL (used by tests).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a key. Expired entries are treated as absent and dropped.
    pub fn get(&self, key: &str) -> Option<CacheHit<T>> {
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.get(key)?;

        let age = slot.fetched_at.elapsed();
        if age >= self.ttl {
            slots.remove(key);
            return None;
        }

        Some(CacheHit {
            value: slot.value.clone(),
            age_seconds: age.as_secs(),
        })
    }

    /// Store a freshly fetched value, replacing any previous entry.
    pub fn set(&self, key: &str, value: T) {
        let mut slots = self.slots.lock().unwrap();
        slots.insert(
            key.to_string(),
            Slot {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop a key so the next `get` misses regardless of age.
    pub fn invalidate(&self, key: &str) {
        self.slots.lock().unwrap().remove(key);
    }
}

impl<T: Clone> Default for ResultCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Mutex;

use crate::models::{Mode, RecommendationRequest, ResultItem};

/// Recommendation cache TTL: 30 minutes
pub const RECOMMENDATION_TTL_SECS: i64 = 30 * 60;

/// Injectable time source so tests can control entry expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cache key derived from the mode and the canonicalized request input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendation { mode: Mode, input_digest: String },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendation { mode, input_digest } => {
                write!(f, "rec:{}:{}", mode, input_digest)
            }
        }
    }
}

impl CacheKey {
    /// Derives the key for a request from its canonical JSON
    pub fn recommendation(request: &RecommendationRequest) -> Self {
        let canonical = request.canonical_json();
        let digest = Sha256::digest(canonical.as_bytes());
        CacheKey::Recommendation {
            mode: request.mode(),
            input_digest: format!("{:x}", digest),
        }
    }
}

struct CacheEntry {
    items: Vec<ResultItem>,
    created_at: DateTime<Utc>,
}

/// In-process TTL-bounded store for assembled result lists.
///
/// Entries are replaced wholesale, never mutated; a `put` racing another
/// `put` for the same key resolves last-writer-wins. Expired entries are
/// treated as absent and lazily evicted on lookup or during a sweep.
pub struct RecommendationCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: std::sync::Arc<dyn Clock>,
}

impl RecommendationCache {
    pub fn new(ttl: Duration, clock: std::sync::Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn with_default_ttl(clock: std::sync::Arc<dyn Clock>) -> Self {
        Self::new(Duration::seconds(RECOMMENDATION_TTL_SECS), clock)
    }

    /// Returns the cached items, or `None` for both a miss and an expired
    /// hit (which is evicted on the way out)
    pub fn get(&self, key: &CacheKey) -> Option<Vec<ResultItem>> {
        let now = self.clock.now();
        let key = key.to_string();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        match entries.get(&key) {
            Some(entry) if now - entry.created_at < self.ttl => Some(entry.items.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &CacheKey, items: Vec<ResultItem>) {
        let entry = CacheEntry {
            items,
            created_at: self.clock.now(),
        };
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(key.to_string(), entry);
    }

    /// Removes every expired entry, returning the eviction count
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let before = entries.len();
        entries.retain(|_, entry| now - entry.created_at < self.ttl);
        before - entries.len()
    }
}

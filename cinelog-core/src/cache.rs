//! In-memory TTL cache for resolved metadata.

use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::meta::Meta;

#[derive(Debug, Clone)]
struct CacheEntry {
    meta: Meta,
    expires_at: Instant,
}

/// Concurrent cache keyed by the [`MediaRef`](crate::MediaRef) display form.
///
/// Expired entries are dropped when they are read, and swept from the whole
/// map by the first insert after each TTL period.
#[derive(Debug)]
pub struct MetaCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    next_sweep: Mutex<Instant>,
}

impl MetaCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            next_sweep: Mutex::new(Instant::now() + ttl),
        }
    }

    pub fn get(&self, key: &str) -> Option<Meta> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.expires_at > now {
                return Some(entry.meta.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    pub fn insert(&self, key: impl Into<String>, meta: Meta) {
        let now = Instant::now();
        self.sweep_expired(now);

        let entry = CacheEntry {
            meta,
            expires_at: now + self.ttl,
        };
        self.entries.insert(key.into(), entry);
    }

    fn sweep_expired(&self, now: Instant) {
        {
            let mut next_sweep = self.next_sweep.lock();
            if now < *next_sweep {
                return;
            }
            *next_sweep = now + self.ttl;
        }

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let swept = before.saturating_sub(self.entries.len());
        if swept > 0 {
            debug!(swept, "Dropped expired meta cache entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

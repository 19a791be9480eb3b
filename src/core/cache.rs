use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Logical query families, each with its own staleness bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryClass {
    NextLaunch,
    UpcomingLaunches,
    RecentLaunches,
    Fleet,
    HomeStats,
}

/// Revalidation horizon per query class, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheHorizons {
    pub next_launch_seconds: u64,
    pub upcoming_seconds: u64,
    pub recent_seconds: u64,
    pub fleet_seconds: u64,
    pub stats_seconds: u64,
}

impl Default for CacheHorizons {
    fn default() -> Self {
        Self {
            next_launch_seconds: 60,
            upcoming_seconds: 60,
            recent_seconds: 3600,
            fleet_seconds: 86400,
            stats_seconds: 3600,
        }
    }
}

impl CacheHorizons {
    /// Disables caching entirely. Handy for tests that count upstream hits.
    pub fn none() -> Self {
        Self {
            next_launch_seconds: 0,
            upcoming_seconds: 0,
            recent_seconds: 0,
            fleet_seconds: 0,
            stats_seconds: 0,
        }
    }

    pub fn horizon(&self, class: QueryClass) -> Duration {
        let seconds = match class {
            QueryClass::NextLaunch => self.next_launch_seconds,
            QueryClass::UpcomingLaunches => self.upcoming_seconds,
            QueryClass::RecentLaunches => self.recent_seconds,
            QueryClass::Fleet => self.fleet_seconds,
            QueryClass::HomeStats => self.stats_seconds,
        };
        Duration::from_secs(seconds)
    }

    /// `Cache-Control` value advertising the horizon to downstream caches.
    pub fn cache_control(&self, class: QueryClass) -> String {
        let seconds = self.horizon(class).as_secs();
        if seconds == 0 {
            "no-store".to_string()
        } else {
            format!("public, max-age={}", seconds)
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: serde_json::Value,
    expires_at: Instant,
}

/// In-memory TTL cache of raw upstream bodies keyed by request URL.
///
/// Only successful bodies go in. Anything derived from wall-clock time
/// (freshness filtering, next-launch selection) is computed after the
/// lookup, never stored.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, body: serde_json::Value, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            tracing::warn!("Cache horizon {:?} out of range, skipping insert for {}", ttl, key);
            return;
        };
        let Ok(mut entries) = self.entries.lock() else {
            tracing::warn!("Response cache lock poisoned, skipping insert for {}", key);
            return;
        };
        entries.insert(
            key,
            CacheEntry {
                body,
                expires_at,
            },
        );
    }

    /// Drops expired entries; returns how many remain.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

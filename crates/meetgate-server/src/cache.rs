//! Running-state cache with TTL (Time-To-Live) support.
//!
//! Many viewers of the same meeting would otherwise ask the provider whether
//! it runs on every refresh. The cache keeps the last answer per meeting for
//! a short time; a state-change notification invalidates it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use meetgate_core::MeetingKey;

/// The last known running state of a meeting.
#[derive(Debug, Clone)]
pub struct RunningEntry {
    pub running: bool,
    /// When the provider was asked.
    pub checked_at: DateTime<Utc>,
    expires_at: Instant,
}

impl RunningEntry {
    pub fn new(running: bool, ttl: Duration) -> Self {
        Self {
            running,
            checked_at: Utc::now(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Running states keyed by meeting.
#[derive(Debug)]
pub struct RunningCache {
    ttl: Duration,
    entries: HashMap<MeetingKey, RunningEntry>,
}

impl Default for RunningCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl RunningCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached state, only if not expired.
    pub fn get_valid(&self, key: MeetingKey) -> Option<bool> {
        self.entries
            .get(&key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.running)
    }

    pub fn get(&self, key: MeetingKey) -> Option<&RunningEntry> {
        self.entries.get(&key)
    }

    pub fn insert(&mut self, key: MeetingKey, running: bool) {
        self.entries.insert(key, RunningEntry::new(running, self.ttl));
        trace!(meeting = %key, running, "Cached running state");
    }

    /// Forgets the state of a meeting so the next lookup asks the provider.
    pub fn invalidate(&mut self, key: MeetingKey) -> bool {
        let removed = self.entries.remove(&key).is_some();
        if removed {
            debug!(meeting = %key, "Invalidated running state");
        }
        removed
    }

    /// Removes all expired entries.
    pub fn evict_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Evicted expired running states");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Running cache shared by the sessions of one process.
pub type SharedRunningCache = Arc<RwLock<RunningCache>>;

pub fn new_running_cache(ttl: Duration) -> SharedRunningCache {
    Arc::new(RwLock::new(RunningCache::new(ttl)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn entry_expiration() {
        let entry = RunningEntry::new(true, Duration::from_millis(50));
        assert!(!entry.is_expired());
        assert!(entry.time_until_expiry() <= Duration::from_millis(50));
        thread::sleep(Duration::from_millis(60));
        assert!(entry.is_expired());
    }

    #[test]
    fn insert_and_get() {
        let mut cache = RunningCache::new(Duration::from_secs(60));
        cache.insert(MeetingKey(1), true);
        cache.insert(MeetingKey(2), false);

        assert_eq!(cache.get_valid(MeetingKey(1)), Some(true));
        assert_eq!(cache.get_valid(MeetingKey(2)), Some(false));
        assert_eq!(cache.get_valid(MeetingKey(3)), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn expired_entries_are_not_valid() {
        let mut cache = RunningCache::new(Duration::from_millis(50));
        cache.insert(MeetingKey(1), true);
        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.get_valid(MeetingKey(1)), None);
        assert!(cache.get(MeetingKey(1)).is_some());
        assert_eq!(cache.evict_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate() {
        let mut cache = RunningCache::default();
        cache.insert(MeetingKey(1), false);

        assert!(cache.invalidate(MeetingKey(1)));
        assert!(!cache.invalidate(MeetingKey(1)));
        assert_eq!(cache.get_valid(MeetingKey(1)), None);
    }

    #[test]
    fn insert_overwrites() {
        let mut cache = RunningCache::default();
        cache.insert(MeetingKey(1), false);
        cache.insert(MeetingKey(1), true);
        assert_eq!(cache.get_valid(MeetingKey(1)), Some(true));
        assert_eq!(cache.len(), 1);
    }
}

//! Update de-duplication cache

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default TTL (5 minutes)
const DEDUP_TTL_SECS: u64 = 300;

/// Maximum cache entries
const DEDUP_MAX_ENTRIES: usize = 2000;

/// Remembers recently seen update ids
///
/// TTL-based eviction with a hard cap on entries; the oldest entry is dropped
/// when the cache is still full after eviction.
#[derive(Debug)]
pub struct UpdateDedup {
    seen: HashMap<i64, Instant>,
    ttl: Duration,
    max_entries: usize,
}

impl Default for UpdateDedup {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEDUP_TTL_SECS), DEDUP_MAX_ENTRIES)
    }
}

impl UpdateDedup {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            seen: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Record `update_id`, returning `true` if it was already seen within the TTL
    pub fn is_duplicate(&mut self, update_id: i64) -> bool {
        let now = Instant::now();

        if let Some(ts) = self.seen.get(&update_id)
            && now.duration_since(*ts) < self.ttl
        {
            return true;
        }

        if self.seen.len() >= self.max_entries {
            self.seen.retain(|_, ts| now.duration_since(*ts) < self.ttl);
        }
        if self.seen.len() >= self.max_entries
            && let Some(oldest) = self.seen.iter().min_by_key(|(_, ts)| **ts).map(|(id, _)| *id)
        {
            self.seen.remove(&oldest);
        }

        self.seen.insert(update_id, now);
        false
    }

    /// Number of remembered ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

//! In-memory TTL cache for raw issue documents.
//!
//! Keys are already-normalized issue keys (trimmed, upper-cased). Staleness
//! is checked lazily at read time; there is no eviction, so memory grows
//! with the number of distinct keys over the process lifetime. That bound is
//! accepted for the intended scale. Concurrent misses for the same key may
//! both fetch and both write; last write wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

struct CacheEntry {
  fetched_at: Instant,
  document: Arc<Value>,
}

pub struct IssueCache {
  enabled: bool,
  ttl: Duration,
  entries: Mutex<HashMap<String, CacheEntry>>,
}

impl IssueCache {
  pub fn new(enabled: bool, ttl: Duration) -> Self {
    Self {
      enabled,
      ttl,
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// Return the cached document for `key` if it is younger than the TTL.
  /// Always a miss when caching is disabled.
  pub fn get(&self, key: &str) -> Option<Arc<Value>> {
    if !self.enabled {
      return None;
    }

    let entries = self.entries.lock().ok()?;
    let entry = entries.get(key)?;
    if entry.fetched_at.elapsed() < self.ttl {
      Some(Arc::clone(&entry.document))
    } else {
      None
    }
  }

  /// Store a freshly fetched document. No-op when caching is disabled.
  pub fn put(&self, key: &str, document: Arc<Value>) {
    if !self.enabled {
      return;
    }

    if let Ok(mut entries) = self.entries.lock() {
      entries.insert(
        key.to_string(),
        CacheEntry {
          fetched_at: Instant::now(),
          document,
        },
      );
    }
  }
}

//! Persisted cache record.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};

/// One cached value with its lifetime, stored as JSON in its own file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque cached payload.
    pub value: String,
    /// Unix seconds at write time.
    pub created_at: i64,
    /// Unix seconds after which the entry is treated as absent.
    pub expires_at: i64,
}

impl CacheEntry {
    /// Builds an entry living `ttl_seconds` from `now`. A zero TTL is raised
    /// to one second so `expires_at > created_at` always holds.
    pub fn new(value: impl Into<String>, now: i64, ttl_seconds: u64) -> Self {
        let ttl = i64::try_from(ttl_seconds.max(1)).unwrap_or(i64::MAX);
        Self {
            value: value.into(),
            created_at: now,
            expires_at: now.saturating_add(ttl),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_is_exclusive_of_expires_at() {
        let entry = CacheEntry::new("v", 100, 10);
        assert_eq!(entry.expires_at, 110);
        assert!(!entry.is_expired(110));
        assert!(entry.is_expired(111));
    }

    #[test]
    fn test_zero_ttl_still_expires_after_creation() {
        let entry = CacheEntry::new("v", 100, 0);
        assert!(entry.expires_at > entry.created_at);
    }

    #[test]
    fn test_record_layout() {
        let entry = CacheEntry::new("payload", 1_700_000_000, 60);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["value"], "payload");
        assert_eq!(json["created_at"], 1_700_000_000i64);
        assert_eq!(json["expires_at"], 1_700_000_060i64);
    }
}

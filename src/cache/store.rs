// Expiring key/value store - one JSON file per key
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::CacheEntry;
use crate::error::Result;
use crate::utils::clock::{Clock, SystemClock};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Key to value store whose entries expire after a per-entry TTL.
pub trait ExpiringStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous entry.
    fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;

    /// Read the value under `key`. Missing, unreadable and expired entries
    /// are all `None`; expired entries are removed on the way out.
    fn get(&self, key: &str) -> Option<String>;

    fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove the entry under `key`. Removing a missing key is a no-op.
    fn delete(&self, key: &str);
}

/// File-backed [`ExpiringStore`].
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a reader never observes a half-written entry and a
/// failed write leaves every other key intact. There is no locking: two
/// writers racing on one key both write complete entries and the last rename
/// wins.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Opened response cache at {}", dir.display());
        Ok(Self { dir, clock })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{:x}.cache", digest))
    }

    fn read_entry(path: &Path) -> Option<CacheEntry> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl ExpiringStore for FileStore {
    fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let entry = CacheEntry::new(value, self.clock.now(), ttl_seconds);
        let payload = serde_json::to_vec(&entry)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&payload)?;
        tmp.persist(self.entry_path(key)).map_err(|e| e.error)?;

        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        let entry = Self::read_entry(&path)?;

        if entry.is_expired(self.clock.now()) {
            debug!("Cache entry expired at {}", entry.expires_at);
            self.delete(key);
            return None;
        }

        Some(entry.value)
    }

    fn delete(&self, key: &str) {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete cache entry: {}", e),
        }
    }
}

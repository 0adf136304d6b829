// Fixed-window quota counter - one locked JSON file per (scope, identifier)
// Author: kelexine (https://github.com/kelexine)

use crate::config::RateLimitConfig;
use crate::error::{GatewayError, Result};
use crate::quota::models::{QuotaPolicy, QuotaWindow};
use crate::utils::clock::{Clock, SystemClock};
use backoff::ExponentialBackoff;
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Which advisory lock to take on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockKind {
    Shared,
    Exclusive,
}

/// Per-identifier request counter over fixed windows.
pub trait QuotaCounter: Send + Sync {
    /// Advisory check: would one more request fit in the current window?
    /// Never mutates the stored window.
    fn is_allowed(&self, identifier: &str) -> bool;

    /// Count one request, rolling the window over first if it has expired.
    /// Returns the requests left in the window, floored at zero. Atomic with
    /// respect to every other `consume` on the same identifier.
    fn consume(&self, identifier: &str) -> Result<u32>;
}

/// File-backed [`QuotaCounter`].
///
/// `consume` holds an exclusive advisory lock (`flock` on unix) on the
/// identifier's record for the whole read, rollover, increment and write, so
/// concurrent callers in any thread or process are serialized. `is_allowed`
/// reads under a shared lock, so it never sees a record mid-write. It may
/// still observe a window that is about to roll over; `consume` stays
/// authoritative.
#[derive(Debug)]
pub struct FileQuotaCounter {
    dir: PathBuf,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl FileQuotaCounter {
    pub fn new(dir: impl Into<PathBuf>, policy: QuotaPolicy) -> Result<Self> {
        Self::with_clock(dir, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        dir: impl Into<PathBuf>,
        policy: QuotaPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(
            "Opened quota store at {} (scope={}, limit={}/{}s)",
            dir.display(),
            policy.scope_id,
            policy.max_requests,
            policy.window_seconds
        );
        Ok(Self { dir, policy, clock })
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        Self::new(&config.path, QuotaPolicy::from(config))
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Record file for `identifier` within this counter's scope. The NUL
    /// separator keeps ("a_b", "c") and ("a", "b_c") apart.
    fn record_path(&self, identifier: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(self.policy.scope_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(identifier.as_bytes());
        self.dir.join(format!("{:x}.rl", hasher.finalize()))
    }

    /// Empty or unparseable records count as a fresh window.
    fn parse_window(raw: &[u8], now: i64) -> QuotaWindow {
        if raw.is_empty() {
            return QuotaWindow::fresh(now);
        }

        serde_json::from_slice(raw).unwrap_or_else(|e| {
            debug!("Resetting unreadable quota record: {}", e);
            QuotaWindow::fresh(now)
        })
    }

    /// Read the stored window under a shared lock. A missing record is a
    /// fresh window and is not created.
    fn read_window(&self, path: &Path, now: i64) -> Result<QuotaWindow> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(QuotaWindow::fresh(now)),
            Err(e) => return Err(e.into()),
        };

        self.lock(&file, path, LockKind::Shared)?;

        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;
        Ok(Self::parse_window(&raw, now))
    }

    /// Take a lock on `file`, polling with exponential backoff for at most
    /// `policy.lock_timeout`.
    fn lock(&self, file: &File, path: &Path, kind: LockKind) -> Result<()> {
        let schedule = ExponentialBackoff {
            current_interval: Duration::from_millis(2),
            initial_interval: Duration::from_millis(2),
            randomization_factor: 0.5,
            multiplier: 2.0,
            max_interval: Duration::from_millis(100),
            max_elapsed_time: Some(self.policy.lock_timeout),
            ..Default::default()
        };

        let contended = fs2::lock_contended_error().raw_os_error();

        // Called through the trait: std's inherent `File::try_lock_shared` differs
        let try_lock = || match kind {
            LockKind::Shared => FileExt::try_lock_shared(file),
            LockKind::Exclusive => FileExt::try_lock_exclusive(file),
        };

        backoff::retry(schedule, || match try_lock() {
            Ok(()) => Ok(()),
            Err(e)
                if e.kind() == ErrorKind::WouldBlock
                    || (contended.is_some() && e.raw_os_error() == contended) =>
            {
                Err(backoff::Error::transient(e))
            }
            Err(e) => Err(backoff::Error::permanent(e)),
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(e) => GatewayError::Io(e),
            backoff::Error::Transient { .. } => GatewayError::LockTimeout(format!(
                "{} still locked after {}ms",
                path.display(),
                self.policy.lock_timeout.as_millis()
            )),
        })
    }
}

impl QuotaCounter for FileQuotaCounter {
    fn is_allowed(&self, identifier: &str) -> bool {
        let now = self.clock.now();
        let window = match self.read_window(&self.record_path(identifier), now) {
            Ok(window) => window,
            Err(e) => {
                warn!("Failed to read quota record, allowing request: {}", e);
                return true;
            }
        };

        window.rolled_over(now, self.policy.window_seconds).count < self.policy.max_requests
    }

    fn consume(&self, identifier: &str) -> Result<u32> {
        let path = self.record_path(identifier);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        self.lock(&file, &path, LockKind::Exclusive)?;

        // Critical section: the lock is released when `file` is dropped
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;

        let now = self.clock.now();
        let mut window = Self::parse_window(&raw, now).rolled_over(now, self.policy.window_seconds);
        window.count = window.count.saturating_add(1);

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&serde_json::to_vec(&window)?)?;

        let remaining = self.policy.max_requests.saturating_sub(window.count);
        debug!(
            "Consumed quota unit (scope={}, count={}, remaining={})",
            self.policy.scope_id, window.count, remaining
        );

        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::ManualClock;
    use std::collections::HashSet;
    use std::thread;

    const START: i64 = 1_700_000_000;

    fn counter(
        dir: &Path,
        scope: &str,
        limit: u32,
        window_seconds: u64,
        clock: Arc<ManualClock>,
    ) -> FileQuotaCounter {
        FileQuotaCounter::with_clock(dir, QuotaPolicy::new(scope, limit, window_seconds), clock)
            .unwrap()
    }

    #[test]
    fn test_consume_counts_down_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = counter(dir.path(), "api", 3, 60, clock);

        assert!(counter.is_allowed("u1"));
        assert_eq!(counter.consume("u1").unwrap(), 2);
        assert_eq!(counter.consume("u1").unwrap(), 1);
        assert!(counter.is_allowed("u1"));
        assert_eq!(counter.consume("u1").unwrap(), 0);
        assert!(!counter.is_allowed("u1"));

        // Over-consuming saturates instead of going negative
        assert_eq!(counter.consume("u1").unwrap(), 0);
    }

    #[test]
    fn test_is_allowed_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = counter(dir.path(), "api", 1, 60, clock);

        for _ in 0..5 {
            assert!(counter.is_allowed("u1"));
        }
        assert!(!counter.record_path("u1").exists());
        assert_eq!(counter.consume("u1").unwrap(), 0);
    }

    #[test]
    fn test_window_rolls_over() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = counter(dir.path(), "api", 2, 60, clock.clone());

        counter.consume("u1").unwrap();
        counter.consume("u1").unwrap();
        assert!(!counter.is_allowed("u1"));

        // Still inside the window at exactly window_start + window_seconds
        clock.advance(60);
        assert!(!counter.is_allowed("u1"));

        clock.advance(1);
        assert!(counter.is_allowed("u1"));
        assert_eq!(counter.consume("u1").unwrap(), 1);

        let stored: QuotaWindow =
            serde_json::from_slice(&fs::read(counter.record_path("u1")).unwrap()).unwrap();
        assert_eq!(stored, QuotaWindow { count: 1, window_start: START + 61 });
    }

    #[test]
    fn test_scopes_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let scope_a = counter(dir.path(), "scope-a", 2, 60, clock.clone());
        let scope_b = counter(dir.path(), "scope-b", 2, 60, clock);

        scope_a.consume("u1").unwrap();
        scope_a.consume("u1").unwrap();

        assert!(!scope_a.is_allowed("u1"));
        assert!(scope_b.is_allowed("u1"));
        assert_eq!(scope_b.consume("u1").unwrap(), 1);
    }

    #[test]
    fn test_identifiers_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = counter(dir.path(), "api", 1, 60, clock);

        counter.consume("u1").unwrap();

        assert!(!counter.is_allowed("u1"));
        assert!(counter.is_allowed("u2"));
        assert_eq!(counter.consume("u2").unwrap(), 0);
    }

    #[test]
    fn test_separator_prevents_key_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let left = counter(dir.path(), "a_b", 1, 60, clock.clone());
        let right = counter(dir.path(), "a", 1, 60, clock);

        assert_ne!(left.record_path("c"), right.record_path("b_c"));
    }

    #[test]
    fn test_corrupt_record_is_a_fresh_window() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = counter(dir.path(), "api", 2, 60, clock);

        fs::write(counter.record_path("u1"), b"\x00garbage").unwrap();

        assert!(counter.is_allowed("u1"));
        assert_eq!(counter.consume("u1").unwrap(), 1);
    }

    #[test]
    fn test_concurrent_consumes_are_serialized() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 25;

        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = Arc::new(counter(dir.path(), "api", 1_000, 60, clock));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|_| counter.consume("shared").unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let seen: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        // Every caller observed a distinct count: no increment was lost
        let distinct: HashSet<u32> = seen.iter().copied().collect();
        assert_eq!(distinct.len(), THREADS * PER_THREAD);
        assert_eq!(seen.iter().min().copied(), Some(1_000 - (THREADS * PER_THREAD) as u32));
    }

    #[test]
    fn test_is_allowed_never_sees_partial_record() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = Arc::new(counter(dir.path(), "api", 1, 60, clock));
        counter.consume("u1").unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let rewrites = Arc::new(AtomicUsize::new(0));
        let writer = {
            let counter = Arc::clone(&counter);
            let stop = Arc::clone(&stop);
            let rewrites = Arc::clone(&rewrites);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    counter.consume("u1").unwrap();
                    rewrites.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        // Only start checking once the record is being rewritten
        while rewrites.load(Ordering::SeqCst) == 0 {
            thread::yield_now();
        }
        let admitted = (0..5_000).filter(|_| counter.is_allowed("u1")).count();

        stop.store(true, Ordering::SeqCst);
        writer.join().unwrap();

        assert_eq!(admitted, 0, "over-quota identifier was admitted mid-rewrite");
    }

    #[test]
    fn test_lock_timeout_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let counter = FileQuotaCounter::with_clock(
            dir.path(),
            QuotaPolicy::new("api", 5, 60).with_lock_timeout(Duration::from_millis(50)),
            clock,
        )
        .unwrap();

        // Hold the record lock from a separate open file handle
        let holder = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(counter.record_path("u1"))
            .unwrap();
        holder.lock_exclusive().unwrap();

        let result = counter.consume("u1");
        assert!(matches!(result, Err(GatewayError::LockTimeout(_))));

        drop(holder);
        assert_eq!(counter.consume("u1").unwrap(), 4);
    }
}

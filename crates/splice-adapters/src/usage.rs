//! Persistent usage counters
//!
//! Counters live in `usage.json` under the user data directory and survive
//! across sessions. Every read-modify-write happens under an exclusive file
//! lock so two processes never lose an increment.

use crate::fsutil::write_atomic;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use splice_core::UsageCounter;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const USAGE_FILE: &str = "usage.json";
const LOCK_FILE: &str = ".usage.lock";
const USAGE_LOCK_TIMEOUT_SECS: u64 = 5;
const USAGE_LOCK_RETRY_MS: u64 = 50;

/// Key bumped by every inline completion request.
pub const INLINE_COMPLETION_KEY: &str = "inline_completion_count";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    pub count: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UsageFile {
    #[serde(default)]
    counters: BTreeMap<String, UsageEntry>,
}

pub struct UsageStore {
    dir: PathBuf,
}

struct UsageLock {
    file: fs::File,
}

impl Drop for UsageLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl UsageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under `<data_dir>/splice`.
    pub fn open_default() -> anyhow::Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
            .join("splice");
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(USAGE_FILE)
    }

    pub fn entry(&self, key: &str) -> anyhow::Result<Option<UsageEntry>> {
        if !self.path().exists() {
            return Ok(None);
        }
        let _lock = self.lock()?;
        Ok(self.read()?.counters.get(key).cloned())
    }

    fn lock(&self) -> anyhow::Result<UsageLock> {
        fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))?;

        let start = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => break,
                Err(err) => {
                    if err.kind() != ErrorKind::WouldBlock {
                        return Err(err.into());
                    }
                    if start.elapsed() >= Duration::from_secs(USAGE_LOCK_TIMEOUT_SECS) {
                        return Err(anyhow::anyhow!(
                            "Timed out waiting for usage lock ({}s)",
                            USAGE_LOCK_TIMEOUT_SECS
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(USAGE_LOCK_RETRY_MS));
                }
            }
        }

        Ok(UsageLock { file })
    }

    fn read(&self) -> anyhow::Result<UsageFile> {
        read_usage_file(&self.path())
    }
}

fn read_usage_file(path: &Path) -> anyhow::Result<UsageFile> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(file) => Ok(file),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "usage file unreadable; starting over"
                );
                Ok(UsageFile::default())
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(UsageFile::default()),
        Err(err) => Err(err.into()),
    }
}

impl UsageCounter for UsageStore {
    fn increment_and_get(&self, key: &str) -> anyhow::Result<u64> {
        let _lock = self.lock()?;
        let mut usage = self.read()?;
        let entry = usage
            .counters
            .entry(key.to_string())
            .or_insert_with(|| UsageEntry {
                count: 0,
                updated_at: Utc::now(),
            });
        entry.count = entry.count.saturating_add(1);
        entry.updated_at = Utc::now();
        let count = entry.count;

        write_atomic(&self.path(), &serde_json::to_string_pretty(&usage)?)?;
        Ok(count)
    }

    fn get(&self, key: &str) -> anyhow::Result<u64> {
        Ok(self.entry(key)?.map(|e| e.count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = UsageStore::new(dir.path());
        assert_eq!(store.get(INLINE_COMPLETION_KEY).unwrap(), 0);
        assert_eq!(store.increment_and_get(INLINE_COMPLETION_KEY).unwrap(), 1);
        assert_eq!(store.increment_and_get(INLINE_COMPLETION_KEY).unwrap(), 2);

        let reopened = UsageStore::new(dir.path());
        assert_eq!(reopened.get(INLINE_COMPLETION_KEY).unwrap(), 2);
        assert!(reopened.entry(INLINE_COMPLETION_KEY).unwrap().is_some());
    }

    #[test]
    fn test_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = UsageStore::new(dir.path());
        store.increment_and_get("a").unwrap();
        store.increment_and_get("a").unwrap();
        store.increment_and_get("b").unwrap();
        assert_eq!(store.get("a").unwrap(), 2);
        assert_eq!(store.get("b").unwrap(), 1);
    }

    #[test]
    fn test_corrupt_file_restarts_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(USAGE_FILE), "garbage").unwrap();
        let store = UsageStore::new(dir.path());
        assert_eq!(store.increment_and_get("k").unwrap(), 1);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = UsageStore::new(path);
                    for _ in 0..5 {
                        store.increment_and_get("shared").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(UsageStore::new(dir.path()).get("shared").unwrap(), 20);
    }
}

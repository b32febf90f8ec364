use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

use super::ResponseCache;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 60);

/// One file per key under a cache directory; an entry is fresh while its
/// mtime is younger than the TTL.
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    pub fn open_default() -> Result<Self> {
        let base = dirs::cache_dir().context("failed to resolve cache dir")?;
        Self::open(base.join("prq"), DEFAULT_TTL)
    }

    pub fn open(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache dir {}", dir.display()))?;
        Ok(Self { dir, ttl })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        let Ok(modified) = meta.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age < self.ttl,
            // mtime in the future: keep the entry
            Err(_) => true,
        }
    }
}

impl ResponseCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);
        if !self.is_fresh(&path) {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(body) => {
                tracing::debug!(key, "cache hit");
                Some(body)
            }
            Err(e) => {
                tracing::debug!(key, error = %e, "unreadable cache entry, treating as miss");
                None
            }
        }
    }

    fn put(&self, key: &str, body: &str) -> Result<()> {
        let path = self.entry_path(key);
        fs::write(&path, body)
            .with_context(|| format!("failed to write cache entry {}", path.display()))
    }
}

/// Cache that never hits, for `--no-cache`.
pub struct NoCache;

impl ResponseCache for NoCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn put(&self, _key: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}

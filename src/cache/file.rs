use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::BrowserError;

use super::{CacheKey, ResponseCache};

const ENTRY_EXTENSION: &str = "json";

/// Disk-backed cache: one `<key>.json` file per entry, freshness taken from
/// the file's modification time.
///
/// There is no index file; an entry is valid if its file exists and is
/// younger than the requested TTL.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open (creating if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, BrowserError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            BrowserError::CacheIo(format!("cannot create cache dir {}: {e}", dir.display()))
        })?;
        Ok(FileCache { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Delete every entry, returning how many were removed.
    pub fn clear(&self) -> Result<usize, BrowserError> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        info!(event = "Cache", phase = "Clear", dir = %self.dir.display(), removed);
        Ok(removed)
    }
}

impl ResponseCache for FileCache {
    fn get(&self, key: &CacheKey, ttl: Duration) -> Result<Option<Value>, BrowserError> {
        let path = self.entry_path(key);
        let modified = match fs::metadata(&path) {
            Ok(meta) => meta.modified()?,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= ttl {
            debug!(event = "Cache", phase = "Expired", key = key.as_str(), age_secs = age.as_secs());
            fs::remove_file(&path)?;
            return Ok(None);
        }

        let text = fs::read_to_string(&path)?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(
                    event = "Cache",
                    phase = "Corrupt",
                    path = %path.display(),
                    error = e.to_string()
                );
                Ok(None)
            }
        }
    }

    /// Stages into a uniquely named file in the cache directory, then renames
    /// it over the entry.
    fn put(&self, key: &CacheKey, value: &Value) -> Result<(), BrowserError> {
        let mut staging = NamedTempFile::new_in(&self.dir)?;
        staging.write_all(&serde_json::to_vec(value)?)?;
        staging
            .persist(self.entry_path(key))
            .map_err(|e| BrowserError::from(e.error))?;
        Ok(())
    }
}

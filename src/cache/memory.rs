use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::BrowserError;

use super::{CacheKey, ResponseCache};

/// In-process cache, used where nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, (Instant, Value)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &CacheKey, ttl: Duration) -> Result<Option<Value>, BrowserError> {
        let mut entries = self.entries.write()?;
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < ttl => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &CacheKey, value: &Value) -> Result<(), BrowserError> {
        self.entries
            .write()?
            .insert(key.clone(), (Instant::now(), value.clone()));
        Ok(())
    }
}

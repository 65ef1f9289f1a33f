//! Time-boxed response cache for JSON call results.
//!
//! Every cached call is addressed by a [`CacheKey`], the SHA-256 digest of a
//! canonical JSON rendering of the operation name and its arguments. Object
//! keys are sorted before hashing, so two argument maps with the same entries
//! always share an entry regardless of insertion order.
//!
//! Backends implement [`ResponseCache`]; call sites go through
//! [`cached_call`], which serves a fresh entry or runs the producer and
//! persists its result.

mod file;
mod memory;

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use itertools::Itertools;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::BrowserError;

pub use file::FileCache;
pub use memory::MemoryCache;

/// Content address of a cached call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Hash `(operation, args)` into a key.
    pub fn new(operation: &str, args: &Value) -> Result<Self, BrowserError> {
        let canonical = serde_json::to_string(&(operation, canonicalize(args)))?;
        let digest = Sha256::digest(canonical.as_bytes());
        Ok(CacheKey(hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Rebuild `value` with every object's keys in ascending order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .sorted_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Storage for cached call results.
pub trait ResponseCache: Send + Sync {
    /// Return the stored value for `key` if it is younger than `ttl`.
    ///
    /// An entry at or past `ttl` is removed and reported as absent.
    fn get(&self, key: &CacheKey, ttl: Duration) -> Result<Option<Value>, BrowserError>;

    /// Store `value` under `key`, stamped with the current time.
    fn put(&self, key: &CacheKey, value: &Value) -> Result<(), BrowserError>;
}

/// Serve `(operation, args)` from `cache`, or run `producer` and store its result.
///
/// The producer runs at most once, and only when no entry younger than `ttl`
/// exists. Producer and storage errors are returned unchanged.
pub fn cached_call<C, F>(
    cache: &C,
    operation: &str,
    args: &Value,
    ttl: Duration,
    producer: F,
) -> Result<Value, BrowserError>
where
    C: ResponseCache + ?Sized,
    F: FnOnce() -> Result<Value, BrowserError>,
{
    let key = CacheKey::new(operation, args)?;

    if let Some(value) = cache.get(&key, ttl)? {
        debug!(event = "Cache", phase = "Hit", operation, key = key.as_str());
        return Ok(value);
    }

    debug!(
        event = "Cache",
        phase = "Miss",
        operation,
        key = key.as_str(),
        ttl_secs = ttl.as_secs()
    );
    let value = producer()?;
    cache.put(&key, &value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use yare::parameterized;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    #[test]
    fn test_key_is_hex_sha256() {
        let key = CacheKey::new("get_groups", &json!({})).unwrap();
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_ignores_argument_order() {
        let mut forward = Map::new();
        forward.insert("descriptor".to_string(), json!("vssgp.A"));
        forward.insert("direction".to_string(), json!("Up"));
        let mut backward = Map::new();
        backward.insert("direction".to_string(), json!("Up"));
        backward.insert("descriptor".to_string(), json!("vssgp.A"));

        let a = CacheKey::new("memberships", &Value::Object(forward)).unwrap();
        let b = CacheKey::new("memberships", &Value::Object(backward)).unwrap();
        assert_eq!(a, b);
    }

    #[parameterized(
        different_operation = { "get_groups", json!({}), "get_users", json!({}) },
        different_argument = { "memberships", json!({"descriptor": "a"}), "memberships", json!({"descriptor": "b"}) },
        different_nesting = { "get_request", json!({"args": {"direction": "Up"}}), "get_request", json!({"args": {"direction": "Down"}}) },
        args_vs_none = { "get_request", json!(null), "get_request", json!({}) },
    )]
    fn test_key_isolation(op_a: &str, args_a: Value, op_b: &str, args_b: Value) {
        let a = CacheKey::new(op_a, &args_a).unwrap();
        let b = CacheKey::new(op_b, &args_b).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_cached_call_hit_skips_producer() {
        let cache = MemoryCache::new();
        let calls = Cell::new(0);
        let producer = || {
            calls.set(calls.get() + 1);
            Ok(json!([1, 2, 3]))
        };

        let first = cached_call(&cache, "op", &json!({"a": 1}), HOUR, producer).unwrap();
        let second = cached_call(&cache, "op", &json!({"a": 1}), HOUR, || {
            calls.set(calls.get() + 1);
            Ok(json!("unused"))
        })
        .unwrap();

        assert_eq!(first, json!([1, 2, 3]));
        assert_eq!(second, json!([1, 2, 3]));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_cached_call_refreshes_expired_entry() {
        let cache = MemoryCache::new();
        cached_call(&cache, "op", &json!([]), HOUR, || Ok(json!("old"))).unwrap();

        let calls = Cell::new(0);
        let refreshed = cached_call(&cache, "op", &json!([]), Duration::ZERO, || {
            calls.set(calls.get() + 1);
            Ok(json!("new"))
        })
        .unwrap();
        assert_eq!(refreshed, json!("new"));
        assert_eq!(calls.get(), 1);

        let after = cached_call(&cache, "op", &json!([]), HOUR, || Ok(json!("unused"))).unwrap();
        assert_eq!(after, json!("new"));
    }

    #[test]
    fn test_cached_call_does_not_store_failures() {
        let cache = MemoryCache::new();
        let result = cached_call(&cache, "op", &json!({}), HOUR, || {
            Err(BrowserError::Upstream("503".to_string()))
        });
        assert!(matches!(result, Err(BrowserError::Upstream(_))));
        assert!(cache.is_empty());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-through cache for account and role-permission snapshots.
//!
//! The cache is strictly best-effort: a miss, a backend error and an
//! undecodable payload all look the same to callers, who fall through to the
//! source of truth.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,

    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Byte-blob store with per-entry expiry.
#[async_trait]
pub trait Cache: Send + Sync {
    /// `Ok(None)` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<(), CacheError>;
}

/// Cached blob + expiry instant.
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process LRU [`Cache`].
pub struct InMemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl InMemoryCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
            // Expired
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.put(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.pop(key);
        Ok(())
    }
}

/// Cache key for an account snapshot.
pub fn user_key(id: impl std::fmt::Display) -> String {
    format!("user:{id}")
}

/// Cache key for a role's permission set.
pub fn role_permissions_key(role: impl std::fmt::Display) -> String {
    format!("role-permissions:{role}")
}

/// Read and decode a JSON snapshot.
///
/// Returns `None` on miss, cache error or corrupt payload. Failures are
/// logged and never surfaced.
pub async fn read_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "discarding undecodable cache entry");
                None
            }
        },
        Ok(None) => {
            tracing::debug!(key = %key, "cache miss");
            None
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "cache read failed");
            None
        }
    }
}

/// Store a JSON snapshot on a detached task.
///
/// The task owns its key and value and is not tied to the caller's
/// lifetime. Errors are logged and swallowed. A zero `ttl` disables
/// population and returns `None`.
pub fn spawn_populate<T>(
    cache: Arc<dyn Cache>,
    key: String,
    value: T,
    ttl: Duration,
) -> Option<JoinHandle<()>>
where
    T: Serialize + Send + 'static,
{
    if ttl.is_zero() {
        return None;
    }

    let task = async move {
        let bytes = match serde_json::to_vec(&value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to encode cache entry");
                return;
            }
        };

        match cache.set(&key, bytes, ttl).await {
            Ok(()) => tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache populated"),
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to populate cache"),
        }
    };

    Some(tokio::spawn(task.in_current_span()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCache;

    #[tokio::test]
    async fn set_then_get() {
        let cache = InMemoryCache::new(10);
        assert!(cache.get("user:1").await.unwrap().is_none());

        cache
            .set("user:1", b"payload".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("user:1").await.unwrap().unwrap(), b"payload");
    }

    #[tokio::test]
    async fn del_removes_entry() {
        let cache = InMemoryCache::new(10);
        cache
            .set("user:1", b"payload".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.del("user:1").await.unwrap();
        assert!(cache.get("user:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_expire() {
        let cache = InMemoryCache::new(10);
        cache
            .set("user:1", b"payload".to_vec(), Duration::from_millis(1))
            .await
            .unwrap();

        // Wait for TTL to expire
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(cache.get("user:1").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let cache = InMemoryCache::new(2);
        for key in ["a", "b", "c"] {
            cache
                .set(key, key.as_bytes().to_vec(), Duration::from_secs(60))
                .await
                .unwrap();
        }

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_json_treats_corruption_as_miss() {
        let cache = InMemoryCache::new(10);
        cache
            .set("user:1", b"{not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert!(read_json::<Vec<String>>(&cache, "user:1").await.is_none());
    }

    #[tokio::test]
    async fn read_json_treats_errors_as_miss() {
        let cache = ScriptedCache::new().failing_reads();
        cache.put_raw("user:1", br#"["x"]"#);

        assert!(read_json::<Vec<String>>(&cache, "user:1").await.is_none());
    }

    #[tokio::test]
    async fn spawn_populate_writes_json() {
        let cache = Arc::new(InMemoryCache::new(10));
        let handle = spawn_populate(
            cache.clone(),
            "role-permissions:client".to_string(),
            vec!["me:manage".to_string()],
            Duration::from_secs(60),
        )
        .unwrap();
        handle.await.unwrap();

        let cached: Vec<String> = read_json(cache.as_ref(), "role-permissions:client")
            .await
            .unwrap();
        assert_eq!(cached, ["me:manage"]);
    }

    #[tokio::test]
    async fn spawn_populate_swallows_write_errors() {
        let cache = Arc::new(ScriptedCache::new().failing_writes());
        let handle = spawn_populate(
            cache.clone(),
            "user:1".to_string(),
            "value".to_string(),
            Duration::from_secs(60),
        )
        .unwrap();

        handle.await.unwrap();
        assert_eq!(cache.set_calls(), 1);
    }

    #[test]
    fn zero_ttl_skips_population() {
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new(10));
        assert!(spawn_populate(cache, "user:1".to_string(), 1u8, Duration::ZERO).is_none());
    }

    #[test]
    fn keys_follow_naming_scheme() {
        assert_eq!(user_key("abc"), "user:abc");
        assert_eq!(role_permissions_key("admin"), "role-permissions:admin");
    }
}

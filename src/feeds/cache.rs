//! In-memory TTL cache for feed blobs.
//!
//! Feeds are republished every few minutes at most, while the projections
//! endpoint can be hit many times a second around lock. Blobs are kept keyed
//! by object name and refetched once older than the TTL.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::store::BlobStore;

struct CachedBlob {
    bytes: Arc<[u8]>,
    fetched_at: Instant,
}

/// Thread-safe feed cache shared across requests.
#[derive(Clone)]
pub struct FeedCache {
    inner: Arc<RwLock<HashMap<String, CachedBlob>>>,
    ttl: Duration,
}

impl FeedCache {
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        FeedCache {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Return the cached blob if still fresh, otherwise fetch and store it.
    /// Fetch failures are not cached.
    pub async fn get_or_fetch(&self, store: &dyn BlobStore, object: &str) -> Result<Arc<[u8]>> {
        if self.ttl.is_zero() {
            return Ok(store.fetch(object).await?.into());
        }

        {
            let inner = self.inner.read().await;
            if let Some(cached) = inner.get(object) {
                if cached.fetched_at.elapsed() < self.ttl {
                    debug!("FeedCache hit: {}", object);
                    return Ok(Arc::clone(&cached.bytes));
                }
            }
        }

        debug!("FeedCache miss: {} (store={})", object, store.name());
        let bytes: Arc<[u8]> = store.fetch(object).await?.into();
        self.inner.write().await.insert(
            object.to_string(),
            CachedBlob {
                bytes: Arc::clone(&bytes),
                fetched_at: Instant::now(),
            },
        );
        Ok(bytes)
    }

    pub async fn invalidate_all(&self) {
        self.inner.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

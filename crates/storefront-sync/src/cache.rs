//! Request de-duplication and last-value cache shared by all feeds.
//!
//! Concurrent reads of the same key share one in-flight request. The cache
//! does not order responses: if two requests for a key are issued one after
//! another, whichever finishes last is what gets stored.
//!
//! Values are only kept for keys someone holds a [`CacheLease`] on. When the
//! last lease for a key is dropped, its value goes with it.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use storefront_http::{ApiClient, ApiError, ApiRequest};

pub type SharedResult = Result<Arc<Value>, Arc<ApiError>>;

type InFlight = Shared<BoxFuture<'static, SharedResult>>;

#[derive(Default)]
struct CacheInner {
    in_flight: HashMap<String, InFlight>,
    values: HashMap<String, Arc<Value>>,
    leases: HashMap<String, usize>,
}

#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue `request`, or join the identical request already in flight.
    pub async fn fetch(&self, client: &ApiClient, request: ApiRequest) -> SharedResult {
        let key = request.cache_key();

        let pending = {
            let mut inner = self.inner.lock();
            match inner.in_flight.get(&key) {
                Some(existing) => {
                    tracing::trace!(%key, "joining in-flight request");
                    existing.clone()
                }
                None => {
                    let client = client.clone();
                    let fetch = async move {
                        client
                            .fetch_json::<Value>(request)
                            .await
                            .map(Arc::new)
                            .map_err(Arc::new)
                    }
                    .boxed()
                    .shared();
                    inner.in_flight.insert(key.clone(), fetch.clone());
                    fetch
                }
            }
        };

        let result = pending.clone().await;

        let mut inner = self.inner.lock();
        if inner
            .in_flight
            .get(&key)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            inner.in_flight.remove(&key);
        }
        if let Ok(value) = &result {
            if inner.leases.contains_key(&key) {
                inner.values.insert(key, value.clone());
            }
        }
        result
    }

    /// [`QueryCache::fetch`] decoded into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        client: &ApiClient,
        request: ApiRequest,
    ) -> Result<T, Arc<ApiError>> {
        let value = self.fetch(client, request).await?;
        T::deserialize(value.as_ref()).map_err(|e| Arc::new(ApiError::Json(e)))
    }

    /// Last successful value stored for `key`.
    pub fn cached(&self, key: &str) -> Option<Arc<Value>> {
        self.inner.lock().values.get(key).cloned()
    }

    /// Keep values for `key` until the returned lease is dropped.
    pub fn retain(&self, key: &str) -> CacheLease {
        *self.inner.lock().leases.entry(key.to_string()).or_default() += 1;
        CacheLease {
            cache: self.clone(),
            key: key.to_string(),
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.lock().values.remove(key);
    }

    fn release(&self, key: &str) {
        let mut inner = self.inner.lock();
        let Some(count) = inner.leases.get_mut(key) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            inner.leases.remove(key);
            inner.values.remove(key);
            tracing::trace!(%key, "last lease released, value evicted");
        }
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.inner.lock().in_flight.contains_key(key)
    }
}

/// Interest in one cache key. See [`QueryCache::retain`].
pub struct CacheLease {
    cache: QueryCache,
    key: String,
}

impl CacheLease {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for CacheLease {
    fn drop(&mut self) {
        self.cache.release(&self.key);
    }
}

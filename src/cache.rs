use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use log::debug;
use tokio::sync::RwLock;
use tokio::task;
use tokio::time::{sleep, Duration};

pub struct Config {
    pub enabled: bool,
    pub ttl: Duration,
}

/// Reference lists change rarely; plans are never cached.
pub struct Cache<K, V> {
    enabled: bool,
    inner: RwLock<HashMap<K, Arc<V>>>,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + std::fmt::Debug + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            enabled: config.enabled,
            ttl: config.ttl,
            inner: Default::default(),
        })
    }

    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        if !self.enabled {
            return None;
        }

        self.inner.read().await.get(key).map(Arc::clone)
    }

    pub async fn insert(self: &Arc<Self>, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if !self.enabled {
            return value;
        }

        self.inner
            .write()
            .await
            .insert(key.clone(), Arc::clone(&value));

        let cache = Arc::clone(self);
        task::spawn(async move {
            sleep(cache.ttl).await;
            debug!("Evicting {key:?}");
            cache.inner.write().await.remove(&key);
        });

        value
    }

    /// Cached value for `key`, or the result of `fetch` stored under it.
    /// Failures are returned as-is and not cached.
    pub async fn get_or_try_insert<F, Fut, E>(self: &Arc<Self>, key: K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            debug!("Cache hit for {key:?}");
            return Ok(value);
        }

        let value = fetch().await?;
        Ok(self.insert(key, value).await)
    }
}

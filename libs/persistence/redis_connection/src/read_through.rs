use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::{
    core::{CacheEnvelope, CacheKey, TypedCacheKey},
    layer::CacheLayer,
};

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit { cached_at: DateTime<Utc> },
    Miss,
}

/// A value returned by [`CacheLayer::read`], tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

impl<T> Cached<T> {
    pub fn hit(envelope: CacheEnvelope<T>) -> Self {
        Self {
            status: CacheStatus::Hit {
                cached_at: envelope.cached_at,
            },
            value: envelope.value,
        }
    }

    pub fn miss(value: T) -> Self {
        Self {
            value,
            status: CacheStatus::Miss,
        }
    }

    pub fn is_hit(&self) -> bool { matches!(self.status, CacheStatus::Hit { .. }) }

    /// When the value was stored; `None` for freshly loaded values.
    pub fn cache_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.status {
            CacheStatus::Hit { cached_at } => Some(cached_at),
            CacheStatus::Miss => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Cached<U> {
        Cached {
            value: f(self.value),
            status: self.status,
        }
    }
}

impl CacheLayer {
    /// Looks `key` up and records the outcome. Unreadable payloads count as
    /// a miss.
    #[instrument(skip(self), fields(cache.key = %key))]
    pub async fn lookup<T>(&self, key: &CacheKey) -> Option<CacheEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let envelope = match self.store().get(key.as_str()).await {
            Some(bytes) => {
                match CacheEnvelope::decode(&bytes) {
                    Ok(envelope) => Some(envelope),
                    Err(err) => {
                        warn!(cache.key = %key, error = %err, "discarding unreadable cache entry");
                        None
                    }
                }
            }
            None => None,
        };

        if envelope.is_some() {
            self.metrics().record_hit();
            debug!(cache.key = %key, cache.outcome = "hit");
        }
        else {
            self.metrics().record_miss();
            debug!(cache.key = %key, cache.outcome = "miss");
        }
        envelope
    }

    /// Stores `value` under `key` for `ttl`. Returns whether it was written.
    /// Never fails: a serialisation or store error only shows up in the
    /// logs and the populate-failure counter.
    #[instrument(skip(self, value), fields(cache.key = %key))]
    pub async fn populate<T>(&self, key: &CacheKey, value: &T, ttl: Duration) -> bool
    where
        T: Serialize,
    {
        if !self.store().is_connected() {
            return false;
        }

        let payload = match CacheEnvelope::new(value).encode() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(cache.key = %key, error = %err, "value not cacheable");
                self.metrics().record_populate_failure();
                return false;
            }
        };

        let stored = self
            .store()
            .set_with_expiry(key.as_str(), payload, ttl)
            .await;
        if !stored {
            self.metrics().record_populate_failure();
        }
        stored
    }

    /// Read-through: the cached value when present, otherwise whatever
    /// `loader` produces, stored for `ttl` on the way out.
    ///
    /// Loader errors are returned unchanged and nothing is cached. Cache
    /// errors never reach the caller.
    pub async fn read<T, E, F, Fut>(
        &self, key: &CacheKey, ttl: Duration, loader: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(envelope) = self.lookup::<T>(key).await {
            return Ok(Cached::hit(envelope));
        }

        let value = loader().await?;
        self.populate(key, &value, ttl).await;
        Ok(Cached::miss(value))
    }

    /// [`CacheLayer::read`] for a key family declared with
    /// [`crate::cache_key!`].
    pub async fn read_typed<K, E, F, Fut>(
        &self, cache_key: &K, args: K::Args<'_>, ttl: Duration, loader: F,
    ) -> Result<Cached<K::Value>, E>
    where
        K: TypedCacheKey,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<K::Value, E>>,
    {
        let key = cache_key.key_with_args(args);
        self.read(&key, ttl, loader).await
    }
}

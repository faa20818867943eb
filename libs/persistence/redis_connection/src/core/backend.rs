use std::time::{Duration, Instant};

use bytes::Bytes;
use moka::{Expiry, future::Cache};
use redis::AsyncCommands;

use super::key::escape_glob;
use crate::{
    config::{BackendKind, MemoryConfig},
    error::{CacheError, CacheResult},
};

const SCAN_BATCH: usize = 500;

/// An entry of the in-process backend. Each one expires on its own TTL.
#[derive(Clone)]
pub struct MemoryEntry {
    payload: Bytes,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, MemoryEntry> for PerEntryTtl {
    fn expire_after_create(
        &self, _key: &String, value: &MemoryEntry, _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self, _key: &String, value: &MemoryEntry, _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// The key-value store behind the adapter.
pub enum CacheBackend {
    /// Redis (or any RESP-compatible store) through a deadpool pool
    Redis(deadpool_redis::Pool),

    /// In-process moka cache
    Memory(Cache<String, MemoryEntry>),

    /// No store at all; every operation is a no-op
    Disabled,
}

impl CacheBackend {
    pub fn memory(config: &MemoryConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .expire_after(PerEntryTtl)
            .build();
        CacheBackend::Memory(cache)
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            CacheBackend::Redis(_) => BackendKind::Redis,
            CacheBackend::Memory(_) => BackendKind::Memory,
            CacheBackend::Disabled => BackendKind::Disabled,
        }
    }

    pub fn is_redis(&self) -> bool { matches!(self, CacheBackend::Redis(_)) }

    async fn redis_conn(
        pool: &deadpool_redis::Pool,
    ) -> CacheResult<deadpool_redis::Connection> {
        Ok(pool.get().await?)
    }

    pub(crate) async fn ping(&self) -> CacheResult<()> {
        match self {
            CacheBackend::Redis(pool) => {
                let mut conn = Self::redis_conn(pool).await?;
                redis::cmd("PING").query_async::<String>(&mut conn).await?;
                Ok(())
            }
            CacheBackend::Memory(_) => Ok(()),
            CacheBackend::Disabled => Err(CacheError::Unavailable),
        }
    }

    pub(crate) async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        match self {
            CacheBackend::Redis(pool) => {
                let mut conn = Self::redis_conn(pool).await?;
                let value: Option<Vec<u8>> = conn.get(key).await?;
                Ok(value.map(Bytes::from))
            }
            CacheBackend::Memory(cache) => {
                Ok(cache.get(key).await.map(|entry| entry.payload))
            }
            CacheBackend::Disabled => Err(CacheError::Unavailable),
        }
    }

    pub(crate) async fn set_with_expiry(
        &self, key: &str, payload: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        match self {
            CacheBackend::Redis(pool) => {
                let mut conn = Self::redis_conn(pool).await?;
                // SETEX has second granularity and rejects 0
                let seconds = ttl.as_secs().max(1);
                let _: () = conn.set_ex(key, &payload[..], seconds).await?;
                Ok(())
            }
            CacheBackend::Memory(cache) => {
                cache
                    .insert(key.to_owned(), MemoryEntry { payload, ttl })
                    .await;
                Ok(())
            }
            CacheBackend::Disabled => Err(CacheError::Unavailable),
        }
    }

    pub(crate) async fn delete(&self, key: &str) -> CacheResult<bool> {
        match self {
            CacheBackend::Redis(pool) => {
                let mut conn = Self::redis_conn(pool).await?;
                let removed: u64 = conn.del(key).await?;
                Ok(removed > 0)
            }
            CacheBackend::Memory(cache) => Ok(cache.remove(key).await.is_some()),
            CacheBackend::Disabled => Err(CacheError::Unavailable),
        }
    }

    pub(crate) async fn delete_by_prefix(&self, prefix: &str) -> CacheResult<u64> {
        match self {
            CacheBackend::Redis(pool) => {
                let mut conn = Self::redis_conn(pool).await?;
                let pattern = format!("{}*", escape_glob(prefix));
                let mut cursor: u64 = 0;
                let mut deleted = 0;
                loop {
                    let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn)
                        .await?;
                    if !keys.is_empty() {
                        let removed: u64 = conn.del(&keys).await?;
                        deleted += removed;
                    }
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                Ok(deleted)
            }
            CacheBackend::Memory(cache) => {
                let matching: Vec<String> = cache
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .map(|(key, _)| String::clone(&key))
                    .collect();
                let mut deleted = 0;
                for key in &matching {
                    if cache.remove(key).await.is_some() {
                        deleted += 1;
                    }
                }
                Ok(deleted)
            }
            CacheBackend::Disabled => Err(CacheError::Unavailable),
        }
    }

    pub(crate) async fn flush(&self) -> CacheResult<()> {
        match self {
            CacheBackend::Redis(pool) => {
                let mut conn = Self::redis_conn(pool).await?;
                redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await?;
                Ok(())
            }
            CacheBackend::Memory(cache) => {
                cache.invalidate_all();
                cache.run_pending_tasks().await;
                Ok(())
            }
            CacheBackend::Disabled => Err(CacheError::Unavailable),
        }
    }

    pub(crate) async fn key_count(&self) -> CacheResult<u64> {
        match self {
            CacheBackend::Redis(pool) => {
                let mut conn = Self::redis_conn(pool).await?;
                Ok(redis::cmd("DBSIZE").query_async::<u64>(&mut conn).await?)
            }
            CacheBackend::Memory(cache) => Ok(cache.iter().count() as u64),
            CacheBackend::Disabled => Err(CacheError::Unavailable),
        }
    }
}

//! The cache store adapter.
//!
//! Every public operation degrades to "absent" or "no-op" when the store is
//! unreachable or misbehaves. Nothing here returns an error to the caller.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{BackendKind, ConnectPolicy, MemoryConfig, RedisDbConfig},
    connection::{connect_redis_db, establish},
    core::CacheBackend,
    error::{CacheError, CacheResult},
    state::{ConnectivitySnapshot, ConnectivityState},
};

/// Handle to the single shared store connection. Cheap to clone.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: CacheBackend,
    state: ConnectivityState,
    policy: ConnectPolicy,
    reconnecting: AtomicBool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub backend: BackendKind,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys_count: Option<u64>,
}

impl CacheStore {
    fn with_backend(backend: CacheBackend, policy: ConnectPolicy) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend,
                state: ConnectivityState::new(),
                policy,
                reconnecting: AtomicBool::new(false),
            }),
        }
    }

    /// Connects to Redis. Never fails: when the store cannot be reached
    /// within the connect policy the returned handle is in passthrough mode.
    #[instrument(skip_all, name = "cache-connect")]
    pub async fn connect(config: &RedisDbConfig) -> Self {
        info!("connecting to cache store");
        let pool = match connect_redis_db(config, config.pool_size, &config.connect)
        {
            Ok(pool) => pool,
            Err(err) => {
                warn!(error = %err, "cache store unavailable, continuing without cache");
                let store = Self::with_backend(CacheBackend::Disabled, config.connect);
                store.inner.state.record_error(err.to_string());
                return store;
            }
        };

        let store = Self::with_backend(CacheBackend::Redis(pool), config.connect);
        match establish(&store.inner.backend, &store.inner.policy).await {
            Ok(()) => {
                store.inner.state.mark_ready();
                info!("cache store connected and ready");
            }
            Err(err) => {
                store.inner.state.record_error(err.to_string());
                warn!(error = %err, "cache store unavailable, continuing without cache");
            }
        }
        store
    }

    /// In-process store; ready immediately.
    pub fn memory(config: &MemoryConfig) -> Self {
        let store = Self::with_backend(
            CacheBackend::memory(config),
            ConnectPolicy::default(),
        );
        store.inner.state.mark_ready();
        store
    }

    /// Permanent passthrough.
    pub fn disabled() -> Self {
        let store =
            Self::with_backend(CacheBackend::Disabled, ConnectPolicy::default());
        store.inner.state.record_error("cache disabled");
        store
    }

    pub async fn from_kind(
        kind: BackendKind, redis: &RedisDbConfig, memory: &MemoryConfig,
    ) -> Self {
        match kind {
            BackendKind::Redis => Self::connect(redis).await,
            BackendKind::Memory => Self::memory(memory),
            BackendKind::Disabled => Self::disabled(),
        }
    }

    pub fn backend_kind(&self) -> BackendKind { self.inner.backend.kind() }

    pub fn is_connected(&self) -> bool { self.inner.state.is_connected() }

    pub fn connectivity(&self) -> ConnectivitySnapshot {
        self.inner.state.snapshot()
    }

    #[instrument(skip(self), fields(cache.op = "get"))]
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.run("get", key, self.inner.backend.get(key)).await.flatten()
    }

    #[instrument(skip(self, value), fields(cache.op = "set"))]
    pub async fn set_with_expiry(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> bool {
        self.run("set", key, self.inner.backend.set_with_expiry(key, value, ttl))
            .await
            .is_some()
    }

    #[instrument(skip(self), fields(cache.op = "delete"))]
    pub async fn delete(&self, key: &str) -> bool {
        self.run("delete", key, self.inner.backend.delete(key))
            .await
            .unwrap_or(false)
    }

    #[instrument(skip(self), fields(cache.op = "delete_by_prefix"))]
    pub async fn delete_by_prefix(&self, prefix: &str) -> u64 {
        self.run(
            "delete_by_prefix",
            prefix,
            self.inner.backend.delete_by_prefix(prefix),
        )
        .await
        .unwrap_or(0)
    }

    #[instrument(skip(self), fields(cache.op = "flush_all"))]
    pub async fn flush_all(&self) -> bool {
        let flushed = self.run("flush_all", "*", self.inner.backend.flush()).await;
        if flushed.is_some() {
            info!("cache flushed");
        }
        flushed.is_some()
    }

    pub async fn stats(&self) -> StoreStats {
        let snapshot = self.connectivity();
        let keys_count = self
            .run("key_count", "*", self.inner.backend.key_count())
            .await;
        StoreStats {
            backend: self.backend_kind(),
            connected: snapshot.connected,
            last_error: snapshot.last_error,
            keys_count,
        }
    }

    /// Graceful shutdown. The store stays unavailable afterwards.
    pub async fn close(&self) {
        self.inner.state.mark_closed();
        if let CacheBackend::Redis(pool) = &self.inner.backend {
            pool.close();
        }
        info!("cache connection closed");
    }

    async fn run<T, F>(&self, op: &'static str, key: &str, operation: F) -> Option<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        if !self.is_connected() {
            return None;
        }

        let result =
            match tokio::time::timeout(self.inner.policy.op_timeout(), operation)
                .await
            {
                Ok(result) => result,
                Err(_) => Err(CacheError::Timeout { op }),
            };

        match result {
            Ok(value) => Some(value),
            Err(err) if err.is_connection_failure() => {
                self.connection_lost(err);
                None
            }
            Err(err) => {
                warn!(cache.op = op, cache.key = key, error = %err, "cache operation failed");
                None
            }
        }
    }

    fn connection_lost(&self, err: CacheError) {
        if !self.inner.state.mark_disconnected(err.to_string()) {
            return;
        }
        warn!(error = %err, "cache store connection lost, serving without cache");

        if self.inner.backend.is_redis()
            && !self.inner.reconnecting.swap(true, Ordering::AcqRel)
        {
            let store = self.clone();
            tokio::spawn(async move { store.reconnect().await });
        }
    }

    async fn reconnect(&self) {
        // The first attempt happens after one backoff step, the rest follow
        // the same policy as the initial connect.
        tokio::time::sleep(self.inner.policy.backoff(1)).await;
        let outcome = establish(&self.inner.backend, &self.inner.policy).await;
        self.inner.reconnecting.store(false, Ordering::Release);

        match outcome {
            Ok(()) if self.inner.state.mark_ready() => {
                info!("cache store reconnected");
            }
            Ok(()) => debug!("cache store answered after close, ignoring"),
            Err(err) => {
                // no further attempts until restart
                self.inner.state.mark_closed();
                self.inner.state.record_error(err.to_string());
                warn!(error = %err, "cache store did not come back, cache disabled until restart");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::{JoinHandle, JoinSet},
    };

    use super::*;
    use crate::config::RedisDbConfig;

    /// Splits one RESP command array off the front of `buf`.
    fn next_command(buf: &[u8]) -> Option<(Vec<Vec<u8>>, usize)> {
        fn line(buf: &[u8], pos: &mut usize) -> Option<usize> {
            let rest = buf.get(*pos..)?;
            let end = rest.windows(2).position(|w| w == b"\r\n")?;
            let value = std::str::from_utf8(rest.get(1..end)?).ok()?.parse().ok()?;
            *pos += end + 2;
            Some(value)
        }

        let mut pos = 0;
        let count = line(buf, &mut pos)?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            let len = line(buf, &mut pos)?;
            let arg = buf.get(pos..pos + len)?.to_vec();
            buf.get(pos + len..pos + len + 2)?;
            pos += len + 2;
            args.push(arg);
        }
        Some((args, pos))
    }

    /// Answers PING (echoing its argument), GET with nil and everything
    /// else with OK.
    async fn serve(mut socket: TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
            while let Some((args, used)) = next_command(&buf) {
                buf.drain(..used);
                let name = args
                    .first()
                    .map(|name| name.to_ascii_uppercase())
                    .unwrap_or_default();
                let reply = match (name.as_slice(), args.get(1)) {
                    (b"PING", Some(echo)) => {
                        let mut reply = format!("${}\r\n", echo.len()).into_bytes();
                        reply.extend_from_slice(echo);
                        reply.extend_from_slice(b"\r\n");
                        reply
                    }
                    (b"PING", None) => b"+PONG\r\n".to_vec(),
                    (b"GET", _) => b"$-1\r\n".to_vec(),
                    _ => b"+OK\r\n".to_vec(),
                };
                if socket.write_all(&reply).await.is_err() {
                    return;
                }
            }
        }
    }

    /// A throwaway RESP server. Aborting the handle drops the listener and
    /// every open connection.
    async fn resp_server() -> (u16, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = tokio::spawn(async move {
            let mut connections = JoinSet::new();
            while let Ok((socket, _)) = listener.accept().await {
                connections.spawn(serve(socket));
            }
        });
        (port, handle)
    }

    fn unreachable_redis() -> RedisDbConfig {
        RedisDbConfig {
            url: Some("redis://127.0.0.1:1/0".into()),
            connect: ConnectPolicy {
                connect_timeout_ms: 200,
                op_timeout_ms: 100,
                reconnect_attempts: 0,
            },
            ..RedisDbConfig::default()
        }
    }

    #[tokio::test]
    async fn unreachable_store_starts_in_passthrough() {
        let store = CacheStore::connect(&unreachable_redis()).await;

        assert!(!store.is_connected());
        assert!(store.connectivity().last_error.is_some());
        assert_eq!(store.get("video:v1").await, None);
        assert!(
            !store
                .set_with_expiry("video:v1", Bytes::from_static(b"{}"), Duration::from_secs(5))
                .await
        );
        assert!(!store.delete("video:v1").await);
        assert_eq!(store.delete_by_prefix("videos-list:").await, 0);
        assert!(!store.flush_all().await);
    }

    #[tokio::test]
    async fn lost_connection_degrades_once_and_stays_down() {
        let (port, server) = resp_server().await;
        let config = RedisDbConfig {
            url: Some(format!("redis://127.0.0.1:{port}/0")),
            connect: ConnectPolicy {
                connect_timeout_ms: 500,
                op_timeout_ms: 500,
                reconnect_attempts: 1,
            },
            ..RedisDbConfig::default()
        };

        let store = CacheStore::connect(&config).await;
        assert!(store.is_connected());
        assert_eq!(store.get("video:v1").await, None);
        assert!(store.is_connected());

        server.abort();
        let _ = server.await;

        assert_eq!(store.get("video:v1").await, None);
        assert!(!store.is_connected());
        let lost = store.connectivity().last_error;
        assert!(lost.is_some());
        assert!(store.inner.reconnecting.load(Ordering::Acquire));

        // already down: no second transition, no second supervisor
        assert_eq!(store.get("video:v2").await, None);
        assert_eq!(store.connectivity().last_error, lost);

        tokio::time::sleep(Duration::from_millis(800)).await;

        assert!(!store.inner.reconnecting.load(Ordering::Acquire));
        assert!(store.inner.state.is_closed());
        assert!(!store.is_connected());
        assert!(!store.inner.state.mark_ready());
        assert!(
            !store
                .set_with_expiry("video:v1", Bytes::from_static(b"{}"), Duration::from_secs(5))
                .await
        );
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = CacheStore::memory(&MemoryConfig::default());
        let ttl = Duration::from_secs(30);

        assert!(store.set_with_expiry("video:v1", Bytes::from_static(b"1"), ttl).await);
        assert_eq!(store.get("video:v1").await, Some(Bytes::from_static(b"1")));
        assert!(store.delete("video:v1").await);
        assert!(!store.delete("video:v1").await);
        assert_eq!(store.get("video:v1").await, None);
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let store = CacheStore::memory(&MemoryConfig::default());
        let ttl = Duration::from_millis(300);

        store.set_with_expiry("trending:{}", Bytes::from_static(b"[]"), ttl).await;
        assert!(store.get("trending:{}").await.is_some());

        tokio::time::sleep(ttl + Duration::from_millis(100)).await;
        assert_eq!(store.get("trending:{}").await, None);
    }

    #[tokio::test]
    async fn flush_clears_every_entry() {
        let store = CacheStore::memory(&MemoryConfig::default());
        let ttl = Duration::from_secs(30);
        store.set_with_expiry("video:a", Bytes::from_static(b"1"), ttl).await;
        store.set_with_expiry("search:{}", Bytes::from_static(b"2"), ttl).await;

        assert!(store.flush_all().await);
        assert_eq!(store.stats().await.keys_count, Some(0));
    }

    #[tokio::test]
    async fn closed_store_is_passthrough() {
        let store = CacheStore::memory(&MemoryConfig::default());
        store.close().await;

        assert!(!store.is_connected());
        assert_eq!(store.connectivity().last_error.as_deref(), Some("closed"));
        assert!(
            !store
                .set_with_expiry("video:v1", Bytes::from_static(b"1"), Duration::from_secs(1))
                .await
        );
    }

    #[tokio::test]
    async fn disabled_store_reports_stats_without_keys() {
        let stats = CacheStore::disabled().stats().await;

        assert_eq!(stats.backend, BackendKind::Disabled);
        assert!(!stats.connected);
        assert_eq!(stats.keys_count, None);
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use deadpool_redis::{Config, Pool, Runtime};
use redis_connection::{CacheStore, ConnectPolicy, RedisDbConfig};
use testcontainers_modules::{
    redis::Redis,
    testcontainers::{ContainerAsync, runners::AsyncRunner},
};

/// A throwaway Redis for integration tests. Needs Docker.
pub struct TestRedisContainer {
    pub pool: Pool,
    pub connection_string: String,
    // Keep the container alive for the lifetime of this struct
    _container: ContainerAsync<Redis>,
}

impl TestRedisContainer {
    pub async fn new() -> Result<Self> {
        let container = Redis::default()
            .start()
            .await
            .context("Failed to start Redis container")?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(6379).await?;
        let connection_string = format!("redis://{host}:{port}/0");

        let pool = Self::create_pool(&connection_string).await?;

        Ok(Self {
            pool,
            connection_string,
            _container: container,
        })
    }

    async fn create_pool(connection_string: &str) -> Result<Pool> {
        let mut cfg = Config::from_url(connection_string);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(4));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .context("Failed to create Redis pool")?;

        let mut attempts = 0;
        loop {
            let ping = match pool.get().await {
                Ok(mut conn) => {
                    deadpool_redis::redis::cmd("PING")
                        .query_async::<()>(&mut conn)
                        .await
                        .map_err(anyhow::Error::from)
                }
                Err(e) => Err(e.into()),
            };
            match ping {
                Ok(()) => return Ok(pool),
                Err(_) if attempts < 20 => {
                    attempts += 1;
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
                Err(e) => return Err(e).context("Redis not ready"),
            }
        }
    }

    pub fn config(&self) -> RedisDbConfig {
        RedisDbConfig {
            url: Some(self.connection_string.clone()),
            ..RedisDbConfig::default()
        }
    }

    /// A store adapter connected to this container.
    pub async fn store(&self) -> CacheStore { CacheStore::connect(&self.config()).await }

    pub async fn flush_db(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        deadpool_redis::redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn ttl_of(&self, key: &str) -> Result<i64> {
        let mut conn = self.pool.get().await?;
        Ok(deadpool_redis::redis::cmd("TTL")
            .arg(key)
            .query_async::<i64>(&mut conn)
            .await?)
    }
}

/// Points at a port nothing listens on, with tight timeouts and no
/// reconnects, so the adapter settles in passthrough quickly.
pub fn unreachable_redis_config() -> RedisDbConfig {
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

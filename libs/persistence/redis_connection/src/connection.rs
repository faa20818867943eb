use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use tracing::{debug, info, instrument};
use url::Url;

use crate::{
    config::{ConnectPolicy, DbConnectConfig},
    core::CacheBackend,
    error::{CacheError, CacheResult},
};

/// Connection URL for `config`: the explicit URL when set, otherwise one
/// assembled from host, port and database index.
pub fn redis_url<C>(config: &C) -> CacheResult<Url>
where
    C: DbConnectConfig,
{
    if let Some(raw) = config.url() {
        return Url::parse(raw).map_err(|e| {
            CacheError::Config(format!("invalid redis url: {e}"))
        });
    }

    let invalid = |what: &str| CacheError::Config(format!("invalid redis {what}"));
    let mut url = Url::parse("redis://")
        .map_err(|e| CacheError::Config(e.to_string()))?;
    url.set_host(Some(config.host())).map_err(|_| invalid("host"))?;
    url.set_port(Some(config.port())).map_err(|_| invalid("port"))?;
    if let Some(password) = config.password() {
        url.set_password(Some(password))
            .map_err(|_| invalid("password"))?;
    }
    url.path_segments_mut()
        .map_err(|_| invalid("url"))?
        .push(&config.db().to_string());
    Ok(url)
}

/// Builds the pool. No connection is opened until the first checkout.
#[instrument(skip_all, name = "connect-redis")]
pub fn connect_redis_db<C>(
    config: &C, pool_size: usize, policy: &ConnectPolicy,
) -> CacheResult<Pool>
where
    C: DbConnectConfig,
{
    let url = redis_url(config)?;
    info!(redis.host = url.host_str().unwrap_or_default(), redis.connect = true);

    let mut pool_config = PoolConfig::new(pool_size);
    pool_config.timeouts.wait = Some(policy.op_timeout());
    pool_config.timeouts.create = Some(policy.connect_timeout());
    pool_config.timeouts.recycle = Some(policy.op_timeout());

    let cfg = Config {
        url: Some(url.to_string()),
        pool: Some(pool_config),
        connection: None,
    };

    Ok(cfg.create_pool(Some(Runtime::Tokio1))?)
}

/// Pings `backend` until it answers, giving up after the policy's reconnect
/// budget. Each ping is bounded by the connect timeout.
pub(crate) async fn establish(
    backend: &CacheBackend, policy: &ConnectPolicy,
) -> CacheResult<()> {
    let mut attempt = 0;
    loop {
        let outcome =
            match tokio::time::timeout(policy.connect_timeout(), backend.ping())
                .await
            {
                Ok(result) => result,
                Err(_) => Err(CacheError::Timeout { op: "connect" }),
            };

        match outcome {
            Ok(()) => return Ok(()),
            Err(err) if attempt >= policy.reconnect_attempts => return Err(err),
            Err(err) => {
                attempt += 1;
                debug!(attempt, error = %err, "cache store not ready, retrying");
                tokio::time::sleep(policy.backoff(attempt)).await;
            }
        }
    }
}

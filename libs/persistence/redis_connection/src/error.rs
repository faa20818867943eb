use deadpool_redis::{CreatePoolError, PoolError};
use redis::RedisError;

/// Failures inside the cache adapter. These never leave [`crate::store`];
/// callers only ever observe a miss or a no-op.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache store unavailable")]
    Unavailable,

    #[error("invalid cache configuration: {0}")]
    Config(String),

    #[error("failed to create pool: {0}")]
    CreatePool(#[from] CreatePoolError),

    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("command error: {0}")]
    Command(#[from] RedisError),

    #[error("{op} timed out")]
    Timeout { op: &'static str },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl CacheError {
    /// Whether the failure means the connection itself is gone, as opposed
    /// to a single operation going wrong.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Unavailable | Self::Pool(_) | Self::CreatePool(_) => true,
            Self::Command(err) => {
                err.is_io_error()
                    || err.is_connection_dropped()
                    || err.is_connection_refusal()
            }
            _ => false,
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

pub use deadpool_redis::Pool;
pub use redis::RedisError;

pub mod config;
pub mod connection;
pub mod core;
pub mod error;
pub mod invalidation;
pub mod layer;
pub mod macros;
pub mod metrics;
pub mod read_through;
pub mod state;
pub mod store;
pub mod ttl;

pub use config::{BackendKind, ConnectPolicy, MemoryConfig, RedisDbConfig};
pub use self::core::{CacheEnvelope, CacheKey, CacheParams, TypedCacheKey};
pub use invalidation::{InvalidationPlan, InvalidationReport};
pub use layer::{CacheHealth, CacheLayer, CacheStats};
pub use metrics::MetricsSnapshot;
pub use read_through::{CacheStatus, Cached};
pub use store::{CacheStore, StoreStats};
pub use ttl::TtlPolicy;

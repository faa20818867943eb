use clap::Parser;
use redis_connection::{BackendKind, ConnectPolicy, MemoryConfig, RedisDbConfig};

#[derive(Parser, Debug, Clone)]
#[command(name = "video-cache-server")]
#[command(about = "Video API with a read-through response cache")]
pub struct ServerConfig {
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Full Redis URL; wins over host, port and db.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: u8,

    /// redis, memory or disabled
    #[arg(long, env = "CACHE_BACKEND", default_value = "redis")]
    pub cache_backend: BackendKind,

    #[arg(long, env = "CACHE_CONNECT_TIMEOUT_MS", default_value_t = 5000)]
    pub cache_connect_timeout_ms: u64,

    #[arg(long, env = "CACHE_OP_TIMEOUT_MS", default_value_t = 500)]
    pub cache_op_timeout_ms: u64,

    #[arg(long, env = "CACHE_RECONNECT_ATTEMPTS", default_value_t = 3)]
    pub cache_reconnect_attempts: u32,

    #[arg(long, env = "CACHE_MEMORY_CAPACITY", default_value_t = 10_000)]
    pub cache_memory_capacity: u64,

    /// Required by the /api/admin routes; they stay closed without it.
    #[arg(long, env = "ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    #[arg(long, env = "SEED_SAMPLE_VIDEOS", default_value_t = false)]
    pub seed_sample_videos: bool,
}

impl ServerConfig {
    pub fn redis(&self) -> RedisDbConfig {
        RedisDbConfig {
            url: self.redis_url.clone(),
            host: self.redis_host.clone(),
            port: self.redis_port,
            db: self.redis_db,
            connect: ConnectPolicy {
                connect_timeout_ms: self.cache_connect_timeout_ms,
                op_timeout_ms: self.cache_op_timeout_ms,
                reconnect_attempts: self.cache_reconnect_attempts,
            },
            ..RedisDbConfig::default()
        }
    }

    pub fn memory(&self) -> MemoryConfig {
        MemoryConfig {
            capacity: self.cache_memory_capacity,
        }
    }
}

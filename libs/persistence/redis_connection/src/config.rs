use std::{fmt, str::FromStr, time::Duration};

pub trait DbConnectConfig: serde::de::DeserializeOwned {
    /// Full connection URL. When present it wins over the discrete fields.
    fn url(&self) -> Option<&str> { None }
    #[allow(unused)]
    fn password(&self) -> Option<&str> { None }
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn db(&self) -> u8;
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RedisDbConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "host_default")]
    pub host: String,
    #[serde(default = "port_default")]
    pub port: u16,
    #[serde(default = "db_default")]
    pub db: u8,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "pool_size_default")]
    pub pool_size: usize,
    #[serde(default)]
    pub connect: ConnectPolicy,
}

impl Default for RedisDbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: host_default(),
            port: port_default(),
            db: db_default(),
            password: None,
            pool_size: pool_size_default(),
            connect: ConnectPolicy::default(),
        }
    }
}

impl DbConnectConfig for RedisDbConfig {
    fn url(&self) -> Option<&str> { self.url.as_deref() }

    fn password(&self) -> Option<&str> { self.password.as_deref() }

    fn host(&self) -> &str { &self.host }

    fn port(&self) -> u16 { self.port }

    fn db(&self) -> u8 { self.db }
}

/// Bounds on how long the adapter waits for the store before giving up.
#[derive(Debug, Clone, Copy, serde::Deserialize, PartialEq, Eq)]
pub struct ConnectPolicy {
    #[serde(default = "connect_timeout_ms_default")]
    pub connect_timeout_ms: u64,
    #[serde(default = "op_timeout_ms_default")]
    pub op_timeout_ms: u64,
    #[serde(default = "reconnect_attempts_default")]
    pub reconnect_attempts: u32,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            connect_timeout_ms: connect_timeout_ms_default(),
            op_timeout_ms: op_timeout_ms_default(),
            reconnect_attempts: reconnect_attempts_default(),
        }
    }
}

impl ConnectPolicy {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }

    /// Delay before reconnect attempt `attempt` (1-based), capped at 500ms.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(u64::from(attempt).saturating_mul(50).min(500))
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub capacity: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_memory_capacity(),
        }
    }
}

/// Which store the adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Redis,
    Memory,
    Disabled,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
            Self::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            other => Err(format!("unknown cache backend '{other}'")),
        }
    }
}

fn host_default() -> String { "127.0.0.1".into() }
fn port_default() -> u16 { 6379 }
fn db_default() -> u8 { 0 }
fn pool_size_default() -> usize { 16 }
fn connect_timeout_ms_default() -> u64 { 5_000 }
fn op_timeout_ms_default() -> u64 { 500 }
fn reconnect_attempts_default() -> u32 { 3 }
fn default_memory_capacity() -> u64 { 10_000 }

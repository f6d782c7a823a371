use std::net::{Ipv4Addr, SocketAddr};

use tracing::trace;

use crate::storage::RetryPolicy;

const DEFAULT_PORT: u16 = 8080;

/// Database connection and retry configuration
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StorageConfig {
    /// Connection URL, `postgres://...` or `sqlite:...`
    pub dsn: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long an operation waits for a pooled connection
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,

    /// Waits between attempts of one operation, in seconds
    #[serde(default, rename = "retry_schedule_secs")]
    pub retry: RetryPolicy,
}

impl StorageConfig {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    5_000
}

pub fn get_default_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT))
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default = "get_default_address")]
    pub address: SocketAddr,

    /// Storage configuration (optional - the DSN may come from the command line)
    pub storage: Option<StorageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: get_default_address(),
            storage: None,
        }
    }
}

/// Configuration with command line overrides applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub address: SocketAddr,
    pub storage: StorageConfig,
}

impl Config {
    /// Apply command line / environment overrides on top of the file values
    pub fn resolve(
        self,
        address: Option<SocketAddr>,
        dsn: Option<String>,
    ) -> anyhow::Result<ResolvedConfig> {
        let storage = match (self.storage, dsn) {
            (Some(storage), Some(dsn)) => StorageConfig { dsn, ..storage },
            (Some(storage), None) => storage,
            (None, Some(dsn)) => StorageConfig::new(dsn),
            (None, None) => anyhow::bail!("no database configured (set DATABASE_DSN or storage.dsn)"),
        };

        Ok(ResolvedConfig {
            address: address.unwrap_or(self.address),
            storage,
        })
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

//! Configuration module
//!
//! Typed configuration for the file server, loaded from defaults, an
//! optional `cogserve.toml`, and `COGSERVE_`-prefixed environment
//! variables. Defaults: 200 cached ranges, 32 MiB cache budget, 2 MiB
//! cacheable-range ceiling, 256 KiB stream chunks.

use serde::Deserialize;

use crate::http::cache;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub stream: StreamConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Listener and runtime settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface the ephemeral-port listener binds to
    pub host: String,
    /// Tokio worker threads; None uses the CPU count
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Range cache limits
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub max_bytes: usize,
    /// Ranges longer than this are served by direct reads, never cached
    pub max_cacheable_range: u64,
}

/// Full-file streaming settings
#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    /// High-water mark for sequential reads
    pub chunk_size: usize,
}

/// Connection handling settings. Both limits default to off: a loopback
/// server for one viewer needs neither a connection bound nor a timeout.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PerformanceConfig {
    #[serde(default)]
    pub max_connections: Option<u64>,
    /// Whole-connection timeout in seconds; None never times out
    #[serde(default)]
    pub connection_timeout: Option<u64>,
}

/// Logging settings
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
}

impl Config {
    /// Load configuration from the default `cogserve.toml` location.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("cogserve")
    }

    /// Load configuration from the specified file path (without extension),
    /// falling back to defaults when the file is absent.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("COGSERVE"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("cache.max_entries", cache::MAX_ENTRIES as u64)?
            .set_default("cache.max_bytes", cache::MAX_BYTES as u64)?
            .set_default("cache.max_cacheable_range", cache::MAX_CACHEABLE_RANGE)?
            .set_default("stream.chunk_size", 262_144_u64)? // 256 KiB
            .set_default("logging.access_log", true)?
            .build()?;

        settings.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                workers: None,
            },
            cache: CacheConfig {
                max_entries: cache::MAX_ENTRIES,
                max_bytes: cache::MAX_BYTES,
                max_cacheable_range: cache::MAX_CACHEABLE_RANGE,
            },
            stream: StreamConfig {
                chunk_size: 262_144,
            },
            performance: PerformanceConfig {
                max_connections: None,
                connection_timeout: None,
            },
            logging: LoggingConfig { access_log: true },
        }
    }
}

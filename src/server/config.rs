use std::path::PathBuf;
use std::time::Duration;
use crate::protocol::{DEFAULT_CHUNK_SIZE, MAX_BODY_SIZE, RTMP_PORT};
use crate::server::cache::CacheConfig;
use crate::stream::DEFAULT_PAGESIZE;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind
    pub host: String,

    /// Port to bind, 0 picks a free one
    pub port: u16,

    /// Maximum live connections
    pub max_connections: usize,

    /// Outgoing chunk size announced after connect
    pub chunk_size: usize,

    /// Read timeout of connection sockets
    pub read_timeout: Option<Duration>,

    /// Directory stream names are resolved against
    pub docroot: PathBuf,

    /// DiskStream page size, also the largest FLV data message sent
    pub pagesize: usize,

    /// File cache bound
    pub cache: CacheConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: RTMP_PORT,
            max_connections: 1000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_timeout: Some(Duration::from_secs(300)),
            docroot: PathBuf::from("."),
            pagesize: DEFAULT_PAGESIZE,
            cache: CacheConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::config("Invalid max_connections: 0"));
        }

        if self.chunk_size < DEFAULT_CHUNK_SIZE {
            return Err(Error::config(format!(
                "Chunk size must be at least {}",
                DEFAULT_CHUNK_SIZE
            )));
        }

        if self.chunk_size > MAX_BODY_SIZE {
            return Err(Error::config(format!(
                "Chunk size must not exceed {}",
                MAX_BODY_SIZE
            )));
        }

        if self.pagesize == 0 || self.pagesize > MAX_BODY_SIZE {
            return Err(Error::config(format!(
                "Page size must be between 1 and {}",
                MAX_BODY_SIZE
            )));
        }

        if self.cache.max_files == Some(0) {
            return Err(Error::config("Cache must hold at least one file"));
        }

        if self.read_timeout == Some(Duration::ZERO) {
            return Err(Error::config("Read timeout must not be zero"));
        }

        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Builder for ServerConfig
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Create new builder
    pub fn new() -> Self {
        ServerConfigBuilder {
            config: ServerConfig::default(),
        }
    }

    /// Set host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set max connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Set chunk size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn docroot(mut self, docroot: impl Into<PathBuf>) -> Self {
        self.config.docroot = docroot.into();
        self
    }

    pub fn pagesize(mut self, pagesize: usize) -> Self {
        self.config.pagesize = pagesize;
        self
    }

    /// Bound the number of cached files
    pub fn max_cached_files(mut self, max: usize) -> Self {
        self.config.cache = CacheConfig::bounded(max);
        self
    }

    /// Build configuration
    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

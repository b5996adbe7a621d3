use std::time::Duration;
use crate::protocol::{DEFAULT_CHUNK_SIZE, FLASH_VERSION, MAX_BODY_SIZE};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connection timeout
    pub connect_timeout: Duration,

    /// Read timeout
    pub read_timeout: Option<Duration>,

    /// Outgoing chunk size, announced after connect when not the default
    pub chunk_size: usize,

    /// flashVer sent with connect
    pub flash_version: String,

    /// swfUrl sent with connect
    pub swf_url: Option<String>,

    /// pageUrl sent with connect
    pub page_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Some(Duration::from_secs(30)),
            chunk_size: DEFAULT_CHUNK_SIZE,
            flash_version: FLASH_VERSION.to_string(),
            swf_url: None,
            page_url: None,
        }
    }
}

impl ClientConfig {
    /// Create config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
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

        if self.connect_timeout.is_zero() || self.read_timeout == Some(Duration::ZERO) {
            return Err(Error::config("Timeouts must not be zero"));
        }

        Ok(())
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create new builder
    pub fn new() -> Self {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set chunk size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn flash_version(mut self, version: impl Into<String>) -> Self {
        self.config.flash_version = version.into();
        self
    }

    pub fn swf_url(mut self, url: impl Into<String>) -> Self {
        self.config.swf_url = Some(url.into());
        self
    }

    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.config.page_url = Some(url.into());
        self
    }

    /// Build configuration
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder()
            .chunk_size(4096)
            .swf_url("http://localhost/player.swf")
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.flash_version, "LNX 9,0,31,0");
        assert_eq!(config.swf_url.as_deref(), Some("http://localhost/player.swf"));
        assert!(config.page_url.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ClientConfig::builder().chunk_size(1).build().is_err());
        assert!(ClientConfig::builder().chunk_size(1 << 20).build().is_err());
        assert!(ClientConfig::builder().connect_timeout(Duration::ZERO).build().is_err());
    }
}

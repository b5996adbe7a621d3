mod client;
mod config;
mod state;

pub use client::RtmpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use state::ClientState;

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use url::Url;
use crate::protocol::RTMP_PORT;
use crate::{Error, Result};

/// The parts of an rtmp://host[:port]/app URL a client needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpUrl {
    pub url: Url,
    pub host: String,
    pub port: u16,
    pub app: String,
}

impl RtmpUrl {
    pub fn parse(url: &str) -> Result<RtmpUrl> {
        let parsed = Url::parse(url).map_err(|e| Error::config(format!("Invalid URL: {}", e)))?;

        // Validate scheme
        if parsed.scheme() != "rtmp" {
            return Err(Error::config(format!("Unsupported scheme: {}", parsed.scheme())));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::config("Missing host in URL"))?
            .to_string();
        let port = parsed.port().unwrap_or(RTMP_PORT);
        let app = parsed
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or("")
            .to_string();

        Ok(RtmpUrl {
            url: parsed,
            host,
            port,
            app,
        })
    }

    /// tcUrl of the connect call
    pub fn tc_url(&self) -> String {
        format!("rtmp://{}:{}/{}", self.host, self.port, self.app)
    }
}

/// Open a blocking TCP connection to the URL's host
pub fn connect_to_server(url: &RtmpUrl, connect_timeout: Duration) -> Result<TcpStream> {
    let addr = (url.host.as_str(), url.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| Error::connection(format!("No address for {}", url.host)))?;

    TcpStream::connect_timeout(&addr, connect_timeout).map_err(|e| match e.kind() {
        std::io::ErrorKind::TimedOut => Error::timeout(format!("Connection to {} timed out", addr)),
        _ => Error::connection(format!("Failed to connect to {}: {}", addr, e)),
    })
}

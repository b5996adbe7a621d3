use tokio::net::TcpListener;
use crate::{Error, Result};

mod cache;
mod config;
mod context;
mod server;

pub use cache::{Cache, CacheConfig, CacheStats, SharedStream};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use context::{ConnectionGuard, ServerContext};
pub use server::RtmpServer;

pub async fn bind_server(config: &ServerConfig) -> Result<TcpListener> {
    let addr = config.address();

    // Try binding with SO_REUSEADDR
    let socket = match addr.parse::<std::net::SocketAddr>() {
        Ok(addr) => {
            let socket = if addr.is_ipv4() {
                tokio::net::TcpSocket::new_v4()?
            } else {
                tokio::net::TcpSocket::new_v6()?
            };

            socket.set_reuseaddr(true)?;
            socket.bind(addr)?;
            socket
        }
        Err(e) => {
            return Err(Error::config(format!("Invalid address {}: {}", addr, e)));
        }
    };

    let listener = socket.listen(1024)?;
    Ok(listener)
}

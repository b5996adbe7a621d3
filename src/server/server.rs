use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use crate::handlers::serve_connection;
use crate::server::bind_server;
use crate::server::cache::Cache;
use crate::server::config::ServerConfig;
use crate::server::context::{ConnectionGuard, ServerContext};
use crate::Result;

pub struct RtmpServer {
    /// Server configuration
    config: Arc<ServerConfig>,

    /// Server context
    context: Arc<ServerContext>,

    shutdown: Arc<Notify>,
}

impl RtmpServer {
    /// Create new server with its own cache
    pub fn new(config: ServerConfig) -> Self {
        let config = Arc::new(config);
        let context = Arc::new(ServerContext::new(config.clone()));
        RtmpServer::from_context(config, context)
    }

    /// Create a server sharing `cache`, e.g. `Cache::default_instance()`
    pub fn with_cache(config: ServerConfig, cache: Arc<Cache>) -> Self {
        let config = Arc::new(config);
        let context = Arc::new(ServerContext::with_cache(config.clone(), cache));
        RtmpServer::from_context(config, context)
    }

    fn from_context(config: Arc<ServerConfig>, context: Arc<ServerContext>) -> Self {
        RtmpServer {
            config,
            context,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get server context
    pub fn context(&self) -> Arc<ServerContext> {
        self.context.clone()
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        self.config.validate()?;
        bind_server(&self.config).await
    }

    /// Bind and accept connections until `shutdown()`
    pub async fn listen(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener until `shutdown()`
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        log::info!("RTMP server listening on {}", listener.local_addr()?);

        loop {
            let accepted = tokio::select! {
                _ = self.shutdown.notified() => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer_addr) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::error!("Accept error: {}", e);
                    continue;
                }
            };

            let Some(guard) = self.context.register() else {
                log::warn!("Connection limit reached, rejecting {}", peer_addr);
                continue;
            };

            if let Err(e) = self.handle_connection(stream, peer_addr, guard) {
                log::error!("Couldn't set up connection from {}: {}", peer_addr, e);
            }
        }

        log::info!("Server stopped");
        Ok(())
    }

    /// Move the socket to a blocking thread and serve it there
    fn handle_connection(&self, stream: TcpStream, peer_addr: SocketAddr, guard: ConnectionGuard) -> Result<()> {
        let stream = stream.into_std()?;
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(self.config.read_timeout)?;

        let conn_id = self.context.generate_connection_id();
        log::info!("{} accepted from {}", conn_id, peer_addr);

        let context = self.context.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            match serve_connection(stream, &context, &conn_id) {
                Ok(()) => log::info!("{} finished", conn_id),
                Err(e) => log::warn!("{} ended with error: {}", conn_id, e),
            }
        });
        Ok(())
    }

    /// Stop accepting; connections already being served run to completion
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub fn connection_count(&self) -> usize {
        self.context.live_connections()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::C0C1;
    use crate::protocol::HANDSHAKE_SIZE;
    use std::io::{Read, Write};
    use std::time::Duration;

    fn test_config() -> ServerConfig {
        ServerConfig::builder()
            .host("127.0.0.1")
            .port(0)
            .read_timeout(Some(Duration::from_secs(5)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_and_answers_handshake() {
        let server = Arc::new(RtmpServer::new(test_config()));
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();

        let running = server.clone();
        let task = tokio::spawn(async move { running.serve(listener).await });

        let reply = tokio::task::spawn_blocking(move || {
            let mut socket = std::net::TcpStream::connect(addr).unwrap();
            socket.write_all(&C0C1::create_client().encode()).unwrap();
            let mut reply = vec![0u8; 1 + HANDSHAKE_SIZE * 2];
            socket.read_exact(&mut reply).unwrap();
            reply
        })
        .await
        .unwrap();
        assert_eq!(reply[0], 3);

        server.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_before_any_connection() {
        let server = RtmpServer::new(test_config());
        let listener = server.bind().await.unwrap();
        server.shutdown();
        server.serve(listener).await.unwrap();
        assert_eq!(server.connection_count(), 0);
    }
}

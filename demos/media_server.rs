// Media Server Example
//
// This example demonstrates:
// - Serving files from a directory over RTMP
// - Sharing opened files between connections through the cache
// - Graceful shutdown
//
// Usage:
//   cargo run --example media_server -- [docroot] [port]

use cygnal::{Cache, Result, RtmpServer, ServerConfig, RTMP_PORT};
use log::info;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let docroot = args.get(1).map(String::as_str).unwrap_or(".");
    let port = match args.get(2) {
        Some(port) => port
            .parse()
            .map_err(|e| cygnal::Error::config(format!("Bad port {}: {}", port, e)))?,
        None => RTMP_PORT,
    };

    // Create server configuration
    let config = ServerConfig::builder()
        .host("0.0.0.0")
        .port(port)
        .max_connections(100)
        .chunk_size(4096)
        .docroot(docroot)
        .build()?;

    info!("Starting media server on {}", config.address());
    info!("Configuration:");
    info!("  - Document root: {}", config.docroot.display());
    info!("  - Max connections: {}", config.max_connections);
    info!("  - Chunk size: {}", config.chunk_size);
    info!("  - Page size: {}", config.pagesize);

    let server = Arc::new(RtmpServer::with_cache(config, Cache::default_instance()));

    // Setup graceful shutdown
    let server_clone = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down server...");
                server_clone.shutdown();
            }
            Err(err) => log::error!("Error setting up signal handler: {}", err),
        }
    });

    info!("Press Ctrl+C to stop");
    server.listen().await?;

    Cache::default_instance().dump();
    Ok(())
}

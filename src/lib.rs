mod utils;
mod amf;
mod protocol;
mod handshake;
mod chunk;
mod message;
mod connection;
mod stream;
mod handlers;
mod server;
mod client;

// Re-export commonly used types at crate root
pub use utils::*;
pub use amf::*;
pub use protocol::*;
pub use handshake::*;
pub use chunk::*;
pub use message::*;
pub use connection::*;

// Stream exports
pub use stream::*;

// Server exports
pub use handlers::{serve_connection, CommandHandler, CommandHandlerRegistry, HandlerContext};
pub use server::{
    bind_server, Cache, CacheConfig, CacheStats, ConnectionGuard, RtmpServer, ServerConfig,
    ServerConfigBuilder, ServerContext, SharedStream,
};

// Client exports
pub use client::{connect_to_server, ClientConfig, ClientConfigBuilder, ClientState, RtmpClient, RtmpUrl};

// Common test utilities and helper functions
//
// This module provides reusable test utilities for integration tests

#![allow(dead_code)]

use cygnal::{merge, ContentType, HeaderSize, RtmpHeader, RtmpServer, ServerConfig, FROM_CLIENT};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Deterministic media bytes with an FLV signature
pub fn media_bytes(len: usize) -> Vec<u8> {
    let mut data = b"FLV\x01\x05\x00\x00\x00\x09".to_vec();
    data.extend((0..len.saturating_sub(9)).map(|i| (i % 253) as u8));
    data.truncate(len);
    data
}

/// Write `len` media bytes to `dir/name` and return them
pub fn write_media(dir: &Path, name: &str, len: usize) -> Vec<u8> {
    let data = media_bytes(len);
    std::fs::write(dir.join(name), &data).expect("write media file");
    data
}

/// One message in wire form, chunked at `chunksize`
pub fn wire_message(channel: u8, content_type: ContentType, payload: &[u8], chunksize: usize) -> Vec<u8> {
    let header = RtmpHeader::new(channel, HeaderSize::Twelve, payload.len(), content_type, FROM_CLIENT);
    merge(&header, payload, chunksize).expect("merge").into_vec()
}

pub struct TestServer {
    pub server: Arc<RtmpServer>,
    pub addr: SocketAddr,
    pub task: JoinHandle<cygnal::Result<()>>,
}

impl TestServer {
    pub fn url(&self, app: &str) -> String {
        format!("rtmp://{}:{}/{}", self.addr.ip(), self.addr.port(), app)
    }

    pub async fn stop(self) {
        self.server.shutdown();
        self.task.await.expect("server task").expect("server result");
    }
}

/// Start a server on a free local port serving `docroot`
pub async fn start_server(docroot: &Path) -> TestServer {
    let config = ServerConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .docroot(docroot)
        .read_timeout(Some(Duration::from_secs(10)))
        .build()
        .expect("server config");
    let server = Arc::new(RtmpServer::new(config));
    let listener = server.bind().await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let running = server.clone();
    let task = tokio::spawn(async move { running.serve(listener).await });
    TestServer { server, addr, task }
}

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use crate::server::cache::{Cache, SharedStream};
use crate::server::config::ServerConfig;
use crate::stream::DiskStream;
use crate::{Error, Result};

pub struct ServerContext {
    /// Server configuration
    config: Arc<ServerConfig>,

    /// Paths and open files shared by all connections
    cache: Arc<Cache>,

    /// Connection ID counter
    connection_counter: AtomicU64,

    live_connections: AtomicUsize,
}

/// Counts a connection as live until dropped
pub struct ConnectionGuard {
    context: Arc<ServerContext>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.context.live_connections.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ServerContext {
    /// Create new context with its own cache
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let cache = Arc::new(Cache::with_config(config.cache));
        ServerContext::with_cache(config, cache)
    }

    pub fn with_cache(config: Arc<ServerConfig>, cache: Arc<Cache>) -> Self {
        ServerContext {
            config,
            cache,
            connection_counter: AtomicU64::new(0),
            live_connections: AtomicUsize::new(0),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Generate unique connection ID
    pub fn generate_connection_id(&self) -> String {
        let id = self.connection_counter.fetch_add(1, Ordering::SeqCst);
        format!("conn-{}", id)
    }

    pub fn live_connections(&self) -> usize {
        self.live_connections.load(Ordering::SeqCst)
    }

    /// Count a new connection, refusing it when the server is full
    pub fn register(self: &Arc<Self>) -> Option<ConnectionGuard> {
        let max = self.config.max_connections;
        self.live_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live < max).then_some(live + 1)
            })
            .ok()?;
        Some(ConnectionGuard {
            context: self.clone(),
        })
    }

    /// Find the stream for a play request.
    ///
    /// The name is looked up in the path cache first, then under the
    /// docroot as given and with an `.flv` suffix. Opened files are kept in
    /// the file cache, so later requests share the same pages.
    pub fn resolve(&self, name: &str) -> Result<SharedStream> {
        let cached = self.cache.find_path(name);
        if !cached.is_empty() {
            if let Some(stream) = self.cache.find_file(&cached) {
                return Ok(stream);
            }
            return self.open_stream(name, PathBuf::from(cached));
        }

        let relative = Path::new(name.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::not_found(format!("Refusing stream name {}", name)));
        }

        let mut candidates = vec![self.config.docroot.join(relative)];
        if relative.extension().is_none() {
            candidates.push(self.config.docroot.join(relative).with_extension("flv"));
        }

        for candidate in candidates {
            let key = candidate.to_string_lossy().into_owned();
            if let Some(stream) = self.cache.find_file(&key) {
                self.cache.add_path(name, key);
                return Ok(stream);
            }
            if candidate.is_file() {
                return self.open_stream(name, candidate);
            }
        }

        Err(Error::not_found(format!("No stream named {}", name)))
    }

    fn open_stream(&self, name: &str, path: PathBuf) -> Result<SharedStream> {
        let key = path.to_string_lossy().into_owned();
        let shared = self.cache.find_or_open_file(key.as_str(), || {
            let mut stream = DiskStream::with_pagesize(self.config.pagesize);
            stream.open(&path)?;
            log::info!("Opened {} for stream {}", key, name);
            Ok(stream)
        })?;
        self.cache.add_path(name, key.clone());
        Ok(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn context_in(docroot: &Path, max_connections: usize) -> Arc<ServerContext> {
        let config = ServerConfig::builder()
            .docroot(docroot)
            .max_connections(max_connections)
            .build()
            .unwrap();
        Arc::new(ServerContext::new(Arc::new(config)))
    }

    #[test]
    fn test_connection_ids() {
        let context = context_in(Path::new("."), 10);
        assert_eq!(context.generate_connection_id(), "conn-0");
        assert_eq!(context.generate_connection_id(), "conn-1");
    }

    #[test]
    fn test_register_limits_connections() {
        let context = context_in(Path::new("."), 2);
        let first = context.register().unwrap();
        let _second = context.register().unwrap();
        assert!(context.register().is_none());
        assert_eq!(context.live_connections(), 2);

        drop(first);
        assert_eq!(context.live_connections(), 1);
        assert!(context.register().is_some());
    }

    #[test]
    fn test_resolve_shares_open_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clip.flv"), b"FLV\x01\x05").unwrap();
        let context = context_in(dir.path(), 10);

        let by_suffix = context.resolve("clip").unwrap();
        let by_name = context.resolve("clip.flv").unwrap();
        let again = context.resolve("clip").unwrap();
        assert!(Arc::ptr_eq(&by_suffix, &by_name));
        assert!(Arc::ptr_eq(&by_suffix, &again));
        assert_eq!(context.cache().file_count(), 1);
        assert_eq!(by_name.lock().unwrap().filesize(), 5);
    }

    #[test]
    fn test_concurrent_resolve_opens_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("race.flv"), b"FLV\x01\x05").unwrap();
        let context = context_in(dir.path(), 10);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let context = context.clone();
                std::thread::spawn(move || context.resolve("race").unwrap())
            })
            .collect();
        let streams: Vec<SharedStream> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(streams.iter().all(|s| Arc::ptr_eq(s, &streams[0])));
        assert_eq!(context.cache().file_count(), 1);
    }

    #[test]
    fn test_resolve_missing_and_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let context = context_in(dir.path(), 10);

        assert!(matches!(context.resolve("nothing"), Err(Error::NotFound(_))));
        assert!(matches!(context.resolve("../etc/passwd"), Err(Error::NotFound(_))));
        assert_eq!(context.cache().path_count(), 0);
    }
}

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use crate::stream::DiskStream;
use crate::Result;

/// A DiskStream handle shared between requests
pub type SharedStream = Arc<Mutex<DiskStream>>;

static DEFAULT_CACHE: OnceLock<Arc<Cache>> = OnceLock::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Most open files kept; `None` never evicts
    pub max_files: Option<usize>,
}

impl CacheConfig {
    pub fn unbounded() -> Self {
        CacheConfig { max_files: None }
    }

    pub fn bounded(max_files: usize) -> Self {
        CacheConfig {
            max_files: Some(max_files),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub path_hits: u64,
    pub path_misses: u64,
    pub response_hits: u64,
    pub response_misses: u64,
    pub file_hits: u64,
    pub file_misses: u64,
}

#[derive(Default)]
struct FileTable {
    files: HashMap<String, SharedStream>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

/// Lookup tables shared by every connection: resolved paths, canned
/// responses and open file streams.
///
/// A miss returns an empty value rather than an error.
pub struct Cache {
    config: CacheConfig,
    pathnames: Mutex<HashMap<String, String>>,
    responses: Mutex<HashMap<String, Vec<u8>>>,
    files: Mutex<FileTable>,
    stats: Mutex<CacheStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Cache {
    pub fn new() -> Self {
        Cache::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Cache {
            config,
            pathnames: Mutex::new(HashMap::new()),
            responses: Mutex::new(HashMap::new()),
            files: Mutex::new(FileTable::default()),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// The process-wide cache, created on first use
    pub fn default_instance() -> Arc<Cache> {
        DEFAULT_CACHE.get_or_init(|| Arc::new(Cache::new())).clone()
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn add_path(&self, name: impl Into<String>, fullpath: impl Into<String>) {
        lock(&self.pathnames).insert(name.into(), fullpath.into());
    }

    /// Resolved path for `name`, empty if unknown
    pub fn find_path(&self, name: &str) -> String {
        let found = lock(&self.pathnames).get(name).cloned();
        let mut stats = lock(&self.stats);
        match found {
            Some(path) => {
                stats.path_hits += 1;
                path
            }
            None => {
                stats.path_misses += 1;
                String::new()
            }
        }
    }

    pub fn remove_path(&self, name: &str) {
        lock(&self.pathnames).remove(name);
    }

    pub fn add_response(&self, name: impl Into<String>, response: impl Into<Vec<u8>>) {
        lock(&self.responses).insert(name.into(), response.into());
    }

    /// Canned response for `name`, empty if unknown
    pub fn find_response(&self, name: &str) -> Vec<u8> {
        let found = lock(&self.responses).get(name).cloned();
        let mut stats = lock(&self.stats);
        match found {
            Some(response) => {
                stats.response_hits += 1;
                response
            }
            None => {
                stats.response_misses += 1;
                Vec::new()
            }
        }
    }

    pub fn remove_response(&self, name: &str) {
        lock(&self.responses).remove(name);
    }

    /// Cache an open stream, evicting the oldest entry when full
    pub fn add_file(&self, name: impl Into<String>, stream: SharedStream) {
        let mut table = lock(&self.files);
        self.insert_file(&mut table, name.into(), stream);
    }

    /// The cached stream for `name`, or the one `open` returns after it is
    /// cached. The file table stays locked throughout, so concurrent first
    /// requests for a name open it once.
    pub fn find_or_open_file<F>(&self, name: impl Into<String>, open: F) -> Result<SharedStream>
    where
        F: FnOnce() -> Result<DiskStream>,
    {
        let name = name.into();
        let mut table = lock(&self.files);
        if let Some(found) = table.files.get(&name).cloned() {
            lock(&self.stats).file_hits += 1;
            return Ok(found);
        }
        lock(&self.stats).file_misses += 1;

        let shared = Arc::new(Mutex::new(open()?));
        self.insert_file(&mut table, name, shared.clone());
        Ok(shared)
    }

    fn insert_file(&self, table: &mut FileTable, name: String, stream: SharedStream) {
        if table.files.insert(name.clone(), stream).is_some() {
            table.order.retain(|n| n != &name);
        } else if let Some(max) = self.config.max_files {
            while table.files.len() > max.max(1) {
                let Some(oldest) = table.order.pop_front() else {
                    break;
                };
                log::debug!("Evicting {} from the file cache", oldest);
                table.files.remove(&oldest);
            }
        }
        table.order.push_back(name);
    }

    /// Wrap `stream` for sharing and cache it under `name`
    pub fn add_stream(&self, name: impl Into<String>, stream: DiskStream) -> SharedStream {
        let shared = Arc::new(Mutex::new(stream));
        self.add_file(name, shared.clone());
        shared
    }

    /// The shared stream for `name`. Every caller gets the same handle.
    pub fn find_file(&self, name: &str) -> Option<SharedStream> {
        let found = lock(&self.files).files.get(name).cloned();
        let mut stats = lock(&self.stats);
        if found.is_some() {
            stats.file_hits += 1;
        } else {
            stats.file_misses += 1;
        }
        found
    }

    pub fn remove_file(&self, name: &str) {
        let mut table = lock(&self.files);
        if table.files.remove(name).is_some() {
            table.order.retain(|n| n != name);
        }
    }

    pub fn path_count(&self) -> usize {
        lock(&self.pathnames).len()
    }

    pub fn response_count(&self) -> usize {
        lock(&self.responses).len()
    }

    pub fn file_count(&self) -> usize {
        lock(&self.files).files.len()
    }

    pub fn stats(&self) -> CacheStats {
        *lock(&self.stats)
    }

    pub fn clear(&self) {
        lock(&self.pathnames).clear();
        lock(&self.responses).clear();
        let mut table = lock(&self.files);
        table.files.clear();
        table.order.clear();
    }

    /// Log every table at debug level
    pub fn dump(&self) {
        for (name, path) in lock(&self.pathnames).iter() {
            log::debug!("Path {} => {}", name, path);
        }
        for (name, response) in lock(&self.responses).iter() {
            log::debug!("Response {} => {} bytes", name, response.len());
        }
        for name in lock(&self.files).order.iter() {
            log::debug!("File {}", name);
        }
        log::debug!("{:?}", self.stats());
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_path_table() {
        let cache = Cache::new();
        assert_eq!(cache.find_path("movie"), "");

        cache.add_path("movie", "/var/media/movie.flv");
        assert_eq!(cache.find_path("movie"), "/var/media/movie.flv");

        cache.remove_path("movie");
        assert_eq!(cache.find_path("movie"), "");

        let stats = cache.stats();
        assert_eq!(stats.path_hits, 1);
        assert_eq!(stats.path_misses, 2);
    }

    #[test]
    fn test_response_table() {
        let cache = Cache::new();
        cache.add_response("/index.html", b"HTTP/1.1 200 OK\r\n\r\n".to_vec());
        assert_eq!(cache.find_response("/index.html"), b"HTTP/1.1 200 OK\r\n\r\n");
        cache.remove_response("/index.html");
        assert!(cache.find_response("/index.html").is_empty());
    }

    #[test]
    fn test_file_table_shares_handle() {
        let cache = Cache::new();
        let stream = cache.add_stream("a", DiskStream::from_data("a", b"abc".to_vec()));

        let found = cache.find_file("a").unwrap();
        assert!(Arc::ptr_eq(&stream, &found));

        cache.remove_file("a");
        assert!(cache.find_file("a").is_none());
        // outstanding handles stay usable
        assert_eq!(found.lock().unwrap().filesize(), 3);
    }

    #[test]
    fn test_unbounded_by_default() {
        let cache = Cache::new();
        for i in 0..100 {
            cache.add_stream(format!("f{}", i), DiskStream::new());
        }
        assert_eq!(cache.file_count(), 100);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let cache = Cache::with_config(CacheConfig::bounded(2));
        cache.add_stream("a", DiskStream::new());
        cache.add_stream("b", DiskStream::new());
        // replacing keeps the count
        cache.add_stream("a", DiskStream::new());
        assert_eq!(cache.file_count(), 2);

        cache.add_stream("c", DiskStream::new());
        assert_eq!(cache.file_count(), 2);
        assert!(cache.find_file("b").is_none());
        assert!(cache.find_file("a").is_some());
        assert!(cache.find_file("c").is_some());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(Cache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for j in 0..50 {
                        let name = format!("{}-{}", i, j);
                        cache.add_path(name.clone(), format!("/media/{}", name));
                        assert!(!cache.find_path(&name).is_empty());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.path_count(), 400);
    }

    #[test]
    fn test_concurrent_first_open_happens_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;

        let cache = Arc::new(Cache::new());
        let opens = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let (cache, opens, barrier) = (cache.clone(), opens.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .find_or_open_file("movie.flv", || {
                            opens.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(10));
                            Ok(DiskStream::new())
                        })
                        .unwrap()
                })
            })
            .collect();
        let streams: Vec<SharedStream> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(streams.iter().all(|s| Arc::ptr_eq(s, &streams[0])));
        assert_eq!(cache.file_count(), 1);
        assert_eq!(cache.stats().file_misses, 1);
        assert_eq!(cache.stats().file_hits, 7);
    }

    #[test]
    fn test_failed_open_is_not_cached() {
        let cache = Cache::new();
        let result = cache.find_or_open_file("gone.flv", || {
            Err(crate::Error::not_found("gone.flv"))
        });
        assert!(result.is_err());
        assert_eq!(cache.file_count(), 0);
    }

    #[test]
    fn test_default_instance_is_shared() {
        let a = Cache::default_instance();
        let b = Cache::default_instance();
        assert!(Arc::ptr_eq(&a, &b));
    }
}

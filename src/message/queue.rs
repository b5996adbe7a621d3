use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use crate::Buffer;

/// Thread-safe FIFO of buffers with a condition variable for a
/// producer/consumer handoff.
///
/// One queue exists per channel, plus one for raw reads that have not been
/// demultiplexed yet.
#[derive(Debug, Default)]
pub struct CQue {
    /// Name used in log output
    name: String,

    que: Mutex<VecDeque<Buffer>>,

    cond: Condvar,
}

impl CQue {
    pub fn new() -> Self {
        CQue::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        CQue {
            name: name.into(),
            ..CQue::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Buffer>> {
        self.que.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a buffer and wake any waiter
    pub fn push(&self, buf: Buffer) {
        self.lock().push_back(buf);
        self.cond.notify_all();
    }

    /// Remove the oldest buffer, `None` when empty. Never blocks.
    pub fn pop(&self) -> Option<Buffer> {
        self.lock().pop_front()
    }

    /// Copy of the oldest buffer, left in place
    pub fn peek(&self) -> Option<Buffer> {
        self.lock().front().cloned()
    }

    /// Run `f` on the newest buffer in place.
    ///
    /// Used to keep filling a message that arrives in several fragments.
    pub fn with_back<R>(&self, f: impl FnOnce(&mut Buffer) -> R) -> Option<R> {
        self.lock().back_mut().map(f)
    }

    pub fn size(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Concatenate every queued buffer into one, which replaces them.
    ///
    /// Returns a copy of the merged buffer, or `None` if the queue was empty.
    pub fn merge(&self) -> Option<Buffer> {
        let mut que = self.lock();
        if que.is_empty() {
            return None;
        }
        let total = que.iter().map(Buffer::len).sum();
        let mut merged = Buffer::with_size(total);
        for buf in que.drain(..) {
            merged.append(buf.as_slice());
        }
        que.push_back(merged.clone());
        Some(merged)
    }

    /// Block until the queue holds data or `notify()` is called
    pub fn wait(&self) {
        let que = self.lock();
        if que.is_empty() {
            let _que = self.cond.wait(que).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like `wait()` with an upper bound. Returns true if data is queued.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let que = self.lock();
        let (que, _) = self
            .cond
            .wait_timeout_while(que, timeout, |que| que.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        !que.is_empty()
    }

    /// Wake every thread blocked in `wait()`
    pub fn notify(&self) {
        self.cond.notify_all();
    }

    /// Log the queue contents at debug level
    pub fn dump(&self) {
        let que = self.lock();
        log::debug!("CQue '{}' has {} buffers", self.name, que.len());
        for (i, buf) in que.iter().enumerate() {
            log::debug!("  {}: {} bytes", i, buf.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let que = CQue::with_name("test");
        que.push(Buffer::from_slice(b"one"));
        que.push(Buffer::from_slice(b"two"));

        assert_eq!(que.size(), 2);
        assert_eq!(que.peek().unwrap().as_slice(), b"one");
        assert_eq!(que.pop().unwrap().as_slice(), b"one");
        assert_eq!(que.pop().unwrap().as_slice(), b"two");
        assert!(que.pop().is_none());
    }

    #[test]
    fn test_with_back_appends_in_place() {
        let que = CQue::new();
        assert!(que.with_back(|buf| buf.len()).is_none());

        que.push(Buffer::from_slice(b"ab"));
        que.with_back(|buf| buf.append(b"cd"));
        assert_eq!(que.pop().unwrap().as_slice(), b"abcd");
    }

    #[test]
    fn test_merge() {
        let que = CQue::new();
        assert!(que.merge().is_none());

        que.push(Buffer::from_slice(b"con"));
        que.push(Buffer::from_slice(b"nect"));
        let merged = que.merge().unwrap();

        assert_eq!(merged.as_slice(), b"connect");
        assert_eq!(que.size(), 1);
        assert_eq!(que.pop().unwrap().as_slice(), b"connect");
    }

    #[test]
    fn test_clear() {
        let que = CQue::new();
        que.push(Buffer::from_slice(b"x"));
        que.clear();
        assert!(que.is_empty());
    }

    #[test]
    fn test_wait_wakes_on_push() {
        let que = Arc::new(CQue::new());
        let producer = {
            let que = que.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                que.push(Buffer::from_slice(b"data"));
            })
        };

        assert!(que.wait_timeout(Duration::from_secs(5)));
        assert_eq!(que.pop().unwrap().as_slice(), b"data");
        producer.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires() {
        let que = CQue::new();
        assert!(!que.wait_timeout(Duration::from_millis(10)));
    }
}

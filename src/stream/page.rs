use std::fmt;
use std::fs::File;
use std::io;
use std::sync::Arc;
use memmap2::{Mmap, MmapOptions};

#[derive(Clone)]
enum PageData {
    Mapped(Arc<Mmap>),
    Memory(Arc<[u8]>),
}

/// A window of file data starting at a byte offset.
///
/// Mapped pages are unmapped when the last clone is dropped.
#[derive(Clone)]
pub struct Page {
    start: usize,
    data: PageData,
}

impl Page {
    /// Map `len` bytes of `file` read-only, starting at `start`
    pub fn map(file: &File, start: usize, len: usize) -> io::Result<Page> {
        if len == 0 {
            return Ok(Page::from_vec(start, Vec::new()));
        }
        // The file is opened read-only by us; truncation underneath the
        // mapping by another process is not guarded against.
        let mmap = unsafe { MmapOptions::new().offset(start as u64).len(len).map(file)? };
        Ok(Page {
            start,
            data: PageData::Mapped(Arc::new(mmap)),
        })
    }

    pub fn from_vec(start: usize, data: Vec<u8>) -> Page {
        Page {
            start,
            data: PageData::Memory(data.into()),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// File offset one past the last byte held
    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.data, PageData::Mapped(_))
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.data {
            PageData::Mapped(mmap) => &mmap[..],
            PageData::Memory(bytes) => &bytes[..],
        }
    }

    /// Data from file offset `offset` to the end of the page
    pub fn slice_from(&self, offset: usize) -> Option<&[u8]> {
        let at = offset.checked_sub(self.start)?;
        self.as_slice().get(at..)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("start", &self.start)
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_map_window() {
        let mut file = tempfile::tempfile().unwrap();
        let data: Vec<u8> = (0..8192u32).map(|i| (i % 256) as u8).collect();
        file.write_all(&data).unwrap();

        let page = Page::map(&file, 4096, 1000).unwrap();
        assert!(page.is_mapped());
        assert_eq!(page.len(), 1000);
        assert_eq!(page.end(), 5096);
        assert!(page.contains(4096));
        assert!(!page.contains(5096));
        assert_eq!(page.slice_from(4100).unwrap()[0], data[4100]);
        assert!(page.slice_from(100).is_none());
    }

    #[test]
    fn test_memory_page() {
        let page = Page::from_vec(0, b"hello".to_vec());
        assert!(!page.is_mapped());
        assert_eq!(page.slice_from(1).unwrap(), b"ello");
        assert_eq!(page.slice_from(5).unwrap(), b"");
        assert!(page.slice_from(6).is_none());
    }
}

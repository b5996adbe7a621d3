use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use crate::stream::file_type::FileType;
use crate::stream::page::Page;
use crate::{Error, Result};

/// Default bytes per page
pub const DEFAULT_PAGESIZE: usize = 4096;

/// Files up to this many pages are held in memory whole
pub const MAX_PAGES: usize = 2560;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    NoState,
    Created,
    Closed,
    Open,
    Play,
    Preview,
    Thumbnail,
    Pause,
    Seek,
    Upload,
    Multicast,
    Done,
}

/// A file served a page at a time.
///
/// Small files are mapped whole on first access; larger ones are mapped
/// one page-sized window at a time. Closing releases the file handle but
/// keeps the current page, so the stream can be replayed without another
/// stat.
#[derive(Debug)]
pub struct DiskStream {
    filespec: PathBuf,
    filesize: usize,
    filetype: FileType,

    pagesize: usize,
    max_memload: usize,

    /// Next byte to send
    offset: usize,
    state: StreamState,

    file: Option<File>,
    page: Option<Page>,

    accesses: usize,
    bytes_sent: usize,
    first_access: Option<DateTime<Local>>,
    last_access: Option<DateTime<Local>>,
}

impl DiskStream {
    pub fn new() -> Self {
        DiskStream::with_pagesize(DEFAULT_PAGESIZE)
    }

    pub fn with_pagesize(pagesize: usize) -> Self {
        let pagesize = pagesize.max(1);
        DiskStream {
            filespec: PathBuf::new(),
            filesize: 0,
            filetype: FileType::None,
            pagesize,
            max_memload: pagesize * MAX_PAGES,
            offset: 0,
            state: StreamState::NoState,
            file: None,
            page: None,
            accesses: 0,
            bytes_sent: 0,
            first_access: None,
            last_access: None,
        }
    }

    /// Wrap data that is already in memory, e.g. an upload
    pub fn from_data(name: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        let mut stream = DiskStream::new();
        stream.filespec = name.into();
        stream.filesize = data.len();
        stream.filetype = match FileType::from_path(&stream.filespec) {
            FileType::None => FileType::sniff(&data),
            known => known,
        };
        stream.page = Some(Page::from_vec(0, data));
        stream.state = StreamState::Created;
        stream
    }

    /// Whole-file threshold, for streams that should always be windowed
    pub fn set_max_memload(&mut self, size: usize) {
        self.max_memload = size;
    }

    pub fn filespec(&self) -> &Path {
        &self.filespec
    }

    pub fn filesize(&self) -> usize {
        self.filesize
    }

    pub fn filetype(&self) -> FileType {
        self.filetype
    }

    pub fn pagesize(&self) -> usize {
        self.pagesize
    }

    pub fn max_memload(&self) -> usize {
        self.max_memload
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn accesses(&self) -> usize {
        self.accesses
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn first_access(&self) -> Option<DateTime<Local>> {
        self.first_access
    }

    pub fn last_access(&self) -> Option<DateTime<Local>> {
        self.last_access
    }

    /// File offset of the page currently in memory
    pub fn page_start(&self) -> Option<usize> {
        self.page.as_ref().map(Page::start)
    }

    pub fn is_file_open(&self) -> bool {
        self.file.is_some()
    }

    /// True when the whole file is in memory
    pub fn fully_populated(&self) -> bool {
        self.page
            .as_ref()
            .is_some_and(|page| page.start() == 0 && page.len() == self.filesize)
    }

    fn touch(&mut self) {
        let now = Local::now();
        self.first_access.get_or_insert(now);
        self.last_access = Some(now);
    }

    fn is_same_file(&self, path: &Path) -> bool {
        !self.filespec.as_os_str().is_empty()
            && (self.filespec == path || self.filespec == path.join("index.html"))
    }

    /// Open `path` for streaming.
    ///
    /// A directory serves its `index.html`. Reopening the file this stream
    /// already knows skips the stat; the handle is reacquired on demand.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.is_same_file(path) {
            match self.state {
                StreamState::Open => {
                    self.accesses += 1;
                    self.touch();
                    return Ok(());
                }
                StreamState::Created | StreamState::Closed | StreamState::Done => {
                    log::debug!("Reopening {}", self.filespec.display());
                    self.state = StreamState::Open;
                    self.accesses += 1;
                    self.touch();
                    return Ok(());
                }
                _ => {}
            }
        }

        let mut filespec = path.to_path_buf();
        let mut meta = self.stat(&filespec)?;
        if meta.is_dir() {
            log::debug!("{} is a directory, appending index.html", filespec.display());
            filespec.push("index.html");
            meta = self.stat(&filespec)?;
        }

        let file = match File::open(&filespec) {
            Ok(file) => file,
            Err(e) => {
                self.state = StreamState::Done;
                return Err(Error::not_found(format!("{}: {}", filespec.display(), e)));
            }
        };

        self.filetype = FileType::from_path(&filespec);
        self.filespec = filespec;
        self.filesize = meta.len() as usize;
        self.file = Some(file);
        self.page = None;
        self.offset = 0;
        self.bytes_sent = 0;
        self.state = StreamState::Open;
        self.accesses = 1;
        self.first_access = None;
        self.touch();

        log::debug!(
            "Opened {}, {} bytes",
            self.filespec.display(),
            self.filesize
        );

        let sniffed = self.load_to_mem(0).map(FileType::sniff);
        if self.filetype == FileType::None {
            self.filetype = sniffed.unwrap_or_default();
        }
        Ok(())
    }

    fn stat(&mut self, path: &Path) -> Result<fs::Metadata> {
        fs::metadata(path).map_err(|e| {
            log::error!("File {} doesn't exist: {}", path.display(), e);
            self.state = StreamState::Done;
            self.filetype = FileType::None;
            Error::not_found(format!("{}: {}", path.display(), e))
        })
    }

    /// Bring the page holding `offset` into memory and return the data
    /// from `offset` to the end of that page.
    ///
    /// `None` means the data can't be served; the reason has been logged.
    pub fn load_to_mem(&mut self, offset: usize) -> Option<&[u8]> {
        if offset > self.filesize {
            log::error!(
                "Offset {} is past the end of {} ({} bytes)",
                offset,
                self.filespec.display(),
                self.filesize
            );
            return None;
        }

        let resident = self.fully_populated()
            || self.page.as_ref().is_some_and(|page| page.contains(offset));
        if !resident {
            self.map_page(offset)?;
        }
        self.page.as_ref().and_then(|page| page.slice_from(offset))
    }

    fn map_page(&mut self, offset: usize) -> Option<()> {
        let (start, len) = if self.filesize <= self.max_memload {
            log::debug!("Loading entire file of {} bytes", self.filesize);
            (0, self.filesize)
        } else {
            let start = offset - offset % self.pagesize;
            (start, self.pagesize.min(self.filesize - start))
        };

        // unmap the old page before mapping the next
        self.page = None;

        if self.file.is_none() {
            match File::open(&self.filespec) {
                Ok(file) => self.file = Some(file),
                Err(e) => {
                    log::error!("Couldn't load file {}: {}", self.filespec.display(), e);
                    return None;
                }
            }
        }
        let file = self.file.as_ref()?;

        match Page::map(file, start, len) {
            Ok(page) => {
                log::trace!("{} mapped at {}, {} bytes", self.filespec.display(), start, len);
                self.page = Some(page);
            }
            Err(e) => {
                log::error!(
                    "Couldn't map file {} into memory: {}",
                    self.filespec.display(),
                    e
                );
                return None;
            }
        }
        self.last_access = Some(Local::now());

        if self.fully_populated() {
            // nothing left to read from disk
            self.file = None;
        }
        Some(())
    }

    /// Send the file to `out` a page at a time.
    ///
    /// With `entire` false only one page is sent per call. At end of file
    /// the stream is closed and rewound; playing it again starts over.
    pub fn play<W: Write>(&mut self, out: &mut W, entire: bool) -> Result<usize> {
        let mut sent = 0;
        loop {
            match self.state {
                StreamState::NoState => {
                    return Err(Error::invalid_state("No DiskStream open"));
                }
                StreamState::Created | StreamState::Closed => {
                    log::debug!("DiskStream {} is closed", self.filespec.display());
                    return Ok(sent);
                }
                StreamState::Open => {
                    self.offset = 0;
                    self.state = StreamState::Play;
                }
                // resume from the position seeked to
                StreamState::Seek => self.state = StreamState::Play,
                StreamState::Done => {
                    log::debug!("Restarting DiskStream {} from the beginning", self.filespec.display());
                    self.offset = 0;
                    self.state = StreamState::Play;
                }
                StreamState::Play => {
                    let offset = self.offset;
                    let len = self.pagesize.min(self.filesize - offset);
                    let Some(data) = self.load_to_mem(offset) else {
                        return Err(Error::stream(format!("Can't load data at offset {}", offset)));
                    };
                    let chunk = &data[..len.min(data.len())];
                    out.write_all(chunk)?;
                    let n = chunk.len();

                    self.offset += n;
                    self.bytes_sent += n;
                    sent += n;

                    if self.offset >= self.filesize {
                        log::debug!(
                            "Done playing file {}, size was: {}",
                            self.filespec.display(),
                            self.filesize
                        );
                        self.close();
                        self.offset = 0;
                        self.state = StreamState::Done;
                        return Ok(sent);
                    }
                    if !entire {
                        return Ok(sent);
                    }
                }
                StreamState::Preview
                | StreamState::Thumbnail
                | StreamState::Pause
                | StreamState::Upload
                | StreamState::Multicast => return Ok(sent),
            }
        }
    }

    /// Move to `offset` and return the data from there to the page end
    pub fn seek(&mut self, offset: usize) -> Option<&[u8]> {
        self.state = StreamState::Seek;
        self.offset = offset.min(self.filesize);
        self.load_to_mem(offset)
    }

    pub fn pause(&mut self) {
        self.state = StreamState::Pause;
    }

    /// Frames sampled across the file; only the state is tracked
    pub fn preview(&mut self, frames: usize) {
        log::debug!("Preview of {} frames requested", frames);
        self.state = StreamState::Preview;
    }

    pub fn thumbnail(&mut self, quantity: usize) {
        log::debug!("{} thumbnails requested", quantity);
        self.state = StreamState::Thumbnail;
    }

    pub fn upload(&mut self) {
        self.state = StreamState::Upload;
    }

    pub fn multicast(&mut self) {
        self.state = StreamState::Multicast;
    }

    /// Release the file handle, keeping the page and counters
    pub fn close(&mut self) {
        log::debug!("Closing {}", self.filespec.display());
        self.file = None;
        self.state = StreamState::Closed;
    }

    /// Write the whole stream to `path`
    pub fn write_to_disk(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::debug!("Writing {} bytes to disk: {}", self.filesize, path.display());
        let mut out = File::create(path)?;

        let mut offset = 0;
        while offset < self.filesize {
            let len = self.pagesize.min(self.filesize - offset);
            let Some(data) = self.load_to_mem(offset) else {
                return Err(Error::stream(format!("Can't load data at offset {}", offset)));
            };
            let chunk = &data[..len.min(data.len())];
            out.write_all(chunk)?;
            offset += chunk.len();
            if chunk.is_empty() {
                break;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// A stream over the same file with its own position.
    ///
    /// The page in memory is shared, the file handle is not.
    pub fn fork(&self) -> DiskStream {
        let state = match self.state {
            StreamState::NoState => StreamState::NoState,
            _ => StreamState::Open,
        };
        DiskStream {
            filespec: self.filespec.clone(),
            filesize: self.filesize,
            filetype: self.filetype,
            pagesize: self.pagesize,
            max_memload: self.max_memload,
            offset: 0,
            state,
            file: None,
            page: self.page.clone(),
            accesses: 0,
            bytes_sent: 0,
            first_access: None,
            last_access: self.last_access,
        }
    }

    /// Log the stream's fields at debug level
    pub fn dump(&self) {
        log::debug!("DiskStream {}:", self.filespec.display());
        log::debug!(
            "  state {:?}, type {:?}, {} bytes, pagesize {}, offset {}",
            self.state,
            self.filetype,
            self.filesize,
            self.pagesize,
            self.offset
        );
        log::debug!("  page {:?}, file open: {}", self.page, self.file.is_some());
        log::debug!(
            "  {} accesses, {} bytes sent, last access {:?}",
            self.accesses,
            self.bytes_sent,
            self.last_access
        );
    }
}

impl Default for DiskStream {
    fn default() -> Self {
        Self::new()
    }
}

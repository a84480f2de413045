//! Seekable, cached byte sources that every format parser and codec reads
//! through.
//!
//! [`Streamfile`] is deliberately narrow: `read`/`size`/`name`/`open`. Parsers
//! never touch [`std::fs`] or a slice directly — they go through this trait so
//! the same code works whether the backing bytes are a real file, an
//! in-memory buffer, or a caller-supplied custom I/O shim.

mod decorate;
mod error;

use std::{
    fmt::Debug,
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::Arc,
};

pub use decorate::{ClampStreamfile, FakeNameStreamfile, IoStreamfile, WrapStreamfile};
pub use error::{StreamfileError, StreamfileErrorKind};

/// An abstract, randomly-readable byte source.
///
/// Implementations must be cheap to reopen: [`Stream`](crate::stream::Stream)
/// opens one independent `Streamfile` per channel, so `open` is called
/// frequently and must hand back a handle with its own cursor/buffer rather
/// than sharing mutable state with the original.
pub trait Streamfile: Debug {
    /// Reads up to `dst.len()` bytes at absolute `offset`, returning the
    /// number of bytes actually read. A short read only happens at or past
    /// [`size`](Streamfile::size); callers never observe a partial read in
    /// the middle of the stream. `0` means EOF or an unrecoverable error —
    /// `Streamfile` does not distinguish between the two.
    fn read(&mut self, dst: &mut [u8], offset: u64) -> usize;

    /// Total size of the underlying data, in bytes.
    fn size(&self) -> u64;

    /// An opaque, path-like name for this streamfile. Stable for the
    /// streamfile's lifetime; parsers compare extensions against it and
    /// derive sibling names from it.
    fn name(&self) -> &str;

    /// Opens a sibling streamfile relative to this one's `name`. Passing the
    /// current name back yields an independent reopen of the same
    /// underlying data with a fresh cursor and buffer. Returns `None` if no
    /// such file exists.
    fn open(&self, name: &str) -> Option<Box<dyn Streamfile>>;
}

const PAGE_SIZE: usize = 4096;

#[derive(Debug, Default)]
struct PageCache {
    offset: u64,
    data: Vec<u8>,
}

impl PageCache {
    /// Serves `dst` from the cache if possible, refilling via `refill` on a
    /// miss. `refill(offset, buf)` must fill as much of `buf` as the
    /// underlying source has available starting at `offset` and return the
    /// number of bytes written.
    fn read(
        &mut self,
        dst: &mut [u8],
        offset: u64,
        mut refill: impl FnMut(u64, &mut [u8]) -> usize,
    ) -> usize {
        let in_cache = !self.data.is_empty()
            && offset >= self.offset
            && offset - self.offset + dst.len() as u64 <= self.data.len() as u64;

        if in_cache {
            let start = (offset - self.offset) as usize;
            dst.copy_from_slice(&self.data[start..start + dst.len()]);
            return dst.len();
        }

        // large reads bypass the page cache entirely; small ones refill a page
        // anchored at `offset` so nearby sequential reads hit the cache next time.
        if dst.len() > PAGE_SIZE {
            return refill(offset, dst);
        }

        self.data.resize(PAGE_SIZE, 0);
        let filled = refill(offset, &mut self.data);
        self.data.truncate(filled);
        self.offset = offset;

        let available = self.data.len().min(dst.len());
        dst[..available].copy_from_slice(&self.data[..available]);
        available
    }
}

/// A [`Streamfile`] backed by an in-memory byte buffer.
///
/// `open` only supports reopening this same buffer under the name it
/// already carries (an independent clone with a fresh cursor) — suitable for
/// tests and for callers who hand over a single blob with no siblings.
#[derive(Debug, Clone)]
pub struct SliceFile {
    data: Arc<[u8]>,
    name: String,
}

impl SliceFile {
    /// Wraps `data` as a streamfile reporting `name`.
    pub fn new(data: impl Into<Arc<[u8]>>, name: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            name: name.into(),
        }
    }
}

impl Streamfile for SliceFile {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> usize {
        let offset = offset as usize;
        if offset >= self.data.len() {
            return 0;
        }
        let available = &self.data[offset..];
        let n = available.len().min(dst.len());
        dst[..n].copy_from_slice(&available[..n]);
        n
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, name: &str) -> Option<Box<dyn Streamfile>> {
        if name == self.name {
            Some(Box::new(self.clone()))
        } else {
            None
        }
    }
}

/// A [`Streamfile`] backed by a real file on disk, with a small page cache in
/// front of it and sibling lookups resolved relative to its directory.
#[derive(Debug)]
pub struct FileStreamfile {
    file: File,
    path: PathBuf,
    size: u64,
    cache: PageCache,
}

impl FileStreamfile {
    /// Opens `path` as a streamfile.
    ///
    /// # Errors
    ///
    /// Returns [`StreamfileErrorKind::Open`] if the file cannot be opened or
    /// its length cannot be determined.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamfileError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(StreamfileError::factory(StreamfileErrorKind::Open))?;
        let size = file
            .metadata()
            .map_err(StreamfileError::factory(StreamfileErrorKind::Open))?
            .len();

        Ok(Self {
            file,
            path,
            size,
            cache: PageCache::default(),
        })
    }
}

impl Streamfile for FileStreamfile {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> usize {
        let file = &mut self.file;
        self.cache.read(dst, offset, |offset, buf| {
            if file.seek(SeekFrom::Start(offset)).is_err() {
                return 0;
            }
            let mut total = 0;
            while total < buf.len() {
                match file.read(&mut buf[total..]) {
                    Ok(0) => break,
                    Ok(n) => total += n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            total
        })
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn name(&self) -> &str {
        self.path.to_str().unwrap_or_default()
    }

    fn open(&self, name: &str) -> Option<Box<dyn Streamfile>> {
        let sibling = if name == self.name() {
            self.path.clone()
        } else {
            self.path.parent().map_or_else(|| PathBuf::from(name), |dir| dir.join(name))
        };

        Self::open(sibling).ok().map(|sf| Box::new(sf) as Box<dyn Streamfile>)
    }
}

/// Wraps `sf` as an independent streamfile presenting only the `size` bytes
/// starting at `offset`, with its name overridden to `fake_ext` for format
/// dispatch on the resulting bytes.
///
/// This is the composition every "subfile container" format parser needs
/// (acx, subsong containers wrapping an embedded known format): it builds a
/// streamfile the registry can probe as if it were a standalone file.
#[must_use]
pub fn setup_subfile(
    sf: &dyn Streamfile,
    offset: u64,
    size: u64,
    fake_ext: &str,
) -> Box<dyn Streamfile> {
    let base_name = sf.name().to_string();
    let clamped = ClampStreamfile::new(sf.open(&base_name).unwrap_or_else(|| {
        panic!("streamfile must support reopening its own name: {base_name}")
    }), offset, size);
    Box::new(FakeNameStreamfile::new(Box::new(clamped), fake_ext))
}

#[cfg(test)]
mod test {
    use super::{SliceFile, Streamfile};

    #[test]
    fn slice_file_reads_in_bounds() {
        let mut sf = SliceFile::new(*b"hello world", "test.bin");
        let mut buf = [0u8; 5];
        assert_eq!(sf.read(&mut buf, 6), 5);
        assert_eq!(&buf, b"world");
    }

    #[test]
    fn slice_file_short_read_at_eof() {
        let mut sf = SliceFile::new(*b"hello", "test.bin");
        let mut buf = [0u8; 10];
        assert_eq!(sf.read(&mut buf, 2), 3);
        assert_eq!(&buf[..3], b"llo");
    }

    #[test]
    fn slice_file_past_end_is_zero() {
        let mut sf = SliceFile::new(*b"hello", "test.bin");
        let mut buf = [0u8; 4];
        assert_eq!(sf.read(&mut buf, 100), 0);
    }

    #[test]
    fn slice_file_reopens_by_name() {
        let sf = SliceFile::new(*b"hello", "test.bin");
        assert!(sf.open("test.bin").is_some());
        assert!(sf.open("other.bin").is_none());
    }
}

//! Composable [`Streamfile`] adapters.
//!
//! These mirror the handful of decorations `libvgmstream_streamfile_t`
//! callers lean on: sharing ownership, presenting a clamped sub-range,
//! overriding the reported name, and interposing a per-read transform (for
//! decryption layers like HCA/AHX).

use super::Streamfile;
use std::{cell::RefCell, fmt, rc::Rc};

/// Forwards every call to a shared inner streamfile.
///
/// Useful when several consumers need their own `Streamfile` handle but the
/// underlying cache/cursor should be shared rather than duplicated.
#[derive(Debug)]
pub struct WrapStreamfile {
    inner: Rc<RefCell<Box<dyn Streamfile>>>,
    // cached at construction: `name()` must be stable for the streamfile's
    // lifetime, so borrowing through the `RefCell` on every call isn't needed.
    name: String,
}

impl WrapStreamfile {
    /// Wraps `inner` for shared access.
    pub fn new(inner: Box<dyn Streamfile>) -> Self {
        let name = inner.name().to_string();
        Self {
            inner: Rc::new(RefCell::new(inner)),
            name,
        }
    }
}

impl Clone for WrapStreamfile {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            name: self.name.clone(),
        }
    }
}

impl Streamfile for WrapStreamfile {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> usize {
        self.inner.borrow_mut().read(dst, offset)
    }

    fn size(&self) -> u64 {
        self.inner.borrow().size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, name: &str) -> Option<Box<dyn Streamfile>> {
        self.inner.borrow().open(name)
    }
}

/// Presents a sub-range `[offset, offset + size)` of an inner streamfile as
/// an independent streamfile with its own, zero-based addressing.
#[derive(Debug)]
pub struct ClampStreamfile {
    inner: Box<dyn Streamfile>,
    offset: u64,
    size: u64,
}

impl ClampStreamfile {
    /// Clamps `inner` to `size` bytes starting at `offset`.
    #[must_use]
    pub fn new(inner: Box<dyn Streamfile>, offset: u64, size: u64) -> Self {
        Self { inner, offset, size }
    }
}

impl Streamfile for ClampStreamfile {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> usize {
        if offset >= self.size {
            return 0;
        }
        let remaining = (self.size - offset) as usize;
        let len = dst.len().min(remaining);
        self.inner.read(&mut dst[..len], self.offset + offset)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open(&self, name: &str) -> Option<Box<dyn Streamfile>> {
        if name == self.inner.name() {
            Some(Box::new(ClampStreamfile {
                inner: self.inner.open(name)?,
                offset: self.offset,
                size: self.size,
            }))
        } else {
            self.inner.open(name)
        }
    }
}

/// Overrides the reported `name` of an inner streamfile, so parsers that
/// dispatch by extension see a synthetic one.
#[derive(Debug)]
pub struct FakeNameStreamfile {
    inner: Box<dyn Streamfile>,
    name: String,
}

impl FakeNameStreamfile {
    /// Wraps `inner`, reporting `fake_ext` as its extension (the base name is
    /// kept, only the extension is swapped).
    #[must_use]
    pub fn new(inner: Box<dyn Streamfile>, fake_ext: &str) -> Self {
        let base = inner.name();
        let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);
        let name = format!("{stem}.{fake_ext}");
        Self { inner, name }
    }
}

impl Streamfile for FakeNameStreamfile {
    fn read(&mut self, dst: &mut [u8], offset: u64) -> usize {
        self.inner.read(dst, offset)
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, name: &str) -> Option<Box<dyn Streamfile>> {
        if name == self.name {
            Some(Box::new(FakeNameStreamfile {
                inner: self.inner.open(self.inner.name())?,
                name: self.name.clone(),
            }))
        } else {
            self.inner.open(name)
        }
    }
}

/// Interposes a per-read transform over an inner streamfile's bytes, for
/// decryption/de-obfuscation layers (HCA's XOR cipher, AHX scrambling) that
/// should be transparent to the decoder reading through this streamfile.
pub struct IoStreamfile<F> {
    inner: Box<dyn Streamfile>,
    transform: F,
}

impl<F> IoStreamfile<F>
where
    F: FnMut(u64, &mut [u8]) + Clone,
{
    /// Wraps `inner`, applying `transform(offset, buf)` to every read's
    /// output in place before returning it to the caller.
    pub fn new(inner: Box<dyn Streamfile>, transform: F) -> Self {
        Self { inner, transform }
    }
}

impl<F> fmt::Debug for IoStreamfile<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoStreamfile").field("name", &self.inner.name()).finish()
    }
}

impl<F> Streamfile for IoStreamfile<F>
where
    F: FnMut(u64, &mut [u8]) + Clone + 'static,
{
    fn read(&mut self, dst: &mut [u8], offset: u64) -> usize {
        let n = self.inner.read(dst, offset);
        (self.transform)(offset, &mut dst[..n]);
        n
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open(&self, name: &str) -> Option<Box<dyn Streamfile>> {
        Some(Box::new(IoStreamfile {
            inner: self.inner.open(name)?,
            transform: self.transform.clone(),
        }))
    }
}

#[cfg(test)]
mod test {
    use super::{ClampStreamfile, FakeNameStreamfile, IoStreamfile};
    use crate::streamfile::{SliceFile, Streamfile};

    #[test]
    fn clamp_presents_sub_range() {
        let sf: Box<dyn Streamfile> = Box::new(SliceFile::new(*b"0123456789", "a.bin"));
        let mut clamped = ClampStreamfile::new(sf, 3, 4);
        assert_eq!(clamped.size(), 4);

        let mut buf = [0u8; 4];
        assert_eq!(clamped.read(&mut buf, 0), 4);
        assert_eq!(&buf, b"3456");
        assert_eq!(clamped.read(&mut buf, 4), 0);
    }

    #[test]
    fn fake_name_overrides_extension() {
        let sf: Box<dyn Streamfile> = Box::new(SliceFile::new(*b"data", "song.acx"));
        let renamed = FakeNameStreamfile::new(sf, "adx");
        assert_eq!(renamed.name(), "song.adx");
    }

    #[test]
    fn io_transform_applies_to_output() {
        let sf: Box<dyn Streamfile> = Box::new(SliceFile::new([0u8; 4], "enc.bin"));
        let mut decrypted = IoStreamfile::new(sf, |_offset, buf| {
            for b in buf {
                *b ^= 0xFF;
            }
        });

        let mut buf = [0u8; 4];
        decrypted.read(&mut buf, 0);
        assert_eq!(buf, [0xFF; 4]);
    }
}

use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::Error as IoError,
};

/// Error produced by a [`Streamfile`](super::Streamfile) backed by fallible I/O
/// (e.g. [`FileStreamfile`](super::FileStreamfile)).
#[derive(Debug)]
pub struct StreamfileError {
    kind: StreamfileErrorKind,
    source: Option<IoError>,
}

/// The kind of failure a [`StreamfileError`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamfileErrorKind {
    /// The backing file could not be opened.
    Open,
    /// A seek to the requested offset failed.
    Seek,
    /// The sibling file named by `open` does not exist or could not be read.
    SiblingNotFound,
}

impl StreamfileError {
    pub(crate) fn new(kind: StreamfileErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn new_with_source(kind: StreamfileErrorKind, source: IoError) -> Self {
        Self {
            kind,
            source: Some(source),
        }
    }

    pub(crate) fn factory(kind: StreamfileErrorKind) -> impl FnOnce(IoError) -> Self {
        move |source| Self::new_with_source(kind, source)
    }

    /// Returns the kind of failure this error represents.
    #[must_use]
    pub fn kind(&self) -> StreamfileErrorKind {
        self.kind
    }
}

impl Display for StreamfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        #[allow(clippy::enum_glob_use)]
        use StreamfileErrorKind::*;

        f.write_str(match self.kind {
            Open => "failed to open streamfile",
            Seek => "failed to seek within streamfile",
            SiblingNotFound => "sibling streamfile not found",
        })
    }
}

impl Error for StreamfileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn Error + 'static))
    }
}

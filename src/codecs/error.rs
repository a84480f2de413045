use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Error produced when a codec cannot continue decoding at all (as opposed
/// to [`DecodeTransient`](crate) garbage mid-stream, which degrades to
/// silence rather than erroring).
#[derive(Debug)]
pub struct CodecError {
    kind: CodecErrorKind,
}

/// The kind of failure a [`CodecError`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// The requested codec variant/configuration isn't implemented.
    Unsupported,
    /// A required coefficient table, key, or setup packet is missing.
    MissingSetup,
    /// A field needed to configure the codec was out of its valid range.
    InvalidParameter,
}

impl CodecError {
    pub(crate) fn new(kind: CodecErrorKind) -> Self {
        Self { kind }
    }

    /// Returns the kind of failure this error represents.
    #[must_use]
    pub fn kind(&self) -> CodecErrorKind {
        self.kind
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self.kind {
            CodecErrorKind::Unsupported => "codec variant is not implemented",
            CodecErrorKind::MissingSetup => "codec is missing required setup data",
            CodecErrorKind::InvalidParameter => "codec parameter out of range",
        })
    }
}

impl Error for CodecError {}

// src/error.rs

//! Error types for cache file conversion

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while probing, decoding or converting a cache file
///
/// Each message already includes the message of the error it wraps, so
/// none of the variants expose a `source()`. Printing the chain with `{:#}`
/// then shows every cause once.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure (open, read, write, seek, rename)
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// Stored response headers do not parse as header lines
    #[error("Malformed header block: {0}")]
    MalformedHeaders(String),

    /// Header offsets recorded in the file are inconsistent
    #[error("Invalid header offsets: header_start {header_start} > body_start {body_start}")]
    InvalidOffsets { header_start: u16, body_start: u16 },

    /// Offset no longer fits in 16 bits after the header grew
    #[error("Offset {offset} does not fit the version 3 header (max {max})")]
    OffsetOverflow { offset: usize, max: usize },

    /// Vary value nginx refuses to cache (wildcard or too long)
    #[error("Non-cacheable Vary header: {0:?}")]
    NonCacheableVary(String),

    /// Version tag outside the supported set
    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u64),

    /// Directory traversal failure
    #[error("Directory traversal error: {0}")]
    Walk(walkdir::Error),

    /// Opening or classifying a cache file failed
    #[error("{}: {error}", path.display())]
    AtPath { path: PathBuf, error: Box<Error> },

    /// Writing or installing the version 3 replacement of a file failed
    #[error("{}: {error}", path.display())]
    Conversion { path: PathBuf, error: Box<Error> },
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        Self::Walk(e)
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error describes a bad record rather than a failing filesystem
    ///
    /// A short read means the file is truncated, which is a property of the
    /// record itself.
    pub fn is_record_error(&self) -> bool {
        match self {
            Self::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::Walk(_) => false,
            Self::AtPath { error, .. } | Self::Conversion { error, .. } => error.is_record_error(),
            _ => true,
        }
    }

    /// Whether the error happened while replacing a file, as opposed to
    /// while finding or opening it
    pub fn is_conversion_error(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Attach the file the error occurred on
    pub fn at_path(self, path: impl Into<PathBuf>) -> Self {
        Self::AtPath {
            path: path.into(),
            error: Box::new(self),
        }
    }

    /// Attach the file whose replacement failed
    pub fn conversion_failed(self, path: impl Into<PathBuf>) -> Self {
        Self::Conversion {
            path: path.into(),
            error: Box::new(self),
        }
    }
}

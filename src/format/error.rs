//! Error types for flow file decoding, encoding and warping.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Image axis named by a dimension error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Width => f.write_str("width"),
            Axis::Height => f.write_str("height"),
        }
    }
}

/// Flat classification of a [`FlowError`].
///
/// Every failed decode, encode or warp maps to exactly one kind, regardless of
/// any file context attached to the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowErrorKind {
    Io,
    InvalidExtension,
    MissingExtension,
    BadTag,
    TruncatedHeader,
    TruncatedData,
    TrailingData,
    InvalidDimensions,
    InvalidChannelCount,
    BufferLength,
    DimensionMismatch,
}

/// Errors raised by the flow codec and the warp.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("I/O error at byte offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("extension .flo expected in '{}'", path.display())]
    InvalidExtension { path: PathBuf },

    #[error("extension required in filename '{}'", path.display())]
    MissingExtension { path: PathBuf },

    #[error("wrong tag {found:02x?} (possibly written on a big-endian machine?)")]
    BadTag { found: [u8; 4] },

    #[error("header is truncated: read {read} of 12 bytes")]
    TruncatedHeader { read: usize },

    #[error("file is too short: row {row} is incomplete")]
    TruncatedData { row: usize },

    #[error("file is too long")]
    TrailingData,

    #[error("illegal {axis} {value}")]
    InvalidDimensions { axis: Axis, value: i64 },

    #[error("image must have 2 bands, got {channels}")]
    InvalidChannelCount { channels: usize },

    #[error("buffer holds {len} samples, expected {expected}")]
    BufferLength { expected: usize, len: usize },

    #[error(
        "flow field is {flow_width}x{flow_height} but source image is {image_width}x{image_height}"
    )]
    DimensionMismatch {
        flow_width: usize,
        flow_height: usize,
        image_width: usize,
        image_height: usize,
    },

    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    /// Flat kind of this error, looking through any attached file context.
    pub fn kind(&self) -> FlowErrorKind {
        match self {
            FlowError::Io { .. } => FlowErrorKind::Io,
            FlowError::InvalidExtension { .. } => FlowErrorKind::InvalidExtension,
            FlowError::MissingExtension { .. } => FlowErrorKind::MissingExtension,
            FlowError::BadTag { .. } => FlowErrorKind::BadTag,
            FlowError::TruncatedHeader { .. } => FlowErrorKind::TruncatedHeader,
            FlowError::TruncatedData { .. } => FlowErrorKind::TruncatedData,
            FlowError::TrailingData => FlowErrorKind::TrailingData,
            FlowError::InvalidDimensions { .. } => FlowErrorKind::InvalidDimensions,
            FlowError::InvalidChannelCount { .. } => FlowErrorKind::InvalidChannelCount,
            FlowError::BufferLength { .. } => FlowErrorKind::BufferLength,
            FlowError::DimensionMismatch { .. } => FlowErrorKind::DimensionMismatch,
            FlowError::InFile { source, .. } => source.kind(),
        }
    }

    /// Attach the path of the file being processed.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // Already named by the path check itself.
            FlowError::InvalidExtension { .. } | FlowError::MissingExtension { .. } => self,
            FlowError::InFile { .. } => self,
            other => FlowError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    pub(crate) fn io(offset: u64, source: io::Error) -> Self {
        FlowError::Io { offset, source }
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

//! Error type shared by the store, cache, and storage layers.

use std::path::PathBuf;

use crate::registry::ContentId;
use crate::section_serial::CodecError;

/// Errors surfaced by [`WorldStore`](crate::WorldStore) operations.
///
/// Every variant is recoverable from the store's point of view: the resident
/// sections are left intact and the call may be retried. Whether a failure is
/// fatal is the host application's decision.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A section file could not be opened, read, written, or renamed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A section file exists but does not decode, or a section failed to encode.
    #[error("corrupt section data in {}: {source}", path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// A section file was written by a newer format version.
    #[error("section file {} has unsupported format version {version}", path.display())]
    UnsupportedVersion { path: PathBuf, version: u8 },

    /// Negative X/Y, or Z outside the world's vertical extent.
    #[error("invalid world coordinate ({x}, {y}, {z})")]
    InvalidCoordinate { x: i64, y: i64, z: i64 },

    /// The content ID is not in the store's registry.
    #[error("unknown content {0:?}")]
    UnknownContent(ContentId),
}

impl WorldError {
    /// Classifies a codec failure for the file at `path`.
    pub(crate) fn codec(path: impl Into<PathBuf>, source: CodecError) -> Self {
        let path = path.into();
        match source {
            CodecError::UnsupportedVersion(version) => Self::UnsupportedVersion { path, version },
            source => Self::CorruptData { path, source },
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

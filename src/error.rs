use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `tarwalk` crate.
#[derive(Debug, Error)]
pub enum WalkError {
    /// A requested digest algorithm is not known. Raised before the archive is touched.
    #[error("unsupported hash algorithm '{name}'")]
    UnsupportedAlgorithm { name: String },

    /// The archive could not be opened at all: missing file, permission problem,
    /// a broken compression envelope, or a stream that does not start with a TAR header.
    #[error("cannot read archive '{}': {source}", path.display())]
    ArchiveUnreadable { path: PathBuf, source: io::Error },

    /// A structural problem discovered while reading a member (bad header checksum,
    /// truncated content, decompression failure mid-stream).
    #[error("corrupt archive '{}': {source}", path.display())]
    ArchiveCorrupt { path: PathBuf, source: io::Error },
}

impl WalkError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        WalkError::ArchiveUnreadable { path: path.into(), source }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: io::Error) -> Self {
        WalkError::ArchiveCorrupt { path: path.into(), source }
    }

    /// Returns the archive path this error refers to, if any.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            WalkError::UnsupportedAlgorithm { .. } => None,
            WalkError::ArchiveUnreadable { path, .. } | WalkError::ArchiveCorrupt { path, .. } => Some(path.as_path()),
        }
    }
}

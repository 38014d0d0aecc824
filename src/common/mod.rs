//! Common types shared by the walker and the command-line front end.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The closed set of member kinds an archive entry is normalized to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Hardlink,
    /// Device nodes, fifos and any tag the walker does not recognize.
    Other,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Directory => "directory",
            EntryType::Symlink => "symlink",
            EntryType::Hardlink => "hardlink",
            EntryType::Other => "other",
        }
    }

    /// True for the two link variants, which carry a target instead of content.
    pub fn is_link(&self) -> bool {
        matches!(self, EntryType::Symlink | EntryType::Hardlink)
    }
}

impl From<tar::EntryType> for EntryType {
    fn from(tag: tar::EntryType) -> Self {
        match tag {
            // contiguous and sparse members are regular files with a different storage layout
            tar::EntryType::Regular | tar::EntryType::Continuous | tar::EntryType::GNUSparse => EntryType::File,
            tar::EntryType::Directory => EntryType::Directory,
            tar::EntryType::Symlink => EntryType::Symlink,
            tar::EntryType::Link => EntryType::Hardlink,
            _ => EntryType::Other,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Normalized metadata for a single member of an archive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path, including the archive's own top-level directory.
    pub name: PathBuf,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Content length in bytes. Always 0 for directories and links.
    pub size: u64,
    /// Modification time in seconds since the epoch, as stored.
    pub mtime: u64,
    /// Raw mode bits from the header.
    pub mode: u32,
    pub uid: u64,
    pub gid: u64,
    /// Present only for symlinks and hardlinks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<PathBuf>,
    /// Algorithm name (as requested) to lowercase hex digest. Present only for
    /// regular files when hashing was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<BTreeMap<String, String>>,
}

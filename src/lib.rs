//! # tarwalk Core Library
//!
//! Walks TAR archives (plain or wrapped in gzip, bzip2, xz or zstd) and yields
//! one normalized [`ArchiveEntry`] per member, optionally with content digests
//! computed while streaming.
//!
//! ## Key Modules
//!
//! - [`archive`]: the walker itself and the lazy entry iterator.
//! - [`common`]: the entry shape shared by the library and the CLI.
//! - [`compress`]: compression detection and streaming decoders.
//! - [`multihash`]: single-pass hashing with several digest algorithms.
//! - [`cli`]: command-line definitions for the `tarwalk` binary.
//!
//! ## Examples
//!
//! ```no_run
//! let entries = tarwalk::iterate("sample.tar.xz", &["md5", "sha1"])?.collect_entries()?;
//! for entry in &entries {
//!     println!("{:?} {}", entry.entry_type, entry.name.display());
//! }
//! # Ok::<(), tarwalk::WalkError>(())
//! ```

pub mod archive;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod compress;
pub mod error;
pub mod multihash;

pub use archive::{iterate, Entries, TarWalker};
pub use common::{ArchiveEntry, EntryType};
pub use compress::Compression;
pub use error::WalkError;
pub use multihash::{HashAlgorithm, MultiHash};

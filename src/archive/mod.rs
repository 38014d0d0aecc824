//! # TAR walker
//!
//! This module turns a (possibly compressed) tarball into a lazy stream of
//! [`ArchiveEntry`] values, one per member, in storage order.
//!
//! The walker owns the open archive; [`TarWalker::entries`] borrows it and hands
//! out a single-pass iterator. Dropping either one closes the file, so a caller
//! can stop early without leaking the handle.
//!
//! When digests are requested, regular-file content is streamed once through all
//! accumulators. Without digests the walker never reads member content; the TAR
//! reader skips over it when advancing to the next header.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use crate::common::{ArchiveEntry, EntryType};
use crate::compress::{self, Compression};
use crate::multihash::{self, MultiHash};
use crate::WalkError;

/// Size of a TAR header block.
const BLOCK_SIZE: usize = 512;
const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;

type Stream = Box<dyn Read + Send>;

/// Opens `archive_path` and prepares to walk it, hashing regular-file content
/// with every algorithm in `hash_algorithms`.
///
/// Algorithm names are validated before the file is opened.
///
/// ```no_run
/// let mut walker = tarwalk::iterate("sample.tar.xz", &["md5", "sha1"])?;
/// for entry in walker.entries()? {
///     let entry = entry?;
///     println!("{} {}", entry.entry_type, entry.name.display());
/// }
/// # Ok::<(), tarwalk::WalkError>(())
/// ```
pub fn iterate<P: AsRef<Path>, S: AsRef<str>>(archive_path: P, hash_algorithms: &[S]) -> Result<TarWalker, WalkError> {
    let hashes = MultiHash::new(hash_algorithms)?;
    TarWalker::open_with(archive_path, None, hashes)
}

/// An open tarball, ready to be walked once.
pub struct TarWalker {
    archive: tar::Archive<Stream>,
    path: PathBuf,
    compression: Compression,
    hashes: MultiHash,
    consumed: bool,
}

impl TarWalker {
    /// Opens an archive without hashing, detecting its compression.
    pub fn open<P: AsRef<Path>>(archive_path: P) -> Result<Self, WalkError> {
        Self::open_with(archive_path, None, MultiHash::default())
    }

    /// Opens an archive with an explicit compression (`None` = detect) and a
    /// prepared set of digests.
    ///
    /// The first header block is read and verified here, so a file that is not a
    /// tarball fails now with [`WalkError::ArchiveUnreadable`] instead of on the
    /// first call to `next()`.
    pub fn open_with<P: AsRef<Path>>(
        archive_path: P,
        compression: Option<Compression>,
        hashes: MultiHash,
    ) -> Result<Self, WalkError> {
        let path = archive_path.as_ref().to_path_buf();
        let (compression, stream, first_block) = match compression {
            Some(forced) => open_stream(&path, forced).map(|(s, b)| (forced, s, b)),
            None => detect_and_open(&path),
        }
        .map_err(|e| WalkError::unreadable(&path, e))?;

        debug!(path = %path.display(), %compression, hashes = ?hashes, "opened archive");

        // hand the verified block back to the TAR reader in front of the rest
        let stream: Stream = Box::new(Cursor::new(first_block).chain(stream));
        Ok(Self {
            archive: tar::Archive::new(stream),
            path,
            compression,
            hashes,
            consumed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns the lazy entry sequence. Can be called only once per walker.
    pub fn entries(&mut self) -> Result<Entries<'_>, WalkError> {
        if self.consumed {
            return Err(WalkError::unreadable(
                &self.path,
                io::Error::other("archive entries were already consumed; open the archive again"),
            ));
        }
        self.consumed = true;
        let inner = self.archive.entries().map_err(|e| WalkError::unreadable(&self.path, e))?;
        Ok(Entries {
            inner,
            path: &self.path,
            hashes: &self.hashes,
            buf: vec![0u8; multihash::READ_CHUNK],
            finished: false,
        })
    }

    /// Walks the whole archive and collects every entry.
    pub fn collect_entries(mut self) -> Result<Vec<ArchiveEntry>, WalkError> {
        let entries = self.entries()?;
        entries.collect()
    }
}

/// Single-pass iterator over the members of a [`TarWalker`].
///
/// Yields `Err` at most once; after an error the sequence is over.
pub struct Entries<'a> {
    inner: tar::Entries<'a, Stream>,
    path: &'a Path,
    hashes: &'a MultiHash,
    /// Read buffer shared by every hashed member.
    buf: Vec<u8>,
    finished: bool,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<ArchiveEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let result = match self.inner.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Ok(raw)) => {
                    // global PAX records describe the archive, not a member
                    if raw.header().entry_type() == tar::EntryType::XGlobalHeader {
                        continue;
                    }
                    self.normalize(raw)
                }
                Some(Err(e)) => Err(e),
            };
            return Some(result.map_err(|e| {
                debug!(path = %self.path.display(), error = %e, "archive stream is corrupt");
                self.finished = true;
                WalkError::corrupt(self.path, e)
            }));
        }
    }
}

impl<'a> Entries<'a> {
    fn normalize(&mut self, mut raw: tar::Entry<'a, Stream>) -> io::Result<ArchiveEntry> {
        let overrides = PaxOverrides::read(&mut raw)?;

        let header = raw.header();
        let fields = header.as_old();
        let entry_type = EntryType::from(header.entry_type());
        let mode = numeric_field(&fields.mode, || header.mode())?;
        let uid = overrides.uid.map_or_else(|| numeric_field(&fields.uid, || header.uid()), Ok)?;
        let gid = overrides.gid.map_or_else(|| numeric_field(&fields.gid, || header.gid()), Ok)?;
        let mtime = overrides.mtime.map_or_else(|| numeric_field(&fields.mtime, || header.mtime()), Ok)?;

        let name = normalize_path(&raw.path()?);
        let link_target = match entry_type {
            EntryType::Symlink => Some(raw.link_name()?.map(Cow::into_owned).unwrap_or_default()),
            EntryType::Hardlink => Some(raw.link_name()?.map(|p| normalize_path(&p)).unwrap_or_default()),
            _ => None,
        };

        let size = if entry_type == EntryType::Directory || entry_type.is_link() {
            0
        } else {
            raw.size()
        };

        let hash = if entry_type == EntryType::File && !self.hashes.is_empty() {
            let mut acc = self.hashes.clone();
            let read = acc.consume_with(&mut raw, &mut self.buf)?;
            if read != size {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("member '{}' truncated: expected {} bytes, got {}", name.display(), size, read),
                ));
            }
            Some(acc.finish())
        } else {
            None
        };

        trace!(name = %name.display(), %entry_type, size, "archive member");

        Ok(ArchiveEntry {
            name,
            entry_type,
            size,
            mtime,
            mode,
            uid,
            gid,
            link_target,
            hash,
        })
    }
}

/// Numeric fields a PAX extended header may carry in place of the ustar ones.
#[derive(Debug, Default)]
struct PaxOverrides {
    mtime: Option<u64>,
    uid: Option<u64>,
    gid: Option<u64>,
}

impl PaxOverrides {
    fn read(raw: &mut tar::Entry<'_, Stream>) -> io::Result<Self> {
        let mut out = PaxOverrides::default();
        let Some(extensions) = raw.pax_extensions()? else {
            return Ok(out);
        };
        for ext in extensions {
            let ext = ext?;
            let (Ok(key), Ok(value)) = (ext.key(), ext.value()) else {
                continue;
            };
            match key {
                // PAX times may be fractional; whole seconds only
                "mtime" => out.mtime = value.split('.').next().and_then(|s| s.parse().ok()),
                "uid" => out.uid = value.parse().ok(),
                "gid" => out.gid = value.parse().ok(),
                _ => {}
            }
        }
        Ok(out)
    }
}

/// Blank numeric fields (all NUL or spaces) read as 0, as many writers leave
/// unused fields that way. Anything else must parse.
fn numeric_field<T: Default>(raw: &[u8], parse: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    if raw.iter().all(|&b| b == 0 || b == b' ') {
        Ok(T::default())
    } else {
        parse()
    }
}

/// Drops `.` components and trailing separators, so that `./a/b/` and `a/b`
/// name the same member.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Opens `path` through the decoder for `compression` and reads the first block.
fn open_stream(path: &Path, compression: Compression) -> io::Result<(Stream, Vec<u8>)> {
    let file = File::open(path)?;
    let mut stream = compress::decoder(file, compression)?;
    let block = read_first_block(&mut stream)?;
    Ok((stream, block))
}

/// Picks the decoder from the leading magic bytes. A plain tarball whose first
/// member name happens to begin with a magic number (`BZh...`) fails to decode;
/// it is then retried uncompressed and accepted if its first header verifies.
fn detect_and_open(path: &Path) -> io::Result<(Compression, Stream, Vec<u8>)> {
    let detected = compress::sniff(&mut File::open(path)?)?;
    match open_stream(path, detected) {
        Ok((stream, block)) => Ok((detected, stream, block)),
        Err(e) if detected != Compression::None => match open_stream(path, Compression::None) {
            Ok((stream, block)) => {
                debug!(path = %path.display(), %detected, error = %e, "magic bytes were a member name; reading as plain tar");
                Ok((Compression::None, stream, block))
            }
            Err(_) => Err(e),
        },
        Err(e) => Err(e),
    }
}

/// Reads the first header block and checks that it looks like TAR.
///
/// An all-zero block is accepted: that is an archive with no members.
fn read_first_block(stream: &mut Stream) -> io::Result<Vec<u8>> {
    let mut block = Vec::with_capacity(BLOCK_SIZE);
    stream.by_ref().take(BLOCK_SIZE as u64).read_to_end(&mut block)?;

    if block.is_empty() {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "archive is empty"));
    }
    if block.len() < BLOCK_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("not a tar archive: first block is only {} bytes", block.len()),
        ));
    }
    if block.iter().all(|&b| b == 0) {
        return Ok(block);
    }

    let recorded = tar::Header::from_byte_slice(&block)
        .cksum()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "not a tar archive: unparsable header checksum"))?;
    if recorded != header_checksum(&block) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "not a tar archive: header checksum mismatch"));
    }
    Ok(block)
}

/// Unsigned sum of the header bytes with the checksum field read as spaces.
fn header_checksum(block: &[u8]) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| if CHECKSUM_RANGE.contains(&i) { u32::from(b' ') } else { u32::from(b) })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_strips_curdir_and_trailing_slash() {
        assert_eq!(normalize_path(Path::new("./test-archive/")), PathBuf::from("test-archive"));
        assert_eq!(normalize_path(Path::new("a/./b/c.txt")), PathBuf::from("a/b/c.txt"));
        assert_eq!(normalize_path(Path::new("subdir")), PathBuf::from("subdir"));
    }

    #[test]
    fn blank_numeric_fields_read_as_zero() {
        assert_eq!(numeric_field(&[0u8; 8], || Err::<u64, _>(io::Error::other("unused"))).unwrap(), 0);
        assert_eq!(numeric_field(b"        ", || Err::<u64, _>(io::Error::other("unused"))).unwrap(), 0);
        assert_eq!(numeric_field(b"0001750\0", || Ok(1000u64)).unwrap(), 1000);
        assert!(numeric_field(b"zz\0\0\0\0\0\0", || Err::<u64, _>(io::Error::other("bad"))).is_err());
    }

    #[test]
    fn checksum_matches_tar_crate() {
        let mut header = tar::Header::new_ustar();
        header.set_path("test-archive/123_hard.txt").unwrap();
        header.set_size(4);
        header.set_mode(0o664);
        header.set_cksum();
        assert_eq!(header.cksum().unwrap(), header_checksum(header.as_bytes()));
    }

    #[test]
    fn first_block_rejects_non_tar() {
        let mut junk: Stream = Box::new(Cursor::new(vec![b'x'; 2048]));
        assert_eq!(read_first_block(&mut junk).unwrap_err().kind(), io::ErrorKind::InvalidData);

        let mut short: Stream = Box::new(Cursor::new(b"hello".to_vec()));
        assert_eq!(read_first_block(&mut short).unwrap_err().kind(), io::ErrorKind::InvalidData);

        let mut empty: Stream = Box::new(io::empty());
        assert_eq!(read_first_block(&mut empty).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);

        let mut zeros: Stream = Box::new(Cursor::new(vec![0u8; 1024]));
        assert_eq!(read_first_block(&mut zeros).unwrap().len(), BLOCK_SIZE);
    }
}

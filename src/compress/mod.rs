//! # Compression envelopes
//!
//! Detects how a tarball is wrapped (gzip, bzip2, xz, zstd or nothing) from its
//! leading magic bytes and builds the matching streaming decoder.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

use serde::{Deserialize, Serialize};

/// Longest magic signature we look at (xz).
const MAGIC_LEN: usize = 6;

const GZIP_MAGIC: &[u8] = b"\x1f\x8b";
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = b"\xfd7zXZ\x00";
const ZSTD_MAGIC: &[u8] = b"\x28\xb5\x2f\xfd";

/// The outer compression applied to a TAR stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Plain, uncompressed TAR.
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Classifies a stream by its first bytes. Unknown signatures are assumed
    /// to be an uncompressed TAR; the header check later decides if that holds.
    pub fn detect(magic: &[u8]) -> Self {
        match magic {
            m if m.starts_with(XZ_MAGIC) => Compression::Xz,
            m if m.starts_with(ZSTD_MAGIC) => Compression::Zstd,
            m if m.starts_with(BZIP2_MAGIC) => Compression::Bzip2,
            m if m.starts_with(GZIP_MAGIC) => Compression::Gzip,
            _ => Compression::None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
            Compression::Xz => "xz",
            Compression::Zstd => "zstd",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Peeks at the start of `file` to detect its compression, then rewinds it.
pub fn sniff(file: &mut File) -> io::Result<Compression> {
    let mut magic = Vec::with_capacity(MAGIC_LEN);
    file.by_ref().take(MAGIC_LEN as u64).read_to_end(&mut magic)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(Compression::detect(&magic))
}

/// Wraps `file` in a streaming decoder for `compression`.
///
/// Multi-member gzip/bzip2/xz streams (concatenated archives) are decoded as one.
pub fn decoder(file: File, compression: Compression) -> io::Result<Box<dyn Read + Send>> {
    let buffered = BufReader::new(file);
    let reader: Box<dyn Read + Send> = match compression {
        Compression::None => Box::new(buffered),
        Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(buffered)),
        Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(buffered)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(buffered)),
        Compression::Zstd => Box::new(zstd::stream::read::Decoder::with_buffer(buffered)?),
    };
    Ok(reader)
}

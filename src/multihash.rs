//! # Multi-digest hashing
//!
//! Feeds one stream of bytes into several digest accumulators at once, so that
//! member content is read a single time no matter how many algorithms were asked for.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use digest::Digest;

use crate::WalkError;

pub(crate) const READ_CHUNK: usize = 64 * 1024;

/// Digest algorithms understood by [`MultiHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    /// BLAKE2b with a 512-bit output.
    Blake2b,
    /// BLAKE2s with a 256-bit output.
    Blake2s,
    Blake3,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 9] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake2b,
        HashAlgorithm::Blake2s,
        HashAlgorithm::Blake3,
    ];

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha224 => "sha224",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake2b => "blake2b",
            HashAlgorithm::Blake2s => "blake2s",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    fn accumulator(&self) -> Accumulator {
        match self {
            HashAlgorithm::Md5 => Accumulator::Md5(md5::Md5::new()),
            HashAlgorithm::Sha1 => Accumulator::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Sha224 => Accumulator::Sha224(sha2::Sha224::new()),
            HashAlgorithm::Sha256 => Accumulator::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha384 => Accumulator::Sha384(sha2::Sha384::new()),
            HashAlgorithm::Sha512 => Accumulator::Sha512(sha2::Sha512::new()),
            HashAlgorithm::Blake2b => Accumulator::Blake2b(blake2::Blake2b512::new()),
            HashAlgorithm::Blake2s => Accumulator::Blake2s(blake2::Blake2s256::new()),
            HashAlgorithm::Blake3 => Accumulator::Blake3(Box::new(blake3::Hasher::new())),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = WalkError;

    /// Names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HashAlgorithm::ALL
            .into_iter()
            .find(|algo| algo.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| WalkError::UnsupportedAlgorithm { name: s.to_string() })
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
enum Accumulator {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
    Blake2b(blake2::Blake2b512),
    Blake2s(blake2::Blake2s256),
    Blake3(Box<blake3::Hasher>),
}

impl Accumulator {
    fn update(&mut self, data: &[u8]) {
        match self {
            Accumulator::Md5(h) => h.update(data),
            Accumulator::Sha1(h) => h.update(data),
            Accumulator::Sha224(h) => h.update(data),
            Accumulator::Sha256(h) => h.update(data),
            Accumulator::Sha384(h) => h.update(data),
            Accumulator::Sha512(h) => h.update(data),
            Accumulator::Blake2b(h) => h.update(data),
            Accumulator::Blake2s(h) => h.update(data),
            Accumulator::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finish_hex(self) -> String {
        match self {
            Accumulator::Md5(h) => hex::encode(h.finalize()),
            Accumulator::Sha1(h) => hex::encode(h.finalize()),
            Accumulator::Sha224(h) => hex::encode(h.finalize()),
            Accumulator::Sha256(h) => hex::encode(h.finalize()),
            Accumulator::Sha384(h) => hex::encode(h.finalize()),
            Accumulator::Sha512(h) => hex::encode(h.finalize()),
            Accumulator::Blake2b(h) => hex::encode(h.finalize()),
            Accumulator::Blake2s(h) => hex::encode(h.finalize()),
            Accumulator::Blake3(h) => hex::encode(h.finalize().as_bytes()),
        }
    }
}

/// A set of named digest accumulators fed from a single pass over the data.
///
/// Each requested name keeps the caller's spelling as its key in the result,
/// so asking for `"SHA1"` yields a `"SHA1"` entry. Repeating the exact same
/// name collapses into one accumulator.
///
/// A fresh `MultiHash` acts as a template: clone it per stream, feed the clone,
/// then call [`MultiHash::finish`].
#[derive(Clone, Default)]
pub struct MultiHash {
    slots: Vec<(String, Accumulator)>,
}

impl MultiHash {
    /// Validates every name up front; the first unknown one fails with
    /// [`WalkError::UnsupportedAlgorithm`].
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, WalkError> {
        let mut slots: Vec<(String, Accumulator)> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let algo: HashAlgorithm = name.parse()?;
            if slots.iter().any(|(existing, _)| existing == name) {
                continue;
            }
            slots.push((name.to_string(), algo.accumulator()));
        }
        Ok(Self { slots })
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The requested names, in request order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    /// Feeds one chunk into every accumulator.
    pub fn update(&mut self, data: &[u8]) {
        for (_, acc) in &mut self.slots {
            acc.update(data);
        }
    }

    /// Reads `reader` to the end, feeding every chunk to all accumulators.
    /// Returns the number of bytes consumed.
    pub fn consume<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<u64> {
        let mut buf = vec![0u8; READ_CHUNK];
        self.consume_with(reader, &mut buf)
    }

    /// Like [`MultiHash::consume`], reading through a caller-owned buffer so
    /// one allocation can serve many streams. `buf` must not be empty.
    pub fn consume_with<R: Read + ?Sized>(&mut self, reader: &mut R, buf: &mut [u8]) -> io::Result<u64> {
        debug_assert!(!buf.is_empty());
        let mut total = 0u64;
        loop {
            let n = match reader.read(buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.update(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    }

    /// Finalizes every accumulator into a lowercase hex digest.
    pub fn finish(self) -> BTreeMap<String, String> {
        self.slots
            .into_iter()
            .map(|(name, acc)| (name, acc.finish_hex()))
            .collect()
    }
}

impl fmt::Debug for MultiHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

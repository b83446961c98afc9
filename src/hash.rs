//! Content hashing and the hash index used for fallback rename detection.
//!
//! The hash is CRC-32, streamed in 4 KiB buffers. It is used strictly as a
//! same-content fingerprint for candidates already gated by equal byte
//! length; its weak collision resistance is acceptable under that gate, and
//! it is not a substitute for cryptographic integrity.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use ahash::{HashMap, HashMapExt};

use crate::relpath::RelativePath;

/// The buffer size is part of the observable contract: it's small enough
/// that hashing a handful of candidates during the matcher's hash pass stays
/// cheap even on spinning disks.
const HASH_BUFFER_SIZE: usize = 4 * 1024;

/// Incremental CRC-32 hasher over streamed file content.
pub struct CrcHasher {
    inner: crc32fast::Hasher,
}

impl CrcHasher {
    pub fn new() -> Self {
        Self { inner: crc32fast::Hasher::new() }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(self) -> u32 {
        self.inner.finalize()
    }
}

impl Default for CrcHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash a file's full content using streaming I/O.
pub fn hash_file(path: &Path) -> io::Result<u32> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(HASH_BUFFER_SIZE, file);
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    let mut hasher = CrcHasher::new();

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Hash an in-memory buffer. Mainly useful for tests.
pub fn hash_bytes(data: &[u8]) -> u32 {
    let mut hasher = CrcHasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// `(matched, path, length)` living in the [`HashIndex`].
#[derive(Debug, Clone)]
pub struct HashRecord {
    pub matched: bool,
    pub path: RelativePath,
    pub length: u64,
}

/// Keyed by CRC-32; collisions are resolved by byte-length equality at
/// lookup time.
pub struct HashIndex {
    records: HashMap<u32, Vec<HashRecord>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self { records: HashMap::new() }
    }

    pub fn insert(&mut self, hash: u32, path: RelativePath, length: u64) {
        self.records.entry(hash).or_default().push(HashRecord { matched: false, path, length });
    }

    /// First unmatched record with equal byte length under `hash`, if any.
    pub fn find_unmatched_mut(&mut self, hash: u32, length: u64) -> Option<&mut HashRecord> {
        self.records.get_mut(&hash)?.iter_mut().find(|r| !r.matched && r.length == length)
    }

    /// Records that never found a destination match, in insertion order
    /// within each bucket.
    pub fn unmatched_paths(&self) -> Vec<RelativePath> {
        self.records.values().flatten().filter(|r| !r.matched).map(|r| r.path.clone()).collect()
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new()
    }
}

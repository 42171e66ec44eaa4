//! Content digest for deduplication and traceability
//!
//! Calculates the MD5 digest of a file, streamed in fixed-size chunks. The
//! digest only has to avoid accidental collisions between recordings; it is
//! not used for any security decision.

use crate::error::HashError;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Default read buffer size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Streaming file hasher
pub struct ContentHasher {
    chunk_size: usize,
}

impl ContentHasher {
    /// Create hasher reading `chunk_size` bytes at a time (0 means the default)
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                chunk_size
            },
        }
    }

    /// Calculate the lowercase hex MD5 digest of `path`
    pub fn digest(&self, path: &Path) -> Result<String, HashError> {
        if !path.is_file() {
            return Err(HashError::NotFound(path.to_path_buf()));
        }

        let read_failure = |source| HashError::ReadFailure {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(read_failure)?;
        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(read_failure(e)),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        let hash_hex = format!("{:x}", hasher.finalize());

        tracing::trace!(path = %path.display(), hash = %hash_hex, "Calculated digest");

        Ok(hash_hex)
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

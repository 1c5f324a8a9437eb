//! Content hashing for installed and staged artifacts.
//!
//! Digests are used for change detection only: they tell the reconciler
//! whether the file on disk is still the one it registered, or whether a
//! freshly downloaded release is byte-identical to what is installed.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Read buffer size used while streaming a file through the digest.
const CHUNK_SIZE: usize = 8192;

/// Computes a stable digest of a file's bytes.
pub trait ContentHasher: Send + Sync {
    /// Hash the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    fn hash(&self, path: &Path) -> Result<String>;
}

/// SHA-256 hasher producing lowercase hex digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash(&self, path: &Path) -> Result<String> {
        let file = File::open(path)?;
        let digest = digest_reader(BufReader::new(file))?;
        debug!("sha256({}) = {}", path.display(), digest);
        Ok(digest)
    }
}

/// Stream a reader through SHA-256 with a bounded buffer.
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn digest_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

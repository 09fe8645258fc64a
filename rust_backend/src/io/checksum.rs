//! Checksums of downloaded source files.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of raw bytes.
///
/// # Returns
/// Hexadecimal string representation of the hash.
pub fn calculate_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(result)
}

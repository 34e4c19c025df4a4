//! Cache key computation.

use sha2::{Digest, Sha256};

/// Compute the disk-cache identifier for a canonical source address.
///
/// SHA-256 of the address string, hex encoded (64 characters). The address
/// must already be canonical: two spellings of the same source produce
/// different keys.
#[must_use]
pub fn cache_key(address: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(address.as_bytes());
    hex::encode(hasher.finalize())
}

//! Content fingerprints used as cache keys.

use sha2::{Digest, Sha256};

/// Returns the lowercase hex SHA-256 digest of `data`.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

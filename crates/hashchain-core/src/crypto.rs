//! Entry digest
//!
//! `hash = SHA256(index || prev_hash || timestamp || data)` rendered as
//! lowercase hex, where `||` is plain string concatenation of the decimal /
//! verbatim forms with no separator.
//!
//! The missing separator means distinct field tuples can feed the same
//! string to SHA-256 (`index=1, timestamp=23` and `index=12, timestamp=3`
//! with the other fields equal). Every node on the network hashes this way,
//! so the encoding cannot change without forking the chain.

use crate::types::{Entry, EntryHash};
use sha2::{Digest, Sha256};

/// Compute the digest of an entry's fields.
pub fn digest(index: u64, prev_hash: &str, timestamp: i64, data: &str) -> EntryHash {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recompute the digest of an existing entry from its fields.
pub fn compute_entry_hash(entry: &Entry) -> EntryHash {
    digest(entry.index, &entry.prev_hash, entry.timestamp, &entry.data)
}

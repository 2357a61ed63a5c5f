//! Core ledger types
//!
//! Field names serialize in camelCase so that a chain dumped by one node can
//! be read back verbatim by any other node on the network.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex-encoded SHA-256 digest.
pub type EntryHash = String;

/// Index of the genesis entry.
pub const GENESIS_INDEX: u64 = 0;
/// `prev_hash` carried by the genesis entry.
pub const GENESIS_PREV_HASH: &str = "0";
/// Creation time of the genesis entry (unix millis).
pub const GENESIS_TIMESTAMP: i64 = 1_489_649_239_990;
/// Payload of the genesis entry.
pub const GENESIS_DATA: &str = "first block";
/// Hash of the genesis entry. Fixed, not derived from the fields above.
pub const GENESIS_HASH: &str = "32f0256825c4258ac35ef7e1073506e2494359caf3fc55907b41adbc59436f13";

/// One record of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Position in the chain, genesis is 0
    pub index: u64,
    /// Hash of the preceding entry
    pub prev_hash: EntryHash,
    /// Creation time (unix millis)
    pub timestamp: i64,
    /// Opaque payload
    pub data: String,
    /// Digest of the four fields above
    pub hash: EntryHash,
}

impl Entry {
    /// Build an entry, computing its hash from the other fields.
    pub fn new(index: u64, prev_hash: impl Into<String>, timestamp: i64, data: impl Into<String>) -> Self {
        let prev_hash = prev_hash.into();
        let data = data.into();
        let hash = crate::crypto::digest(index, &prev_hash, timestamp, &data);
        Self {
            index,
            prev_hash,
            timestamp,
            data,
            hash,
        }
    }

    /// The hard-coded first entry shared by every node.
    pub fn genesis() -> Self {
        Self {
            index: GENESIS_INDEX,
            prev_hash: GENESIS_PREV_HASH.to_string(),
            timestamp: GENESIS_TIMESTAMP,
            data: GENESIS_DATA.to_string(),
            hash: GENESIS_HASH.to_string(),
        }
    }

    /// Is this the canonical genesis entry, field for field?
    pub fn is_genesis(&self) -> bool {
        self.index == GENESIS_INDEX
            && self.prev_hash == GENESIS_PREV_HASH
            && self.timestamp == GENESIS_TIMESTAMP
            && self.data == GENESIS_DATA
            && self.hash == GENESIS_HASH
    }

    /// Short form of the hash for log lines.
    pub fn short_hash(&self) -> &str {
        let end = self.hash.len().min(12);
        self.hash.get(..end).unwrap_or(&self.hash)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.short_hash())
    }
}

/// Current wall-clock time in unix millis.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

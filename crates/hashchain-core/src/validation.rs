//! Structural validation of entries and chains
//!
//! All checks are pure. The `is_*` functions answer yes/no; the matching
//! `check_*` functions report the first rule that failed.

use crate::crypto::compute_entry_hash;
use crate::ledger::Ledger;
use crate::types::Entry;
use thiserror::Error;

/// Why a candidate entry or chain was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("hash mismatch at index {index}: computed {computed}, carried {carried}")]
    HashMismatch {
        index: u64,
        computed: String,
        carried: String,
    },

    #[error("entry {index} does not reference the hash of entry {prev_index}")]
    BrokenLink { prev_index: u64, index: u64 },

    #[error("entry index {index} does not follow {prev_index}")]
    IndexGap { prev_index: u64, index: u64 },

    #[error("candidate chain of length {candidate} is not longer than local length {local}")]
    NotLonger { candidate: usize, local: usize },

    #[error("candidate chain starts from a different genesis")]
    GenesisMismatch,

    #[error("candidate chain is empty")]
    EmptyChain,
}

/// Does the entry carry the digest of its own fields? The canonical genesis
/// entry is accepted as-is; its hash is a fixed constant.
pub fn is_correct_hash(entry: &Entry) -> bool {
    check_hash(entry).is_ok()
}

/// Explaining form of [`is_correct_hash`].
pub fn check_hash(entry: &Entry) -> Result<(), Rejection> {
    if entry.is_genesis() {
        return Ok(());
    }
    let computed = compute_entry_hash(entry);
    if computed != entry.hash {
        return Err(Rejection::HashMismatch {
            index: entry.index,
            computed,
            carried: entry.hash.clone(),
        });
    }
    Ok(())
}

/// Does `next` directly extend `prev`?
pub fn is_linked(prev: &Entry, next: &Entry) -> bool {
    check_linked(prev, next).is_ok()
}

/// Explaining form of [`is_linked`].
pub fn check_linked(prev: &Entry, next: &Entry) -> Result<(), Rejection> {
    if next.prev_hash != prev.hash {
        return Err(Rejection::BrokenLink {
            prev_index: prev.index,
            index: next.index,
        });
    }
    if prev.index.checked_add(1) != Some(next.index) {
        return Err(Rejection::IndexGap {
            prev_index: prev.index,
            index: next.index,
        });
    }
    check_hash(prev)?;
    check_hash(next)
}

/// Can `candidate` be appended to the current tip of `ledger`?
pub fn is_valid_append(candidate: &Entry, ledger: &Ledger) -> bool {
    check_append(candidate, ledger).is_ok()
}

/// Explaining form of [`is_valid_append`].
pub fn check_append(candidate: &Entry, ledger: &Ledger) -> Result<(), Rejection> {
    check_linked(ledger.latest(), candidate)
}

/// Would `chain` be an acceptable replacement for `ledger`?
pub fn is_valid_chain(chain: &[Entry], ledger: &Ledger) -> bool {
    check_chain(chain, ledger).is_ok()
}

/// Explaining form of [`is_valid_chain`].
pub fn check_chain(chain: &[Entry], ledger: &Ledger) -> Result<(), Rejection> {
    if chain.len() <= ledger.len() {
        return Err(Rejection::NotLonger {
            candidate: chain.len(),
            local: ledger.len(),
        });
    }

    let first = chain.first().ok_or(Rejection::EmptyChain)?;
    if first != ledger.genesis() {
        return Err(Rejection::GenesisMismatch);
    }

    if chain.len() == 1 {
        return Ok(());
    }

    for pair in chain.windows(2) {
        check_linked(&pair[0], &pair[1])?;
    }
    Ok(())
}

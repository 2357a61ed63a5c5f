//! Fork choice: longest valid chain wins
//!
//! [`on_received_chain`] decides what to do with entries gossiped by a peer
//! and applies the decision to the ledger in the same call. Callers hold the
//! ledger exclusively for the duration so decision and mutation are atomic.
//! The returned [`ChainOutcome`] tells the gossip layer what, if anything, to
//! send next.

use crate::ledger::Ledger;
use crate::types::Entry;
use crate::validation::{self, Rejection};
use tracing::{debug, info, warn};

/// Result of processing a chain received from a peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Local chain is already at least as long; nothing to do.
    AlreadyCurrent { local_index: u64, remote_index: u64 },
    /// The remote tip extended ours by one entry and was appended.
    /// The entry should be announced to all peers.
    Appended(Entry),
    /// A lone tip that does not connect to ours; ask peers for their chains.
    RequestFullChain,
    /// The local chain was replaced by the longer candidate.
    Replaced { length: usize },
    /// The candidate failed validation and was dropped.
    Rejected(Rejection),
}

impl ChainOutcome {
    /// Did the ledger change?
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Appended(_) | Self::Replaced { .. })
    }
}

/// Result of a local submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Entry appended; it should be announced to all peers.
    Applied(Entry),
    /// Entry refused; the ledger is unchanged.
    Rejected(Rejection),
}

impl SubmitOutcome {
    /// The appended entry, if any.
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            Self::Applied(entry) => Some(entry),
            Self::Rejected(_) => None,
        }
    }
}

/// Process a chain (a lone tip or a full history) received from a peer.
pub fn on_received_chain(ledger: &mut Ledger, mut candidate: Vec<Entry>) -> ChainOutcome {
    // Peers are untrusted; do not rely on their ordering.
    candidate.sort_by(|a, b| a.index.cmp(&b.index));

    let Some(remote_tail) = candidate.last() else {
        warn!("Received empty chain");
        return ChainOutcome::Rejected(Rejection::EmptyChain);
    };
    let local_tail = ledger.latest();

    if local_tail.index >= remote_tail.index {
        debug!(
            local = local_tail.index,
            remote = remote_tail.index,
            "Received chain is not longer than ours"
        );
        return ChainOutcome::AlreadyCurrent {
            local_index: local_tail.index,
            remote_index: remote_tail.index,
        };
    }

    if remote_tail.prev_hash == local_tail.hash && remote_tail.index == local_tail.index + 1 {
        if let Err(reason) = validation::check_linked(local_tail, remote_tail) {
            warn!(%reason, "Rejected received tip");
            return ChainOutcome::Rejected(reason);
        }
        let entry = remote_tail.clone();
        info!(entry = %entry, "Appending received entry");
        ledger.append(entry.clone());
        return ChainOutcome::Appended(entry);
    }

    if candidate.len() == 1 {
        info!(
            local = local_tail.index,
            remote = remote_tail.index,
            "Received tip does not connect, querying full chains"
        );
        return ChainOutcome::RequestFullChain;
    }

    if let Err(reason) = validation::check_chain(&candidate, ledger) {
        warn!(%reason, "Rejected received chain");
        return ChainOutcome::Rejected(reason);
    }

    let length = candidate.len();
    if ledger.replace(candidate).is_err() {
        return ChainOutcome::Rejected(Rejection::EmptyChain);
    }
    info!(length, "Replaced chain with longer received chain");
    ChainOutcome::Replaced { length }
}

/// Build an entry carrying `data` on top of the local tip and append it.
pub fn on_local_submit(ledger: &mut Ledger, data: impl Into<String>, timestamp: i64) -> SubmitOutcome {
    let entry = ledger.create_next_at(data, timestamp);
    if let Err(reason) = validation::check_append(&entry, ledger) {
        warn!(%reason, "Rejected local entry");
        return SubmitOutcome::Rejected(reason);
    }
    info!(entry = %entry, "Added new entry");
    ledger.append(entry.clone());
    SubmitOutcome::Applied(entry)
}

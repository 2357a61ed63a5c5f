//! In-memory hash-linked ledger
//!
//! The genesis entry is held apart from the rest of the chain so that an
//! empty ledger cannot be represented. `append` and `replace` are the only
//! mutation primitives; neither validates, callers go through
//! [`crate::validation`] first.

use crate::error::{Error, Result};
use crate::types::{now_millis, Entry};

/// Ordered sequence of entries starting at genesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    genesis: Entry,
    /// Everything after genesis, in index order
    tail: Vec<Entry>,
}

impl Ledger {
    /// A fresh ledger holding only the genesis entry.
    pub fn new() -> Self {
        Self {
            genesis: Entry::genesis(),
            tail: Vec::new(),
        }
    }

    /// Build a ledger from an existing chain without validating it.
    pub fn from_entries(entries: Vec<Entry>) -> Result<Self> {
        let mut ledger = Self::new();
        ledger.replace(entries)?;
        Ok(ledger)
    }

    /// Last entry of the chain.
    pub fn latest(&self) -> &Entry {
        self.tail.last().unwrap_or(&self.genesis)
    }

    /// First entry of the chain.
    pub fn genesis(&self) -> &Entry {
        &self.genesis
    }

    /// Number of entries, genesis included.
    pub fn len(&self) -> usize {
        self.tail.len() + 1
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the chain from genesis to tip.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        std::iter::once(&self.genesis).chain(self.tail.iter())
    }

    /// Snapshot of the whole chain.
    pub fn entries(&self) -> Vec<Entry> {
        self.iter().cloned().collect()
    }

    /// Build the next entry on top of the current tip, stamped with the
    /// current time. Does not mutate the ledger.
    pub fn create_next(&self, data: impl Into<String>) -> Entry {
        self.create_next_at(data, now_millis())
    }

    /// Build the next entry with an explicit timestamp.
    pub fn create_next_at(&self, data: impl Into<String>, timestamp: i64) -> Entry {
        let latest = self.latest();
        Entry::new(latest.index + 1, latest.hash.clone(), timestamp, data)
    }

    /// Push an already-validated entry onto the tip.
    pub fn append(&mut self, entry: Entry) {
        self.tail.push(entry);
    }

    /// Swap the whole chain for an already-validated one.
    pub fn replace(&mut self, chain: Vec<Entry>) -> Result<()> {
        let mut entries = chain.into_iter();
        let genesis = entries.next().ok_or(Error::EmptyLedger)?;
        self.genesis = genesis;
        self.tail = entries.collect();
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

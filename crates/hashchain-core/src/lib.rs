//! hashchain core library
//!
//! This crate provides the data model and the decision logic of the
//! replicated hashchain ledger. It performs no I/O.
//!
//! # Modules
//!
//! - [`types`]: The [`Entry`] record and the hard-coded genesis entry
//! - [`crypto`]: The entry digest
//! - [`ledger`]: The in-memory chain and its two mutation primitives
//! - [`validation`]: Linkage and whole-chain structural checks
//! - [`fork_choice`]: What to do with a chain received from a peer
//! - [`error`]: Error types

pub mod crypto;
pub mod error;
pub mod fork_choice;
pub mod ledger;
pub mod types;
pub mod validation;

#[cfg(test)]
mod test_vectors;

pub use error::{Error, Result};
pub use fork_choice::{on_local_submit, on_received_chain, ChainOutcome, SubmitOutcome};
pub use ledger::Ledger;
pub use types::*;
pub use validation::Rejection;

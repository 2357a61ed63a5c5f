//! Error types for hashchain

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// hashchain error types
#[derive(Debug, Error)]
pub enum Error {
    /// A chain operation was handed an empty sequence. The ledger always
    /// holds at least the genesis entry, so this is a programming error.
    #[error("ledger must contain at least the genesis entry")]
    EmptyLedger,
}

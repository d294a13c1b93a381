use alloc::collections::TryReserveError;
use alloc::string::String;

/// Errors surfaced by hash state construction and table operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The operating system could not supply randomness for the hash key.
    #[error("system entropy unavailable: {0}")]
    EntropyUnavailable(String),
    /// Backing storage for a table or a new entry could not be allocated.
    #[error("allocation failed: {0}")]
    AllocationFailed(#[from] TryReserveError),
    /// The requested capacity does not round up to a power of two that fits
    /// in a `usize`.
    #[error("capacity overflow: cannot round {requested} up to a power of two")]
    CapacityOverflow {
        /// The bucket or slot count asked for.
        requested: usize,
    },
    /// A linear-probe scan covered every slot without a match or a free slot.
    #[error("table full: all {capacity} slots are occupied")]
    TableFull {
        /// Number of slots in the table.
        capacity: usize,
    },
}

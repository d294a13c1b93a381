#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A fixed-capacity table that chains colliding entries per bucket.
///
/// This module provides `ChainedTable`, whose buckets are singly linked lists
/// threaded through an arena owned by the table.
pub mod chained_table;

mod entry;
mod error;

/// The keyed hash that places keys into buckets and slots.
///
/// This module provides `HashState`, a secret SipHash-2-4 state seeded from
/// operating system entropy, and the `KeyDigest` trait tables are generic
/// over.
pub mod hash_state;

/// A fixed-capacity table using open addressing with linear probing.
pub mod probe_table;

#[cfg(any(test, feature = "stats"))]
pub mod stats;

pub use chained_table::ChainedTable;
pub use entry::Entry;
pub use entry::EntryMut;
pub use entry::KEY_LEN;
pub use entry::Key;
pub use error::Error;
#[cfg(feature = "foldhash")]
pub use hash_state::FoldDigest;
pub use hash_state::BuildHasherDigest;
pub use hash_state::HashState;
pub use hash_state::KeyDigest;
#[cfg(feature = "std")]
pub use hash_state::initialize;
pub use probe_table::ProbeTable;

/// The lookup and insert-or-fetch contract shared by both table layouts.
///
/// Lets callers and benchmarks stay generic over the collision strategy.
/// Inserting into a [`ChainedTable`] only fails if the allocator does; a
/// [`ProbeTable`] additionally fails with [`Error::TableFull`].
///
/// # Examples
///
/// ```rust
/// # use pubkey_table::ChainedTable;
/// # use pubkey_table::HashState;
/// # use pubkey_table::KeyedTable;
/// # use pubkey_table::ProbeTable;
/// #
/// fn bump(table: &mut impl KeyedTable, key: &[u8; 32]) -> u64 {
///     let counter = table.find_or_insert(key).expect("room for key").into_counter_mut();
///     *counter += 1;
///     *counter
/// }
///
/// let state = HashState::with_keys(1, 2);
/// let mut chained = ChainedTable::with_capacity(16, state.clone());
/// let mut probing = ProbeTable::with_capacity(16, state);
///
/// assert_eq!(bump(&mut chained, &[1; 32]), 1);
/// assert_eq!(bump(&mut chained, &[1; 32]), 2);
/// assert_eq!(bump(&mut probing, &[1; 32]), 1);
/// ```
pub trait KeyedTable {
    /// Finds the entry for `key`.
    fn find(&self, key: &Key) -> Option<&Entry>;

    /// Finds the entry for `key`, returning a handle to its payload.
    fn find_mut(&mut self, key: &Key) -> Option<EntryMut<'_>>;

    /// Returns the entry for `key`, creating a zeroed one if the key is new.
    fn find_or_insert(&mut self, key: &Key) -> Result<EntryMut<'_>, Error>;

    /// Returns the number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the table holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of buckets or slots.
    fn capacity(&self) -> usize;
}

/// Rounds a requested bucket or slot count up to a power of two, minimum one.
pub(crate) fn round_capacity(requested: usize) -> Result<usize, Error> {
    requested
        .max(1)
        .checked_next_power_of_two()
        .ok_or(Error::CapacityOverflow { requested })
}

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::KeyedTable;
use crate::entry::Entry;
use crate::entry::EntryMut;
use crate::entry::KEY_LEN;
use crate::entry::Key;
use crate::error::Error;
use crate::hash_state::HashState;
use crate::hash_state::KeyDigest;
use crate::round_capacity;

/// Slot count used by [`ProbeTable::new`].
///
/// Sized for about 2^20 keys at a load factor of at most 25%; linear probing
/// degrades sharply as occupancy approaches capacity.
pub const DEFAULT_SLOTS: usize = 1 << 22;

/// Special tag value marking an empty slot.
///
/// Occupied slots carry the top seven bits of their digest, which never
/// produce 0x80.
const EMPTY: u8 = 0x80;

cfg_if::cfg_if! {
    if #[cfg(feature = "full-ring-scan")] {
        // A miss walks the entire ring, passing over empty slots.
        const STOP_AT_EMPTY: bool = false;
    } else {
        // Nothing is ever removed, so an empty slot ends every probe sequence
        // that could contain the key.
        const STOP_AT_EMPTY: bool = true;
    }
}

/// Filler for slots whose tag is [`EMPTY`].
const VACANT: Entry = Entry::new([0; KEY_LEN]);

#[inline(always)]
fn hashtag(hash: u64) -> u8 {
    (hash >> 57) as u8
}

/// A fixed-size hash table using open addressing with linear probing.
///
/// Entries live directly in a flat power-of-two array. A key's home slot is
/// `digest & (capacity - 1)`; collisions move forward one slot at a time,
/// wrapping at the end. A parallel byte array holds a 7-bit tag per occupied
/// slot so most foreign slots are skipped without comparing keys.
///
/// The table never resizes and never removes entries. Once every slot is
/// taken, inserting a new key fails with [`Error::TableFull`] and leaves the
/// existing entries untouched.
///
/// ## Example
///
/// ```rust
/// # use pubkey_table::Error;
/// # use pubkey_table::HashState;
/// # use pubkey_table::ProbeTable;
/// #
/// let state = HashState::from_entropy().expect("entropy");
/// let mut table = ProbeTable::with_capacity(4, state);
///
/// for i in 0..4u8 {
///     table.find_or_insert(&[i; 32]).unwrap().set_counter(i.into());
/// }
///
/// assert_eq!(table.find(&[2; 32]).map(|e| e.counter()), Some(2));
/// assert_eq!(
///     table.find_or_insert(&[4; 32]).err(),
///     Some(Error::TableFull { capacity: 4 })
/// );
/// ```
#[derive(Clone)]
pub struct ProbeTable<D = HashState> {
    tags: Box<[u8]>,
    slots: Box<[Entry]>,
    populated: usize,
    mask: usize,
    digest: D,
}

impl<D> Debug for ProbeTable<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProbeTable")
            .field("populated", &self.populated)
            .field("capacity", &self.tags.len())
            .finish_non_exhaustive()
    }
}

impl<D: KeyDigest> ProbeTable<D> {
    /// Creates a table with [`DEFAULT_SLOTS`] slots.
    pub fn new(digest: D) -> Self {
        Self::with_capacity(DEFAULT_SLOTS, digest)
    }

    /// Creates a table with at least `slots` slots.
    ///
    /// The slot count is rounded up to a power of two, and is at least one.
    ///
    /// # Panics
    ///
    /// Panics if the rounded slot count does not fit in a `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pubkey_table::HashState;
    /// # use pubkey_table::ProbeTable;
    /// #
    /// let table = ProbeTable::with_capacity(100, HashState::with_keys(1, 2));
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(slots: usize, digest: D) -> Self {
        let slots = match round_capacity(slots) {
            Ok(slots) => slots,
            Err(err) => panic!("{err}"),
        };
        Self {
            tags: vec![EMPTY; slots].into_boxed_slice(),
            slots: vec![VACANT; slots].into_boxed_slice(),
            populated: 0,
            mask: slots - 1,
            digest,
        }
    }

    /// Like [`ProbeTable::with_capacity`], but reports an oversized request
    /// or allocation failure instead of panicking or aborting.
    pub fn try_with_capacity(slots: usize, digest: D) -> Result<Self, Error> {
        let slots = round_capacity(slots)?;

        let mut tags = Vec::new();
        tags.try_reserve_exact(slots)?;
        tags.resize(slots, EMPTY);

        let mut entries = Vec::new();
        entries.try_reserve_exact(slots)?;
        entries.resize(slots, VACANT);

        Ok(Self {
            tags: tags.into_boxed_slice(),
            slots: entries.into_boxed_slice(),
            populated: 0,
            mask: slots - 1,
            digest,
        })
    }

    #[inline(always)]
    fn start_index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Probes for `key`, returning its slot index.
    #[inline]
    fn search(&self, key: &Key) -> Option<usize> {
        let hash = self.digest.digest(key);
        let tag = hashtag(hash);
        let start = self.start_index(hash);

        for step in 0..self.tags.len() {
            let index = (start + step) & self.mask;
            let slot_tag = self.tags[index];
            if slot_tag == EMPTY {
                if STOP_AT_EMPTY {
                    return None;
                }
                continue;
            }
            if slot_tag == tag && self.slots[index].matches(key) {
                return Some(index);
            }
        }

        None
    }

    /// Finds the entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pubkey_table::HashState;
    /// # use pubkey_table::ProbeTable;
    /// #
    /// let mut table = ProbeTable::with_capacity(16, HashState::with_keys(1, 2));
    /// table.find_or_insert(&[5; 32]).unwrap().set_aux(8);
    ///
    /// assert_eq!(table.find(&[5; 32]).map(|e| e.aux()), Some(8));
    /// assert_eq!(table.find(&[6; 32]), None);
    /// ```
    #[inline]
    pub fn find(&self, key: &Key) -> Option<&Entry> {
        if self.populated == 0 {
            return None;
        }

        let index = self.search(key)?;
        Some(&self.slots[index])
    }

    /// Finds the entry for `key`, returning a handle to its payload.
    #[inline]
    pub fn find_mut(&mut self, key: &Key) -> Option<EntryMut<'_>> {
        if self.populated == 0 {
            return None;
        }

        let index = self.search(key)?;
        Some(EntryMut::new(&mut self.slots[index]))
    }

    /// Returns the entry for `key`, placing a zeroed one in the first empty
    /// slot of its probe sequence if the key is new.
    ///
    /// Fails with [`Error::TableFull`] when the probe wraps all the way around
    /// without finding the key or a free slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pubkey_table::HashState;
    /// # use pubkey_table::ProbeTable;
    /// #
    /// let mut table = ProbeTable::with_capacity(16, HashState::with_keys(1, 2));
    ///
    /// table.find_or_insert(&[1; 32]).unwrap().set_counter(10);
    /// let again = table.find_or_insert(&[1; 32]).unwrap();
    /// assert_eq!(again.counter(), 10);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn find_or_insert(&mut self, key: &Key) -> Result<EntryMut<'_>, Error> {
        let hash = self.digest.digest(key);
        let tag = hashtag(hash);
        let start = self.start_index(hash);

        for step in 0..self.tags.len() {
            let index = (start + step) & self.mask;
            let slot_tag = self.tags[index];
            if slot_tag == EMPTY {
                self.tags[index] = tag;
                self.slots[index] = Entry::new(*key);
                self.populated += 1;
                return Ok(EntryMut::new(&mut self.slots[index]));
            }
            if slot_tag == tag && self.slots[index].matches(key) {
                return Ok(EntryMut::new(&mut self.slots[index]));
            }
        }

        Err(Error::TableFull {
            capacity: self.tags.len(),
        })
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.tags.len()
    }

    /// Returns `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.populated as f64 / self.tags.len() as f64
    }

    /// Returns an iterator over all entries in slot order.
    pub fn iter(&self) -> Iter<'_, D> {
        Iter {
            table: self,
            index: 0,
            remaining: self.populated,
        }
    }

    /// Distance of the entry in `index` from its home slot.
    #[cfg(any(test, feature = "stats"))]
    fn displacement(&self, index: usize) -> usize {
        let home = self.start_index(self.digest.digest(self.slots[index].key()));
        index.wrapping_sub(home) & self.mask
    }

    /// Computes a histogram of displacements, one sample per entry.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> crate::stats::ProbeHistogram {
        let mut hist = crate::stats::ProbeHistogram::default();
        for index in 0..self.tags.len() {
            if self.tags[index] != EMPTY {
                hist.record(self.displacement(index));
            }
        }
        hist
    }

    /// Returns utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::stats::DebugStats {
        let mut longest = 0;
        let mut total = 0;
        for index in 0..self.tags.len() {
            if self.tags[index] != EMPTY {
                let distance = self.displacement(index);
                longest = longest.max(distance);
                total += distance;
            }
        }

        crate::stats::DebugStats {
            populated: self.populated,
            capacity: self.tags.len(),
            occupied_slots: self.populated,
            load_factor: self.load_factor(),
            longest_probe: longest,
            mean_probe: if self.populated == 0 {
                0.0
            } else {
                total as f64 / self.populated as f64
            },
            total_bytes: core::mem::size_of_val(&*self.tags) + core::mem::size_of_val(&*self.slots),
        }
    }
}

impl<D: KeyDigest> KeyedTable for ProbeTable<D> {
    fn find(&self, key: &Key) -> Option<&Entry> {
        ProbeTable::find(self, key)
    }

    fn find_mut(&mut self, key: &Key) -> Option<EntryMut<'_>> {
        ProbeTable::find_mut(self, key)
    }

    fn find_or_insert(&mut self, key: &Key) -> Result<EntryMut<'_>, Error> {
        ProbeTable::find_or_insert(self, key)
    }

    fn len(&self) -> usize {
        self.populated
    }

    fn capacity(&self) -> usize {
        self.tags.len()
    }
}

/// An iterator over the entries of a [`ProbeTable`].
///
/// Created by [`ProbeTable::iter`].
pub struct Iter<'a, D> {
    table: &'a ProbeTable<D>,
    index: usize,
    remaining: usize,
}

impl<'a, D> Iterator for Iter<'a, D> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        while self.index < self.table.tags.len() {
            let index = self.index;
            self.index += 1;
            if self.table.tags[index] != EMPTY {
                self.remaining -= 1;
                return Some(&self.table.slots[index]);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<D> ExactSizeIterator for Iter<'_, D> {}

impl<'a, D: KeyDigest> IntoIterator for &'a ProbeTable<D> {
    type Item = &'a Entry;
    type IntoIter = Iter<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

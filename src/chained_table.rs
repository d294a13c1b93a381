use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::KeyedTable;
use crate::entry::Entry;
use crate::entry::EntryMut;
use crate::entry::Key;
use crate::error::Error;
use crate::hash_state::HashState;
use crate::hash_state::KeyDigest;
use crate::round_capacity;

/// Bucket count used by [`ChainedTable::new`].
pub const DEFAULT_BUCKETS: usize = 1 << 17;

/// End-of-chain marker for arena links.
const NIL: usize = usize::MAX;

#[derive(Clone)]
struct Node {
    entry: Entry,
    next: usize,
}

/// A fixed-size hash table that resolves collisions by chaining.
///
/// Each of the power-of-two buckets heads a singly linked list of entries
/// whose digests land in it. Chains are threaded through a single arena by
/// index, so inserting never allocates a node of its own and entries are
/// laid out in insertion order. Buckets have no length limit; the bucket
/// count only affects the expected chain length.
///
/// The table never resizes and never removes entries.
///
/// ## Example
///
/// ```rust
/// # use pubkey_table::ChainedTable;
/// # use pubkey_table::HashState;
/// #
/// let state = HashState::from_entropy().expect("entropy");
/// let mut table = ChainedTable::with_capacity(1024, state);
///
/// let key = [0x11; 32];
/// table.find_or_insert(&key).set_counter(5);
///
/// assert_eq!(table.find(&key).map(|e| e.counter()), Some(5));
/// assert!(table.find(&[0x22; 32]).is_none());
/// ```
#[derive(Clone)]
pub struct ChainedTable<D = HashState> {
    heads: Box<[usize]>,
    nodes: Vec<Node>,
    mask: usize,
    digest: D,
}

impl<D> Debug for ChainedTable<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChainedTable")
            .field("populated", &self.nodes.len())
            .field("buckets", &self.heads.len())
            .finish_non_exhaustive()
    }
}

impl<D: KeyDigest> ChainedTable<D> {
    /// Creates a table with [`DEFAULT_BUCKETS`] buckets.
    pub fn new(digest: D) -> Self {
        Self::with_capacity(DEFAULT_BUCKETS, digest)
    }

    /// Creates a table with at least `buckets` buckets.
    ///
    /// The bucket count is rounded up to a power of two, and is at least one.
    ///
    /// # Panics
    ///
    /// Panics if the rounded bucket count does not fit in a `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pubkey_table::ChainedTable;
    /// # use pubkey_table::HashState;
    /// #
    /// let table = ChainedTable::with_capacity(1000, HashState::with_keys(1, 2));
    /// assert_eq!(table.capacity(), 1024);
    /// assert!(table.is_empty());
    /// ```
    pub fn with_capacity(buckets: usize, digest: D) -> Self {
        let buckets = match round_capacity(buckets) {
            Ok(buckets) => buckets,
            Err(err) => panic!("{err}"),
        };
        Self {
            heads: vec![NIL; buckets].into_boxed_slice(),
            nodes: Vec::new(),
            mask: buckets - 1,
            digest,
        }
    }

    /// Like [`ChainedTable::with_capacity`], but reports an oversized request
    /// or allocation failure instead of panicking or aborting.
    pub fn try_with_capacity(buckets: usize, digest: D) -> Result<Self, Error> {
        let buckets = round_capacity(buckets)?;

        let mut heads = Vec::new();
        heads.try_reserve_exact(buckets)?;
        heads.resize(buckets, NIL);

        Ok(Self {
            heads: heads.into_boxed_slice(),
            nodes: Vec::new(),
            mask: buckets - 1,
            digest,
        })
    }

    #[inline(always)]
    fn bucket_index(&self, key: &Key) -> usize {
        (self.digest.digest(key) as usize) & self.mask
    }

    /// Walks the chain of `bucket`, returning the matching node or the tail.
    #[inline]
    fn search_chain(&self, bucket: usize, key: &Key) -> Result<usize, Option<usize>> {
        let mut tail = None;
        let mut cursor = self.heads[bucket];
        while cursor != NIL {
            let node = &self.nodes[cursor];
            if node.entry.matches(key) {
                return Ok(cursor);
            }
            tail = Some(cursor);
            cursor = node.next;
        }
        Err(tail)
    }

    /// Finds the entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pubkey_table::ChainedTable;
    /// # use pubkey_table::HashState;
    /// #
    /// let mut table = ChainedTable::with_capacity(16, HashState::with_keys(1, 2));
    /// table.find_or_insert(&[1; 32]).set_aux(3);
    ///
    /// assert_eq!(table.find(&[1; 32]).map(|e| e.aux()), Some(3));
    /// assert_eq!(table.find(&[2; 32]), None);
    /// ```
    #[inline]
    pub fn find(&self, key: &Key) -> Option<&Entry> {
        if self.nodes.is_empty() {
            return None;
        }

        let index = self.search_chain(self.bucket_index(key), key).ok()?;
        Some(&self.nodes[index].entry)
    }

    /// Finds the entry for `key`, returning a handle to its payload.
    #[inline]
    pub fn find_mut(&mut self, key: &Key) -> Option<EntryMut<'_>> {
        if self.nodes.is_empty() {
            return None;
        }

        let index = self.search_chain(self.bucket_index(key), key).ok()?;
        Some(EntryMut::new(&mut self.nodes[index].entry))
    }

    /// Returns the entry for `key`, appending a zeroed one to its bucket's
    /// chain if the key is new.
    ///
    /// Aborts through the global allocation error handler if the arena cannot
    /// grow; see [`ChainedTable::try_find_or_insert`] for a fallible variant.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use pubkey_table::ChainedTable;
    /// # use pubkey_table::HashState;
    /// #
    /// let mut table = ChainedTable::with_capacity(16, HashState::with_keys(1, 2));
    ///
    /// *table.find_or_insert(&[9; 32]).counter_mut() += 1;
    /// *table.find_or_insert(&[9; 32]).counter_mut() += 1;
    ///
    /// assert_eq!(table.len(), 1);
    /// assert_eq!(table.find(&[9; 32]).map(|e| e.counter()), Some(2));
    /// ```
    pub fn find_or_insert(&mut self, key: &Key) -> EntryMut<'_> {
        let bucket = self.bucket_index(key);
        match self.search_chain(bucket, key) {
            Ok(index) => EntryMut::new(&mut self.nodes[index].entry),
            Err(tail) => self.append(bucket, tail, key),
        }
    }

    /// Like [`ChainedTable::find_or_insert`], but reports allocation failure
    /// instead of aborting.
    pub fn try_find_or_insert(&mut self, key: &Key) -> Result<EntryMut<'_>, Error> {
        let bucket = self.bucket_index(key);
        match self.search_chain(bucket, key) {
            Ok(index) => Ok(EntryMut::new(&mut self.nodes[index].entry)),
            Err(tail) => {
                self.nodes.try_reserve(1)?;
                Ok(self.append(bucket, tail, key))
            }
        }
    }

    fn append(&mut self, bucket: usize, tail: Option<usize>, key: &Key) -> EntryMut<'_> {
        let index = self.nodes.len();
        self.nodes.push(Node {
            entry: Entry::new(*key),
            next: NIL,
        });

        match tail {
            Some(tail) => self.nodes[tail].next = index,
            None => self.heads[bucket] = index,
        }

        EntryMut::new(&mut self.nodes[index].entry)
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.heads.len()
    }

    /// Returns an iterator over all entries in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.nodes.iter(),
        }
    }

    #[cfg(any(test, feature = "stats"))]
    fn chain_len(&self, bucket: usize) -> usize {
        let mut len = 0;
        let mut cursor = self.heads[bucket];
        while cursor != NIL {
            len += 1;
            cursor = self.nodes[cursor].next;
        }
        len
    }

    /// Computes a histogram of chain lengths, one sample per bucket.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> crate::stats::ProbeHistogram {
        let mut hist = crate::stats::ProbeHistogram::default();
        for bucket in 0..self.heads.len() {
            hist.record(self.chain_len(bucket));
        }
        hist
    }

    /// Returns utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::stats::DebugStats {
        let mut occupied = 0;
        let mut longest = 0;
        for bucket in 0..self.heads.len() {
            let len = self.chain_len(bucket);
            if len > 0 {
                occupied += 1;
            }
            longest = longest.max(len);
        }

        crate::stats::DebugStats {
            populated: self.nodes.len(),
            capacity: self.heads.len(),
            occupied_slots: occupied,
            load_factor: self.nodes.len() as f64 / self.heads.len() as f64,
            longest_probe: longest,
            mean_probe: if occupied == 0 {
                0.0
            } else {
                self.nodes.len() as f64 / occupied as f64
            },
            total_bytes: core::mem::size_of_val(&*self.heads)
                + self.nodes.capacity() * core::mem::size_of::<Node>(),
        }
    }
}

impl<D: KeyDigest> KeyedTable for ChainedTable<D> {
    fn find(&self, key: &Key) -> Option<&Entry> {
        ChainedTable::find(self, key)
    }

    fn find_mut(&mut self, key: &Key) -> Option<EntryMut<'_>> {
        ChainedTable::find_mut(self, key)
    }

    fn find_or_insert(&mut self, key: &Key) -> Result<EntryMut<'_>, Error> {
        self.try_find_or_insert(key)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn capacity(&self) -> usize {
        self.heads.len()
    }
}

/// An iterator over the entries of a [`ChainedTable`].
///
/// Created by [`ChainedTable::iter`].
pub struct Iter<'a> {
    inner: core::slice::Iter<'a, Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| &node.entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a, D: KeyDigest> IntoIterator for &'a ChainedTable<D> {
    type Item = &'a Entry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

use core::ops::Deref;

/// Length in bytes of a table key.
pub const KEY_LEN: usize = 32;

/// A 32-byte lookup key, typically a public key.
pub type Key = [u8; KEY_LEN];

/// The record stored for each key.
///
/// An `Entry` is created zero-initialized the first time its key is inserted
/// and lives as long as the table that owns it. The key is fixed at creation;
/// the two payload fields are free for the embedding application to use and
/// are written through an [`EntryMut`].
///
/// # Examples
///
/// ```rust
/// # use pubkey_table::ChainedTable;
/// # use pubkey_table::HashState;
/// #
/// let mut table = ChainedTable::with_capacity(8, HashState::with_keys(1, 2));
/// let mut entry = table.find_or_insert(&[7; 32]);
/// assert_eq!(entry.counter(), 0);
///
/// entry.set_counter(42);
/// entry.set_aux(9);
///
/// let entry = table.find(&[7; 32]).unwrap();
/// assert_eq!(entry.counter(), 42);
/// assert_eq!(entry.aux(), 9);
/// assert_eq!(entry.key(), &[7; 32]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry {
    key: Key,
    counter: u64,
    aux: u32,
}

impl Entry {
    #[inline]
    pub(crate) const fn new(key: Key) -> Self {
        Self {
            key,
            counter: 0,
            aux: 0,
        }
    }

    /// The key this entry was inserted under.
    #[inline]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// The 8-byte counter payload.
    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// The 4-byte auxiliary payload.
    #[inline]
    pub fn aux(&self) -> u32 {
        self.aux
    }

    #[inline(always)]
    pub(crate) fn matches(&self, key: &Key) -> bool {
        self.key == *key
    }
}

/// Write access to the payload of an entry stored in a table.
///
/// Returned by the tables' `find_mut` and `find_or_insert`. Only the counter
/// and auxiliary fields can be changed; the key stays the one the entry was
/// inserted under, so lookups keep finding it. Reads go through [`Deref`] to
/// the underlying [`Entry`].
#[derive(Debug)]
pub struct EntryMut<'a> {
    entry: &'a mut Entry,
}

impl<'a> EntryMut<'a> {
    #[inline(always)]
    pub(crate) fn new(entry: &'a mut Entry) -> Self {
        Self { entry }
    }

    /// Overwrites the counter payload.
    #[inline]
    pub fn set_counter(&mut self, counter: u64) {
        self.entry.counter = counter;
    }

    /// Mutable access to the counter payload, for in-place arithmetic.
    #[inline]
    pub fn counter_mut(&mut self) -> &mut u64 {
        &mut self.entry.counter
    }

    /// Overwrites the auxiliary payload.
    #[inline]
    pub fn set_aux(&mut self, aux: u32) {
        self.entry.aux = aux;
    }

    /// Mutable access to the auxiliary payload.
    #[inline]
    pub fn aux_mut(&mut self) -> &mut u32 {
        &mut self.entry.aux
    }

    /// Converts the handle into a mutable reference to the counter with the
    /// table's borrow lifetime.
    #[inline]
    pub fn into_counter_mut(self) -> &'a mut u64 {
        let entry = self.entry;
        &mut entry.counter
    }
}

impl Deref for EntryMut<'_> {
    type Target = Entry;

    #[inline(always)]
    fn deref(&self) -> &Entry {
        &*self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_zeroed() {
        let entry = Entry::new([0xAB; KEY_LEN]);
        assert_eq!(entry.key(), &[0xAB; KEY_LEN]);
        assert_eq!(entry.counter(), 0);
        assert_eq!(entry.aux(), 0);
    }

    #[test]
    fn payload_mutation_keeps_key() {
        let mut entry = Entry::new([1; KEY_LEN]);
        {
            let mut handle = EntryMut::new(&mut entry);
            *handle.counter_mut() += 5;
            handle.set_aux(u32::MAX);
            *handle.aux_mut() -= 1;
            assert_eq!(handle.key(), &[1; KEY_LEN]);
        }

        assert_eq!(entry.counter(), 5);
        assert_eq!(entry.aux(), u32::MAX - 1);
        assert!(entry.matches(&[1; KEY_LEN]));
        assert!(!entry.matches(&[2; KEY_LEN]));
    }

    #[test]
    fn swapping_handles_leaves_entries_in_place() {
        let mut a = Entry::new([1; KEY_LEN]);
        let mut b = Entry::new([2; KEY_LEN]);
        {
            let mut ha = EntryMut::new(&mut a);
            let mut hb = EntryMut::new(&mut b);
            core::mem::swap(&mut ha, &mut hb);
            ha.set_counter(20);
            hb.set_counter(10);
        }

        assert_eq!(a.key(), &[1; KEY_LEN]);
        assert_eq!(a.counter(), 10);
        assert_eq!(b.key(), &[2; KEY_LEN]);
        assert_eq!(b.counter(), 20);
    }

    #[test]
    fn into_counter_mut_outlives_handle() {
        let mut entry = Entry::new([3; KEY_LEN]);
        let counter = EntryMut::new(&mut entry).into_counter_mut();
        *counter = 77;
        assert_eq!(entry.counter(), 77);
    }
}

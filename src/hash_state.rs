use alloc::string::ToString;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hasher;

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::entry::KEY_LEN;
use crate::entry::Key;
use crate::error::Error;

// ASCII "somepseudorandomlygeneratedbytes", folded into the key words.
const SOMEPSEU: u64 = 0x736f_6d65_7073_6575;
const DORANDOM: u64 = 0x646f_7261_6e64_6f6d;
const LYGENERA: u64 = 0x6c79_6765_6e65_7261;
const TEDBYTES: u64 = 0x7465_6462_7974_6573;

/// Source of 64-bit digests for table keys.
///
/// Tables reduce the digest to a bucket or slot with `digest & (capacity -
/// 1)`, so every bit of the output should depend on every bit of the key.
pub trait KeyDigest {
    /// Computes the digest of `key`.
    fn digest(&self, key: &Key) -> u64;
}

impl<T: KeyDigest + ?Sized> KeyDigest for &T {
    #[inline(always)]
    fn digest(&self, key: &Key) -> u64 {
        (**self).digest(key)
    }
}

/// Secret SipHash-2-4 state specialised to 32-byte keys.
///
/// The state is four 64-bit words derived from a 128-bit key, laid out exactly
/// as SipHash initializes them, so [`HashState::digest`] produces the same
/// value as SipHash-2-4 keyed with `(k0, k1)` over the 32 key bytes. Without
/// the key an adversary cannot choose keys that pile into one bucket.
///
/// The state is never exposed: `Debug` prints nothing but the type name.
///
/// # Examples
///
/// ```rust
/// # use pubkey_table::HashState;
/// #
/// let state = HashState::from_entropy().expect("entropy");
/// let key = [3u8; 32];
/// assert_eq!(state.digest(&key), state.digest(&key));
/// ```
#[derive(Clone)]
pub struct HashState {
    v: [u64; 4],
}

impl Debug for HashState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashState").finish_non_exhaustive()
    }
}

impl HashState {
    /// Derives a fresh state from operating system entropy.
    ///
    /// Only half of the state is random; the other half is fixed-constant
    /// mixing of the random half, as SipHash specifies.
    pub fn from_entropy() -> Result<Self, Error> {
        let mut seed = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|err| Error::EntropyUnavailable(err.to_string()))?;
        Ok(Self::from_seed(seed))
    }

    /// Builds a state from a 16-byte seed, read as two little-endian words.
    pub fn from_seed(seed: [u8; 16]) -> Self {
        let mut k0 = [0u8; 8];
        let mut k1 = [0u8; 8];
        k0.copy_from_slice(&seed[..8]);
        k1.copy_from_slice(&seed[8..]);
        Self::with_keys(u64::from_le_bytes(k0), u64::from_le_bytes(k1))
    }

    /// Builds a state from explicit SipHash keys.
    ///
    /// Use this for reproducible tables in tests; production tables should
    /// use [`HashState::from_entropy`] or [`initialize`](crate::initialize).
    pub const fn with_keys(k0: u64, k1: u64) -> Self {
        let v0 = k0 ^ SOMEPSEU;
        let v1 = k1 ^ DORANDOM;
        Self {
            v: [v0, v1, v0 ^ SOMEPSEU ^ LYGENERA, v1 ^ DORANDOM ^ TEDBYTES],
        }
    }

    /// Computes the 64-bit digest of a 32-byte key.
    #[inline]
    pub fn digest(&self, key: &Key) -> u64 {
        let mut v = self.v;

        for chunk in key.chunks_exact(8) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            let m = u64::from_le_bytes(word);

            v[3] ^= m;
            sip_round(&mut v);
            sip_round(&mut v);
            v[0] ^= m;
        }

        let tail = (KEY_LEN as u64) << 56;
        v[3] ^= tail;
        sip_round(&mut v);
        sip_round(&mut v);
        v[0] ^= tail;

        v[2] ^= 0xff;
        sip_round(&mut v);
        sip_round(&mut v);
        sip_round(&mut v);
        sip_round(&mut v);

        v[0] ^ v[1] ^ v[2] ^ v[3]
    }
}

impl KeyDigest for HashState {
    #[inline(always)]
    fn digest(&self, key: &Key) -> u64 {
        HashState::digest(self, key)
    }
}

#[inline(always)]
fn sip_round(v: &mut [u64; 4]) {
    v[0] = v[0].wrapping_add(v[1]);
    v[1] = v[1].rotate_left(13);
    v[1] ^= v[0];
    v[0] = v[0].rotate_left(32);
    v[2] = v[2].wrapping_add(v[3]);
    v[3] = v[3].rotate_left(16);
    v[3] ^= v[2];
    v[0] = v[0].wrapping_add(v[3]);
    v[3] = v[3].rotate_left(21);
    v[3] ^= v[0];
    v[2] = v[2].wrapping_add(v[1]);
    v[1] = v[1].rotate_left(17);
    v[1] ^= v[2];
    v[2] = v[2].rotate_left(32);
}

/// Returns the process-wide hash state, creating it on first use.
///
/// Every call returns the same state. If the operating system cannot provide
/// entropy the process panics: continuing with a guessable key would let
/// callers flood a single bucket.
///
/// # Examples
///
/// ```rust
/// # use pubkey_table::initialize;
/// #
/// let a = initialize();
/// let b = initialize();
/// assert!(core::ptr::eq(a, b));
/// ```
#[cfg(feature = "std")]
pub fn initialize() -> &'static HashState {
    static STATE: std::sync::OnceLock<HashState> = std::sync::OnceLock::new();

    STATE.get_or_init(|| match HashState::from_entropy() {
        Ok(state) => state,
        Err(err) => panic!("cannot seed the key hash: {err}"),
    })
}

/// Adapts any [`BuildHasher`] into a [`KeyDigest`].
///
/// The 32 key bytes are written to a fresh hasher as raw bytes, without a
/// length prefix.
///
/// # Examples
///
/// ```rust
/// # use std::collections::hash_map::RandomState;
/// #
/// # use pubkey_table::BuildHasherDigest;
/// # use pubkey_table::ChainedTable;
/// #
/// let mut table = ChainedTable::with_capacity(64, BuildHasherDigest(RandomState::new()));
/// table.find_or_insert(&[1; 32]).set_counter(1);
/// assert_eq!(table.find(&[1; 32]).map(|e| e.counter()), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BuildHasherDigest<S>(pub S);

impl<S: BuildHasher> KeyDigest for BuildHasherDigest<S> {
    #[inline]
    fn digest(&self, key: &Key) -> u64 {
        let mut hasher = self.0.build_hasher();
        hasher.write(key);
        hasher.finish()
    }
}

/// Digest backed by `foldhash`'s randomly seeded fast hasher.
///
/// Faster than [`HashState`] but without SipHash's flooding resistance.
#[cfg(feature = "foldhash")]
pub type FoldDigest = BuildHasherDigest<foldhash::fast::RandomState>;

/*!

Deterministic hashing. The standard library's `HashMap` is seeded randomly per process, which
would make iteration order (and anything derived from it) differ from run to run. Everything in
this crate that hashes uses the `rustc-hash` hasher instead, which is both fast and stable.

*/

use rustc_hash::FxHasher;
use std::hash::{BuildHasherDefault, Hash, Hasher};

pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Provides `new()` and `with_capacity()` for the alias above, which the standard
/// constructors don't cover because of the non-default hasher.
pub trait HashMapExt {
    fn new() -> Self;
    fn with_capacity(capacity: usize) -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, BuildHasherDefault::default())
    }
}

/// A stable 64-bit hash of any hashable value.
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

pub fn hash_u64(data: u64) -> u64 {
    hash_value(&data)
}

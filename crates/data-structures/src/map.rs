//! Hash maps and sets keyed with [`FxBuildHasher`].
//!
//! The `Index*` variants iterate in insertion order, which keeps compiler output stable across
//! runs.

use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};

pub use rustc_hash::FxBuildHasher;

pub type FxHashMap<K, V> = HashMap<K, V, FxBuildHasher>;
pub type FxHashSet<T> = HashSet<T, FxBuildHasher>;
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_map_keeps_insertion_order() {
        let mut map = FxIndexMap::default();
        for (i, name) in ["tmp2", "a", "tmp0"].into_iter().enumerate() {
            map.insert(name, i);
        }
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), ["tmp2", "a", "tmp0"]);
        assert_eq!(map.shift_remove("a"), Some(1));
        assert_eq!(map.get_index(1), Some((&"tmp0", &2)));
    }
}

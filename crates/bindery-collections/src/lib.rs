pub mod bi_map;

pub mod im_vec {
    pub use imbl::vector::{ConsumingIter as IntoIter, Iter};

    /// Persistent vector; clones share structure, so immutable values holding
    /// one stay cheap to copy and edit.
    pub type ImVec<T> = imbl::Vector<T>;
}

pub mod hash_map {
    use std::hash::RandomState;

    pub use std::collections::hash_map::{Entry, IntoIter, Iter, IterMut};

    pub type HashMap<K, V, S = RandomState> = std::collections::HashMap<K, V, S>;
}

pub mod hash_set {
    use std::hash::RandomState;

    pub use std::collections::hash_set::{IntoIter, Iter};

    pub type HashSet<T, S = RandomState> = std::collections::HashSet<T, S>;
}

pub mod index_map {
    pub use indexmap::map::{Entry, IntoIter, Iter};

    pub type IndexMap<K, V> = indexmap::IndexMap<K, V>;
}

pub use bi_map::BiMap;
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use im_vec::ImVec;
pub use index_map::IndexMap;

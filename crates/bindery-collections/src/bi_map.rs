use std::hash::{BuildHasher, Hash, RandomState};

use crate::hash_map::HashMap;

/// One-to-one map that can be queried from either side.
///
/// Inserting a pair evicts any previous pair sharing its key or its value.
#[derive(Debug, Clone)]
pub struct BiMap<K, V, S: BuildHasher = RandomState> {
    forward: HashMap<K, V, S>,
    backward: HashMap<V, K, S>,
}

impl<K, V> Default for BiMap<K, V> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            backward: HashMap::new(),
        }
    }
}

impl<K, V> BiMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V, S> BiMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    S: BuildHasher,
{
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(old) = self.forward.remove(&key) {
            self.backward.remove(&old);
        }
        if let Some(old) = self.backward.remove(&value) {
            self.forward.remove(&old);
        }
        self.forward.insert(key.clone(), value.clone());
        self.backward.insert(value, key);
    }

    pub fn get_by_key(&self, key: &K) -> Option<&V> {
        self.forward.get(key)
    }

    pub fn get_by_value(&self, value: &V) -> Option<&K> {
        self.backward.get(value)
    }

    pub fn remove_by_key(&mut self, key: &K) -> Option<V> {
        let value = self.forward.remove(key)?;
        self.backward.remove(&value);
        Some(value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.forward.contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool {
        self.backward.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.forward.iter()
    }
}

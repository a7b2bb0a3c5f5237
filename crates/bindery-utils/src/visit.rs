use std::{collections::HashMap, hash::Hash};

use derive_more::Display;

/// Depth-first traversal state of a node.
///
/// A node seen again while still `Visiting` closes a cycle.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VisitState {
    Unvisited,
    Visiting,
    Visited,
}

#[derive(Debug, Clone)]
pub struct VisitMap<T>(HashMap<T, VisitState>);

impl<T> VisitMap<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn get(&self, key: &T) -> VisitState {
        self.0.get(key).copied().unwrap_or(VisitState::Unvisited)
    }

    pub fn insert(&mut self, key: T, state: VisitState) -> Option<VisitState> {
        self.0.insert(key, state)
    }

    pub fn is_visiting(&self, key: &T) -> bool {
        self.get(key) == VisitState::Visiting
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for VisitMap<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

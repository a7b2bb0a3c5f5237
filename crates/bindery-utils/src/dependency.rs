//! Directed dependency graphs with cycle reporting.

use std::{
    collections::HashMap,
    fmt::{self, Debug},
    hash::Hash,
};

use indexmap::{IndexMap, IndexSet};

use crate::visit::{VisitMap, VisitState};

/// Error representing a dependency cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError<T>(Vec<T>);

impl<T> CycleError<T> {
    pub fn new(path: Vec<T>) -> Self {
        Self(path)
    }

    /// The nodes of the cycle, first node repeated at the end.
    pub fn path(&self) -> &[T] {
        &self.0
    }
}

impl<T: fmt::Display> fmt::Display for CycleError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency cycle detected: ")?;

        let mut iter = self.0.iter();

        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }

        for el in iter {
            write!(f, " -> {}", el)?;
        }

        Ok(())
    }
}

/// Graph of dependencies, iterated in insertion order.
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    /// Forward dependencies (node -> dependencies)
    forward: IndexMap<T, IndexSet<T>>,

    /// Reverse dependencies (node -> dependents)
    reverse: IndexMap<T, IndexSet<T>>,
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self {
            forward: IndexMap::default(),
            reverse: IndexMap::default(),
        }
    }
}

impl<T> DependencyGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl<T: Eq + Hash> DependencyGraph<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.forward.contains_key(item)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.forward.keys()
    }

    pub fn dependencies_of(&self, item: &T) -> impl Iterator<Item = &T> {
        self.forward
            .get(item)
            .map(|deps| deps.iter())
            .into_iter()
            .flatten()
    }

    pub fn dependents_of(&self, item: &T) -> impl Iterator<Item = &T> {
        self.reverse
            .get(item)
            .map(|deps| deps.iter())
            .into_iter()
            .flatten()
    }
}

impl<T: Eq + Hash + Copy> DependencyGraph<T> {
    pub fn add_node(&mut self, item: T) {
        self.forward.entry(item).or_default();
        self.reverse.entry(item).or_default();
    }

    pub fn add_dependency(&mut self, from: T, to: T) {
        self.add_node(from);
        self.add_node(to);
        self.forward.entry(from).or_default().insert(to);
        self.reverse.entry(to).or_default().insert(from);
    }

    /// Orders nodes so that every node comes after its dependencies.
    pub fn topological_sort(&self) -> Result<Vec<T>, CycleError<T>>
    where
        T: Debug,
    {
        let mut visited = VisitMap::new();
        let mut order = Vec::new();
        let mut stack = self.forward.keys().rev().copied().collect::<Vec<_>>();
        let mut path = Vec::new();

        while let Some(node) = stack.pop() {
            match visited.get(&node) {
                VisitState::Unvisited => {
                    visited.insert(node, VisitState::Visiting);
                    stack.push(node);
                    path.push(node);

                    for &dep in self.dependencies_of(&node) {
                        match visited.get(&dep) {
                            VisitState::Unvisited => stack.push(dep),
                            VisitState::Visiting => {
                                let start = path.iter().position(|&n| n == dep).unwrap_or(0);
                                let mut cycle = path[start..].to_vec();
                                cycle.push(dep);
                                return Err(CycleError::new(cycle));
                            }
                            VisitState::Visited => {}
                        }
                    }
                }
                VisitState::Visiting => {
                    visited.insert(node, VisitState::Visited);
                    path.retain(|&n| n != node);
                    order.push(node);
                }
                VisitState::Visited => {}
            }
        }
        Ok(order)
    }

    /// Strongly connected components that form cycles, including
    /// single nodes depending on themselves, in discovery order.
    pub fn cycles(&self) -> Vec<Vec<T>> {
        let mut tarjan = Tarjan {
            graph: self,
            index: 0,
            indices: HashMap::new(),
            lowlink: HashMap::new(),
            stack: Vec::new(),
            on_stack: IndexSet::new(),
            components: Vec::new(),
        };

        for &node in self.forward.keys() {
            if !tarjan.indices.contains_key(&node) {
                tarjan.connect(node);
            }
        }

        let mut cycles = tarjan
            .components
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.dependencies_of(single).any(|dep| dep == single),
                _ => true,
            })
            .collect::<Vec<_>>();

        for component in &mut cycles {
            component.sort_by_key(|node| self.forward.get_index_of(node));
        }
        cycles.sort_by_key(|component| self.forward.get_index_of(&component[0]));
        cycles
    }
}

struct Tarjan<'g, T> {
    graph: &'g DependencyGraph<T>,
    index: usize,
    indices: HashMap<T, usize>,
    lowlink: HashMap<T, usize>,
    stack: Vec<T>,
    on_stack: IndexSet<T>,
    components: Vec<Vec<T>>,
}

impl<T: Eq + Hash + Copy> Tarjan<'_, T> {
    // Reference graphs are shallow enough that recursion depth is not a concern.
    fn connect(&mut self, node: T) {
        self.indices.insert(node, self.index);
        self.lowlink.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let graph = self.graph;
        for &dep in graph.dependencies_of(&node) {
            if !self.indices.contains_key(&dep) {
                self.connect(dep);
                let low = self.lowlink[&node].min(self.lowlink[&dep]);
                self.lowlink.insert(node, low);
            } else if self.on_stack.contains(&dep) {
                let low = self.lowlink[&node].min(self.indices[&dep]);
                self.lowlink.insert(node, low);
            }
        }

        if self.lowlink[&node] == self.indices[&node] {
            let mut component = Vec::new();
            while let Some(top) = self.stack.pop() {
                self.on_stack.swap_remove(&top);
                component.push(top);
                if top == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

//! Reference binding for one scope.
//!
//! Every declared reference of the root and, transitively, of everything it
//! reaches is resolved against the root's direct units only:
//!
//! ```text
//! requested identity ──select──▶ Root | Unit(i) | Missing
//!                                        │
//!                     determine(i) ◀─────┘
//!                       ├─ image:        PE assembly, reused when its bound references match
//!                       └─ compilation:  home assembly when its references match,
//!                                        a cached retargeting assembly otherwise
//! ```
//!
//! Units that reach each other form a group and are materialized together
//! once the whole group is resolved. A group reuses existing assemblies when
//! one per member can be found whose references match, with references
//! inside the group pointing at each other. Otherwise every member gets a
//! fresh assembly and the group is wired to itself.

use std::sync::Arc;

use bindery_collections::HashMap;
use bindery_metadata::{identity::AssemblyIdentity, image::AssemblyImage};
use bindery_symbols::prelude::*;
use ecow::eco_format;
use log::{debug, trace};

use crate::{
    compilation::Compilation,
    edge::{BoundEdge, EdgeState},
    scope::{Scope, Selection, Unit},
    session::Session,
};

/// Result of binding one scope.
#[derive(Debug)]
pub(crate) struct BindOutcome {
    pub assembly: AssemblyId,
    /// Assembly per direct unit of the scope, in scope order.
    pub direct: Vec<AssemblyId>,
    pub added_modules: Vec<ModuleId>,
    pub edges: Vec<BoundEdge>,
}

/// Where a requested identity led.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Bound(AssemblyId),
    /// A unit whose group is still being resolved.
    Pending(usize),
}

#[derive(Debug)]
enum Recorded {
    Finished(BoundEdge),
    Unit {
        edge: BoundEdge,
        target: Target,
        exact: bool,
    },
}

pub(crate) struct Binder<'a> {
    session: &'a mut Session,
    compilation: &'a Compilation,
    scope: &'a Scope,
    root: AssemblyId,
    indices: HashMap<usize, usize>,
    lowlinks: HashMap<usize, usize>,
    stack: Vec<usize>,
    /// Per module targets of units whose group is not materialized yet.
    requested: HashMap<usize, Vec<Vec<Target>>>,
    resolved: HashMap<usize, AssemblyId>,
    edges: Vec<Recorded>,
}

impl<'a> Binder<'a> {
    pub fn new(session: &'a mut Session, compilation: &'a Compilation, scope: &'a Scope) -> Self {
        let id = compilation.id();
        let root = session
            .table
            .add_assembly(compilation.identity(), AssemblyKind::Source { compilation: id });
        session.table.add_module(
            root,
            eco_format!("{}.dll", compilation.assembly_name()),
            ModuleKind::Source { compilation: id },
            None,
        );

        Self {
            session,
            compilation,
            scope,
            root,
            indices: HashMap::new(),
            lowlinks: HashMap::new(),
            stack: Vec::new(),
            requested: HashMap::new(),
            resolved: HashMap::new(),
            edges: Vec::new(),
        }
    }

    pub fn run(mut self) -> BindOutcome {
        let scope = self.scope;
        let none = HashMap::new();

        let added_modules = scope
            .modules
            .iter()
            .map(|(_, image)| {
                self.session.table.add_module(
                    self.root,
                    image.name.clone(),
                    ModuleKind::Metadata {
                        image: image.clone(),
                    },
                    None,
                )
            })
            .collect::<Vec<_>>();

        let mut direct = Vec::with_capacity(scope.units.len());
        for unit in 0..scope.units.len() {
            let target = self.determine(unit);
            direct.push(self.settle(target, &none));
        }

        let root_identity = self.compilation.identity();
        let mut modules = self.session.table[self.root].modules.clone().into_iter();

        if let Some(primary) = modules.next() {
            self.session.table.set_module_references(primary, direct.clone());
        }

        for ((_, image), module) in scope.modules.iter().zip(modules) {
            let mut targets = Vec::with_capacity(image.assembly_refs.len());
            for requested in &image.assembly_refs {
                let target = self.resolve_identity(&root_identity, requested);
                targets.push(self.settle(target, &none));
            }
            self.session.table.set_module_references(module, targets);
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        for recorded in std::mem::take(&mut self.edges) {
            let edge = match recorded {
                Recorded::Finished(edge) => edge,
                Recorded::Unit {
                    mut edge,
                    target,
                    exact,
                } => {
                    let assembly = self.settle(target, &none);
                    let state = if exact && !self.session.table[assembly].is_retargeting() {
                        EdgeState::Resolved(assembly)
                    } else {
                        EdgeState::Retargeted(assembly)
                    };
                    trace!("{} -> {}: {state}", edge.from, edge.requested);
                    edge.finish(state);
                    edge
                }
            };
            edges.push(edge);
        }

        BindOutcome {
            assembly: self.root,
            direct,
            added_modules,
            edges,
        }
    }

    fn resolve_identity(&mut self, from: &AssemblyIdentity, requested: &AssemblyIdentity) -> Target {
        let mut edge = BoundEdge::new(from.clone(), requested.clone());
        edge.begin();

        match self.scope.select(requested) {
            Selection::Root => {
                trace!("{from} -> {requested}: root");
                edge.finish(EdgeState::Resolved(self.root));
                self.edges.push(Recorded::Finished(edge));
                Target::Bound(self.root)
            }
            Selection::Unit(unit) => {
                let target = self.determine(unit);
                let exact = self.scope.units[unit].identity == *requested;
                self.edges.push(Recorded::Unit {
                    edge,
                    target,
                    exact,
                });
                target
            }
            Selection::Missing => {
                let assembly = self.session.missing_assembly(requested);
                let state = EdgeState::Missing(requested.clone());
                trace!("{from} -> {requested}: {state}");
                edge.finish(state);
                self.edges.push(Recorded::Finished(edge));
                Target::Bound(assembly)
            }
        }
    }

    fn determine(&mut self, unit: usize) -> Target {
        if let Some(&assembly) = self.resolved.get(&unit) {
            return Target::Bound(assembly);
        }
        if self.indices.contains_key(&unit) {
            trace!("unit {} is reached through a cycle", self.scope.units[unit].identity);
            return Target::Pending(unit);
        }

        let index = self.indices.len();
        self.indices.insert(unit, index);
        self.lowlinks.insert(unit, index);
        self.stack.push(unit);

        let from = self.scope.units[unit].identity.clone();
        let mut targets = Vec::new();
        for module in self.requests(unit) {
            let mut bound = Vec::with_capacity(module.len());
            for requested in &module {
                let target = self.resolve_identity(&from, requested);
                if let Target::Pending(other) = target {
                    self.lower(unit, other);
                }
                bound.push(target);
            }
            targets.push(bound);
        }
        self.requested.insert(unit, targets);

        if self.lowlinks.get(&unit) != Some(&index) {
            return Target::Pending(unit);
        }

        let mut group = Vec::new();
        while let Some(member) = self.stack.pop() {
            group.push(member);
            if member == unit {
                break;
            }
        }
        group.reverse();

        let assemblies = match self.reuse_group(&group) {
            Some(assemblies) => {
                trace!("reusing {assemblies:?} for {from}");
                assemblies
            }
            None => self.create_group(&group),
        };

        for (&member, &assembly) in group.iter().zip(&assemblies) {
            self.requested.remove(&member);
            self.resolved.insert(member, assembly);
        }

        match self.resolved.get(&unit) {
            Some(&assembly) => Target::Bound(assembly),
            None => Target::Pending(unit),
        }
    }

    fn lower(&mut self, unit: usize, other: usize) {
        if let Some(&low) = self.lowlinks.get(&other)
            && let Some(current) = self.lowlinks.get_mut(&unit)
        {
            *current = (*current).min(low);
        }
    }

    fn requests(&self, unit: usize) -> Vec<Vec<AssemblyIdentity>> {
        match &self.scope.units[unit].unit {
            Unit::Image(image) => image
                .modules()
                .iter()
                .map(|module| module.assembly_refs.clone())
                .collect(),
            Unit::Compilation(compilation) => self
                .session
                .compilations
                .get(&compilation.id())
                .map(|bound| bound.requests.clone())
                .unwrap_or_default(),
        }
    }

    fn home(&self, compilation: &Compilation) -> Option<AssemblyId> {
        self.session
            .compilations
            .get(&compilation.id())
            .map(|bound| bound.assembly)
    }

    /// The assembly `target` ended up at. Units of `placed` take precedence
    /// over those resolved earlier.
    fn settle(&mut self, target: Target, placed: &HashMap<usize, AssemblyId>) -> AssemblyId {
        let unit = match target {
            Target::Bound(assembly) => return assembly,
            Target::Pending(unit) => unit,
        };

        match placed.get(&unit).or_else(|| self.resolved.get(&unit)) {
            Some(&assembly) => assembly,
            None => {
                let identity = self.scope.units[unit].identity.clone();
                self.session.missing_assembly(&identity)
            }
        }
    }

    /// Wired assemblies that may stand for `unit` in this scope.
    fn candidates(&self, unit: usize) -> Vec<AssemblyId> {
        let candidates = match &self.scope.units[unit].unit {
            Unit::Image(image) => self.session.metadata_candidates(image),
            Unit::Compilation(compilation) => match self.home(compilation) {
                Some(home) => self.session.retargeting_candidates(home),
                None => Vec::new(),
            },
        };

        candidates
            .into_iter()
            .filter(|&candidate| self.session.is_wired(candidate))
            .collect()
    }

    /// Existing assemblies, one per member of `group` in order, bound the
    /// way the group is.
    ///
    /// A candidate for the first member fixes what its references inside the
    /// group point at, which in turn fixes the other members.
    fn reuse_group(&self, group: &[usize]) -> Option<Vec<AssemblyId>> {
        let &first = group.first()?;

        self.candidates(first).into_iter().find_map(|candidate| {
            let mut placed = HashMap::new();
            placed.insert(first, candidate);
            let mut queue = vec![first];

            while let Some(unit) = queue.pop() {
                let actual = self.session.module_targets(*placed.get(&unit)?);
                let expected = self.requested.get(&unit)?;
                if actual.len() != expected.len() {
                    return None;
                }

                for (actual, expected) in actual.iter().zip(expected) {
                    if actual.len() != expected.len() {
                        return None;
                    }
                    for (&actual, &expected) in actual.iter().zip(expected) {
                        match expected {
                            Target::Bound(expected) if expected == actual => {}
                            Target::Bound(_) => return None,
                            Target::Pending(other) => match placed.get(&other) {
                                Some(&mapped) if mapped == actual => {}
                                Some(_) => return None,
                                None if self.candidates(other).contains(&actual) => {
                                    placed.insert(other, actual);
                                    queue.push(other);
                                }
                                None => return None,
                            },
                        }
                    }
                }
            }

            group.iter().map(|unit| placed.get(unit).copied()).collect()
        })
    }

    fn create_group(&mut self, group: &[usize]) -> Vec<AssemblyId> {
        let scope = self.scope;
        let mut placed = HashMap::new();

        for &unit in group {
            let assembly = match &scope.units[unit].unit {
                Unit::Image(image) => self.session.create_metadata_assembly(image),
                Unit::Compilation(compilation) => match self.home(compilation) {
                    Some(home) => self.session.create_retargeting_assembly(home),
                    None => self.session.missing_assembly(&compilation.identity()),
                },
            };
            placed.insert(unit, assembly);
        }

        if group.len() > 1 {
            debug!("wiring a reference cycle of {} assemblies", group.len());
        }

        let mut assemblies = Vec::with_capacity(group.len());
        for &unit in group {
            let Some(&assembly) = placed.get(&unit) else {
                continue;
            };
            assemblies.push(assembly);

            if self.session.is_missing(assembly) {
                continue;
            }

            let requested = self.requested.get(&unit).cloned().unwrap_or_default();
            let mut targets = Vec::with_capacity(requested.len());
            for module in requested {
                let mut bound = Vec::with_capacity(module.len());
                for target in module {
                    bound.push(self.settle(target, &placed));
                }
                targets.push(bound);
            }
            self.session.wire(assembly, targets);
        }

        assemblies
    }
}

impl Session {
    /// Bound references of every module of `assembly`.
    pub(crate) fn module_targets(&self, assembly: AssemblyId) -> Vec<Vec<AssemblyId>> {
        self.table[assembly]
            .modules
            .iter()
            .map(|&module| self.table[module].referenced_assemblies().to_vec())
            .collect()
    }

    pub(crate) fn is_wired(&self, assembly: AssemblyId) -> bool {
        self.table[assembly]
            .modules
            .iter()
            .all(|&module| self.table[module].is_wired())
    }

    pub(crate) fn wire(&mut self, assembly: AssemblyId, targets: Vec<Vec<AssemblyId>>) {
        let modules = self.table[assembly].modules.clone();
        for (module, references) in modules.into_iter().zip(targets) {
            self.table.set_module_references(module, references);
        }
    }

    /// PE assemblies created for `image` so far, none when sharing is off.
    pub(crate) fn metadata_candidates(&self, image: &Arc<AssemblyImage>) -> Vec<AssemblyId> {
        if !self.options.reuse_metadata_symbols {
            return Vec::new();
        }
        self.metadata_symbols
            .get(&(Arc::as_ptr(image) as usize))
            .cloned()
            .unwrap_or_default()
    }

    /// `home` itself followed by its retargeting assemblies, oldest first.
    pub(crate) fn retargeting_candidates(&self, home: AssemblyId) -> Vec<AssemblyId> {
        let mut candidates = vec![home];
        if let Some(retargeting) = self.retargeting_symbols.get(&home) {
            candidates.extend(retargeting.iter().copied());
        }
        candidates
    }

    pub(crate) fn create_metadata_assembly(&mut self, image: &Arc<AssemblyImage>) -> AssemblyId {
        let assembly = self.table.add_assembly(
            image.identity().clone(),
            AssemblyKind::Metadata {
                image: image.clone(),
            },
        );
        for module in image.modules() {
            self.table.add_module(
                assembly,
                module.name.clone(),
                ModuleKind::Metadata {
                    image: module.clone(),
                },
                None,
            );
        }

        debug!("created {assembly} for {}", image.identity());

        self.metadata_symbols
            .entry(Arc::as_ptr(image) as usize)
            .or_default()
            .push(assembly);
        assembly
    }

    pub(crate) fn create_retargeting_assembly(&mut self, underlying: AssemblyId) -> AssemblyId {
        let identity = self.table[underlying].identity.clone();
        let assembly = self
            .table
            .add_assembly(identity, AssemblyKind::Retargeting { underlying });

        for module in self.table[underlying].modules.clone() {
            let name = self.table[module].name.clone();
            let global = self.table[module].global_namespace;
            self.table.add_module(
                assembly,
                name,
                ModuleKind::Retargeting { underlying: module },
                Some(global),
            );
        }

        debug!(
            "created retargeting {assembly} for {}",
            self.table[underlying].identity
        );

        self.retargeting_symbols
            .entry(underlying)
            .or_default()
            .push(assembly);
        assembly
    }
}

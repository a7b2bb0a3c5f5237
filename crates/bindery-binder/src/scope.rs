//! The units one root compilation can bind against, and version selection
//! among them.

use std::sync::Arc;

use bindery_collections::HashSet;
use bindery_metadata::{
    identity::{AssemblyIdentity, Version},
    image::{AssemblyImage, ModuleImage},
};
use bindery_symbols::id::CompilationId;
use ecow::EcoString;
use log::trace;

use crate::{
    compilation::Compilation,
    reference::{MetadataReference, ReferenceKind},
};

/// Something that becomes an assembly symbol when bound.
#[derive(Debug, Clone)]
pub enum Unit {
    Image(Arc<AssemblyImage>),
    Compilation(Compilation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKey {
    Image(usize),
    Compilation(CompilationId),
}

impl Unit {
    pub fn identity(&self) -> AssemblyIdentity {
        match self {
            Self::Image(image) => image.identity().clone(),
            Self::Compilation(compilation) => compilation.identity(),
        }
    }

    pub fn key(&self) -> UnitKey {
        match self {
            Self::Image(image) => UnitKey::Image(Arc::as_ptr(image) as usize),
            Self::Compilation(compilation) => UnitKey::Compilation(compilation.id()),
        }
    }
}

/// A declared assembly reference that survived deduplication.
#[derive(Debug, Clone)]
pub struct DirectUnit {
    pub reference: MetadataReference,
    pub unit: Unit,
    pub identity: AssemblyIdentity,
}

/// Outcome of selecting an assembly for a requested identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The compilation being bound.
    Root,
    /// Index into [`Scope::units`].
    Unit(usize),
    Missing,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub root: AssemblyIdentity,
    /// Assembly references in declared order.
    pub units: Vec<DirectUnit>,
    /// Netmodule references in declared order.
    pub modules: Vec<(MetadataReference, Arc<ModuleImage>)>,
    /// References replaced by a later reference to the same unit.
    pub superseded: Vec<MetadataReference>,
}

impl Scope {
    /// Deduplicates `references`: of two references to the same image, the
    /// same compilation, or assemblies with equal identities, the later one
    /// wins.
    pub fn new(root: AssemblyIdentity, references: &[MetadataReference]) -> Self {
        let mut units = Vec::new();
        let mut modules = Vec::new();
        let mut superseded = Vec::new();

        let mut seen_units = HashSet::new();
        let mut seen_modules = HashSet::new();
        let mut seen_identities: Vec<AssemblyIdentity> = Vec::new();

        for reference in references.iter().rev() {
            let unit = match reference.kind() {
                ReferenceKind::Module(image) => {
                    if seen_modules.insert(Arc::as_ptr(image) as usize) {
                        modules.push((reference.clone(), image.clone()));
                    } else if !modules.iter().any(|(r, _)| r == reference) {
                        superseded.push(reference.clone());
                    }
                    continue;
                }
                ReferenceKind::Assembly(image) => Unit::Image(image.clone()),
                ReferenceKind::Compilation(compilation) => Unit::Compilation(compilation.clone()),
            };

            let identity = unit.identity();
            let is_new = seen_units.insert(unit.key()) && !seen_identities.contains(&identity);

            if is_new {
                seen_identities.push(identity.clone());
                units.push(DirectUnit {
                    reference: reference.clone(),
                    unit,
                    identity,
                });
            } else if !units.iter().any(|u| &u.reference == reference) {
                trace!("reference {reference} is superseded by a later one");
                superseded.push(reference.clone());
            }
        }

        units.reverse();
        modules.reverse();
        superseded.reverse();

        Self {
            root,
            units,
            modules,
            superseded,
        }
    }

    /// Picks the assembly a reference to `identity` binds to.
    ///
    /// The compilation itself wins when it can stand for `identity`.
    /// Otherwise, among direct units that unify with `identity`: an exact
    /// match, else the lowest higher version, else the highest version.
    /// Remaining ties go to the first declared unit.
    pub fn select(&self, identity: &AssemblyIdentity) -> Selection {
        if identity.unifies_with(&self.root) {
            return Selection::Root;
        }

        let mut higher: Option<(usize, Version)> = None;
        let mut highest: Option<(usize, Version)> = None;

        for (index, unit) in self.units.iter().enumerate() {
            if !unit.identity.unifies_with(identity) {
                continue;
            }
            if unit.identity == *identity {
                return Selection::Unit(index);
            }

            let version = unit.identity.version();
            if version > identity.version() && higher.is_none_or(|(_, best)| version < best) {
                higher = Some((index, version));
            }
            if highest.is_none_or(|(_, best)| version > best) {
                highest = Some((index, version));
            }
        }

        higher
            .or(highest)
            .map_or(Selection::Missing, |(index, _)| Selection::Unit(index))
    }

    /// Simple names claimed by direct units that cannot stand for each other.
    pub fn ambiguous_names(&self) -> Vec<EcoString> {
        let mut names: Vec<EcoString> = Vec::new();

        for (i, first) in self.units.iter().enumerate() {
            for second in &self.units[i + 1..] {
                let clash = first.identity.name_eq(&second.identity)
                    && !first.identity.unifies_with(&second.identity);
                let name = EcoString::from(first.identity.name());

                if clash && !names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                    names.push(name);
                }
            }
        }

        names
    }

    pub fn position(&self, reference: &MetadataReference) -> Option<usize> {
        self.units.iter().position(|unit| &unit.reference == reference)
    }
}

#[cfg(test)]
mod tests {
    use bindery_metadata::{builder::ModuleImageBuilder, identity::PublicKeyToken};

    use super::*;
    use crate::test::{Fixtures, identity};

    fn image(identity: AssemblyIdentity) -> MetadataReference {
        MetadataReference::assembly(ModuleImageBuilder::manifest(&identity).into_assembly(identity))
    }

    fn root() -> AssemblyIdentity {
        identity("App", 0)
    }

    #[test]
    fn later_duplicates_win() {
        let fixtures = Fixtures::new();
        let copy = image(identity("MTTestLib1", 1));

        let scope = Scope::new(
            root(),
            &[fixtures.lib1_v1.clone(), fixtures.mscorlib.clone(), copy.clone()],
        );

        assert_eq!(scope.units.len(), 2);
        assert_eq!(scope.position(&copy), Some(1));
        assert_eq!(scope.position(&fixtures.lib1_v1), None);
        assert_eq!(scope.superseded, vec![fixtures.lib1_v1.clone()]);
    }

    #[test]
    fn repeated_references_are_kept_once() {
        let fixtures = Fixtures::new();
        let scope = Scope::new(
            root(),
            &[fixtures.mscorlib.clone(), fixtures.mscorlib.clone()],
        );

        assert_eq!(scope.units.len(), 1);
        assert!(scope.superseded.is_empty());
    }

    #[test]
    fn selection_prefers_exact_then_higher_then_highest() {
        let fixtures = Fixtures::new();
        let scope = Scope::new(
            root(),
            &[
                fixtures.lib1_v3.clone(),
                fixtures.lib1_v1.clone(),
                fixtures.lib1_v2.clone(),
            ],
        );

        assert_eq!(scope.select(&identity("MTTestLib1", 2)), Selection::Unit(2));
        assert_eq!(
            scope.select(&AssemblyIdentity::new("MTTestLib1", Version::new(1, 5, 0, 0))),
            Selection::Unit(2)
        );
        assert_eq!(scope.select(&identity("MTTestLib1", 9)), Selection::Unit(0));
        assert_eq!(scope.select(&identity("Other", 1)), Selection::Missing);
    }

    #[test]
    fn selection_ignores_declared_order() {
        let fixtures = Fixtures::new();
        let forward = Scope::new(root(), &[fixtures.lib1_v2.clone(), fixtures.lib1_v3.clone()]);
        let backward = Scope::new(root(), &[fixtures.lib1_v3.clone(), fixtures.lib1_v2.clone()]);

        let pick = |scope: &Scope| match scope.select(&identity("MTTestLib1", 1)) {
            Selection::Unit(index) => scope.units[index].identity.clone(),
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(pick(&forward), identity("MTTestLib1", 2));
        assert_eq!(pick(&forward), pick(&backward));
    }

    #[test]
    fn references_to_the_root_bind_to_it() {
        let scope = Scope::new(identity("Cyclic1", 0), &[]);
        assert_eq!(scope.select(&identity("cyclic1", 1)), Selection::Root);
    }

    #[test]
    fn incompatible_tokens_are_ambiguous() {
        let signed = identity("Lib", 1).with_public_key_token(PublicKeyToken::new([1; 8]));
        let other = identity("Lib", 1).with_public_key_token(PublicKeyToken::new([2; 8]));

        let scope = Scope::new(root(), &[image(signed.clone()), image(other)]);

        assert_eq!(scope.units.len(), 2);
        assert_eq!(scope.ambiguous_names(), vec![EcoString::from("Lib")]);
        assert_eq!(scope.select(&signed), Selection::Unit(0));
    }
}

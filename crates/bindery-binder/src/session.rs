//! The binding session: symbol table, caches and the public query surface.

use std::sync::Arc;

use bindery_collections::{BiMap, HashMap};
use bindery_metadata::{identity::AssemblyIdentity, image::AssemblyImage};
use bindery_span::Report;
use bindery_symbols::prelude::*;
use bindery_utils::dependency::DependencyGraph;
use log::debug;

use crate::{
    binder::Binder,
    compilation::Compilation,
    directives::resolve_directives,
    edge::BoundEdge,
    error::BindError,
    members::MemberCache,
    options::SessionOptions,
    reference::MetadataReference,
    retarget::RetargetCache,
    scope::{Scope, Unit},
};

/// Everything binding a compilation produced, kept for queries.
#[derive(Debug)]
pub(crate) struct BoundCompilation {
    pub compilation: Compilation,
    pub assembly: AssemblyId,
    /// Effective references: directive references first, then explicit ones.
    pub references: Vec<MetadataReference>,
    pub bindings: BiMap<MetadataReference, AssemblyId>,
    pub modules: HashMap<MetadataReference, ModuleId>,
    /// Identities requested by each module of the source assembly, in
    /// module order. Binding the compilation from another scope resolves
    /// these again.
    pub requests: Vec<Vec<AssemblyIdentity>>,
    pub edges: Vec<BoundEdge>,
    pub report: Report,
}

/// Owns every symbol created while binding compilations and the caches
/// that make repeated binding return the same symbols.
///
/// ```text
///              bind(compilation)
///                     │
///   directives ──▶ Scope ──▶ Binder ──▶ SymbolTable
///                                │
///        metadata_symbols ◀──────┤  image ptr ─▶ PE assemblies
///     retargeting_symbols ◀──────┤  underlying ─▶ retargeting assemblies
///                 missing ◀──────┘  identity ─▶ missing assembly
/// ```
///
/// Members are not created by binding. They are populated on first query
/// and memoized, so symbols nobody looks at are never built.
///
/// Queries therefore take `&mut self` and a session has a single writer.
/// Symbols already handed out are never changed by later queries. To bind
/// in parallel, give each thread its own session; `Session` is `Send`.
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) table: SymbolTable,
    pub(crate) options: SessionOptions,
    pub(crate) compilations: HashMap<CompilationId, BoundCompilation>,
    pub(crate) metadata_symbols: HashMap<usize, Vec<AssemblyId>>,
    pub(crate) retargeting_symbols: HashMap<AssemblyId, Vec<AssemblyId>>,
    pub(crate) missing: HashMap<AssemblyIdentity, AssemblyId>,
    pub(crate) members: MemberCache,
    pub(crate) retargets: RetargetCache,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Binds `compilation` and returns its source assembly. Binding the same
    /// compilation again returns the same assembly.
    pub fn bind(&mut self, compilation: &Compilation) -> AssemblyId {
        self.bound(compilation).assembly
    }

    pub fn source_assembly(&mut self, compilation: &Compilation) -> AssemblyId {
        self.bind(compilation)
    }

    pub(crate) fn bound(&mut self, compilation: &Compilation) -> &BoundCompilation {
        let id = compilation.id();
        if !self.compilations.contains_key(&id) {
            let bound = self.bind_compilation(compilation);
            self.compilations.insert(id, bound);
        }
        &self.compilations[&id]
    }

    fn bind_compilation(&mut self, compilation: &Compilation) -> BoundCompilation {
        debug!(
            "binding compilation {} ({})",
            compilation.assembly_name(),
            compilation.id()
        );

        let mut report = Report::new();
        let mut references = resolve_directives(compilation, &mut report);
        references.extend(compilation.references().iter().cloned());

        let scope = Scope::new(compilation.identity(), &references);

        // Referenced compilations get their home assemblies first; binding
        // them from this scope either reuses or retargets those.
        for direct in &scope.units {
            if let Unit::Compilation(referenced) = &direct.unit {
                self.bind(referenced);
            }
        }

        if self.options.report_ambiguous_names {
            for name in scope.ambiguous_names() {
                report.add_issue(BindError::DuplicateSimpleName(name).into_issue());
            }
        }

        let outcome = Binder::new(self, compilation, &scope).run();

        let mut bindings = BiMap::new();
        for (direct, assembly) in scope.units.iter().zip(&outcome.direct) {
            bindings.insert(direct.reference.clone(), *assembly);
        }

        let modules = scope
            .modules
            .iter()
            .map(|(reference, _)| reference.clone())
            .zip(outcome.added_modules.iter().copied())
            .collect();

        let mut requests = vec![
            scope
                .units
                .iter()
                .map(|direct| direct.identity.clone())
                .collect::<Vec<_>>(),
        ];
        requests.extend(
            scope
                .modules
                .iter()
                .map(|(_, image)| image.assembly_refs.clone()),
        );

        BoundCompilation {
            compilation: compilation.clone(),
            assembly: outcome.assembly,
            references,
            bindings,
            modules,
            requests,
            edges: outcome.edges,
            report,
        }
    }

    /// The assembly `reference` is bound to, `None` when the reference is
    /// not part of the compilation or was superseded by a later duplicate.
    pub fn referenced_assembly(
        &mut self,
        compilation: &Compilation,
        reference: &MetadataReference,
    ) -> Option<AssemblyId> {
        self.bound(compilation).bindings.get_by_key(reference).copied()
    }

    /// The added module a netmodule reference became.
    pub fn referenced_module(
        &mut self,
        compilation: &Compilation,
        reference: &MetadataReference,
    ) -> Option<ModuleId> {
        self.bound(compilation).modules.get(reference).copied()
    }

    /// The reference `assembly` was bound from in `compilation`.
    pub fn reference_for(
        &mut self,
        compilation: &Compilation,
        assembly: AssemblyId,
    ) -> Option<MetadataReference> {
        self.bound(compilation).bindings.get_by_value(&assembly).cloned()
    }

    /// Directive references followed by explicit references, as bound.
    pub fn effective_references(&mut self, compilation: &Compilation) -> &[MetadataReference] {
        &self.bound(compilation).references
    }

    pub fn report(&mut self, compilation: &Compilation) -> &Report {
        &self.bound(compilation).report
    }

    /// Every reference edge resolved from the scope of `compilation`.
    pub fn edges(&mut self, compilation: &Compilation) -> &[BoundEdge] {
        &self.bound(compilation).edges
    }

    /// Bound references of the primary module of `assembly`.
    pub fn bound_references(&self, assembly: AssemblyId) -> &[AssemblyId] {
        match self.table[assembly].primary_module() {
            Some(module) => self.module_references(module),
            None => &[],
        }
    }

    pub fn module_references(&self, module: ModuleId) -> &[AssemblyId] {
        self.table[module].referenced_assemblies()
    }

    pub fn modules(&self, assembly: AssemblyId) -> &[ModuleId] {
        &self.table[assembly].modules
    }

    pub fn global_namespace(&self, assembly: AssemblyId) -> Option<NamespaceId> {
        self.table[assembly]
            .primary_module()
            .map(|module| self.table[module].global_namespace)
    }

    pub fn identity(&self, assembly: AssemblyId) -> &AssemblyIdentity {
        &self.table[assembly].identity
    }

    pub fn containing_assembly(&self, symbol: impl Into<SymbolRef>) -> AssemblyId {
        self.table.containing_assembly(symbol)
    }

    pub fn is_missing(&self, assembly: AssemblyId) -> bool {
        self.table.is_missing(assembly)
    }

    /// Whether `ty` is or mentions a type that could not be resolved.
    pub fn is_missing_type(&self, ty: &Type) -> bool {
        ty.contains_error()
    }

    /// The compilation that declares `module`. Only primary modules of
    /// source assemblies have one.
    pub fn declaring_compilation(&self, module: ModuleId) -> Option<CompilationId> {
        match self.table[module].kind {
            ModuleKind::Source { compilation } => Some(compilation),
            _ => None,
        }
    }

    /// The compilation an assembly symbol was built from, `None` for
    /// metadata, retargeting and missing assemblies.
    pub fn assembly_compilation(&self, assembly: AssemblyId) -> Option<CompilationId> {
        match self.table[assembly].kind {
            AssemblyKind::Source { compilation } => Some(compilation),
            _ => None,
        }
    }

    /// The metadata image behind `assembly`, if it is a PE assembly.
    pub fn image(&self, assembly: AssemblyId) -> Option<&Arc<AssemblyImage>> {
        match &self.table[assembly].kind {
            AssemblyKind::Metadata { image } => Some(image),
            _ => None,
        }
    }

    /// Whether `assembly` and `other` stand for the same binary or the same
    /// compilation while `assembly` failed to resolve a reference that
    /// `other` resolved.
    pub fn represents_same_assembly_but_has_unresolved_references(
        &self,
        assembly: AssemblyId,
        other: AssemblyId,
    ) -> bool {
        if assembly == other || !self.same_origin(assembly, other) {
            return false;
        }

        let modules = &self.table[assembly].modules;
        let other_modules = &self.table[other].modules;

        modules.iter().zip(other_modules).any(|(&module, &other_module)| {
            let references = self.module_references(module);
            let other_references = self.module_references(other_module);

            references
                .iter()
                .zip(other_references)
                .any(|(&a, &b)| self.is_missing(a) && !self.is_missing(b))
        })
    }

    fn same_origin(&self, assembly: AssemblyId, other: AssemblyId) -> bool {
        match (&self.table[assembly].kind, &self.table[other].kind) {
            (AssemblyKind::Metadata { image }, AssemblyKind::Metadata { image: other }) => {
                Arc::ptr_eq(image, other)
            }
            _ => match (self.origin_compilation(assembly), self.origin_compilation(other)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    fn origin_compilation(&self, assembly: AssemblyId) -> Option<CompilationId> {
        match self.table[assembly].kind {
            AssemblyKind::Source { compilation } => Some(compilation),
            AssemblyKind::Retargeting { underlying } => self.origin_compilation(underlying),
            _ => None,
        }
    }

    /// Assemblies reachable from `assembly` through bound references of any
    /// of their modules.
    pub fn reference_graph(&self, assembly: AssemblyId) -> DependencyGraph<AssemblyId> {
        let mut graph = DependencyGraph::new();
        let mut stack = vec![assembly];
        graph.add_node(assembly);

        while let Some(current) = stack.pop() {
            for &module in &self.table[current].modules {
                for &target in self.module_references(module) {
                    if !graph.contains(&target) {
                        stack.push(target);
                    }
                    graph.add_dependency(current, target);
                }
            }
        }

        graph
    }

    /// Groups of assemblies reachable from `assembly` that reference each
    /// other.
    pub fn cycles(&self, assembly: AssemblyId) -> Vec<Vec<AssemblyId>> {
        self.reference_graph(assembly).cycles()
    }
}

#[cfg(test)]
mod tests {
    use bindery_metadata::prelude::*;
    use bindery_span::SourceId;
    use bindery_syntax::{MethodDecl, SourceUnit, TypeDecl, TypeExpr};

    use super::*;
    use crate::{
        edge::EdgeState,
        error::code,
        options::SessionOptions,
        test::{Fixtures, identity, lib1, source_lib1, source_lib2, source_lib3},
    };

    fn method(session: &mut Session, ty: TypeId, name: &str) -> MethodId {
        session
            .members_named(ty, name)
            .into_iter()
            .find_map(MemberId::as_method)
            .unwrap()
    }

    fn field(session: &mut Session, ty: TypeId, name: &str) -> FieldId {
        session
            .members_named(ty, name)
            .into_iter()
            .find_map(MemberId::as_field)
            .unwrap()
    }

    fn returns(session: &mut Session, assembly: AssemblyId, ty: &str, name: &str) -> Type {
        let ty = session.lookup_type(assembly, ty).unwrap();
        let method = method(session, ty, name);
        session.return_type(method)
    }

    #[test]
    fn binding_is_memoized() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let compilation = Compilation::create("App", [], [fixtures.mscorlib.clone(), fixtures.lib2.clone()]);

        let first = session.bind(&compilation);
        let count = session.table().assembly_count();

        assert_eq!(session.bind(&compilation), first);
        assert_eq!(session.table().assembly_count(), count);

        let class4 = session.lookup_type(session.bound_references(first)[1], "Class4");
        assert!(class4.is_some());
        assert_eq!(session.lookup_type(session.bound_references(first)[1], "Class4"), class4);

        let foo = method(&mut session, class4.unwrap(), "Foo");
        assert_eq!(session.return_type(foo), session.return_type(foo));
    }

    #[test]
    fn unresolved_references_become_missing_assemblies() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let compilation = Compilation::create(
            "App",
            [],
            [
                fixtures.mscorlib.clone(),
                fixtures.lib2.clone(),
                fixtures.lib3.clone(),
                fixtures.lib4.clone(),
            ],
        );

        let root = session.bind(&compilation);
        let references = session.bound_references(root).to_vec();
        let [_, lib2, lib3, lib4] = references[..] else {
            panic!("expected four references, got {references:?}");
        };

        let missing_v1 = session.bound_references(lib2)[1];
        let missing_v2 = session.bound_references(lib3)[1];
        assert!(session.is_missing(missing_v1));
        assert_eq!(session.identity(missing_v1), &identity("MTTestLib1", 1));
        assert_eq!(session.identity(missing_v2), &identity("MTTestLib1", 2));
        assert_eq!(session.bound_references(lib3)[2], lib2);
        assert_eq!(session.bound_references(lib4)[3], lib3);

        let foo = returns(&mut session, lib2, "Class4", "Foo");
        let error = foo.as_error().copied().unwrap();
        assert_eq!(foo.kind(), SymbolKind::ErrorType);
        assert_eq!(session.table()[error].name, "Class1");
        assert_eq!(session.table()[error].assembly, Some(missing_v1));

        let class4 = session.lookup_type(lib2, "Class4").unwrap();
        assert_eq!(returns(&mut session, lib3, "Class5", "Foo3"), Type::named(class4, Vec::new()));

        let missing = session
            .edges(&compilation)
            .iter()
            .filter(|edge| matches!(edge.state(), EdgeState::Missing(_)))
            .count();
        assert_eq!(missing, 3);
    }

    #[test]
    fn metadata_assemblies_are_shared_when_bound_alike() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();

        let first = Compilation::create("A", [], [fixtures.mscorlib.clone(), fixtures.lib2.clone()]);
        let second = Compilation::create("B", [], [fixtures.mscorlib.clone(), fixtures.lib2.clone()]);
        let resolved = Compilation::create(
            "C",
            [],
            [
                fixtures.mscorlib.clone(),
                fixtures.lib2.clone(),
                fixtures.lib1_v1.clone(),
            ],
        );

        let first = session.bind(&first);
        let second = session.bind(&second);
        let resolved = session.bind(&resolved);

        let lib2 = session.bound_references(first)[1];
        assert_eq!(session.bound_references(second)[1], lib2);
        assert_eq!(session.bound_references(resolved)[0], session.bound_references(first)[0]);

        let resolved_lib2 = session.bound_references(resolved)[1];
        assert_ne!(resolved_lib2, lib2);
        assert!(session.represents_same_assembly_but_has_unresolved_references(lib2, resolved_lib2));
        assert!(!session.represents_same_assembly_but_has_unresolved_references(resolved_lib2, lib2));

        let class1 = session.lookup_type(session.bound_references(resolved)[2], "Class1").unwrap();
        assert_eq!(
            returns(&mut session, resolved_lib2, "Class4", "Foo"),
            Type::named(class1, Vec::new())
        );
    }

    #[test]
    fn metadata_sharing_can_be_disabled() {
        let fixtures = Fixtures::new();
        let mut session = Session::with_options(SessionOptions {
            reuse_metadata_symbols: false,
            ..SessionOptions::default()
        });

        let first = Compilation::create("A", [], [fixtures.mscorlib.clone()]);
        let second = Compilation::create("B", [], [fixtures.mscorlib.clone()]);

        let first = session.bind(&first);
        let second = session.bind(&second);
        assert_ne!(session.bound_references(first)[0], session.bound_references(second)[0]);
    }

    #[test]
    fn one_version_per_name() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let compilation = Compilation::create(
            "App",
            [],
            [
                fixtures.mscorlib.clone(),
                fixtures.lib2.clone(),
                fixtures.lib1_v3.clone(),
                fixtures.lib3.clone(),
                fixtures.lib4.clone(),
            ],
        );

        let root = session.bind(&compilation);
        let references = session.bound_references(root).to_vec();
        let lib1 = references[2];

        for &library in &[references[1], references[3], references[4]] {
            assert_eq!(session.bound_references(library)[1], lib1);
        }

        for edge in session.edges(&compilation) {
            if edge.requested.name() != "MTTestLib1" {
                continue;
            }
            assert_eq!(edge.state().assembly(), Some(lib1));
            if edge.requested.version() != Version::new(3, 0, 0, 0) {
                assert!(matches!(edge.state(), EdgeState::Retargeted(_)));
            }
        }

        let class1 = session.lookup_type(lib1, "Class1").unwrap();
        assert_eq!(
            returns(&mut session, references[1], "Class4", "Foo"),
            Type::named(class1, Vec::new())
        );
    }

    #[test]
    fn selection_does_not_depend_on_reference_order() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let references = [
            fixtures.mscorlib.clone(),
            fixtures.lib1_v1.clone(),
            fixtures.lib1_v3.clone(),
            fixtures.lib2.clone(),
            fixtures.lib3.clone(),
        ];
        let mut reversed = references.clone();
        reversed.reverse();

        let forward = Compilation::create("Forward", [], references);
        let backward = Compilation::create("Backward", [], reversed);

        for compilation in [&forward, &backward] {
            let lib2 = session.referenced_assembly(compilation, &fixtures.lib2).unwrap();
            let lib3 = session.referenced_assembly(compilation, &fixtures.lib3).unwrap();

            let lib2_lib1 = session.bound_references(lib2)[1];
            let lib3_lib1 = session.bound_references(lib3)[1];
            assert_eq!(session.identity(lib2_lib1), &identity("MTTestLib1", 1));
            assert_eq!(session.identity(lib3_lib1), &identity("MTTestLib1", 3));
        }

        assert_eq!(
            session.referenced_assembly(&forward, &fixtures.lib3),
            session.referenced_assembly(&backward, &fixtures.lib3)
        );
    }

    #[test]
    fn edits_leave_the_original_untouched() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();

        let original = Compilation::create("App", [], [fixtures.lib1_v1.clone()]);
        assert_eq!(session.get_type_by_name(&original, "System.Int32"), None);

        let edited = original.add_references([fixtures.mscorlib.clone()]);
        let int32 = session.get_type_by_name(&edited, "System.Int32").unwrap();
        assert_eq!(session.table()[int32].kind, TypeKind::Struct);

        assert_eq!(session.get_type_by_name(&original, "System.Int32"), None);
        let original = session.bind(&original);
        assert_ne!(original, session.bind(&edited));
        assert_eq!(session.bound_references(original).len(), 1);
    }

    #[test]
    fn compilation_references_retarget() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();

        let lib1_v1 = source_lib1(&fixtures, 1);
        let lib1_v2 = source_lib1(&fixtures, 2);
        let lib1_v3 = source_lib1(&fixtures, 3);
        let lib2 = source_lib2(&fixtures, &lib1_v1);
        let lib3 = source_lib3(&fixtures, &lib2, &lib1_v2);

        let home_lib1 = session.bind(&lib1_v1);
        let home_lib2 = session.bind(&lib2);
        let home_lib3 = session.bind(&lib3);

        // Same references as its own: the home assembly is used as is.
        let c2 = Compilation::create(
            "C2",
            [],
            [fixtures.mscorlib.clone(), lib2.to_reference(), lib1_v1.to_reference()],
        );
        let asm2 = session.bind(&c2);
        assert_eq!(session.bound_references(asm2)[1..], [home_lib2, home_lib1]);

        let lib3_refs = session.bound_references(home_lib3).to_vec();
        let retargeted_lib2 = lib3_refs[1];
        assert_eq!(session.table()[retargeted_lib2].underlying(), Some(home_lib2));
        assert_eq!(lib3_refs[2], session.bind(&lib1_v2));
        assert_eq!(session.declaring_compilation(session.modules(retargeted_lib2)[0]), None);

        let c3 = Compilation::create(
            "C3",
            [],
            [
                fixtures.mscorlib.clone(),
                lib2.to_reference(),
                lib1_v2.to_reference(),
                lib3.to_reference(),
            ],
        );
        let asm3 = session.bind(&c3);
        assert_eq!(session.bound_references(asm3)[1], retargeted_lib2);
        assert_eq!(session.bound_references(asm3)[3], home_lib3);

        let class4 = session.lookup_type(retargeted_lib2, "Class4").unwrap();
        assert_eq!(session.containing_assembly(class4), retargeted_lib2);

        let home_lib1_v2 = session.bind(&lib1_v2);
        let class1_v2 = session.lookup_type(home_lib1_v2, "Class1").unwrap();
        let foo = method(&mut session, class4, "Foo");
        assert_eq!(session.return_type(foo), Type::named(class1_v2, Vec::new()));
        assert!(session.table()[foo].underlying().is_some());

        let bar = field(&mut session, class4, "Bar");
        assert_eq!(session.field_type(bar), Type::named(class1_v2, Vec::new()));
        assert_eq!(
            returns(&mut session, home_lib3, "Class5", "Foo3"),
            Type::named(class4, Vec::new())
        );

        // A third version retargets both libraries built against older ones.
        let c4 = Compilation::create(
            "C4",
            [],
            [
                fixtures.mscorlib.clone(),
                lib2.to_reference(),
                lib1_v3.to_reference(),
                lib3.to_reference(),
            ],
        );
        let asm4 = session.bind(&c4);
        let refs4 = session.bound_references(asm4).to_vec();
        assert_eq!(session.table()[refs4[1]].underlying(), Some(home_lib2));
        assert_ne!(refs4[1], retargeted_lib2);
        assert_eq!(session.table()[refs4[3]].underlying(), Some(home_lib3));

        let class4_v3 = session.lookup_type(refs4[1], "Class4").unwrap();
        let class2_v3 = session.lookup_type(refs4[2], "Class2").unwrap();
        assert_eq!(
            returns(&mut session, refs4[3], "Class5", "Foo3"),
            Type::named(class4_v3, Vec::new())
        );
        assert_eq!(
            returns(&mut session, refs4[3], "Class5", "Foo2"),
            Type::named(class2_v3, Vec::new())
        );

        // The same pair from another compilation yields the same wrapper.
        let c4_again = c4.add_references([]);
        let again = session.bind(&c4_again);
        assert_eq!(session.bound_references(again)[1..], refs4[1..]);
    }

    #[test]
    fn retargeting_onto_missing_assemblies_yields_error_types() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();

        let lib1_v1 = source_lib1(&fixtures, 1);
        let lib1_v2 = source_lib1(&fixtures, 2);
        let lib2 = source_lib2(&fixtures, &lib1_v1);
        let lib3 = source_lib3(&fixtures, &lib2, &lib1_v2);

        let home_lib3 = session.bind(&lib3);
        let compilation = Compilation::create(
            "C5",
            [],
            [fixtures.mscorlib.clone(), lib2.to_reference(), lib3.to_reference()],
        );
        let root = session.bind(&compilation);
        let lib3_here = session.bound_references(root)[2];
        let missing_lib1 = session.bound_references(lib3_here)[2];

        assert!(session.is_missing(missing_lib1));
        assert_eq!(session.table()[lib3_here].underlying(), Some(home_lib3));

        let foo1 = returns(&mut session, lib3_here, "Class5", "Foo1");
        let error = foo1.as_error().copied().unwrap();
        assert!(session.is_missing_type(&foo1));
        assert_eq!(session.table()[error].assembly, Some(missing_lib1));

        assert!(session.represents_same_assembly_but_has_unresolved_references(lib3_here, home_lib3));
        assert!(!session.represents_same_assembly_but_has_unresolved_references(home_lib3, lib3_here));
    }

    #[test]
    fn references_back_to_the_root_bind_to_it() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let unit = SourceUnit::regular(SourceId::new(0)).ty(TypeDecl::class("", "C1"));
        let compilation = Compilation::create(
            "Cyclic1",
            [unit],
            [fixtures.mscorlib.clone(), fixtures.cyclic2.clone()],
        );

        let root = session.bind(&compilation);
        let cyclic2 = session.bound_references(root)[1];
        assert_eq!(session.bound_references(cyclic2)[1], root);
        assert_eq!(session.cycles(root), vec![vec![root, cyclic2]]);

        let c1 = session.lookup_type(root, "C1").unwrap();
        let c2 = session.lookup_type(cyclic2, "C2").unwrap();
        assert_eq!(session.base_type(c2), Some(Type::named(c1, Vec::new())));
    }

    #[test]
    fn metadata_cycles_are_wired_to_each_other() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let compilation = Compilation::create(
            "App",
            [],
            [
                fixtures.mscorlib.clone(),
                fixtures.cyc_a.clone(),
                fixtures.cyc_b.clone(),
            ],
        );

        let root = session.bind(&compilation);
        let [_, a, b] = session.bound_references(root)[..] else {
            panic!("expected three references");
        };

        assert_eq!(session.bound_references(a)[1], b);
        assert_eq!(session.bound_references(b)[1], a);
        assert!(session.cycles(root).contains(&vec![a, b]));

        let class_a = session.lookup_type(a, "A").unwrap();
        let class_b = session.lookup_type(b, "B").unwrap();
        let field_b = field(&mut session, class_a, "b");
        let field_a = field(&mut session, class_b, "a");
        assert_eq!(session.field_type(field_b), Type::named(class_b, Vec::new()));
        assert_eq!(session.field_type(field_a), Type::named(class_a, Vec::new()));
    }

    #[test]
    fn metadata_cycles_are_shared_when_bound_alike() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let references = [
            fixtures.mscorlib.clone(),
            fixtures.cyc_a.clone(),
            fixtures.cyc_b.clone(),
        ];

        let first = session.bind(&Compilation::create("First", [], references.clone()));
        let count = session.table().assembly_count();
        let second = session.bind(&Compilation::create("Second", [], references));

        assert_eq!(session.bound_references(first), session.bound_references(second));
        // Only the second root is new.
        assert_eq!(session.table().assembly_count(), count + 1);

        let [_, a, b] = session.bound_references(second)[..] else {
            panic!("expected three references");
        };
        assert_eq!(session.bound_references(a)[1], b);
        assert_eq!(session.bound_references(b)[1], a);

        // Binding the pair in the other order finds the same group.
        let reversed = Compilation::create(
            "Reversed",
            [],
            [
                fixtures.cyc_b.clone(),
                fixtures.mscorlib.clone(),
                fixtures.cyc_a.clone(),
            ],
        );
        let corlib = session.bound_references(first)[0];
        let reversed = session.bind(&reversed);
        assert_eq!(session.bound_references(reversed), [b, corlib, a]);
        assert_eq!(session.table().assembly_count(), count + 2);
    }

    #[test]
    fn metadata_cycles_bound_differently_are_not_shared() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();

        let full = Compilation::create(
            "Full",
            [],
            [
                fixtures.mscorlib.clone(),
                fixtures.cyc_a.clone(),
                fixtures.cyc_b.clone(),
            ],
        );
        let bare = Compilation::create("Bare", [], [fixtures.cyc_a.clone(), fixtures.cyc_b.clone()]);

        let full = session.bind(&full);
        let bare = session.bind(&bare);
        let [_, a, b] = session.bound_references(full)[..] else {
            panic!("expected three references");
        };
        let [bare_a, bare_b] = session.bound_references(bare)[..] else {
            panic!("expected two references");
        };

        assert_ne!(bare_a, a);
        assert_ne!(bare_b, b);
        assert!(session.is_missing(session.bound_references(bare_a)[0]));
        assert_eq!(session.bound_references(bare_a)[1], bare_b);
        assert_eq!(session.bound_references(bare_b)[1], bare_a);
    }

    #[test]
    fn metadata_cycles_are_not_shared_when_sharing_is_disabled() {
        let fixtures = Fixtures::new();
        let mut session = Session::with_options(SessionOptions {
            reuse_metadata_symbols: false,
            ..SessionOptions::default()
        });
        let references = [
            fixtures.mscorlib.clone(),
            fixtures.cyc_a.clone(),
            fixtures.cyc_b.clone(),
        ];

        let first = session.bind(&Compilation::create("First", [], references.clone()));
        let second = session.bind(&Compilation::create("Second", [], references));

        assert_ne!(session.bound_references(first)[1], session.bound_references(second)[1]);
        assert_ne!(session.bound_references(first)[2], session.bound_references(second)[2]);
    }

    #[test]
    fn retargeting_to_an_older_version_yields_error_types() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();

        let lib1_v2 = source_lib1(&fixtures, 2);
        let lib1_v3 = source_lib1(&fixtures, 3);
        let unit = SourceUnit::regular(SourceId::new(0)).ty(
            TypeDecl::class("", "Consumer")
                .method(MethodDecl::new("Latest", TypeExpr::path("Class3")))
                .method(MethodDecl::new(
                    "All",
                    TypeExpr::generic("System.Collections.Generic.List", vec![TypeExpr::path("Class3")]),
                ))
                .method(MethodDecl::new("First", TypeExpr::path("Class1"))),
        );
        let user = Compilation::create("User", [unit], [fixtures.mscorlib.clone(), lib1_v3.to_reference()]);
        let app = Compilation::create(
            "App",
            [],
            [fixtures.mscorlib.clone(), user.to_reference(), lib1_v2.to_reference()],
        );

        let root = session.bind(&app);
        let home_user = session.bind(&user);
        let home_lib1_v2 = session.bind(&lib1_v2);
        let user_here = session.bound_references(root)[1];
        assert_eq!(session.table()[user_here].underlying(), Some(home_user));
        assert_eq!(session.bound_references(user_here)[1], home_lib1_v2);

        // Class3 only exists in the version the library was built against.
        let latest = returns(&mut session, user_here, "Consumer", "Latest");
        let error = latest.as_error().copied().unwrap();
        let owner = session.table()[error].assembly.unwrap();
        assert_eq!(session.identity(owner).name(), "MTTestLib1");
        assert!(session.is_missing(owner));

        let all = returns(&mut session, user_here, "Consumer", "All");
        assert!(all.as_named().is_some());
        assert!(session.is_missing_type(&all));

        let class1 = session.lookup_type(home_lib1_v2, "Class1").unwrap();
        assert_eq!(
            returns(&mut session, user_here, "Consumer", "First"),
            Type::named(class1, Vec::new())
        );

        // The home assembly still sees the version it was built against.
        let latest_home = returns(&mut session, home_user, "Consumer", "Latest");
        assert!(!latest_home.contains_error());
    }

    #[test]
    fn sessions_bind_on_separate_threads() {
        fn assert_send<T: Send>() {}
        assert_send::<Session>();

        let fixtures = Fixtures::new();
        let bound = std::thread::scope(|scope| {
            let workers = (0..2)
                .map(|_| {
                    scope.spawn(|| {
                        let mut session = Session::new();
                        let compilation = Compilation::create(
                            "App",
                            [],
                            [fixtures.mscorlib.clone(), fixtures.lib2.clone()],
                        );
                        let root = session.bind(&compilation);
                        (
                            session.table().assembly_count(),
                            session.bound_references(root).len(),
                        )
                    })
                })
                .collect::<Vec<_>>();

            workers
                .into_iter()
                .map(|worker| worker.join().unwrap())
                .collect::<Vec<_>>()
        });

        assert_eq!(bound[0], bound[1]);
        assert_eq!(bound[0].1, 2);
    }

    #[test]
    fn script_directives_add_references() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let unit = SourceUnit::script(SourceId::new(0))
            .with_path("/scripts/main.csx")
            .directive("\"mscorlib.dll\"", bindery_span::Span::new(3, 17))
            .directive("\"MTTestLib1.v1.dll\"", bindery_span::Span::new(21, 40))
            .directive("\"MTTestLib1.v1.dll\"", bindery_span::Span::new(44, 63));
        let compilation = Compilation::create("Script", [unit], [fixtures.lib2.clone()])
            .with_resolver(Arc::new(fixtures.resolver()));

        let root = session.bind(&compilation);
        assert!(session.report(&compilation).is_empty());
        assert_eq!(session.effective_references(&compilation).len(), 4);
        assert_eq!(session.bound_references(root).len(), 3);

        let lib2 = session.referenced_assembly(&compilation, &fixtures.lib2).unwrap();
        assert!(session.bound_references(lib2).iter().all(|&r| !session.is_missing(r)));
        assert!(session.get_type_by_name(&compilation, "Class1").is_some());
    }

    #[test]
    fn netmodules_become_added_modules() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let unit = SourceUnit::regular(SourceId::new(0)).ty(TypeDecl::class("", "Main"));
        let compilation = Compilation::create(
            "App",
            [unit],
            [
                fixtures.mscorlib.clone(),
                fixtures.lib1_v1.clone(),
                fixtures.netmodule.clone(),
            ],
        );

        let root = session.bind(&compilation);
        let modules = session.modules(root).to_vec();
        assert_eq!(modules.len(), 2);

        let added = session.referenced_module(&compilation, &fixtures.netmodule).unwrap();
        assert_eq!(added, modules[1]);
        assert_eq!(session.declaring_compilation(modules[0]), Some(compilation.id()));
        assert_eq!(session.declaring_compilation(added), None);
        assert_eq!(session.referenced_assembly(&compilation, &fixtures.netmodule), None);

        let lib1 = session.referenced_assembly(&compilation, &fixtures.lib1_v1).unwrap();
        assert_eq!(session.module_references(added), &[lib1]);
        assert_eq!(session.bound_references(root).len(), 2);

        let helper = session.lookup_type(root, "Extra.Helper").unwrap();
        assert_eq!(session.table()[helper].module, added);

        let class1 = session.lookup_type(lib1, "Class1").unwrap();
        assert_eq!(
            returns(&mut session, root, "Extra.Helper", "Make"),
            Type::named(class1, Vec::new())
        );
    }

    #[test]
    fn later_duplicate_references_win() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let copy = MetadataReference::assembly(lib1(1));
        let compilation = Compilation::create(
            "App",
            [],
            [fixtures.mscorlib.clone(), fixtures.lib1_v1.clone(), copy.clone()],
        );

        let root = session.bind(&compilation);
        assert_eq!(session.referenced_assembly(&compilation, &fixtures.lib1_v1), None);

        let bound = session.referenced_assembly(&compilation, &copy).unwrap();
        assert_eq!(session.bound_references(root), &[session.bound_references(root)[0], bound]);
        assert_eq!(session.reference_for(&compilation, bound), Some(copy));
    }

    #[test]
    fn ambiguous_simple_names_are_reported() {
        let image = |token: u8| {
            let id = identity("Lib", 1).with_public_key_token(PublicKeyToken::new([token; 8]));
            MetadataReference::assembly(ModuleImageBuilder::manifest(&id).into_assembly(id))
        };
        let compilation = Compilation::create("App", [], [image(1), image(2)]);

        let mut session = Session::new();
        let root = session.bind(&compilation);
        assert_eq!(
            session.report(&compilation).codes().collect::<Vec<_>>(),
            vec![code::DUPLICATE_SIMPLE_NAME]
        );
        assert_eq!(session.bound_references(root).len(), 2);

        let mut quiet = Session::with_options(SessionOptions {
            report_ambiguous_names: false,
            ..SessionOptions::default()
        });
        assert!(quiet.report(&compilation).is_empty());
    }

    #[test]
    fn reference_graph_spans_all_bound_assemblies() {
        let fixtures = Fixtures::new();
        let mut session = Session::new();
        let compilation = Compilation::create(
            "App",
            [],
            [fixtures.mscorlib.clone(), fixtures.lib2.clone(), fixtures.lib1_v1.clone()],
        );

        let root = session.bind(&compilation);
        let graph = session.reference_graph(root);
        let [mscorlib, lib2, lib1] = session.bound_references(root)[..] else {
            panic!("expected three references");
        };

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.dependencies_of(&lib2).copied().collect::<Vec<_>>(), vec![mscorlib, lib1]);
        assert!(session.cycles(root).is_empty());
    }
}

//! Lazy member population and lookup by name.
//!
//! Namespaces and types are materialized the first time somebody asks for
//! their members. Source modules read the declarations of their
//! compilation, metadata modules their type table, retargeting modules map
//! the members of the module they wrap. Missing modules have no members.

use std::sync::Arc;

use bindery_collections::HashMap;
use bindery_metadata::{
    image::ModuleImage,
    signature::TypeName,
};
use bindery_symbols::prelude::*;
use bindery_syntax::TypeDecl;
use ecow::EcoString;
use log::trace;

use crate::{compilation::Compilation, session::Session};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMembers {
    pub namespaces: Vec<NamespaceId>,
    pub types: Vec<TypeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMembers {
    pub types: Vec<TypeId>,
    pub methods: Vec<MethodId>,
    pub fields: Vec<FieldId>,
}

#[derive(Debug, Default)]
pub(crate) struct MemberCache {
    pub namespaces: HashMap<NamespaceId, NamespaceMembers>,
    pub types: HashMap<TypeId, TypeMembers>,
    pub bases: HashMap<TypeId, Option<Type>>,
    pub interfaces: HashMap<TypeId, Vec<Type>>,
    pub returns: HashMap<MethodId, Type>,
    pub params: HashMap<MethodId, Vec<ParamId>>,
    pub fields: HashMap<FieldId, Type>,
}

/// The first segment of `namespace` below `parent`, if `namespace` is nested
/// in it.
fn child_segment<'a>(namespace: &'a str, parent: &str) -> Option<&'a str> {
    let rest = if parent.is_empty() {
        namespace
    } else {
        namespace.strip_prefix(parent)?.strip_prefix('.')?
    };
    rest.split('.').next().filter(|segment| !segment.is_empty())
}

/// Splits `N.S.Outer`1+Inner` into its namespace and name path.
pub(crate) fn parse_metadata_name(name: &str) -> (&str, Vec<TypeName>) {
    let mut segments = name.split('+');
    let first = segments.next().unwrap_or_default();
    let (namespace, first) = first.rsplit_once('.').unwrap_or(("", first));

    let path = std::iter::once(first)
        .chain(segments)
        .map(|segment| match segment.rsplit_once('`') {
            Some((name, arity)) => match arity.parse() {
                Ok(arity) => TypeName::new(name, arity),
                Err(_) => TypeName::new(segment, 0),
            },
            None => TypeName::new(segment, 0),
        })
        .collect();

    (namespace, path)
}

impl Session {
    pub fn namespace_members(&mut self, namespace: NamespaceId) -> NamespaceMembers {
        if let Some(members) = self.members.namespaces.get(&namespace) {
            return members.clone();
        }

        let module = self.table[namespace].module;
        trace!("populating namespace `{}`", self.table[namespace].qualified);

        let members = match self.table[module].kind.clone() {
            ModuleKind::Source { compilation } => {
                let compilation = self
                    .compilations
                    .get(&compilation)
                    .map(|bound| bound.compilation.clone());
                match compilation {
                    Some(compilation) => self.source_namespace_members(namespace, &compilation),
                    None => NamespaceMembers::default(),
                }
            }
            ModuleKind::Metadata { image } => self.metadata_namespace_members(namespace, &image),
            ModuleKind::Retargeting { .. } => self.retargeting_namespace_members(namespace),
            ModuleKind::Missing => NamespaceMembers::default(),
        };

        self.members.namespaces.insert(namespace, members.clone());
        members
    }

    fn add_child_namespaces(&mut self, parent: NamespaceId, names: Vec<&str>) -> Vec<NamespaceId> {
        let mut seen: Vec<&str> = Vec::new();
        let mut namespaces = Vec::new();

        for name in names {
            if !seen.contains(&name) {
                seen.push(name);
                namespaces.push(self.table.add_namespace(parent, name, None));
            }
        }
        namespaces
    }

    fn source_namespace_members(
        &mut self,
        namespace: NamespaceId,
        compilation: &Compilation,
    ) -> NamespaceMembers {
        let qualified = self.table[namespace].qualified.clone();
        let module = self.table[namespace].module;

        let decls = compilation
            .units()
            .iter()
            .flat_map(|unit| unit.types.iter().cloned())
            .collect::<Vec<_>>();

        let children = decls
            .iter()
            .filter_map(|decl| child_segment(&decl.namespace, &qualified))
            .collect();
        let namespaces = self.add_child_namespaces(namespace, children);

        let types = decls
            .iter()
            .filter(|decl| decl.namespace == qualified)
            .map(|decl| self.add_source_type(decl, Container::Namespace(namespace), module))
            .collect();

        NamespaceMembers { namespaces, types }
    }

    fn metadata_namespace_members(
        &mut self,
        namespace: NamespaceId,
        image: &Arc<ModuleImage>,
    ) -> NamespaceMembers {
        let qualified = self.table[namespace].qualified.clone();
        let module = self.table[namespace].module;

        let children = image
            .top_level_types()
            .filter_map(|(_, def)| child_segment(&def.namespace, &qualified))
            .collect();
        let namespaces = self.add_child_namespaces(namespace, children);

        let rows = image
            .top_level_types()
            .filter(|(_, def)| def.namespace == qualified)
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        let types = rows
            .into_iter()
            .map(|index| self.add_metadata_type(image, index, Container::Namespace(namespace), module))
            .collect();

        NamespaceMembers { namespaces, types }
    }

    fn retargeting_namespace_members(&mut self, namespace: NamespaceId) -> NamespaceMembers {
        let module = self.table[namespace].module;
        let assembly = self.table[module].assembly;

        let Some(underlying) = self.table[namespace].underlying else {
            return NamespaceMembers::default();
        };
        let members = self.namespace_members(underlying);

        let namespaces = members
            .namespaces
            .into_iter()
            .map(|child| self.retarget_namespace(module, child))
            .collect();
        let types = members
            .types
            .into_iter()
            .map(|ty| self.retarget_type_def(assembly, ty))
            .collect();

        NamespaceMembers { namespaces, types }
    }

    fn add_source_type(&mut self, decl: &Arc<TypeDecl>, container: Container, module: ModuleId) -> TypeId {
        let ty = self.table.add_type(
            decl.name.clone(),
            decl.kind,
            container,
            module,
            TypeOrigin::Source(decl.clone()),
        );
        for param in &decl.type_params {
            self.table
                .add_type_param(TypeParamOwner::Type(ty), param.clone(), None);
        }
        ty
    }

    fn add_metadata_type(
        &mut self,
        image: &Arc<ModuleImage>,
        index: usize,
        container: Container,
        module: ModuleId,
    ) -> TypeId {
        let Some(def) = image.type_def(index) else {
            return self.table.add_type(
                EcoString::new(),
                bindery_metadata::image::TypeKind::Class,
                container,
                module,
                TypeOrigin::Metadata {
                    image: image.clone(),
                    index,
                },
            );
        };

        let ty = self.table.add_type(
            def.name.clone(),
            def.kind,
            container,
            module,
            TypeOrigin::Metadata {
                image: image.clone(),
                index,
            },
        );
        for param in &def.type_params {
            self.table
                .add_type_param(TypeParamOwner::Type(ty), param.clone(), None);
        }
        ty
    }

    /// Nested types, methods and fields of `ty`, in declaration order.
    pub fn type_members(&mut self, ty: TypeId) -> TypeMembers {
        if let Some(members) = self.members.types.get(&ty) {
            return members.clone();
        }

        trace!("populating members of {}", self.table.qualified_name(ty));

        let module = self.table[ty].module;
        let members = match self.table[ty].origin.clone() {
            TypeOrigin::Source(decl) => {
                let types = decl
                    .nested
                    .iter()
                    .map(|nested| self.add_source_type(nested, Container::Type(ty), module))
                    .collect();

                let methods = decl
                    .methods
                    .iter()
                    .enumerate()
                    .map(|(row, method)| {
                        let id = self
                            .table
                            .add_method(method.name.clone(), ty, MemberOrigin::Declared(row));
                        for param in &method.type_params {
                            self.table
                                .add_type_param(TypeParamOwner::Method(id), param.clone(), None);
                        }
                        id
                    })
                    .collect();

                let fields = decl
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(row, field)| {
                        self.table
                            .add_field(field.name.clone(), ty, MemberOrigin::Declared(row))
                    })
                    .collect();

                TypeMembers {
                    types,
                    methods,
                    fields,
                }
            }
            TypeOrigin::Metadata { image, index } => {
                let nested = image.nested_types(index).map(|(row, _)| row).collect::<Vec<_>>();
                let types = nested
                    .into_iter()
                    .map(|row| self.add_metadata_type(&image, row, Container::Type(ty), module))
                    .collect();

                let mut methods = Vec::new();
                let mut fields = Vec::new();
                if let Some(def) = image.type_def(index) {
                    for (row, method) in def.methods.iter().enumerate() {
                        let id = self
                            .table
                            .add_method(method.name.clone(), ty, MemberOrigin::Declared(row));
                        for param in &method.type_params {
                            self.table
                                .add_type_param(TypeParamOwner::Method(id), param.clone(), None);
                        }
                        methods.push(id);
                    }
                    for (row, field) in def.fields.iter().enumerate() {
                        fields.push(
                            self.table
                                .add_field(field.name.clone(), ty, MemberOrigin::Declared(row)),
                        );
                    }
                }

                TypeMembers {
                    types,
                    methods,
                    fields,
                }
            }
            TypeOrigin::Retargeting(underlying) => {
                let assembly = self.table.type_assembly(ty);
                let members = self.type_members(underlying);

                TypeMembers {
                    types: members
                        .types
                        .into_iter()
                        .map(|nested| self.retarget_type_def(assembly, nested))
                        .collect(),
                    methods: members
                        .methods
                        .into_iter()
                        .map(|method| self.retarget_method(assembly, method))
                        .collect(),
                    fields: members
                        .fields
                        .into_iter()
                        .map(|field| self.retarget_field(assembly, field))
                        .collect(),
                }
            }
        };

        self.members.types.insert(ty, members.clone());
        members
    }

    /// Every member of `ty`: nested types, then methods, then fields.
    pub fn members(&mut self, ty: TypeId) -> Vec<MemberId> {
        let members = self.type_members(ty);

        members
            .types
            .into_iter()
            .map(MemberId::from)
            .chain(members.methods.into_iter().map(MemberId::from))
            .chain(members.fields.into_iter().map(MemberId::from))
            .collect()
    }

    pub fn members_named(&mut self, ty: TypeId, name: &str) -> Vec<MemberId> {
        self.members(ty)
            .into_iter()
            .filter(|&member| self.member_name(member) == name)
            .collect()
    }

    pub fn member_name(&self, member: MemberId) -> &EcoString {
        match member {
            MemberId::Type(id) => &self.table[id].name,
            MemberId::Method(id) => &self.table[id].name,
            MemberId::Field(id) => &self.table[id].name,
        }
    }

    /// Types named `name` directly inside `namespace`, any arity.
    pub fn type_members_named(&mut self, namespace: NamespaceId, name: &str) -> Vec<TypeId> {
        self.namespace_members(namespace)
            .types
            .into_iter()
            .filter(|&ty| self.table[ty].name == name)
            .collect()
    }

    pub fn namespace_named(&mut self, namespace: NamespaceId, name: &str) -> Option<NamespaceId> {
        self.namespace_members(namespace)
            .namespaces
            .into_iter()
            .find(|&child| self.table[child].name == name)
    }

    fn find_namespace(&mut self, module: ModuleId, namespace: &str) -> Option<NamespaceId> {
        let mut current = self.table[module].global_namespace;
        if namespace.is_empty() {
            return Some(current);
        }
        for segment in namespace.split('.') {
            current = self.namespace_named(current, segment)?;
        }
        Some(current)
    }

    /// Finds a type of `assembly` by namespace and name path, matching the
    /// arity of every segment. All modules are searched, primary first.
    pub fn find_type(
        &mut self,
        assembly: AssemblyId,
        namespace: &str,
        path: &[TypeName],
    ) -> Option<TypeId> {
        let modules = self.table[assembly].modules.clone();
        modules
            .into_iter()
            .find_map(|module| self.find_type_in_module(module, namespace, path))
    }

    pub(crate) fn find_type_in_module(
        &mut self,
        module: ModuleId,
        namespace: &str,
        path: &[TypeName],
    ) -> Option<TypeId> {
        let (first, rest) = path.split_first()?;
        let namespace = self.find_namespace(module, namespace)?;

        let mut current = self
            .namespace_members(namespace)
            .types
            .into_iter()
            .find(|&ty| self.table[ty].name == first.name && self.table[ty].arity() == first.arity)?;

        for segment in rest {
            current = self
                .type_members(current)
                .types
                .into_iter()
                .find(|&ty| {
                    self.table[ty].name == segment.name && self.table[ty].arity() == segment.arity
                })?;
        }

        Some(current)
    }

    /// Finds a type of `assembly` whose name path is `names` and whose
    /// segments declare `arity` type parameters in total.
    pub(crate) fn find_type_by_total_arity(
        &mut self,
        assembly: AssemblyId,
        namespace: &str,
        names: &[&str],
        arity: usize,
    ) -> Option<TypeId> {
        let modules = self.table[assembly].modules.clone();

        for module in modules {
            let Some(namespace) = self.find_namespace(module, namespace) else {
                continue;
            };
            let candidates = self.namespace_members(namespace).types;
            if let Some(found) = self.find_path(candidates, names, arity) {
                return Some(found);
            }
        }
        None
    }

    pub(crate) fn find_path(&mut self, candidates: Vec<TypeId>, names: &[&str], arity: usize) -> Option<TypeId> {
        let (first, rest) = names.split_first()?;

        for ty in candidates {
            let own = self.table[ty].arity();
            if self.table[ty].name != *first || own > arity {
                continue;
            }

            let remaining = arity - own;
            if rest.is_empty() {
                if remaining == 0 {
                    return Some(ty);
                }
                continue;
            }

            let nested = self.type_members(ty).types;
            if let Some(found) = self.find_path(nested, rest, remaining) {
                return Some(found);
            }
        }
        None
    }

    /// Looks up a type of `assembly` by metadata name, e.g.
    /// ``System.Collections.Generic.List`1`` or `N.Outer+Inner`.
    pub fn lookup_type(&mut self, assembly: AssemblyId, name: &str) -> Option<TypeId> {
        let (namespace, path) = parse_metadata_name(name);
        self.find_type(assembly, namespace, &path)
    }

    /// Looks up a type by metadata name as seen from `compilation`: its own
    /// assembly first, then its bound references. A name defined by more
    /// than one reference is ambiguous and yields `None`.
    pub fn get_type_by_name(&mut self, compilation: &Compilation, name: &str) -> Option<TypeId> {
        let assembly = self.bind(compilation);
        if let Some(found) = self.lookup_type(assembly, name) {
            return Some(found);
        }

        let references = self.bound_references(assembly).to_vec();
        let mut found = None;

        for reference in references {
            if self.is_missing(reference) {
                continue;
            }
            if let Some(ty) = self.lookup_type(reference, name) {
                if found.is_some_and(|previous| previous != ty) {
                    trace!("`{name}` is ambiguous in {}", compilation.assembly_name());
                    return None;
                }
                found = Some(ty);
            }
        }
        found
    }
}

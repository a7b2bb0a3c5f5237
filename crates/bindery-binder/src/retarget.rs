//! Retargeting: re-exposing the symbols of an assembly bound against one
//! set of references as if it had been bound against another.
//!
//! A retargeting assembly maps every assembly its underlying assembly
//! references to the assembly it references itself at the same position:
//!
//! ```text
//! underlying  MTTestLib2 ──▶ [mscorlib, MTTestLib1 v1]
//! retargeting MTTestLib2 ──▶ [mscorlib, MTTestLib1 v2]
//!                                        ╰─ MTTestLib1 v1 ↦ MTTestLib1 v2
//! ```
//!
//! Symbols are wrapped on demand and memoized per retargeting assembly.
//! Types from assemblies that map onto themselves pass through unchanged.

use bindery_collections::HashMap;
use bindery_metadata::signature::TypeName;
use bindery_symbols::prelude::*;
use log::trace;

use crate::session::Session;

#[derive(Debug, Default)]
pub(crate) struct RetargetCache {
    assemblies: HashMap<AssemblyId, HashMap<AssemblyId, AssemblyId>>,
    namespaces: HashMap<(ModuleId, NamespaceId), NamespaceId>,
    types: HashMap<(AssemblyId, TypeId), TypeId>,
    methods: HashMap<(AssemblyId, MethodId), MethodId>,
    fields: HashMap<(AssemblyId, FieldId), FieldId>,
    type_params: HashMap<(AssemblyId, TypeParamId), TypeParamId>,
}

impl Session {
    /// Where `retargeting` sends each assembly its underlying assembly
    /// refers to, the underlying assembly itself included.
    pub fn retargeting_map(&mut self, retargeting: AssemblyId) -> HashMap<AssemblyId, AssemblyId> {
        if let Some(map) = self.retargets.assemblies.get(&retargeting) {
            return map.clone();
        }

        let mut map = HashMap::new();
        let Some(underlying) = self.table[retargeting].underlying() else {
            return map;
        };
        map.insert(underlying, retargeting);

        let modules = &self.table[retargeting].modules;
        let underlying_modules = &self.table[underlying].modules;

        for (&module, &underlying_module) in modules.iter().zip(underlying_modules) {
            let targets = self.table[module].referenced_assemblies();
            let sources = self.table[underlying_module].referenced_assemblies();

            for (&source, &target) in sources.iter().zip(targets) {
                map.entry(source).or_insert(target);
            }
        }

        self.retargets.assemblies.insert(retargeting, map.clone());
        map
    }

    fn retargeting_module(&self, retargeting: AssemblyId, underlying: ModuleId) -> ModuleId {
        let modules = &self.table[retargeting].modules;
        modules
            .iter()
            .copied()
            .find(|&module| self.table[module].underlying() == Some(underlying))
            .or_else(|| modules.get(self.table[underlying].ordinal).copied())
            .unwrap_or_else(|| modules[0])
    }

    pub(crate) fn retarget_namespace(&mut self, module: ModuleId, underlying: NamespaceId) -> NamespaceId {
        let Some(parent) = self.table[underlying].parent else {
            return self.table[module].global_namespace;
        };
        if let Some(&namespace) = self.retargets.namespaces.get(&(module, underlying)) {
            return namespace;
        }

        let parent = self.retarget_namespace(module, parent);
        let name = self.table[underlying].name.clone();
        let namespace = self.table.add_namespace(parent, name, Some(underlying));

        self.retargets
            .namespaces
            .insert((module, underlying), namespace);
        namespace
    }

    /// The wrapper of `underlying`, a type of the underlying assembly, as
    /// seen through `retargeting`.
    pub(crate) fn retarget_type_def(&mut self, retargeting: AssemblyId, underlying: TypeId) -> TypeId {
        if let Some(&ty) = self.retargets.types.get(&(retargeting, underlying)) {
            return ty;
        }

        let symbol = self.table[underlying].clone();
        let module = self.retargeting_module(retargeting, symbol.module);
        let container = match symbol.container {
            Container::Namespace(namespace) => {
                Container::Namespace(self.retarget_namespace(module, namespace))
            }
            Container::Type(outer) => Container::Type(self.retarget_type_def(retargeting, outer)),
        };

        let ty = self.table.add_type(
            symbol.name.clone(),
            symbol.kind,
            container,
            module,
            TypeOrigin::Retargeting(underlying),
        );
        self.retargets.types.insert((retargeting, underlying), ty);

        for param in symbol.type_params {
            let name = self.table[param].name.clone();
            let retargeted = self
                .table
                .add_type_param(TypeParamOwner::Type(ty), name, Some(param));
            self.retargets
                .type_params
                .insert((retargeting, param), retargeted);
        }

        trace!("retargeted {}", self.table.qualified_name(underlying));
        ty
    }

    pub(crate) fn retarget_method(&mut self, retargeting: AssemblyId, underlying: MethodId) -> MethodId {
        if let Some(&method) = self.retargets.methods.get(&(retargeting, underlying)) {
            return method;
        }

        let symbol = self.table[underlying].clone();
        let containing = self.retarget_type_def(retargeting, symbol.containing);
        let method = self
            .table
            .add_method(symbol.name, containing, MemberOrigin::Retargeting(underlying));
        self.retargets
            .methods
            .insert((retargeting, underlying), method);

        for param in symbol.type_params {
            let name = self.table[param].name.clone();
            let retargeted = self
                .table
                .add_type_param(TypeParamOwner::Method(method), name, Some(param));
            self.retargets
                .type_params
                .insert((retargeting, param), retargeted);
        }
        method
    }

    pub(crate) fn retarget_field(&mut self, retargeting: AssemblyId, underlying: FieldId) -> FieldId {
        if let Some(&field) = self.retargets.fields.get(&(retargeting, underlying)) {
            return field;
        }

        let symbol = self.table[underlying].clone();
        let containing = self.retarget_type_def(retargeting, symbol.containing);
        let field = self
            .table
            .add_field(symbol.name, containing, MemberOrigin::Retargeting(underlying));
        self.retargets
            .fields
            .insert((retargeting, underlying), field);
        field
    }

    fn retarget_type_param(&mut self, retargeting: AssemblyId, param: TypeParamId) -> TypeParamId {
        if let Some(&retargeted) = self.retargets.type_params.get(&(retargeting, param)) {
            return retargeted;
        }

        let Some(underlying) = self.table[retargeting].underlying() else {
            return param;
        };
        if self.table.containing_assembly(param) != underlying {
            return param;
        }

        // Wrapping the owner wraps its type parameters.
        match self.table[param].owner {
            TypeParamOwner::Type(owner) => {
                self.retarget_type_def(retargeting, owner);
            }
            TypeParamOwner::Method(owner) => {
                self.retarget_method(retargeting, owner);
            }
        }

        self.retargets
            .type_params
            .get(&(retargeting, param))
            .copied()
            .unwrap_or(param)
    }

    /// Rewrites `ty`, a type observed through the underlying assembly of
    /// `retargeting`, to refer to the assemblies `retargeting` is bound to.
    pub fn retarget_type(&mut self, retargeting: AssemblyId, ty: &Type) -> Type {
        match ty {
            Type::Void => Type::Void,
            Type::Param(param) => Type::Param(self.retarget_type_param(retargeting, *param)),
            Type::Array(array) => {
                Type::array(self.retarget_type(retargeting, &array.element), array.rank)
            }
            Type::Pointer(pointee) => Type::pointer(self.retarget_type(retargeting, pointee)),
            Type::Named(named) => {
                let args = named
                    .args
                    .iter()
                    .map(|arg| self.retarget_type(retargeting, arg))
                    .collect();
                match self.retarget_definition(retargeting, named.def) {
                    Ok(def) => Type::named(def, args),
                    Err(error) => error,
                }
            }
            Type::Error(error) => self.retarget_error(retargeting, *error),
        }
    }

    fn retarget_definition(&mut self, retargeting: AssemblyId, def: TypeId) -> Result<TypeId, Type> {
        let source = self.table.type_assembly(def);
        let map = self.retargeting_map(retargeting);

        let target = match map.get(&source) {
            None => return Ok(def),
            Some(&target) if target == source => return Ok(def),
            Some(&target) => target,
        };

        if self.table[retargeting].underlying() == Some(source) {
            return Ok(self.retarget_type_def(retargeting, def));
        }

        let namespace = self.table[self.table.type_namespace(def)].qualified.clone();
        let path = self
            .table
            .type_path(def)
            .into_iter()
            .map(|(name, arity)| TypeName::new(name, arity))
            .collect::<Vec<_>>();

        if let Some(found) = self.find_type(target, &namespace, &path) {
            return Ok(found);
        }

        trace!(
            "{} is not defined in {}",
            self.table.qualified_name(def),
            self.table[target].identity
        );

        let identity = self.table[source].identity.clone();
        let owner = self.missing_assembly(&identity);
        let name = path
            .iter()
            .map(|segment| segment.name.as_str())
            .collect::<Vec<_>>()
            .join(".");
        let arity = path.iter().map(|segment| segment.arity).sum();

        Err(self.error_type(namespace, name, arity, Some(owner)))
    }

    /// Error types expected in an assembly that maps to another one get a
    /// second chance there.
    fn retarget_error(&mut self, retargeting: AssemblyId, error: ErrorTypeId) -> Type {
        let symbol = self.table[error].clone();

        let target = symbol.assembly.and_then(|assembly| {
            let map = self.retargeting_map(retargeting);
            map.get(&assembly).copied().filter(|&target| target != assembly)
        });

        let Some(target) = target else {
            return Type::Error(error);
        };
        if symbol.arity != 0 || self.table.is_missing(target) {
            return Type::Error(error);
        }

        let path = symbol
            .name
            .split('.')
            .map(|name| TypeName::new(name, 0))
            .collect::<Vec<_>>();

        match self.find_type(target, &symbol.namespace, &path) {
            Some(found) => Type::named(found, Vec::new()),
            None => Type::Error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use bindery_span::SourceId;
    use bindery_syntax::{MethodDecl, SourceUnit, TypeDecl, TypeExpr};

    use super::*;
    use crate::{
        compilation::Compilation,
        test::{Fixtures, source_lib1},
    };

    fn boxes(fixtures: &Fixtures, lib1: &Compilation) -> Compilation {
        let unit = SourceUnit::regular(SourceId::new(0)).ty(
            TypeDecl::class("", "Box")
                .generic(["T"])
                .method(MethodDecl::new("Get", TypeExpr::path("T")))
                .method(
                    MethodDecl::new("Map", TypeExpr::generic("Box", vec![TypeExpr::path("U")]))
                        .generic(["U"])
                        .param("seed", TypeExpr::path("Class1")),
                ),
        );
        Compilation::create("Boxes", [unit], [fixtures.mscorlib.clone(), lib1.to_reference()])
    }

    fn method(session: &mut Session, ty: TypeId, name: &str) -> MethodId {
        session
            .members_named(ty, name)
            .into_iter()
            .find_map(MemberId::as_method)
            .unwrap()
    }

    #[test]
    fn generic_members_keep_their_parameters() {
        let fixtures = Fixtures::new();
        let lib1_v1 = source_lib1(&fixtures, 1);
        let lib1_v2 = source_lib1(&fixtures, 2);
        let boxes = boxes(&fixtures, &lib1_v1);
        let reference = boxes.to_reference();
        let app = Compilation::create(
            "App",
            [],
            [fixtures.mscorlib.clone(), reference.clone(), lib1_v2.to_reference()],
        );

        let mut session = Session::new();
        let home = session.bind(&boxes);
        let home_lib1 = session.bind(&lib1_v1);
        let lib1 = session.bind(&lib1_v2);
        let retargeted = session.referenced_assembly(&app, &reference).unwrap();
        assert_eq!(session.table()[retargeted].underlying(), Some(home));

        let map = session.retargeting_map(retargeted);
        assert_eq!(map.get(&home), Some(&retargeted));
        assert_eq!(map.get(&home_lib1), Some(&lib1));

        let boxed = session.lookup_type(retargeted, "Box`1").unwrap();
        let home_boxed = session.lookup_type(home, "Box`1").unwrap();
        let t = session.table()[boxed].type_params[0];
        assert_eq!(session.table()[t].underlying, Some(session.table()[home_boxed].type_params[0]));

        let get = method(&mut session, boxed, "Get");
        assert_eq!(session.return_type(get), Type::Param(t));

        let mapped = method(&mut session, boxed, "Map");
        let u = session.table()[mapped].type_params[0];
        assert_eq!(session.return_type(mapped), Type::named(boxed, vec![Type::Param(u)]));

        let class1 = session.lookup_type(lib1, "Class1").unwrap();
        assert_eq!(session.parameter_types(mapped), vec![Type::named(class1, Vec::new())]);

        let params = session.parameters(mapped);
        assert!(session.table()[params[0]].underlying.is_some());
    }

    #[test]
    fn namespaces_are_wrapped_once() {
        let fixtures = Fixtures::new();
        let lib1_v1 = source_lib1(&fixtures, 1);
        let lib1_v2 = source_lib1(&fixtures, 2);
        let boxes = boxes(&fixtures, &lib1_v1);
        let reference = boxes.to_reference();
        let app = Compilation::create("App", [], [reference.clone(), lib1_v2.to_reference()]);

        let mut session = Session::new();
        let retargeted = session.referenced_assembly(&app, &reference).unwrap();
        let global = session.global_namespace(retargeted).unwrap();

        let first = session.namespace_members(global);
        let second = session.namespace_members(global);
        assert_eq!(first, second);
        assert_eq!(first.types.len(), 1);
        assert_eq!(session.table()[first.types[0]].name, "Box");
    }
}

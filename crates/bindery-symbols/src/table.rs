use std::ops::Index;

use bindery_collections::HashMap;
use bindery_metadata::identity::AssemblyIdentity;
use ecow::{EcoString, eco_format};

use crate::{id::*, symbol::*, ty::Type};

/// Arena owning every symbol of a binding session.
///
/// Symbols are never removed or replaced. The only post-construction write
/// is wiring the bound references of a module, which happens exactly once.
#[derive(Debug, Default)]
pub struct SymbolTable {
    assemblies: Vec<AssemblySymbol>,
    modules: Vec<ModuleSymbol>,
    namespaces: Vec<NamespaceSymbol>,
    types: Vec<NamedTypeSymbol>,
    methods: Vec<MethodSymbol>,
    fields: Vec<FieldSymbol>,
    params: Vec<ParameterSymbol>,
    type_params: Vec<TypeParameterSymbol>,
    error_types: Vec<ErrorTypeSymbol>,
    error_index: HashMap<ErrorTypeSymbol, ErrorTypeId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_assembly(&mut self, identity: AssemblyIdentity, kind: AssemblyKind) -> AssemblyId {
        let id = AssemblyId::from_usize(self.assemblies.len());
        self.assemblies.push(AssemblySymbol {
            identity,
            kind,
            modules: Vec::new(),
        });
        id
    }

    /// Adds a module and its global namespace to `assembly`.
    pub fn add_module(
        &mut self,
        assembly: AssemblyId,
        name: impl Into<EcoString>,
        kind: ModuleKind,
        underlying_namespace: Option<NamespaceId>,
    ) -> ModuleId {
        let id = ModuleId::from_usize(self.modules.len());
        let global_namespace = NamespaceId::from_usize(self.namespaces.len());

        self.namespaces.push(NamespaceSymbol {
            name: EcoString::new(),
            qualified: EcoString::new(),
            parent: None,
            module: id,
            underlying: underlying_namespace,
        });

        let modules = &mut self.assemblies[assembly.as_usize()].modules;
        let ordinal = modules.len();
        modules.push(id);

        self.modules.push(ModuleSymbol {
            name: name.into(),
            ordinal,
            assembly,
            kind,
            global_namespace,
            referenced: None,
        });
        id
    }

    /// Wires the bound references of `module`. Later calls are ignored so
    /// already observed reference lists never change.
    pub fn set_module_references(&mut self, module: ModuleId, references: Vec<AssemblyId>) -> bool {
        let slot = &mut self.modules[module.as_usize()].referenced;
        if slot.is_some() {
            return false;
        }
        *slot = Some(references);
        true
    }

    pub fn add_namespace(
        &mut self,
        parent: NamespaceId,
        name: impl Into<EcoString>,
        underlying: Option<NamespaceId>,
    ) -> NamespaceId {
        let name = name.into();
        let parent_symbol = &self[parent];
        let qualified = if parent_symbol.qualified.is_empty() {
            name.clone()
        } else {
            eco_format!("{}.{}", parent_symbol.qualified, name)
        };
        let module = parent_symbol.module;

        let id = NamespaceId::from_usize(self.namespaces.len());
        self.namespaces.push(NamespaceSymbol {
            name,
            qualified,
            parent: Some(parent),
            module,
            underlying,
        });
        id
    }

    /// Adds a named type; its type parameters are added afterwards with
    /// [`add_type_param`](Self::add_type_param).
    pub fn add_type(
        &mut self,
        name: impl Into<EcoString>,
        kind: bindery_metadata::image::TypeKind,
        container: Container,
        module: ModuleId,
        origin: TypeOrigin,
    ) -> TypeId {
        let id = TypeId::from_usize(self.types.len());
        self.types.push(NamedTypeSymbol {
            name: name.into(),
            kind,
            container,
            module,
            type_params: Vec::new(),
            origin,
        });
        id
    }

    pub fn add_method(
        &mut self,
        name: impl Into<EcoString>,
        containing: TypeId,
        origin: MemberOrigin<MethodId>,
    ) -> MethodId {
        let id = MethodId::from_usize(self.methods.len());
        self.methods.push(MethodSymbol {
            name: name.into(),
            containing,
            type_params: Vec::new(),
            origin,
        });
        id
    }

    pub fn add_field(
        &mut self,
        name: impl Into<EcoString>,
        containing: TypeId,
        origin: MemberOrigin<FieldId>,
    ) -> FieldId {
        let id = FieldId::from_usize(self.fields.len());
        self.fields.push(FieldSymbol {
            name: name.into(),
            containing,
            origin,
        });
        id
    }

    pub fn add_param(
        &mut self,
        method: MethodId,
        name: impl Into<EcoString>,
        ty: Type,
        underlying: Option<ParamId>,
    ) -> ParamId {
        let ordinal = self
            .params
            .iter()
            .filter(|param| param.method == method)
            .count();

        let id = ParamId::from_usize(self.params.len());
        self.params.push(ParameterSymbol {
            name: name.into(),
            ordinal,
            method,
            ty,
            underlying,
        });
        id
    }

    pub fn add_type_param(
        &mut self,
        owner: TypeParamOwner,
        name: impl Into<EcoString>,
        underlying: Option<TypeParamId>,
    ) -> TypeParamId {
        let id = TypeParamId::from_usize(self.type_params.len());
        let params = match owner {
            TypeParamOwner::Type(ty) => &mut self.types[ty.as_usize()].type_params,
            TypeParamOwner::Method(method) => &mut self.methods[method.as_usize()].type_params,
        };
        let ordinal = params.len();
        params.push(id);

        self.type_params.push(TypeParameterSymbol {
            name: name.into(),
            ordinal,
            owner,
            underlying,
        });
        id
    }

    /// Interns an error type; equal sentinels share one id.
    pub fn error_type(&mut self, symbol: ErrorTypeSymbol) -> ErrorTypeId {
        if let Some(&id) = self.error_index.get(&symbol) {
            return id;
        }

        let id = ErrorTypeId::from_usize(self.error_types.len());
        self.error_types.push(symbol.clone());
        self.error_index.insert(symbol, id);
        id
    }

    pub fn assemblies(&self) -> impl Iterator<Item = (AssemblyId, &AssemblySymbol)> {
        self.assemblies
            .iter()
            .enumerate()
            .map(|(i, symbol)| (AssemblyId::from_usize(i), symbol))
    }

    pub fn assembly_count(&self) -> usize {
        self.assemblies.len()
    }

    pub fn module_assembly(&self, module: ModuleId) -> AssemblyId {
        self[module].assembly
    }

    pub fn type_assembly(&self, ty: TypeId) -> AssemblyId {
        self.module_assembly(self[ty].module)
    }

    /// The assembly a symbol is observed through. Symbols reached through a
    /// retargeting assembly belong to it, not to the underlying assembly.
    pub fn containing_assembly(&self, symbol: impl Into<SymbolRef>) -> AssemblyId {
        match symbol.into() {
            SymbolRef::Assembly(assembly) => assembly,
            SymbolRef::Module(module) => self.module_assembly(module),
            SymbolRef::Namespace(ns) => self.module_assembly(self[ns].module),
            SymbolRef::Type(ty) => self.type_assembly(ty),
            SymbolRef::Method(method) => self.type_assembly(self[method].containing),
            SymbolRef::Field(field) => self.type_assembly(self[field].containing),
            SymbolRef::Param(param) => self.containing_assembly(self[param].method),
            SymbolRef::TypeParam(param) => match self[param].owner {
                TypeParamOwner::Type(ty) => self.type_assembly(ty),
                TypeParamOwner::Method(method) => self.containing_assembly(method),
            },
        }
    }

    /// Assembly owning the definition of a type shape, if it has one.
    pub fn type_shape_assembly(&self, ty: &Type) -> Option<AssemblyId> {
        match ty {
            Type::Named(named) => Some(self.type_assembly(named.def)),
            Type::Error(error) => self[*error].assembly,
            Type::Param(param) => Some(self.containing_assembly(*param)),
            Type::Array(_) | Type::Pointer(_) | Type::Void => None,
        }
    }

    pub fn is_missing(&self, assembly: AssemblyId) -> bool {
        self[assembly].is_missing()
    }

    /// Type parameters in scope inside `ty`, outermost declaring type first.
    pub fn all_type_params(&self, ty: TypeId) -> Vec<TypeParamId> {
        let mut chain = vec![ty];
        while let Some(outer) = self[*chain.last().unwrap_or(&ty)].containing_type() {
            chain.push(outer);
        }

        chain
            .iter()
            .rev()
            .flat_map(|t| self[*t].type_params.iter().copied())
            .collect()
    }

    /// Namespace of the outermost containing type.
    pub fn type_namespace(&self, ty: TypeId) -> NamespaceId {
        let mut current = ty;
        loop {
            match self[current].container {
                Container::Namespace(ns) => return ns,
                Container::Type(outer) => current = outer,
            }
        }
    }

    /// `(name, arity)` for the type and its containing types, outermost first.
    pub fn type_path(&self, ty: TypeId) -> Vec<(EcoString, usize)> {
        let mut path = Vec::new();
        let mut current = Some(ty);
        while let Some(t) = current {
            let symbol = &self[t];
            path.push((symbol.name.clone(), symbol.arity()));
            current = symbol.containing_type();
        }
        path.reverse();
        path
    }

    /// Dotted name including namespace and containing types.
    pub fn qualified_name(&self, ty: TypeId) -> String {
        let namespace = &self[self.type_namespace(ty)].qualified;
        let path = self
            .type_path(ty)
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(".");

        if namespace.is_empty() {
            path
        } else {
            format!("{namespace}.{path}")
        }
    }

    pub fn display_type(&self, ty: &Type) -> String {
        match ty {
            Type::Void => "void".to_owned(),
            Type::Named(named) => {
                let name = self.qualified_name(named.def);
                if named.args.is_empty() {
                    name
                } else {
                    let args = named
                        .args
                        .iter()
                        .map(|arg| self.display_type(arg))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{name}<{args}>")
                }
            }
            Type::Array(array) => {
                let commas = ",".repeat(array.rank.saturating_sub(1) as usize);
                format!("{}[{commas}]", self.display_type(&array.element))
            }
            Type::Pointer(pointee) => format!("{}*", self.display_type(pointee)),
            Type::Param(param) => self[*param].name.to_string(),
            Type::Error(error) => {
                let error = &self[*error];
                if error.namespace.is_empty() {
                    error.name.to_string()
                } else {
                    format!("{}.{}", error.namespace, error.name)
                }
            }
        }
    }
}

macro_rules! impl_index {
    ($($id:ty => $field:ident: $symbol:ty),* $(,)?) => {
        $(
            impl Index<$id> for SymbolTable {
                type Output = $symbol;

                fn index(&self, id: $id) -> &Self::Output {
                    &self.$field[id.as_usize()]
                }
            }
        )*
    };
}

impl_index!(
    AssemblyId => assemblies: AssemblySymbol,
    ModuleId => modules: ModuleSymbol,
    NamespaceId => namespaces: NamespaceSymbol,
    TypeId => types: NamedTypeSymbol,
    MethodId => methods: MethodSymbol,
    FieldId => fields: FieldSymbol,
    ParamId => params: ParameterSymbol,
    TypeParamId => type_params: TypeParameterSymbol,
    ErrorTypeId => error_types: ErrorTypeSymbol,
);

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_metadata::{identity::Version, image::TypeKind};
    use bindery_syntax::TypeDecl;
    use std::sync::Arc;

    fn source_assembly(table: &mut SymbolTable) -> (AssemblyId, ModuleId) {
        let assembly = table.add_assembly(
            AssemblyIdentity::new("App", Version::new(1, 0, 0, 0)),
            AssemblyKind::Source {
                compilation: CompilationId::new(0),
            },
        );
        let module = table.add_module(
            assembly,
            "App.dll",
            ModuleKind::Source {
                compilation: CompilationId::new(0),
            },
            None,
        );
        (assembly, module)
    }

    fn class(table: &mut SymbolTable, container: Container, module: ModuleId, name: &str) -> TypeId {
        let decl = Arc::new(TypeDecl::class("", name));
        table.add_type(name, TypeKind::Class, container, module, TypeOrigin::Source(decl))
    }

    #[test]
    fn modules_get_ordinals_and_global_namespaces() {
        let mut table = SymbolTable::new();
        let (assembly, primary) = source_assembly(&mut table);
        let added = table.add_module(
            assembly,
            "Extra.netmodule",
            ModuleKind::Missing,
            None,
        );

        assert_eq!(table[assembly].modules, vec![primary, added]);
        assert_eq!(table[added].ordinal, 1);
        assert!(table[table[primary].global_namespace].is_global());
        assert_eq!(table.module_assembly(added), assembly);
    }

    #[test]
    fn module_references_are_wired_once() {
        let mut table = SymbolTable::new();
        let (assembly, module) = source_assembly(&mut table);

        assert!(!table[module].is_wired());
        assert!(table.set_module_references(module, vec![assembly]));
        assert!(!table.set_module_references(module, Vec::new()));
        assert_eq!(table[module].referenced_assemblies(), &[assembly]);
    }

    #[test]
    fn namespaces_qualify_from_the_global_namespace() {
        let mut table = SymbolTable::new();
        let (_, module) = source_assembly(&mut table);
        let global = table[module].global_namespace;

        let system = table.add_namespace(global, "System", None);
        let generic = table.add_namespace(system, "Collections", None);

        assert_eq!(table[system].qualified, "System");
        assert_eq!(table[generic].qualified, "System.Collections");
    }

    #[test]
    fn nested_type_params_flatten_outermost_first() {
        let mut table = SymbolTable::new();
        let (_, module) = source_assembly(&mut table);
        let global = table[module].global_namespace;
        let ns = table.add_namespace(global, "N", None);

        let outer = class(&mut table, Container::Namespace(ns), module, "Outer");
        let t = table.add_type_param(TypeParamOwner::Type(outer), "T", None);
        let inner = class(&mut table, Container::Type(outer), module, "Inner");
        let u = table.add_type_param(TypeParamOwner::Type(inner), "U", None);

        assert_eq!(table.all_type_params(inner), vec![t, u]);
        assert_eq!(table[u].ordinal, 0);
        assert_eq!(table.qualified_name(inner), "N.Outer.Inner");
        assert_eq!(
            table.display_type(&Type::named(inner, vec![Type::Param(t), Type::Param(u)])),
            "N.Outer.Inner<T, U>"
        );
    }

    #[test]
    fn error_types_are_interned() {
        let mut table = SymbolTable::new();
        let symbol = ErrorTypeSymbol {
            namespace: "MT".into(),
            name: "Class1".into(),
            arity: 0,
            assembly: None,
        };

        let first = table.error_type(symbol.clone());
        let second = table.error_type(symbol);
        let other = table.error_type(ErrorTypeSymbol {
            namespace: "MT".into(),
            name: "Class2".into(),
            arity: 0,
            assembly: None,
        });

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(table.display_type(&Type::Error(first)), "MT.Class1");
    }
}

//! Builders for in-memory images, used by readers and tests alike.

use std::sync::Arc;

use ecow::EcoString;

use crate::{
    identity::AssemblyIdentity,
    image::{AssemblyImage, FieldDef, MethodDef, ModuleImage, ParamDef, TypeDef, TypeKind},
    signature::TypeSig,
};

#[derive(Debug, Clone)]
pub struct ModuleImageBuilder {
    name: EcoString,
    assembly_refs: Vec<AssemblyIdentity>,
    types: Vec<TypeDef>,
}

impl ModuleImageBuilder {
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self {
            name: name.into(),
            assembly_refs: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Builder for the manifest module of `identity`, named `<name>.dll`.
    pub fn manifest(identity: &AssemblyIdentity) -> Self {
        Self::new(ecow::eco_format!("{}.dll", identity.name()))
    }

    /// Appends a row to the assembly reference table.
    pub fn reference(mut self, identity: AssemblyIdentity) -> Self {
        self.assembly_refs.push(identity);
        self
    }

    pub fn ty(mut self, ty: TypeBuilder) -> Self {
        self.push(ty, None);
        self
    }

    fn push(&mut self, ty: TypeBuilder, enclosing: Option<usize>) {
        let TypeBuilder { mut def, nested } = ty;
        let index = self.types.len();

        def.enclosing = enclosing;
        self.types.push(def);

        for ty in nested {
            self.push(ty, Some(index));
        }
    }

    pub fn finish(self) -> Arc<ModuleImage> {
        Arc::new(ModuleImage {
            name: self.name,
            assembly_refs: self.assembly_refs,
            types: self.types,
        })
    }

    /// Finishes the module as the manifest module of a single module assembly.
    pub fn into_assembly(self, identity: AssemblyIdentity) -> Arc<AssemblyImage> {
        Arc::new(AssemblyImage::new(identity, self.finish()))
    }
}

#[derive(Debug, Clone)]
pub struct TypeBuilder {
    def: TypeDef,
    nested: Vec<TypeBuilder>,
}

impl TypeBuilder {
    pub fn new(kind: TypeKind, namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self {
            def: TypeDef {
                namespace: namespace.into(),
                name: name.into(),
                kind,
                type_params: Vec::new(),
                enclosing: None,
                base: None,
                interfaces: Vec::new(),
                methods: Vec::new(),
                fields: Vec::new(),
            },
            nested: Vec::new(),
        }
    }

    pub fn class(namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self::new(TypeKind::Class, namespace, name)
    }

    pub fn structure(namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self::new(TypeKind::Struct, namespace, name)
    }

    pub fn interface(namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self::new(TypeKind::Interface, namespace, name)
    }

    pub fn generic<'a>(mut self, params: impl IntoIterator<Item = &'a str>) -> Self {
        self.def.type_params = params.into_iter().map(EcoString::from).collect();
        self
    }

    pub fn extends(mut self, base: TypeSig) -> Self {
        self.def.base = Some(base);
        self
    }

    pub fn implements(mut self, interface: TypeSig) -> Self {
        self.def.interfaces.push(interface);
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.def.methods.push(method.def);
        self
    }

    pub fn field(mut self, name: impl Into<EcoString>, ty: TypeSig) -> Self {
        self.def.fields.push(FieldDef {
            name: name.into(),
            ty,
        });
        self
    }

    /// Adds a nested type; its namespace is cleared.
    pub fn nested(mut self, mut ty: TypeBuilder) -> Self {
        ty.def.namespace = EcoString::new();
        self.nested.push(ty);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodBuilder {
    def: MethodDef,
}

impl MethodBuilder {
    pub fn new(name: impl Into<EcoString>, return_type: TypeSig) -> Self {
        Self {
            def: MethodDef {
                name: name.into(),
                type_params: Vec::new(),
                return_type,
                params: Vec::new(),
            },
        }
    }

    pub fn generic<'a>(mut self, params: impl IntoIterator<Item = &'a str>) -> Self {
        self.def.type_params = params.into_iter().map(EcoString::from).collect();
        self
    }

    pub fn param(mut self, name: impl Into<EcoString>, ty: TypeSig) -> Self {
        self.def.params.push(ParamDef {
            name: name.into(),
            ty,
        });
        self
    }
}

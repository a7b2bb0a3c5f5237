use std::sync::Arc;

use derive_more::Display;
use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::{
    identity::AssemblyIdentity,
    signature::{TypeName, TypeSig},
};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// A loaded assembly: its identity plus its modules, manifest module first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyImage {
    identity: AssemblyIdentity,
    modules: Vec<Arc<ModuleImage>>,
}

impl AssemblyImage {
    pub fn new(identity: AssemblyIdentity, manifest: Arc<ModuleImage>) -> Self {
        Self {
            identity,
            modules: vec![manifest],
        }
    }

    pub fn with_module(mut self, module: Arc<ModuleImage>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn identity(&self) -> &AssemblyIdentity {
        &self.identity
    }

    pub fn modules(&self) -> &[Arc<ModuleImage>] {
        &self.modules
    }

    pub fn manifest_module(&self) -> &Arc<ModuleImage> {
        &self.modules[0]
    }
}

/// One module of an assembly, or a standalone netmodule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleImage {
    pub name: EcoString,
    /// Assemblies this module references, in file order.
    pub assembly_refs: Vec<AssemblyIdentity>,
    /// Every type of the module; nested types included.
    pub types: Vec<TypeDef>,
}

impl ModuleImage {
    pub fn type_def(&self, index: usize) -> Option<&TypeDef> {
        self.types.get(index)
    }

    pub fn top_level_types(&self) -> impl Iterator<Item = (usize, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, def)| def.enclosing.is_none())
    }

    pub fn nested_types(&self, enclosing: usize) -> impl Iterator<Item = (usize, &TypeDef)> {
        self.types
            .iter()
            .enumerate()
            .filter(move |(_, def)| def.enclosing == Some(enclosing))
    }

    /// Finds a type by namespace and name path, matching arity per segment.
    pub fn find_type(&self, namespace: &str, path: &[TypeName]) -> Option<usize> {
        let (first, rest) = path.split_first()?;

        let mut current = self.top_level_types().find_map(|(index, def)| {
            (def.namespace == namespace && def.name == first.name && def.arity() == first.arity)
                .then_some(index)
        })?;

        for segment in rest {
            current = self.nested_types(current).find_map(|(index, def)| {
                (def.name == segment.name && def.arity() == segment.arity).then_some(index)
            })?;
        }

        Some(current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    /// Empty for nested types.
    pub namespace: EcoString,
    pub name: EcoString,
    pub kind: TypeKind,
    /// Type parameters declared by this type, not its enclosing types.
    pub type_params: Vec<EcoString>,
    pub enclosing: Option<usize>,
    pub base: Option<TypeSig>,
    pub interfaces: Vec<TypeSig>,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
}

impl TypeDef {
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: EcoString,
    pub type_params: Vec<EcoString>,
    pub return_type: TypeSig,
    pub params: Vec<ParamDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    pub name: EcoString,
    pub ty: TypeSig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: EcoString,
    pub ty: TypeSig,
}

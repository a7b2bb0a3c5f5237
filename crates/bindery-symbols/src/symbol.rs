use std::sync::Arc;

use bindery_metadata::{
    identity::AssemblyIdentity,
    image::{AssemblyImage, ModuleImage, TypeKind},
};
use bindery_syntax::TypeDecl;
use derive_more::{Display, From};
use ecow::EcoString;

use crate::{
    id::*,
    ty::Type,
};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Assembly,
    Module,
    Namespace,
    NamedType,
    ErrorType,
    ArrayType,
    PointerType,
    TypeParameter,
    Method,
    Field,
    Parameter,
}

#[derive(Debug, Clone)]
pub enum AssemblyKind {
    /// Built from the declarations of a compilation.
    Source { compilation: CompilationId },
    /// Wraps a read-only metadata image.
    Metadata { image: Arc<AssemblyImage> },
    /// Re-exposes `underlying` against different bound references.
    Retargeting { underlying: AssemblyId },
    /// Stands in for an assembly that could not be resolved.
    Missing,
}

#[derive(Debug, Clone)]
pub struct AssemblySymbol {
    pub identity: AssemblyIdentity,
    pub kind: AssemblyKind,
    /// Primary module first.
    pub modules: Vec<ModuleId>,
}

impl AssemblySymbol {
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.kind, AssemblyKind::Missing)
    }

    pub fn is_retargeting(&self) -> bool {
        matches!(self.kind, AssemblyKind::Retargeting { .. })
    }

    pub fn underlying(&self) -> Option<AssemblyId> {
        match self.kind {
            AssemblyKind::Retargeting { underlying } => Some(underlying),
            _ => None,
        }
    }

    pub fn primary_module(&self) -> Option<ModuleId> {
        self.modules.first().copied()
    }
}

#[derive(Debug, Clone)]
pub enum ModuleKind {
    Source { compilation: CompilationId },
    Metadata { image: Arc<ModuleImage> },
    Retargeting { underlying: ModuleId },
    Missing,
}

#[derive(Debug, Clone)]
pub struct ModuleSymbol {
    pub name: EcoString,
    /// Position within the owning assembly, primary module at zero.
    pub ordinal: usize,
    pub assembly: AssemblyId,
    pub kind: ModuleKind,
    pub global_namespace: NamespaceId,
    pub(crate) referenced: Option<Vec<AssemblyId>>,
}

impl ModuleSymbol {
    /// Bound references in declared order; empty until wired.
    pub fn referenced_assemblies(&self) -> &[AssemblyId] {
        self.referenced.as_deref().unwrap_or_default()
    }

    pub fn is_wired(&self) -> bool {
        self.referenced.is_some()
    }

    pub fn underlying(&self) -> Option<ModuleId> {
        match self.kind {
            ModuleKind::Retargeting { underlying } => Some(underlying),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NamespaceSymbol {
    /// Empty for the global namespace.
    pub name: EcoString,
    /// Dotted name from the global namespace.
    pub qualified: EcoString,
    pub parent: Option<NamespaceId>,
    pub module: ModuleId,
    pub underlying: Option<NamespaceId>,
}

impl NamespaceSymbol {
    pub fn is_global(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, From, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Namespace(NamespaceId),
    Type(TypeId),
}

#[derive(Debug, Clone)]
pub enum TypeOrigin {
    Source(Arc<TypeDecl>),
    Metadata { image: Arc<ModuleImage>, index: usize },
    Retargeting(TypeId),
}

#[derive(Debug, Clone)]
pub struct NamedTypeSymbol {
    pub name: EcoString,
    pub kind: TypeKind,
    pub container: Container,
    pub module: ModuleId,
    /// Declared by this type only; enclosing type parameters live on the
    /// enclosing types.
    pub type_params: Vec<TypeParamId>,
    pub origin: TypeOrigin,
}

impl NamedTypeSymbol {
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    pub fn underlying(&self) -> Option<TypeId> {
        match self.origin {
            TypeOrigin::Retargeting(underlying) => Some(underlying),
            _ => None,
        }
    }

    pub fn containing_type(&self) -> Option<TypeId> {
        match self.container {
            Container::Type(ty) => Some(ty),
            Container::Namespace(_) => None,
        }
    }
}

/// Where a member's shape comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOrigin<T> {
    /// Row in the declaration of the containing type.
    Declared(usize),
    Retargeting(T),
}

#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub name: EcoString,
    pub containing: TypeId,
    pub type_params: Vec<TypeParamId>,
    pub origin: MemberOrigin<MethodId>,
}

impl MethodSymbol {
    pub fn underlying(&self) -> Option<MethodId> {
        match self.origin {
            MemberOrigin::Retargeting(underlying) => Some(underlying),
            MemberOrigin::Declared(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSymbol {
    pub name: EcoString,
    pub containing: TypeId,
    pub origin: MemberOrigin<FieldId>,
}

#[derive(Debug, Clone)]
pub struct ParameterSymbol {
    pub name: EcoString,
    pub ordinal: usize,
    pub method: MethodId,
    pub ty: Type,
    pub underlying: Option<ParamId>,
}

#[derive(Debug, From, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeParamOwner {
    Type(TypeId),
    Method(MethodId),
}

#[derive(Debug, Clone)]
pub struct TypeParameterSymbol {
    pub name: EcoString,
    pub ordinal: usize,
    pub owner: TypeParamOwner,
    pub underlying: Option<TypeParamId>,
}

/// A type that could not be resolved.
///
/// `assembly` is the assembly the type was expected in, a missing assembly
/// when that one could not be found, or `None` for names that never
/// resolved to any assembly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorTypeSymbol {
    pub namespace: EcoString,
    /// Dotted for nested types.
    pub name: EcoString,
    pub arity: usize,
    pub assembly: Option<AssemblyId>,
}

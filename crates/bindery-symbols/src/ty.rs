use enum_as_inner::EnumAsInner;

use crate::{
    id::{ErrorTypeId, TypeId, TypeParamId},
    symbol::SymbolKind,
};

/// A type as seen by binding and unification.
///
/// Named types refer to their definition by id, so two `Type`s are equal
/// exactly when they denote the same definition with equal arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumAsInner)]
pub enum Type {
    Void,
    Named(NamedType),
    Array(ArrayType),
    Pointer(Box<Type>),
    Param(TypeParamId),
    /// Unresolvable type; interned so equal sentinels share an id.
    Error(ErrorTypeId),
}

/// A named type with its arguments. Arguments of enclosing generic types
/// come first, so `Outer<A>.Inner<B>` has the arguments `[A, B]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    pub def: TypeId,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub element: Box<Type>,
    pub rank: u32,
}

impl Type {
    pub fn named(def: TypeId, args: Vec<Type>) -> Self {
        Self::Named(NamedType { def, args })
    }

    pub fn array(element: Type, rank: u32) -> Self {
        Self::Array(ArrayType {
            element: Box::new(element),
            rank,
        })
    }

    pub fn pointer(pointee: Type) -> Self {
        Self::Pointer(Box::new(pointee))
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Type::Void | Type::Named(_) => SymbolKind::NamedType,
            Type::Array(_) => SymbolKind::ArrayType,
            Type::Pointer(_) => SymbolKind::PointerType,
            Type::Param(_) => SymbolKind::TypeParameter,
            Type::Error(_) => SymbolKind::ErrorType,
        }
    }

    /// The definition of a named type, if this is one.
    pub fn definition(&self) -> Option<TypeId> {
        self.as_named().map(|named| named.def)
    }

    /// Whether `param` occurs anywhere inside this type.
    pub fn contains_param(&self, param: TypeParamId) -> bool {
        match self {
            Type::Void | Type::Error(_) => false,
            Type::Param(p) => *p == param,
            Type::Named(named) => named.args.iter().any(|arg| arg.contains_param(param)),
            Type::Array(array) => array.element.contains_param(param),
            Type::Pointer(pointee) => pointee.contains_param(param),
        }
    }

    pub fn contains_error(&self) -> bool {
        match self {
            Type::Error(_) => true,
            Type::Void | Type::Param(_) => false,
            Type::Named(named) => named.args.iter().any(Type::contains_error),
            Type::Array(array) => array.element.contains_error(),
            Type::Pointer(pointee) => pointee.contains_error(),
        }
    }
}

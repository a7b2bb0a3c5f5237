//! Symbol identity model.
//!
//! Every symbol lives in a [`SymbolTable`] arena and is referred to by a
//! copyable id, so reference equality of symbols is id equality:
//!
//! ```text
//! AssemblySymbol ─┬─ ModuleSymbol (primary) ── global NamespaceSymbol ── NamedTypeSymbol ─┬─ MethodSymbol ── ParameterSymbol
//!                 └─ ModuleSymbol (added)                                                 ├─ FieldSymbol
//!                                                                                         └─ NamedTypeSymbol (nested)
//! ```
//!
//! Assemblies are allocated as shells first and their bound references are
//! wired afterwards, which lets reference cycles point at already existing
//! ids. Members are filled in lazily by the binder; the table only stores
//! what has been materialized so far.

pub mod id;
pub mod symbol;
pub mod table;
pub mod ty;

pub mod prelude {
    pub use crate::id::*;
    pub use crate::symbol::*;
    pub use crate::table::SymbolTable;
    pub use crate::ty::{ArrayType, NamedType, Type};
}

pub use table::SymbolTable;
pub use ty::Type;

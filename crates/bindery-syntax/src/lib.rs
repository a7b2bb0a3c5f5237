//! Declarations of a source unit after parsing.
//!
//! Only the shapes the binder needs are kept: reference directives of
//! scripts and the type declarations with their member signatures.

mod decl;
mod unit;

pub use decl::{FieldDecl, MethodDecl, ParamDecl, TypeDecl, TypeExpr};
pub use unit::{ReferenceDirective, SourceKind, SourceUnit};

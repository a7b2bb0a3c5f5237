//! Reference binding, retargeting and missing-reference handling.
//!
//! A [`Compilation`] declares references to metadata images, netmodules and
//! other compilations. Binding it inside a [`Session`] yields a source
//! assembly whose modules are wired to exactly one assembly per declared
//! reference, transitively:
//!
//! ```text
//!            App (source)
//!           ╱     │      ╲
//!   mscorlib  MTTestLib2   MTTestLib1 v2
//!               │  ╲            ▲
//!               │   ╰ v1 ───────╯  one version per name in a scope
//!               ▼
//!   retargeting MTTestLib2 ──underlying──▶ MTTestLib2
//! ```
//!
//! Versions are picked from the root's direct references only. Compilations
//! reached against references other than their own are exposed through
//! retargeting assemblies, metadata images are bound again with different
//! references and shared otherwise. Anything that cannot be found becomes a
//! missing assembly and, when observed, an error type.

mod binder;
pub mod compilation;
pub mod directives;
pub mod edge;
pub mod error;
pub mod members;
mod missing;
pub mod options;
pub mod reference;
mod resolve;
pub mod resolver;
mod retarget;
mod scope;
pub mod session;


pub mod prelude {
    pub use crate::compilation::Compilation;
    pub use crate::directives::resolve_directives;
    pub use crate::edge::{BoundEdge, EdgeState};
    pub use crate::error::{BindError, CompilationError, ResolveError, code};
    pub use crate::members::{NamespaceMembers, TypeMembers};
    pub use crate::options::{CompilationOptions, SessionOptions};
    pub use crate::reference::{MetadataReference, ReferenceKind};
    pub use crate::resolver::{FileReferenceResolver, ReferenceResolver};
    pub use crate::session::Session;
}

pub use compilation::Compilation;
pub use reference::{MetadataReference, ReferenceKind};
pub use session::Session;

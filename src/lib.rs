//! Symbol binding for managed-language compilers.
//!
//! ```text
//!   bindery-metadata   images, identities, signatures
//!   bindery-syntax     source declarations
//!          │
//!          ▼
//!   bindery-binder     compilations ─▶ session ─▶ bound assemblies
//!          │
//!          ▼
//!   bindery-symbols    symbol table, types
//!          │
//!          ▼
//!   bindery-unify      can two types be made identical?
//! ```
//!
//! Most users only need the [`prelude`].

pub use bindery_binder as binder;
pub use bindery_metadata as metadata;
pub use bindery_symbols as symbols;
pub use bindery_syntax as syntax;
pub use bindery_unify as unify;

pub mod prelude {
    pub use bindery_binder::prelude::*;
    pub use bindery_metadata::identity::{AssemblyIdentity, PublicKeyToken, Version};
    pub use bindery_symbols::prelude::*;
    pub use bindery_unify::prelude::*;
}

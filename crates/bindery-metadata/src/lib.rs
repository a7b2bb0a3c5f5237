//! Read-only model of compiled assembly images.
//!
//! Decoding the actual binary format is left to a [`MetadataReader`]; the
//! binder only ever looks at what this crate exposes:
//!
//! ```text
//! AssemblyImage
//!   identity ─────────── Name, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null
//!   modules[0] (manifest)
//!     assembly_refs ──── import table, file order; TypeSig scopes index into it
//!     types ──────────── flat table, nested types point at their enclosing row
//!   modules[1..]
//! ```

pub mod builder;
pub mod error;
pub mod identity;
pub mod image;
pub mod reader;
pub mod signature;

pub mod prelude {
    pub use crate::builder::{MethodBuilder, ModuleImageBuilder, TypeBuilder};
    pub use crate::error::{IdentityParseError, MetadataError};
    pub use crate::identity::{AssemblyIdentity, PublicKeyToken, Version};
    pub use crate::image::{
        AssemblyImage, FieldDef, MethodDef, ModuleImage, ParamDef, TypeDef, TypeKind,
    };
    pub use crate::reader::{InMemoryReader, MetadataReader};
    pub use crate::signature::{ResolutionScope, TypeName, TypeReference, TypeSig};
}

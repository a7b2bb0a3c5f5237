use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use bindery_metadata::{
    identity::AssemblyIdentity,
    image::{AssemblyImage, ModuleImage},
};
use ecow::{EcoString, eco_format};

use crate::compilation::Compilation;

#[derive(Debug, Clone)]
pub enum ReferenceKind {
    Assembly(Arc<AssemblyImage>),
    /// A netmodule, added to the referencing assembly instead of bound as
    /// an assembly of its own.
    Module(Arc<ModuleImage>),
    Compilation(Compilation),
}

/// A declared reference of a compilation.
///
/// References compare by object identity: two references built from the
/// same image are different references, clones of one reference are the
/// same.
#[derive(Clone)]
pub struct MetadataReference(Arc<ReferenceData>);

#[derive(Debug)]
struct ReferenceData {
    kind: ReferenceKind,
    display: EcoString,
}

impl MetadataReference {
    pub fn new(kind: ReferenceKind, display: impl Into<EcoString>) -> Self {
        Self(Arc::new(ReferenceData {
            kind,
            display: display.into(),
        }))
    }

    pub fn assembly(image: Arc<AssemblyImage>) -> Self {
        let display = eco_format!("{}", image.identity());
        Self::new(ReferenceKind::Assembly(image), display)
    }

    pub fn module(image: Arc<ModuleImage>) -> Self {
        let display = image.name.clone();
        Self::new(ReferenceKind::Module(image), display)
    }

    pub fn compilation(compilation: Compilation) -> Self {
        let display = compilation.assembly_name().clone();
        Self::new(ReferenceKind::Compilation(compilation), display)
    }

    pub fn kind(&self) -> &ReferenceKind {
        &self.0.kind
    }

    pub fn display(&self) -> &EcoString {
        &self.0.display
    }

    pub fn is_module(&self) -> bool {
        matches!(self.0.kind, ReferenceKind::Module(_))
    }

    /// Identity of the referenced assembly; `None` for netmodules.
    pub fn identity(&self) -> Option<AssemblyIdentity> {
        match &self.0.kind {
            ReferenceKind::Assembly(image) => Some(image.identity().clone()),
            ReferenceKind::Compilation(compilation) => Some(compilation.identity()),
            ReferenceKind::Module(_) => None,
        }
    }
}

impl PartialEq for MetadataReference {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MetadataReference {}

impl Hash for MetadataReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for MetadataReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MetadataReference")
            .field(&self.0.display)
            .finish()
    }
}

impl fmt::Display for MetadataReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display.fmt(f)
    }
}

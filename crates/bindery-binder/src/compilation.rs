use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use bindery_collections::ImVec;
use bindery_metadata::identity::AssemblyIdentity;
use bindery_symbols::id::CompilationId;
use bindery_syntax::SourceUnit;
use ecow::EcoString;

use crate::{
    error::CompilationError, options::CompilationOptions, reference::MetadataReference,
    resolver::ReferenceResolver,
};

static GENERATOR: AtomicU32 = AtomicU32::new(0);

fn next_id() -> CompilationId {
    CompilationId::new(GENERATOR.fetch_add(1, Ordering::Relaxed))
}

/// An immutable set of source units and declared references.
///
/// Every edit returns a new compilation with a fresh id; the receiver and
/// everything already bound for it stay untouched.
#[derive(Clone)]
pub struct Compilation(Arc<CompilationData>);

#[derive(Debug, Clone)]
struct CompilationData {
    id: CompilationId,
    assembly_name: EcoString,
    units: ImVec<Arc<SourceUnit>>,
    references: ImVec<MetadataReference>,
    options: CompilationOptions,
    resolver: Option<Arc<dyn ReferenceResolver>>,
}

impl Compilation {
    pub fn new(assembly_name: impl Into<EcoString>) -> Self {
        Self(Arc::new(CompilationData {
            id: next_id(),
            assembly_name: assembly_name.into(),
            units: ImVec::new(),
            references: ImVec::new(),
            options: CompilationOptions::default(),
            resolver: None,
        }))
    }

    pub fn create(
        assembly_name: impl Into<EcoString>,
        units: impl IntoIterator<Item = SourceUnit>,
        references: impl IntoIterator<Item = MetadataReference>,
    ) -> Self {
        Self::new(assembly_name)
            .add_units(units)
            .add_references(references)
    }

    pub fn id(&self) -> CompilationId {
        self.0.id
    }

    pub fn assembly_name(&self) -> &EcoString {
        &self.0.assembly_name
    }

    pub fn units(&self) -> &ImVec<Arc<SourceUnit>> {
        &self.0.units
    }

    /// Explicit references in declared order. References coming from `#r`
    /// directives are only known once the compilation is bound.
    pub fn references(&self) -> &ImVec<MetadataReference> {
        &self.0.references
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.0.options
    }

    pub fn resolver(&self) -> Option<&Arc<dyn ReferenceResolver>> {
        self.0.resolver.as_ref()
    }

    pub fn identity(&self) -> AssemblyIdentity {
        let options = &self.0.options;
        let identity = AssemblyIdentity::new(self.0.assembly_name.clone(), options.version);

        let identity = match &options.culture {
            Some(culture) => identity.with_culture(culture.clone()),
            None => identity,
        };

        match options.public_key_token {
            Some(token) => identity.with_public_key_token(token),
            None => identity,
        }
    }

    pub fn has_reference(&self, reference: &MetadataReference) -> bool {
        self.0.references.contains(reference)
    }

    pub fn to_reference(&self) -> MetadataReference {
        MetadataReference::compilation(self.clone())
    }

    pub fn add_references(&self, references: impl IntoIterator<Item = MetadataReference>) -> Self {
        self.derive(|data| data.references.extend(references))
    }

    pub fn remove_references(&self, references: &[MetadataReference]) -> Result<Self, CompilationError> {
        for reference in references {
            self.ensure_reference(reference)?;
        }

        Ok(self.derive(|data| data.references.retain(|r| !references.contains(r))))
    }

    pub fn remove_all_references(&self) -> Self {
        self.derive(|data| data.references.clear())
    }

    /// Puts `new` in the position of `old`.
    pub fn replace_reference(
        &self,
        old: &MetadataReference,
        new: MetadataReference,
    ) -> Result<Self, CompilationError> {
        self.ensure_reference(old)?;

        Ok(self.derive(|data| {
            data.references = data
                .references
                .iter()
                .map(|r| if r == old { new.clone() } else { r.clone() })
                .collect();
        }))
    }

    pub fn add_units(&self, units: impl IntoIterator<Item = SourceUnit>) -> Self {
        self.derive(|data| data.units.extend(units.into_iter().map(Arc::new)))
    }

    pub fn with_options(&self, options: CompilationOptions) -> Self {
        self.derive(|data| data.options = options)
    }

    pub fn with_assembly_name(&self, assembly_name: impl Into<EcoString>) -> Self {
        self.derive(|data| data.assembly_name = assembly_name.into())
    }

    pub fn with_resolver(&self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.derive(|data| data.resolver = Some(resolver))
    }

    fn ensure_reference(&self, reference: &MetadataReference) -> Result<(), CompilationError> {
        if self.has_reference(reference) {
            Ok(())
        } else {
            Err(CompilationError::ReferenceNotFound(reference.display().clone()))
        }
    }

    fn derive(&self, edit: impl FnOnce(&mut CompilationData)) -> Self {
        let mut data = CompilationData::clone(&self.0);
        data.id = next_id();
        edit(&mut data);
        Self(Arc::new(data))
    }
}

impl PartialEq for Compilation {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Compilation {}

impl Hash for Compilation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Compilation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compilation")
            .field("id", &self.0.id)
            .field("assembly_name", &self.0.assembly_name)
            .field("units", &self.0.units.len())
            .field("references", &self.0.references)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bindery_metadata::identity::Version;

    use super::*;
    use crate::test::Fixtures;

    #[test]
    fn edits_leave_the_receiver_untouched() {
        let fixtures = Fixtures::new();
        let base = Compilation::new("App");

        let added = base.add_references([fixtures.mscorlib.clone()]);
        assert!(base.references().is_empty());
        assert_eq!(added.references().len(), 1);
        assert_ne!(base.id(), added.id());

        let removed = added.remove_references(&[fixtures.mscorlib.clone()]).unwrap();
        assert!(removed.references().is_empty());
        assert_eq!(added.references().len(), 1);
    }

    #[test]
    fn replace_keeps_position() {
        let fixtures = Fixtures::new();
        let compilation = Compilation::new("App").add_references([
            fixtures.mscorlib.clone(),
            fixtures.lib1_v1.clone(),
            fixtures.lib2.clone(),
        ]);

        let replaced = compilation
            .replace_reference(&fixtures.lib1_v1, fixtures.lib1_v2.clone())
            .unwrap();

        assert_eq!(replaced.references()[1], fixtures.lib1_v2);
        assert_eq!(compilation.references()[1], fixtures.lib1_v1);
    }

    #[test]
    fn unknown_references_are_rejected() {
        let fixtures = Fixtures::new();
        let compilation = Compilation::new("App").add_references([fixtures.mscorlib.clone()]);

        let error = compilation
            .replace_reference(&fixtures.lib2, fixtures.lib1_v1.clone())
            .unwrap_err();
        assert!(matches!(error, CompilationError::ReferenceNotFound(_)));
        assert!(compilation.remove_references(&[fixtures.lib2.clone()]).is_err());
    }

    #[test]
    fn identity_follows_options() {
        let compilation = Compilation::new("App")
            .with_options(CompilationOptions::new().with_version(Version::new(1, 2, 0, 0)));

        let identity = compilation.identity();
        assert_eq!(identity.name(), "App");
        assert_eq!(identity.version(), Version::new(1, 2, 0, 0));

        let renamed = compilation.with_assembly_name("Other");
        assert_eq!(renamed.identity().name(), "Other");
        assert_eq!(compilation.identity().name(), "App");
    }
}

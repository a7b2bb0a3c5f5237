use std::fmt;

use bindery_metadata::reader::MetadataReader;
use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;
use log::trace;

use crate::{error::ResolveError, reference::MetadataReference};

/// Resolves the argument of a `#r` directive to metadata references.
///
/// `base` is the directory of the unit holding the directive, or the base
/// directory of the compilation when the unit has no path.
pub trait ReferenceResolver: Send + Sync + fmt::Debug {
    fn resolve(
        &self,
        reference: &str,
        base: Option<&Utf8Path>,
    ) -> Result<Vec<MetadataReference>, ResolveError>;
}

/// Resolves file paths through a [`MetadataReader`].
///
/// Relative paths are tried against `base`, then against the resolver's own
/// base directory, then against every search path. A resolved file always
/// yields the same reference object, so repeated directives bind to the same
/// assembly.
#[derive(Debug)]
pub struct FileReferenceResolver<R> {
    reader: R,
    base_directory: Option<Utf8PathBuf>,
    search_paths: Vec<Utf8PathBuf>,
    cache: DashMap<Utf8PathBuf, MetadataReference>,
}

impl<R: MetadataReader> FileReferenceResolver<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            base_directory: None,
            search_paths: Vec::new(),
            cache: DashMap::new(),
        }
    }

    pub fn with_base_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.base_directory = Some(directory.into());
        self
    }

    pub fn with_search_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    fn candidates(&self, reference: &Utf8Path, base: Option<&Utf8Path>) -> Vec<Utf8PathBuf> {
        if reference.is_absolute() {
            return vec![reference.to_owned()];
        }

        base.into_iter()
            .chain(self.base_directory.as_deref())
            .chain(self.search_paths.iter().map(Utf8PathBuf::as_path))
            .map(|directory| directory.join(reference))
            .collect()
    }

    fn open(&self, path: Utf8PathBuf) -> Result<MetadataReference, ResolveError> {
        if let Some(reference) = self.cache.get(&path) {
            return Ok(reference.clone());
        }

        let image = self.reader.read(&path)?;
        let reference = MetadataReference::assembly(image);

        Ok(self.cache.entry(path).or_insert(reference).clone())
    }
}

impl<R> ReferenceResolver for FileReferenceResolver<R>
where
    R: MetadataReader + fmt::Debug,
{
    fn resolve(
        &self,
        reference: &str,
        base: Option<&Utf8Path>,
    ) -> Result<Vec<MetadataReference>, ResolveError> {
        let found = self
            .candidates(Utf8Path::new(reference), base)
            .into_iter()
            .find(|path| self.reader.exists(path));

        match found {
            Some(path) => {
                trace!("resolved `{reference}` to {path}");
                self.open(path).map(|reference| vec![reference])
            }
            None => Err(ResolveError::NotFound(reference.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use bindery_metadata::{
        builder::ModuleImageBuilder,
        identity::{AssemblyIdentity, Version},
        reader::InMemoryReader,
    };

    use super::*;

    fn reader() -> InMemoryReader {
        let identity = AssemblyIdentity::new("Lib", Version::new(1, 0, 0, 0));
        let image = ModuleImageBuilder::manifest(&identity).into_assembly(identity);

        InMemoryReader::new()
            .with_image("/scripts/lib.dll", image.clone())
            .with_image("/packages/lib.dll", image)
    }

    #[test]
    fn relative_paths_prefer_the_unit_directory() {
        let resolver = FileReferenceResolver::new(reader()).with_search_path("/packages");

        let from_script = resolver
            .resolve("lib.dll", Some(Utf8Path::new("/scripts")))
            .unwrap();
        let from_search = resolver.resolve("lib.dll", None).unwrap();

        assert_eq!(from_script.len(), 1);
        assert_ne!(from_script[0], from_search[0]);
    }

    #[test]
    fn repeated_resolution_yields_the_same_reference() {
        let resolver = FileReferenceResolver::new(reader()).with_base_directory("/scripts");

        let first = resolver.resolve("lib.dll", None).unwrap();
        let second = resolver.resolve("/scripts/lib.dll", None).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn missing_files_are_reported() {
        let resolver = FileReferenceResolver::new(reader());

        assert_eq!(
            resolver.resolve("other.dll", Some(Utf8Path::new("/scripts"))),
            Err(ResolveError::NotFound("other.dll".into()))
        );
    }
}

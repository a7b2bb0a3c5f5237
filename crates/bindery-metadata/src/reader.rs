use std::{collections::HashMap, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
use log::trace;

use crate::{error::MetadataError, image::AssemblyImage};

/// Turns a binary location into a read-only assembly image.
///
/// Implementations may block on I/O. Failures are reported, never panicked.
pub trait MetadataReader: Send + Sync {
    fn read(&self, path: &Utf8Path) -> Result<Arc<AssemblyImage>, MetadataError>;

    fn exists(&self, path: &Utf8Path) -> bool;
}

/// Reader serving images registered up front, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReader {
    images: HashMap<Utf8PathBuf, Arc<AssemblyImage>>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image(&mut self, path: impl Into<Utf8PathBuf>, image: Arc<AssemblyImage>) {
        self.images.insert(path.into(), image);
    }

    pub fn with_image(mut self, path: impl Into<Utf8PathBuf>, image: Arc<AssemblyImage>) -> Self {
        self.add_image(path, image);
        self
    }
}

impl MetadataReader for InMemoryReader {
    fn read(&self, path: &Utf8Path) -> Result<Arc<AssemblyImage>, MetadataError> {
        trace!("reading metadata from {path}");

        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(path.to_owned()))
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        self.images.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::ModuleImageBuilder,
        identity::{AssemblyIdentity, Version},
    };

    #[test]
    fn serves_registered_images_by_path() {
        let identity = AssemblyIdentity::new("Lib", Version::new(1, 0, 0, 0));
        let image = ModuleImageBuilder::manifest(&identity).into_assembly(identity);
        let reader = InMemoryReader::new().with_image("/refs/Lib.dll", image.clone());

        let read = reader.read(Utf8Path::new("/refs/Lib.dll")).unwrap();
        assert!(Arc::ptr_eq(&read, &image));
        assert!(reader.exists(Utf8Path::new("/refs/Lib.dll")));

        assert_eq!(
            reader.read(Utf8Path::new("/refs/Missing.dll")),
            Err(MetadataError::NotFound("/refs/Missing.dll".into()))
        );
    }
}

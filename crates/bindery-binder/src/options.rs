use bindery_metadata::identity::{PublicKeyToken, Version};
use camino::Utf8PathBuf;
use ecow::EcoString;
use serde::Deserialize;

/// Options shared by every compilation bound in one [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionOptions {
    /// Share metadata assembly symbols between compilations whose references
    /// bind them to the same assemblies.
    pub reuse_metadata_symbols: bool,
    /// Record an issue when two direct references share a simple name but
    /// cannot stand for the same assembly.
    pub report_ambiguous_names: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            reuse_metadata_symbols: true,
            report_ambiguous_names: true,
        }
    }
}

/// Options describing the assembly a compilation produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilationOptions {
    pub version: Version,
    pub culture: Option<EcoString>,
    pub public_key_token: Option<PublicKeyToken>,
    /// Fallback directory for `#r` directives of units without a path.
    pub base_directory: Option<Utf8PathBuf>,
}

impl CompilationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn with_culture(mut self, culture: impl Into<EcoString>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    pub fn with_public_key_token(mut self, token: PublicKeyToken) -> Self {
        self.public_key_token = Some(token);
        self
    }

    pub fn with_base_directory(mut self, directory: impl Into<Utf8PathBuf>) -> Self {
        self.base_directory = Some(directory.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_defaults_share_and_report() {
        let options = SessionOptions::default();
        assert!(options.reuse_metadata_symbols);
        assert!(options.report_ambiguous_names);
    }

    #[test]
    fn compilation_options_build_up() {
        let options = CompilationOptions::new()
            .with_version(Version::new(2, 0, 0, 0))
            .with_base_directory("/refs");

        assert_eq!(options.version, Version::new(2, 0, 0, 0));
        assert_eq!(options.base_directory.as_deref(), Some(camino::Utf8Path::new("/refs")));
        assert_eq!(options.culture, None);
    }
}

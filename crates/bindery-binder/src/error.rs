use bindery_metadata::error::MetadataError;
use bindery_span::{Diagnostic, Issue, Loc};
use ecow::EcoString;
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Stable codes of the conditions reported while binding references.
pub mod code {
    pub const METADATA_FILE_NOT_FOUND: usize = 6;
    pub const DUPLICATE_SIMPLE_NAME: usize = 1704;
    pub const QUOTED_FILE_NAME_EXPECTED: usize = 7010;
    pub const DIRECTIVE_ONLY_IN_SCRIPTS: usize = 7011;
    pub const REFERENCES_NOT_SUPPORTED: usize = 7099;
}

/// Recoverable binding conditions. They end up in the [`Report`] of a bound
/// compilation and never abort binding.
///
/// [`Report`]: bindery_span::Report
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum BindError {
    #[error("metadata file `{0}` could not be found")]
    #[diagnostic(code(binder::metadata_file_not_found))]
    MetadataFileNotFound(EcoString),
    #[error("an assembly with the same simple name `{0}` has already been imported")]
    #[diagnostic(
        code(binder::duplicate_simple_name),
        help("remove one of the references or sign them to enable side-by-side")
    )]
    DuplicateSimpleName(EcoString),
    #[error("quoted file name expected")]
    #[diagnostic(code(binder::quoted_file_name_expected))]
    QuotedFileNameExpected,
    #[error("#r is only allowed in scripts")]
    #[diagnostic(code(binder::directive_only_in_scripts))]
    DirectiveOnlyInScripts,
    #[error("metadata references are not supported")]
    #[diagnostic(
        code(binder::references_not_supported),
        help("attach a reference resolver to the compilation")
    )]
    ReferencesNotSupported,
}

impl BindError {
    pub fn code(&self) -> usize {
        match self {
            Self::MetadataFileNotFound(_) => code::METADATA_FILE_NOT_FOUND,
            Self::DuplicateSimpleName(_) => code::DUPLICATE_SIMPLE_NAME,
            Self::QuotedFileNameExpected => code::QUOTED_FILE_NAME_EXPECTED,
            Self::DirectiveOnlyInScripts => code::DIRECTIVE_ONLY_IN_SCRIPTS,
            Self::ReferencesNotSupported => code::REFERENCES_NOT_SUPPORTED,
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Self::MetadataFileNotFound(arg) | Self::DuplicateSimpleName(arg) => vec![arg.to_string()],
            _ => Vec::new(),
        }
    }

    pub fn into_diagnostic(self, loc: Loc) -> Diagnostic {
        let diagnostic = Diagnostic::error(loc, self.code(), self.to_string()).with_args(self.args());
        match help(&self) {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        }
    }

    pub fn into_issue(self) -> Issue {
        let issue = Issue::error(self.to_string(), self.code()).with_args(self.args());
        match help(&self) {
            Some(help) => issue.with_help(help),
            None => issue,
        }
    }
}

fn help(error: &BindError) -> Option<String> {
    MietteDiagnostic::help(error).map(|help| help.to_string())
}

/// Misuse of the compilation editing API.
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum CompilationError {
    #[error("reference `{0}` is not part of the compilation")]
    #[diagnostic(code(binder::compilation::reference_not_found))]
    ReferenceNotFound(EcoString),
}

/// Failure of a [`ReferenceResolver`](crate::resolver::ReferenceResolver).
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("no file found for reference `{0}`")]
    #[diagnostic(code(binder::resolver::not_found))]
    NotFound(EcoString),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Metadata(#[from] MetadataError),
}

#[cfg(test)]
mod tests {
    use bindery_span::{SourceId, Span};

    use super::*;

    #[test]
    fn diagnostics_carry_code_and_args() {
        let loc = Loc::new(SourceId::new(0), Span::new(3, 12));
        let diagnostic = BindError::MetadataFileNotFound("lib.dll".into()).into_diagnostic(loc);

        assert_eq!(diagnostic.code, code::METADATA_FILE_NOT_FOUND);
        assert_eq!(diagnostic.args, vec!["lib.dll".to_owned()]);
        assert_eq!(diagnostic.loc, loc);
        assert!(diagnostic.is_error());
    }

    #[test]
    fn issues_keep_help() {
        let issue = BindError::DuplicateSimpleName("Lib".into()).into_issue();
        assert_eq!(issue.code, code::DUPLICATE_SIMPLE_NAME);
        assert!(issue.help.is_some());

        let issue = BindError::QuotedFileNameExpected.into_issue();
        assert!(issue.args.is_empty());
        assert!(issue.help.is_none());
    }
}

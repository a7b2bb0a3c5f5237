//! `#r` reference directives of script units.

use bindery_span::Report;
use log::{debug, trace};

use crate::{compilation::Compilation, error::BindError, reference::MetadataReference};

/// Resolves every reference directive of `compilation`, in unit order.
///
/// Malformed or unresolvable directives are reported and skipped; the
/// remaining directives are still resolved.
pub fn resolve_directives(compilation: &Compilation, report: &mut Report) -> Vec<MetadataReference> {
    let mut references = Vec::new();

    for unit in compilation.units() {
        for directive in &unit.directives {
            trace!("resolving directive {} at {}", directive.text, directive.loc);

            if !unit.is_script() {
                report.add_diagnostic(BindError::DirectiveOnlyInScripts.into_diagnostic(directive.loc));
                continue;
            }

            let Some(file) = directive.file() else {
                report.add_diagnostic(BindError::QuotedFileNameExpected.into_diagnostic(directive.loc));
                continue;
            };

            let Some(resolver) = compilation.resolver() else {
                report.add_diagnostic(BindError::ReferencesNotSupported.into_diagnostic(directive.loc));
                continue;
            };

            let base = unit
                .directory()
                .or(compilation.options().base_directory.as_deref());

            match resolver.resolve(file, base) {
                Ok(resolved) if !resolved.is_empty() => references.extend(resolved),
                Ok(_) | Err(_) => {
                    debug!("directive `{file}` did not resolve");
                    report.add_diagnostic(
                        BindError::MetadataFileNotFound(file.into()).into_diagnostic(directive.loc),
                    );
                }
            }
        }
    }

    references
}

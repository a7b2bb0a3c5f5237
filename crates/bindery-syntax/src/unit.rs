use std::sync::Arc;

use bindery_span::{Loc, SourceId, Span};
use camino::{Utf8Path, Utf8PathBuf};
use ecow::EcoString;

use crate::TypeDecl;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SourceKind {
    #[default]
    Regular,
    /// Scripts may carry `#r` reference directives.
    Script,
}

/// `#r "path"`; `text` is the raw argument as written, quotes included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceDirective {
    pub text: EcoString,
    pub loc: Loc,
}

impl ReferenceDirective {
    /// The referenced file when the argument is a well formed quoted string.
    pub fn file(&self) -> Option<&str> {
        let text = self.text.trim();
        let inner = text.strip_prefix('"')?.strip_suffix('"')?;
        (!inner.is_empty() && !inner.contains('"')).then_some(inner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub source: SourceId,
    pub path: Option<Utf8PathBuf>,
    pub kind: SourceKind,
    pub directives: Vec<ReferenceDirective>,
    pub types: Vec<Arc<TypeDecl>>,
}

impl SourceUnit {
    pub fn new(source: SourceId, kind: SourceKind) -> Self {
        Self {
            source,
            path: None,
            kind,
            directives: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn regular(source: SourceId) -> Self {
        Self::new(source, SourceKind::Regular)
    }

    pub fn script(source: SourceId) -> Self {
        Self::new(source, SourceKind::Script)
    }

    pub fn with_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn directive(mut self, text: impl Into<EcoString>, span: Span) -> Self {
        self.directives.push(ReferenceDirective {
            text: text.into(),
            loc: Loc::new(self.source, span),
        });
        self
    }

    pub fn ty(mut self, decl: TypeDecl) -> Self {
        self.types.push(Arc::new(decl));
        self
    }

    pub fn is_script(&self) -> bool {
        self.kind == SourceKind::Script
    }

    /// Directory relative directives are resolved against.
    pub fn directory(&self) -> Option<&Utf8Path> {
        self.path.as_deref().and_then(Utf8Path::parent)
    }
}

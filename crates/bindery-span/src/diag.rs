use derive_more::Display;
use owo_colors::{OwoColorize, Style};
use std::{
    fmt,
    io::{self, Write},
};

use crate::Loc;

/// Issues and diagnostics collected by one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub issues: Vec<Issue>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
            || self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Codes of every issue followed by every diagnostic, in insertion order.
    pub fn codes(&self) -> impl Iterator<Item = usize> + '_ {
        self.issues
            .iter()
            .map(|i| i.code)
            .chain(self.diagnostics.iter().map(|d| d.code))
    }

    pub fn write(&self, mut w: impl Write) -> io::Result<()> {
        for issue in &self.issues {
            issue.write(&mut w)?;
        }
        for diagnostic in &self.diagnostics {
            diagnostic.write(&mut w)?;
        }
        Ok(())
    }

    pub fn eprint(&self) -> io::Result<()> {
        self.write(io::stderr())
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    fn palette(self) -> Style {
        match self {
            Severity::Info => Style::new().green(),
            Severity::Warning => Style::new().yellow(),
            Severity::Error => Style::new().red(),
        }
    }
}

/// A report that is not tied to a source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Issue {
    /// The main issue message.
    pub message: String,
    /// Stable code identifying the kind of issue.
    pub code: usize,
    /// Values substituted into the message, in order.
    pub args: Vec<String>,
    pub help: Option<String>,
    pub severity: Severity,
}

impl Issue {
    pub fn error(message: impl Into<String>, code: usize) -> Self {
        Self::new(message, code, Severity::Error)
    }

    pub fn warn(message: impl Into<String>, code: usize) -> Self {
        Self::new(message, code, Severity::Warning)
    }

    fn new(message: impl Into<String>, code: usize, severity: Severity) -> Self {
        Self {
            message: message.into(),
            code,
            args: Vec::new(),
            help: None,
            severity,
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn write(&self, mut w: impl Write) -> io::Result<()> {
        let style = self.severity.palette();

        writeln!(
            w,
            "{} {}: {}",
            self.code.style(style),
            self.severity.style(style),
            self.message
        )?;

        if let Some(help) = &self.help {
            writeln!(w, "{} {help}", "Help:".cyan())?;
        }

        Ok(())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

/// Represents a diagnostic message with source location information.
///
/// Besides the rendered message a diagnostic keeps its stable `code` and
/// the raw `args` of the message, so consumers can localize or match on
/// them without parsing text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// The main diagnostic message.
    pub message: String,
    /// Stable code identifying the kind of diagnostic.
    pub code: usize,
    /// Values substituted into the message, in order.
    pub args: Vec<String>,
    /// Optional help text that provides additional guidance.
    pub help: Option<String>,
    pub severity: Severity,
    /// The source code location this diagnostic refers to.
    pub loc: Loc,
    /// Additional notes related to the diagnostic.
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(loc: Loc, code: usize, message: impl Into<String>) -> Self {
        Self::new(loc, code, message, Severity::Error)
    }

    pub fn warn(loc: Loc, code: usize, message: impl Into<String>) -> Self {
        Self::new(loc, code, message, Severity::Warning)
    }

    pub fn info(loc: Loc, code: usize, message: impl Into<String>) -> Self {
        Self::new(loc, code, message, Severity::Info)
    }

    fn new(loc: Loc, code: usize, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            code,
            args: Vec::new(),
            help: None,
            severity,
            loc,
            notes: Vec::new(),
        }
    }

    /// Sets the message arguments and returns self for method chaining.
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_notes(mut self, notes: impl IntoIterator<Item = String>) -> Self {
        self.notes = notes.into_iter().collect();
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn write(&self, mut w: impl Write) -> io::Result<()> {
        let style = self.severity.palette();

        writeln!(
            w,
            "{} {} at {}: {}",
            self.code.style(style),
            self.severity.style(style),
            self.loc,
            self.message
        )?;

        if let Some(help) = &self.help {
            writeln!(w, "{} {help}", "Help:".cyan())?;
        }

        for note in &self.notes {
            writeln!(w, "{} {note}", "Note:".blue())?;
        }

        Ok(())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceId;

    #[test]
    fn report_tracks_codes_in_order() {
        let loc = Loc::from_range(SourceId::new(0), 3..9);

        let mut report = Report::new();
        assert!(report.is_empty());

        report.add_diagnostic(
            Diagnostic::error(loc, 6, "metadata file 'a.dll' could not be found")
                .with_args(["a.dll"]),
        );
        report.add_issue(Issue::warn("ambiguous", 1704));

        assert_eq!(report.codes().collect::<Vec<_>>(), vec![1704, 6]);
        assert!(report.has_errors());
        assert_eq!(report.diagnostics[0].args, vec!["a.dll".to_owned()]);
    }

    #[test]
    fn warnings_alone_are_not_errors() {
        let mut report = Report::new();
        report.add_issue(Issue::warn("ambiguous", 1704).with_help("add a public key"));

        assert!(!report.has_errors());

        let mut out = Vec::new();
        report.write(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("ambiguous"));
    }
}

//! Source positions and diagnostics.
//!
//! Important concepts in this module include:
//!
//! - the *span*, represented by [`Span`], and its owning unit as a [`Loc`];
//! - the [`Diagnostic`] (located) and [`Issue`] (unlocated) reports, both
//!   carrying a stable numeric code and the arguments of their message.

mod diag;
mod loc;
mod span;

pub use diag::{Diagnostic, Issue, Report, Severity};
pub use loc::{Loc, SourceId};
pub use span::Span;

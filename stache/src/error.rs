//! Template syntax errors, reported through miette.
//!
//! Every error carries the template source and the span of the offending tag,
//! so a failing template prints with the tag underlined. Lookup misses are not
//! errors: the renderer is total over arbitrary data.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::ops::Range;
use std::sync::Arc;
use thiserror::Error;

/// A template source for error reporting
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Name shown in diagnostics (`template`, or the partial name)
    pub name: String,
    /// The full source text
    pub source: Arc<String>,
}

impl TemplateSource {
    /// A named source.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Arc::new(source.into()),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, (*self.source).clone())
    }
}

/// All template errors
#[derive(Error, Debug, Diagnostic)]
pub enum TemplateError {
    /// See [`MalformedDelimiterError`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    MalformedDelimiter(#[from] MalformedDelimiterError),

    /// See [`UnclosedTagError`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnclosedTag(#[from] UnclosedTagError),

    /// See [`UnmatchedSectionError`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnmatchedSection(#[from] UnmatchedSectionError),

    /// See [`UnclosedSectionError`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    UnclosedSection(#[from] UnclosedSectionError),
}

impl TemplateError {
    /// Byte range of the tag the error points at, if it came from template text.
    pub fn span(&self) -> Option<Range<usize>> {
        let span = match self {
            TemplateError::MalformedDelimiter(e) => e.span?,
            TemplateError::UnclosedTag(e) => e.span,
            TemplateError::UnmatchedSection(e) => e.span,
            TemplateError::UnclosedSection(e) => e.span,
        };
        Some(span.offset()..span.offset() + span.len())
    }
}

/// Delimiter pair that is not exactly two whitespace-separated tags
#[derive(Error, Debug, Diagnostic)]
#[error("Invalid tags: {found}")]
#[diagnostic(
    code(stache::syntax::malformed_delimiter),
    help("Delimiters are exactly two tags separated by whitespace, e.g. `<% %>`")
)]
pub struct MalformedDelimiterError {
    /// The tag specification as written
    pub found: String,
    /// Location of the delimiter change tag (absent for tags passed to `compile`)
    #[label("in this delimiter change")]
    pub span: Option<SourceSpan>,
    /// The source code
    #[source_code]
    pub src: NamedSource<String>,
}

/// Open delimiter without a matching close delimiter
#[derive(Error, Debug, Diagnostic)]
#[error("Unclosed tag at {position}")]
#[diagnostic(
    code(stache::syntax::unclosed_tag),
    help("Add `{close_delim}` to close this tag")
)]
pub struct UnclosedTagError {
    /// Byte offset where scanning gave up
    pub position: usize,
    /// The closing delimiter needed
    pub close_delim: String,
    /// Where the tag was opened
    #[label("opened here")]
    pub span: SourceSpan,
    /// The source code
    #[source_code]
    pub src: NamedSource<String>,
}

/// Section close tag that does not close the innermost open section
#[derive(Error, Debug, Diagnostic)]
#[error("Unmatched section close `{name}`")]
#[diagnostic(code(stache::syntax::unmatched_section), help("{hint}"))]
pub struct UnmatchedSectionError {
    /// Name in the close tag
    pub name: String,
    /// Name of the innermost open section, if any
    pub expected: Option<String>,
    /// Help text
    pub hint: String,
    /// Location of the close tag
    #[label("closed here")]
    pub span: SourceSpan,
    /// The source code
    #[source_code]
    pub src: NamedSource<String>,
}

impl UnmatchedSectionError {
    pub(crate) fn new(
        name: impl Into<String>,
        expected: Option<String>,
        span: Range<usize>,
        src: &TemplateSource,
    ) -> Self {
        let name = name.into();
        let hint = match &expected {
            Some(open) => format!("The innermost open section is `{open}`"),
            None => format!("No section named `{name}` is open here"),
        };
        Self {
            name,
            expected,
            hint,
            span: span.into(),
            src: src.named_source(),
        }
    }
}

/// Section still open at end of input
#[derive(Error, Debug, Diagnostic)]
#[error("Unclosed section `{name}`")]
#[diagnostic(
    code(stache::syntax::unclosed_section),
    help("Add a matching close tag for `{name}`")
)]
pub struct UnclosedSectionError {
    /// Name of the open section
    pub name: String,
    /// Location of the open tag
    #[label("opened here")]
    pub span: SourceSpan,
    /// The source code
    #[source_code]
    pub src: NamedSource<String>,
}

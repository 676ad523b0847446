//! Template tokens and delimiter tags.

use std::fmt;
use std::ops::Range;

/// An open/close delimiter pair, `{{`/`}}` by default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tags {
    /// Opening delimiter
    pub open: String,
    /// Closing delimiter
    pub close: String,
}

impl Tags {
    /// A delimiter pair.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Parse a `"<% %>"` style specification: exactly two whitespace-separated
    /// tags.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let (open, close) = (parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(open, close))
    }

    pub(crate) fn is_valid(&self) -> bool {
        let valid = |tag: &str| !tag.is_empty() && !tag.contains(char::is_whitespace);
        valid(&self.open) && valid(&self.close)
    }
}

impl Default for Tags {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

/// A token with its byte span in the template source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What the token is
    pub kind: TokenKind,
    /// Byte range of the token in the template source
    pub span: Range<usize>,
}

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Literal text
    Text(String),
    /// `{{name}}`, HTML-escaped
    Name(String),
    /// `{{{name}}}` or `{{&name}}`
    UnescapedName(String),
    /// `{{#name}}`
    Section(Section),
    /// `{{^name}}`
    InvertedSection(Section),
    /// `{{/name}}`; only present before nesting
    SectionClose(String),
    /// `{{>name}}`
    Partial(String),
    /// `{{=<% %>=}}`
    DelimiterChange(Tags),
    /// `{{! ... }}`
    Comment(String),
}

/// Body of a section token
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    /// Name in the open tag
    pub name: String,
    /// Tokens between the open and close tags
    pub children: Vec<Token>,
    /// Byte offset where the matching close tag starts
    pub close: usize,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    /// The name a tag refers to, if it is a tag.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Name(name)
            | TokenKind::UnescapedName(name)
            | TokenKind::SectionClose(name)
            | TokenKind::Partial(name) => Some(name),
            TokenKind::Section(section) | TokenKind::InvertedSection(section) => {
                Some(&section.name)
            }
            TokenKind::Text(_) | TokenKind::DelimiterChange(_) | TokenKind::Comment(_) => None,
        }
    }

    /// The section body, for section and inverted section tokens.
    pub fn section(&self) -> Option<&Section> {
        match &self.kind {
            TokenKind::Section(section) | TokenKind::InvertedSection(section) => Some(section),
            _ => None,
        }
    }

    pub(crate) fn section_mut(&mut self) -> Option<&mut Section> {
        match &mut self.kind {
            TokenKind::Section(section) | TokenKind::InvertedSection(section) => Some(section),
            _ => None,
        }
    }

    /// Raw template text between a section's open and close tags.
    pub fn section_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        let section = self.section()?;
        source.get(self.span.end..section.close)
    }
}

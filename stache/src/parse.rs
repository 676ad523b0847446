//! Template parser: scan → squash → nest.
//!
//! Text is emitted one character per token while scanning so that whitespace
//! on a line holding only structural tags (sections, partials, comments,
//! delimiter changes) can be dropped token by token. Adjacent text tokens are
//! then coalesced and the flat stream is nested into a tree of sections.

use std::ops::Range;

use crate::error::{
    MalformedDelimiterError, TemplateError, TemplateSource, UnclosedSectionError,
    UnclosedTagError, UnmatchedSectionError,
};
use crate::scanner::Scanner;
use crate::token::{Section, Tags, Token, TokenKind};
use crate::tracing_macros::trace;

const SIGILS: &[char] = &['#', '^', '/', '>', '{', '&', '=', '!'];

/// Parse a template with the default `{{ }}` delimiters.
pub fn parse(template: &str) -> Result<Vec<Token>, TemplateError> {
    parse_with_tags(template, &Tags::default())
}

/// Parse a template into a token tree, starting with the given delimiters.
pub fn parse_with_tags(template: &str, tags: &Tags) -> Result<Vec<Token>, TemplateError> {
    parse_named("template", template, tags)
}

pub(crate) fn parse_named(
    name: &str,
    template: &str,
    tags: &Tags,
) -> Result<Vec<Token>, TemplateError> {
    let src = || TemplateSource::new(name, template);

    if !tags.is_valid() {
        return Err(MalformedDelimiterError {
            found: tags.to_string(),
            span: None,
            src: src().named_source(),
        }
        .into());
    }

    let mut tags = tags.clone();
    let mut scanner = Scanner::new(template);
    let mut sections: Vec<(String, Range<usize>)> = Vec::new();
    let mut tokens: Vec<Token> = Vec::new();
    // Indices of whitespace tokens on the current line
    let mut spaces: Vec<usize> = Vec::new();
    let mut has_tag = false;
    let mut non_space = false;

    while !scanner.eos() {
        let mut start = scanner.pos();
        for ch in scanner.scan_until(&tags.open).chars() {
            let end = start + ch.len_utf8();
            if ch.is_whitespace() {
                spaces.push(tokens.len());
            } else {
                non_space = true;
            }
            tokens.push(Token::new(TokenKind::Text(ch.to_string()), start..end));
            start = end;

            if ch == '\n' {
                strip_space(&mut tokens, &mut spaces, has_tag && !non_space);
                has_tag = false;
                non_space = false;
            }
        }

        let start = scanner.pos();
        if !scanner.scan(&tags.open) {
            break;
        }
        has_tag = true;

        let sigil = scanner.scan_char(SIGILS);
        scanner.skip_whitespace();

        let value = match sigil {
            Some('=') => {
                let value = scanner.scan_until_padded("=");
                scanner.scan_padded("=");
                scanner.scan_until_padded(&tags.close);
                value
            }
            Some('{') => {
                let value = scanner.scan_until_padded(&format!("}}{}", tags.close));
                scanner.scan_padded("}");
                scanner.scan_until_padded(&tags.close);
                value
            }
            _ => scanner.scan_until_padded(&tags.close),
        };

        if !scanner.scan_padded(&tags.close) {
            return Err(UnclosedTagError {
                position: scanner.pos(),
                close_delim: tags.close.clone(),
                span: (start..start + tags.open.len()).into(),
                src: src().named_source(),
            }
            .into());
        }

        let span = start..scanner.pos();
        let value = value.to_string();
        let kind = match sigil {
            Some('#') => {
                sections.push((value.clone(), span.clone()));
                TokenKind::Section(Section {
                    name: value,
                    ..Section::default()
                })
            }
            Some('^') => {
                sections.push((value.clone(), span.clone()));
                TokenKind::InvertedSection(Section {
                    name: value,
                    ..Section::default()
                })
            }
            Some('/') => match sections.pop() {
                None => return Err(UnmatchedSectionError::new(value, None, span, &src()).into()),
                Some((open, _)) if open != value => {
                    return Err(UnmatchedSectionError::new(value, Some(open), span, &src()).into());
                }
                Some(_) => TokenKind::SectionClose(value),
            },
            Some('>') => TokenKind::Partial(value),
            Some('{') | Some('&') => {
                non_space = true;
                TokenKind::UnescapedName(value)
            }
            Some('=') => {
                let Some(new_tags) = Tags::parse(&value) else {
                    return Err(MalformedDelimiterError {
                        found: value,
                        span: Some(span.into()),
                        src: src().named_source(),
                    }
                    .into());
                };
                trace!(open = %new_tags.open, close = %new_tags.close, "delimiters changed");
                tags = new_tags.clone();
                TokenKind::DelimiterChange(new_tags)
            }
            Some('!') => TokenKind::Comment(value),
            _ => {
                non_space = true;
                TokenKind::Name(value)
            }
        };
        tokens.push(Token::new(kind, span));
    }

    if let Some((name, span)) = sections.pop() {
        return Err(UnclosedSectionError {
            name,
            span: span.into(),
            src: src().named_source(),
        }
        .into());
    }

    Ok(nest(squash(tokens)))
}

/// Drop the whitespace tokens of the line just ended if it was standalone.
fn strip_space(tokens: &mut Vec<Token>, spaces: &mut Vec<usize>, standalone: bool) {
    if standalone {
        while let Some(idx) = spaces.pop() {
            tokens.remove(idx);
        }
    } else {
        spaces.clear();
    }
}

/// Coalesce runs of text tokens into one token.
pub(crate) fn squash(tokens: Vec<Token>) -> Vec<Token> {
    let mut squashed: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let (TokenKind::Text(text), Some(last)) = (&token.kind, squashed.last_mut()) {
            if let TokenKind::Text(last_text) = &mut last.kind {
                last_text.push_str(text);
                last.span.end = token.span.end;
                continue;
            }
        }
        squashed.push(token);
    }
    squashed
}

/// Nest a flat, balanced token stream into a tree. Close tags are consumed:
/// each section records where its close tag starts.
pub(crate) fn nest(tokens: Vec<Token>) -> Vec<Token> {
    let mut tree: Vec<Token> = Vec::new();
    let mut open: Vec<Token> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Section(_) | TokenKind::InvertedSection(_) => open.push(token),
            TokenKind::SectionClose(_) => {
                let Some(mut section) = open.pop() else {
                    continue;
                };
                if let Some(body) = section.section_mut() {
                    body.close = token.span.start;
                }
                collector(&mut open, &mut tree).push(section);
            }
            _ => collector(&mut open, &mut tree).push(token),
        }
    }

    // Only reachable with unbalanced input, which `parse` rejects.
    while let Some(section) = open.pop() {
        collector(&mut open, &mut tree).push(section);
    }

    tree
}

fn collector<'a>(open: &'a mut [Token], tree: &'a mut Vec<Token>) -> &'a mut Vec<Token> {
    match open.last_mut().and_then(Token::section_mut) {
        Some(section) => &mut section.children,
        None => tree,
    }
}

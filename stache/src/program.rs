//! Token trees compiled into render programs.
//!
//! A program is a list of closures, one per top-level token. Section tokens
//! compile their body into a nested program once, at compile time, and every
//! iteration of the section reuses it.

use std::fmt;
use std::sync::Arc;

use crate::context::{Frame, LambdaScope};
use crate::engine::Engine;
use crate::error::TemplateError;
use crate::escape::push_escaped;
use crate::token::{Token, TokenKind};
use crate::tracing_macros::trace;
use crate::value::{Lambda, Value};

type Node = Box<dyn Fn(&Engine, &Frame<'_>, &mut String) -> Result<(), TemplateError>>;

fn node<F>(f: F) -> Node
where
    F: Fn(&Engine, &Frame<'_>, &mut String) -> Result<(), TemplateError> + 'static,
{
    Box::new(f)
}

/// A compiled template body
pub(crate) struct Program {
    nodes: Vec<Node>,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// How a section treats the value its name resolves to
enum Resolved {
    Sequence(Arc<Vec<Value>>),
    Lambda(Lambda),
    Object(Value),
    Scalar(bool),
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Resolved::Sequence(items),
            Value::Lambda(lambda) => Resolved::Lambda(lambda),
            Value::Object(_) => Resolved::Object(value),
            scalar => Resolved::Scalar(scalar.is_truthy()),
        }
    }
}

impl Program {
    /// Compile a nested token tree. `source` is the template text the
    /// token spans point into.
    pub(crate) fn compile(tokens: &[Token], source: &str) -> Self {
        let nodes = tokens
            .iter()
            .filter_map(|token| compile_token(token, source))
            .collect();
        Self { nodes }
    }

    pub(crate) fn render(
        &self,
        engine: &Engine,
        frame: &Frame<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        for node in &self.nodes {
            node(engine, frame, out)?;
        }
        Ok(())
    }
}

fn compile_token(token: &Token, source: &str) -> Option<Node> {
    let compiled = match &token.kind {
        TokenKind::Text(text) => {
            let text = text.clone();
            node(move |_, _, out| {
                out.push_str(&text);
                Ok(())
            })
        }
        TokenKind::Name(name) => {
            let name = name.clone();
            node(move |engine, frame, out| {
                let value = interpolate(engine, frame, &name);
                push_escaped(out, &value.to_string());
                Ok(())
            })
        }
        TokenKind::UnescapedName(name) => {
            let name = name.clone();
            node(move |engine, frame, out| {
                let value = interpolate(engine, frame, &name);
                out.push_str(&value.to_string());
                Ok(())
            })
        }
        TokenKind::Section(section) => {
            let name = section.name.clone();
            let body = Program::compile(&section.children, source);
            let text = token.section_text(source).unwrap_or_default().to_owned();
            node(move |engine, frame, out| {
                match Resolved::from(frame.lookup(&name)) {
                    Resolved::Sequence(items) => {
                        trace!(section = %name, len = items.len(), "iterating section");
                        for item in items.iter() {
                            let child = frame.push(item.clone());
                            body.render(engine, &child, out)?;
                        }
                    }
                    Resolved::Object(view) => {
                        let child = frame.push(view);
                        body.render(engine, &child, out)?;
                    }
                    Resolved::Lambda(lambda) => {
                        let scope = LambdaScope::new(frame, engine, Some(&text));
                        // Null displays as the empty string.
                        out.push_str(&lambda.call(&scope).to_string());
                    }
                    Resolved::Scalar(true) => body.render(engine, frame, out)?,
                    Resolved::Scalar(false) => {}
                }
                Ok(())
            })
        }
        TokenKind::InvertedSection(section) => {
            let name = section.name.clone();
            let body = Program::compile(&section.children, source);
            node(move |engine, frame, out| {
                let empty = match frame.lookup(&name) {
                    Value::Array(items) => items.is_empty(),
                    value => !value.is_truthy(),
                };
                if empty {
                    body.render(engine, frame, out)?;
                }
                Ok(())
            })
        }
        TokenKind::Partial(name) => {
            let name = name.clone();
            node(move |engine, frame, out| engine.render_partial(&name, frame, out))
        }
        TokenKind::SectionClose(_) | TokenKind::DelimiterChange(_) | TokenKind::Comment(_) => {
            return None;
        }
    };
    Some(compiled)
}

/// Resolve a name for interpolation, calling it if it is a lambda.
fn interpolate(engine: &Engine, frame: &Frame<'_>, name: &str) -> Value {
    match frame.lookup(name) {
        Value::Lambda(lambda) => lambda.call(&LambdaScope::new(frame, engine, None)),
        value => value,
    }
}

#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Logic-less `{{mustache}}` templates.
//!
//! Templates are parsed once into a token tree, compiled into a render
//! program and cached by their text and delimiters. Rendering walks a chain
//! of context frames and never fails on missing data.
//!
//! # Syntax Overview
//!
//! ```text
//! {{name}}                 - Interpolation, HTML-escaped
//! {{{name}}} {{&name}}     - Interpolation, unescaped
//! {{#name}}...{{/name}}    - Section: loop, object scope, lambda or condition
//! {{^name}}...{{/name}}    - Inverted section
//! {{>name}}                - Partial
//! {{! comment }}           - Comment
//! {{=<% %>=}}              - Delimiter change
//! ```
//!
//! # Example
//!
//! ```
//! use stache::{Engine, Value};
//!
//! let engine = Engine::new();
//! let template = engine.compile("{{#items}}<li>{{.}}</li>{{/items}}")?;
//! let view = Value::object([("items", Value::array(["a", "b"]))]);
//! assert_eq!(template.render(&view)?, "<li>a</li><li>b</li>");
//! # Ok::<(), stache::TemplateError>(())
//! ```

mod context;
mod engine;
mod error;
mod escape;
mod parse;
mod program;
mod scanner;
mod token;
mod tracing_macros;
mod value;

pub use context::{Frame, LambdaScope};
pub use engine::{
    Engine, PartialLoader, Partials, Template, clear_cache, compile, default_engine, render,
};
pub use error::{
    MalformedDelimiterError, TemplateError, TemplateSource, UnclosedSectionError,
    UnclosedTagError, UnmatchedSectionError,
};
pub use escape::escape_html;
pub use parse::{parse, parse_with_tags};
pub use token::{Section, Tags, Token, TokenKind};
pub use value::{Lambda, LambdaFn, Value};

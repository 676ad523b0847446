//! Template engine: compile caches, partial registry and the default engine.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::context::Frame;
use crate::error::TemplateError;
use crate::parse::parse_named;
use crate::program::Program;
use crate::token::Tags;
use crate::tracing_macros::{debug, trace};
use crate::value::Value;

/// Resolves a partial name to its template text on first use.
pub type PartialLoader = dyn Fn(&str) -> Option<String>;

/// Partials supplied to a render call.
#[derive(Clone)]
pub enum Partials {
    /// Named partial templates, compiled and registered before rendering
    Map(IndexMap<String, String>),
    /// A resolver installed on the engine; partials it returns are compiled
    /// and registered when first referenced
    Loader(Rc<PartialLoader>),
}

impl Partials {
    /// Partials from name/template pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Partials::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Partials resolved lazily by `f`.
    pub fn loader(f: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Partials::Loader(Rc::new(f))
    }
}

impl fmt::Debug for Partials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partials::Map(map) => f.debug_tuple("Map").field(&map.keys()).finish(),
            Partials::Loader(_) => f.write_str("Loader(..)"),
        }
    }
}

#[derive(Default)]
struct EngineInner {
    /// Compiled templates by delimiter tags, then by source text
    templates: RefCell<HashMap<Tags, HashMap<String, Rc<Program>>>>,
    partials: RefCell<HashMap<String, Rc<Program>>>,
    loader: RefCell<Option<Rc<PartialLoader>>>,
}

/// A template engine.
///
/// Compiling the same text with the same tags twice returns the cached
/// program. Engines are cheap to clone; clones share their caches.
#[derive(Clone, Default)]
pub struct Engine(Rc<EngineInner>);

impl Engine {
    /// An engine with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile with the default `{{ }}` delimiters.
    pub fn compile(&self, template: &str) -> Result<Template, TemplateError> {
        self.compile_with_tags(template, &Tags::default())
    }

    /// Compile starting with the given delimiters.
    pub fn compile_with_tags(
        &self,
        template: &str,
        tags: &Tags,
    ) -> Result<Template, TemplateError> {
        let program = self.program("template", template, tags)?;
        Ok(Template {
            engine: self.clone(),
            program,
        })
    }

    /// Compile `template` and register it as the partial `name`.
    pub fn compile_partial(&self, name: &str, template: &str) -> Result<Template, TemplateError> {
        self.compile_partial_with_tags(name, template, &Tags::default())
    }

    /// [`Engine::compile_partial`] with explicit delimiters.
    pub fn compile_partial_with_tags(
        &self,
        name: &str,
        template: &str,
        tags: &Tags,
    ) -> Result<Template, TemplateError> {
        let program = self.program(name, template, tags)?;
        self.0
            .partials
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&program));
        debug!(partial = name, "registered partial");
        Ok(Template {
            engine: self.clone(),
            program,
        })
    }

    /// Install a resolver for partials not registered yet.
    pub fn set_partial_loader(&self, loader: impl Fn(&str) -> Option<String> + 'static) {
        *self.0.loader.borrow_mut() = Some(Rc::new(loader));
    }

    /// Compile (or fetch from cache) and render in one step.
    pub fn render(&self, template: &str, view: &Value) -> Result<String, TemplateError> {
        self.compile(template)?.render(view)
    }

    /// [`Engine::render`] with partials.
    pub fn render_with(
        &self,
        template: &str,
        view: &Value,
        partials: &Partials,
    ) -> Result<String, TemplateError> {
        self.compile(template)?.render_with(view, partials)
    }

    /// Drop every compiled template and registered partial.
    pub fn clear_cache(&self) {
        self.0.templates.borrow_mut().clear();
        self.0.partials.borrow_mut().clear();
        debug!("template caches cleared");
    }

    /// Number of compiled templates in the cache
    pub fn cached_templates(&self) -> usize {
        self.0.templates.borrow().values().map(HashMap::len).sum()
    }

    fn program(&self, name: &str, template: &str, tags: &Tags) -> Result<Rc<Program>, TemplateError> {
        if let Some(program) = self
            .0
            .templates
            .borrow()
            .get(tags)
            .and_then(|by_text| by_text.get(template))
        {
            trace!(name, "template cache hit");
            return Ok(Rc::clone(program));
        }

        let tokens = parse_named(name, template, tags)?;
        let program = Rc::new(Program::compile(&tokens, template));
        self.0
            .templates
            .borrow_mut()
            .entry(tags.clone())
            .or_default()
            .insert(template.to_string(), Rc::clone(&program));
        trace!(name, tokens = tokens.len(), "compiled template");
        Ok(program)
    }

    fn install(&self, partials: &Partials) -> Result<(), TemplateError> {
        match partials {
            Partials::Map(map) => {
                for (name, template) in map {
                    self.compile_partial(name, template)?;
                }
            }
            Partials::Loader(loader) => {
                *self.0.loader.borrow_mut() = Some(Rc::clone(loader));
            }
        }
        Ok(())
    }

    pub(crate) fn render_partial(
        &self,
        name: &str,
        frame: &Frame<'_>,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        let registered = self.0.partials.borrow().get(name).cloned();
        let program = match registered {
            Some(program) => Some(program),
            None => self.load_partial(name)?,
        };
        match program {
            Some(program) => program.render(self, frame, out),
            None => {
                trace!(partial = name, "unknown partial");
                Ok(())
            }
        }
    }

    fn load_partial(&self, name: &str) -> Result<Option<Rc<Program>>, TemplateError> {
        let loader = self.0.loader.borrow().clone();
        let Some(template) = loader.and_then(|load| load(name)) else {
            return Ok(None);
        };
        let partial = self.compile_partial(name, &template)?;
        Ok(Some(partial.program))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("templates", &self.cached_templates())
            .field("partials", &self.0.partials.borrow().len())
            .field("loader", &self.0.loader.borrow().is_some())
            .finish()
    }
}

/// A compiled template, bound to the engine that compiled it.
#[derive(Clone)]
pub struct Template {
    engine: Engine,
    program: Rc<Program>,
}

impl Template {
    /// Render against `view` as the root context.
    pub fn render(&self, view: &Value) -> Result<String, TemplateError> {
        self.render_in(&Frame::root(view.clone()))
    }

    /// Register `partials` on the engine, then render.
    pub fn render_with(&self, view: &Value, partials: &Partials) -> Result<String, TemplateError> {
        self.engine.install(partials)?;
        self.render(view)
    }

    /// Render against an existing context frame.
    pub fn render_in(&self, frame: &Frame<'_>) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.program.render(&self.engine, frame, &mut out)?;
        Ok(out)
    }

    /// The engine that compiled this template.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

thread_local! {
    static DEFAULT_ENGINE: Engine = Engine::new();
}

/// The engine behind [`compile`], [`render`] and [`clear_cache`], one per
/// thread.
pub fn default_engine() -> Engine {
    DEFAULT_ENGINE.with(Engine::clone)
}

/// Compile with the default engine.
pub fn compile(template: &str) -> Result<Template, TemplateError> {
    default_engine().compile(template)
}

/// Render with the default engine.
pub fn render(template: &str, view: &Value) -> Result<String, TemplateError> {
    default_engine().render(template, view)
}

/// Clear the default engine's caches.
pub fn clear_cache() {
    default_engine().clear_cache();
}

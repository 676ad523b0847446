//! Render context: a chain of view frames.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::engine::Engine;
use crate::error::TemplateError;
use crate::value::Value;

/// One frame of the render context.
///
/// A frame wraps a view value and points at the frame it was pushed from.
/// Name lookups walk the chain outward and are memoized per frame; frames are
/// never mutated once created, so the memo stays valid for their lifetime.
pub struct Frame<'p> {
    view: Value,
    parent: Option<&'p Frame<'p>>,
    cache: RefCell<HashMap<String, Value>>,
}

impl Frame<'static> {
    /// A root frame with no parent.
    pub fn root(view: Value) -> Self {
        Self {
            view,
            parent: None,
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl<'p> Frame<'p> {
    /// A child frame whose lookups fall back to `self`.
    pub fn push(&self, view: Value) -> Frame<'_> {
        Frame {
            view,
            parent: Some(self),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The view this frame wraps.
    pub fn view(&self) -> &Value {
        &self.view
    }

    /// The frame this one was pushed from.
    pub fn parent(&self) -> Option<&Frame<'p>> {
        self.parent
    }

    /// Resolve a name or dotted path.
    ///
    /// `.` is the current view. Otherwise each frame is tried innermost
    /// first, and the first non-null result wins. Misses resolve to `Null`.
    pub fn lookup(&self, name: &str) -> Value {
        if let Some(value) = self.cache.borrow().get(name) {
            return value.clone();
        }

        let value = if name == "." {
            self.view.clone()
        } else {
            let mut value = Value::Null;
            let mut frame = Some(self);
            while let Some(current) = frame {
                value = resolve_in(&current.view, name);
                if !value.is_null() {
                    break;
                }
                frame = current.parent;
            }
            value
        };

        self.cache
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        value
    }
}

/// Walk a dotted path inside one view. A falsy value part way down ends
/// the walk and is the result.
fn resolve_in(view: &Value, name: &str) -> Value {
    // A leading dot is not a path separator.
    if name.find('.').is_some_and(|idx| idx > 0) {
        let mut value = view.clone();
        for part in name.split('.') {
            if !value.is_truthy() {
                break;
            }
            value = value.get(part);
        }
        value
    } else {
        view.get(name)
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("view", &self.view)
            .field("depth", &self.depth())
            .finish()
    }
}

impl Frame<'_> {
    fn depth(&self) -> usize {
        std::iter::successors(self.parent, |f| f.parent).count()
    }
}

/// What a [`Lambda`](crate::Lambda) sees when it is called.
pub struct LambdaScope<'a> {
    frame: &'a Frame<'a>,
    engine: &'a Engine,
    section: Option<&'a str>,
}

impl<'a> LambdaScope<'a> {
    pub(crate) fn new(frame: &'a Frame<'a>, engine: &'a Engine, section: Option<&'a str>) -> Self {
        Self {
            frame,
            engine,
            section,
        }
    }

    /// The view of the innermost frame.
    pub fn view(&self) -> &Value {
        self.frame.view()
    }

    /// Raw template text between the section tags, when called as a section.
    pub fn section_text(&self) -> Option<&str> {
        self.section
    }

    /// Resolve a name against the current context.
    pub fn lookup(&self, name: &str) -> Value {
        self.frame.lookup(name)
    }

    /// Render a template string against the current context.
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        let compiled = self.engine.compile(template)?;
        compiled.render_in(self.frame)
    }
}

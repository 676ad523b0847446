//! Row views: how one row becomes markup.

use stache::{Engine, Template, Value};

use crate::error::TableError;

/// Renders one row. `index` is the row's 1-based position in the visible
/// set, not its offset in the table.
pub trait RowView {
    /// Markup for `row`.
    fn render_row(&self, row: &Value, index: usize) -> String;
}

impl<F> RowView for F
where
    F: Fn(&Value, usize) -> String,
{
    fn render_row(&self, row: &Value, index: usize) -> String {
        self(row, index)
    }
}

/// A compiled template used as a row view.
///
/// The template sees `record` (the row) and `index` (its 1-based position).
#[derive(Debug, Clone)]
pub struct TemplateView {
    template: Template,
}

impl TemplateView {
    /// Wrap an already compiled template.
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    /// Compile `source` with `engine`. Whitespace is kept as written;
    /// standalone section lines are stripped as in any template.
    pub fn compile(engine: &Engine, source: &str) -> Result<Self, TableError> {
        Ok(Self::new(engine.compile(source)?))
    }
}

impl RowView for TemplateView {
    fn render_row(&self, row: &Value, index: usize) -> String {
        let view = Value::object([("record", row.clone()), ("index", Value::from(index))]);
        match self.template.render(&view) {
            Ok(html) => html,
            Err(err) => {
                tracing::warn!(index, error = %err, "row template failed to render");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_view_exposes_record_and_index() {
        let view =
            TemplateView::compile(&Engine::new(), "<tr><td>{{index}}</td><td>{{record.name}}</td></tr>")
                .unwrap();
        let row = Value::object([("name", "Heat & Dust")]);
        assert_eq!(
            view.render_row(&row, 3),
            "<tr><td>3</td><td>Heat &amp; Dust</td></tr>"
        );
    }

    #[test]
    fn template_whitespace_is_kept() {
        let engine = Engine::new();
        let view = TemplateView::compile(&engine, " <li>{{record}}</li>\n").unwrap();
        assert_eq!(view.render_row(&Value::from("x"), 1), " <li>x</li>\n");

        let view = TemplateView::compile(&engine, "{{#record}}\n<li>{{.}}</li>\n{{/record}}\n").unwrap();
        assert_eq!(view.render_row(&Value::array([1, 2]), 1), "<li>1</li>\n<li>2</li>\n");
    }

    #[test]
    fn closures_are_views() {
        let view = |row: &Value, index: usize| format!("{index}:{}", row.get("name"));
        assert_eq!(view.render_row(&Value::object([("name", "x")]), 1), "1:x");
    }
}

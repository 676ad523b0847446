//! Per-row search strings.

use stache::Value;

/// Which parts of a row make up its search text. Fixed by the first row
/// the table ever sees.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TextSource {
    /// Named fields; for array rows the names are positions
    Fields(Vec<String>),
    /// Every element of an array row
    Elements,
    /// The row's own text, for scalar rows
    Whole,
}

impl TextSource {
    fn for_row(row: &Value, fields: Option<&[String]>) -> Self {
        if let Some(fields) = fields {
            return TextSource::Fields(fields.to_vec());
        }
        match row {
            Value::Object(map) => TextSource::Fields(map.keys().cloned().collect()),
            Value::Array(_) => TextSource::Elements,
            _ => TextSource::Whole,
        }
    }

    fn text(&self, row: &Value) -> String {
        let text = match self {
            TextSource::Fields(fields) => fields
                .iter()
                .map(|field| row.get(field).to_string())
                .collect::<Vec<_>>()
                .join(" "),
            TextSource::Elements => row
                .as_array()
                .unwrap_or_default()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            TextSource::Whole => row.to_string(),
        };
        text.to_uppercase()
    }
}

/// Uppercased search text, one entry per row, in insertion order
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    source: Option<TextSource>,
    entries: Vec<String>,
}

impl SearchIndex {
    /// Index a batch of rows appended to the table.
    pub fn extend(&mut self, rows: &[Value], fields: Option<&[String]>) {
        let Some(first) = rows.first() else {
            return;
        };
        let source = self
            .source
            .get_or_insert_with(|| TextSource::for_row(first, fields));
        self.entries.extend(rows.iter().map(|row| source.text(row)));
    }

    /// Search text of row `offset`.
    pub fn entry(&self, offset: usize) -> Option<&str> {
        self.entries.get(offset).map(String::as_str)
    }

    /// Does row `offset` contain `query`? The query must already be
    /// uppercased.
    pub fn matches(&self, offset: usize, query: &str) -> bool {
        self.entry(offset).is_some_and(|text| text.contains(query))
    }

    /// Number of indexed rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the index empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Table configuration.
//!
//! Options are plain data so a dashboard can keep them in a JSON file;
//! the view and the callbacks are attached in code through
//! [`StreamTable::builder`](crate::StreamTable::builder).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TableError;
use crate::sort::SortSpec;

const DEFAULT_STREAM_AFTER: Duration = Duration::from_secs(2);
const DEFAULT_PER_PAGE: usize = 10;

/// Options of a [`StreamTable`](crate::StreamTable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableOptions {
    /// Fields (object keys, or array positions) that make up a row's search
    /// text. Defaults to every key of the first row added.
    pub fields: Option<Vec<String>>,

    /// Page size and pagination markup
    pub pagination: PaginationOptions,

    /// Seconds between two fetches of the stream loader
    pub stream_after: f64,

    /// Rows requested per fetch. Without it the loader never fetches.
    pub fetch_data_limit: Option<usize>,

    /// Sortable columns as `field[:asc|desc[:string|number]]`. The first one
    /// is applied when the table is built.
    pub sorting: Vec<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            fields: None,
            pagination: PaginationOptions::default(),
            stream_after: DEFAULT_STREAM_AFTER.as_secs_f64(),
            fetch_data_limit: None,
            sorting: Vec::new(),
        }
    }
}

/// Pagination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationOptions {
    /// Number of page links shown at once
    pub span: usize,
    /// Label of the previous-page link (HTML)
    pub prev_text: String,
    /// Label of the next-page link (HTML)
    pub next_text: String,
    /// Whether to offer the page-size selector
    pub per_page_select: bool,
    /// Page sizes offered by the selector
    pub per_page_options: Vec<usize>,
    /// Initial page size; the first of `per_page_options` when unset
    pub per_page: Option<usize>,
    /// Extra class on the `<ul>` of page links
    pub ul_class: Option<String>,
    /// Extra class on the page-size `<select>`
    pub per_page_class: Option<String>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            span: 5,
            prev_text: "&laquo;".to_string(),
            next_text: "&raquo;".to_string(),
            per_page_select: true,
            per_page_options: vec![10, 25, 50],
            per_page: None,
            ul_class: None,
            per_page_class: None,
        }
    }
}

impl PaginationOptions {
    /// The page size a new table starts with.
    pub fn initial_per_page(&self) -> usize {
        self.per_page
            .or_else(|| self.per_page_options.first().copied())
            .unwrap_or(DEFAULT_PER_PAGE)
    }
}

impl TableOptions {
    /// Decode options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let options: Self = serde_json::from_str(json).map_err(TableError::Options)?;
        options.validate()?;
        Ok(options)
    }

    /// Check page sizes and sort declarations.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.pagination.initial_per_page() == 0 || self.pagination.per_page_options.contains(&0)
        {
            return Err(TableError::ZeroPageSize);
        }
        self.sort_columns()?;
        Ok(())
    }

    /// Parsed `sorting` declarations, in declaration order.
    pub fn sort_columns(&self) -> Result<Vec<SortSpec>, TableError> {
        self.sorting.iter().map(|decl| decl.parse()).collect()
    }

    /// Delay between fetches. Negative or non-finite values fall back to two
    /// seconds.
    pub fn stream_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.stream_after).unwrap_or(DEFAULT_STREAM_AFTER)
    }
}

//! Table configuration and fetch errors.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or driving a table
#[derive(Error, Debug, Diagnostic)]
pub enum TableError {
    /// No row view was supplied to the builder
    #[error("Add a view function in the table options")]
    #[diagnostic(
        code(streamtable::config::missing_view),
        help("Call `view` or `template_view` on the builder before `build`")
    )]
    MissingView,

    /// A sort declaration that is not `field[:dir[:type]]`
    #[error("Invalid sort declaration `{declaration}`")]
    #[diagnostic(
        code(streamtable::config::sort_declaration),
        help("Write `field:asc:number`; the direction is `asc` or `desc`, the type `string` or `number`")
    )]
    SortDeclaration {
        /// The declaration as written
        declaration: String,
    },

    /// Sorting requested on a column that was never declared sortable
    #[error("Column `{field}` is not sortable")]
    #[diagnostic(code(streamtable::sort::unknown_column))]
    UnknownSortColumn {
        /// The requested column
        field: String,
    },

    /// A page size of zero
    #[error("Page size must be at least 1")]
    #[diagnostic(code(streamtable::config::zero_page_size))]
    ZeroPageSize,

    /// Options that could not be decoded
    #[error("Invalid table options")]
    #[diagnostic(code(streamtable::config::options))]
    Options(#[source] serde_json::Error),

    /// The row template failed to compile
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] stache::TemplateError),
}

/// Errors from a [`RowSource`](crate::RowSource)
#[derive(Error, Debug, Diagnostic)]
pub enum FetchError {
    /// Reading the backing file failed
    #[error("Failed to read rows from {}", path.display())]
    #[diagnostic(code(streamtable::fetch::io))]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The payload was not valid JSON
    #[error("Failed to decode rows")]
    #[diagnostic(code(streamtable::fetch::decode))]
    Decode(#[from] serde_json::Error),

    /// The payload was JSON, but not an array of rows
    #[error("Expected a JSON array of rows, found {found}")]
    #[diagnostic(code(streamtable::fetch::not_an_array))]
    NotAnArray {
        /// Kind of JSON value found instead
        found: &'static str,
    },

    /// The source reported a failure of its own
    #[error("{0}")]
    #[diagnostic(code(streamtable::fetch::source))]
    Source(String),
}

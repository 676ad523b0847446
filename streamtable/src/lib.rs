#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! A streaming, paginated, searchable and sortable table.
//!
//! [`StreamTable`] owns the rows and every structure derived from them;
//! a [`StreamLoader`] fills it chunk by chunk from a [`RowSource`]. Rows are
//! [`stache::Value`]s and are usually rendered through a [`TemplateView`].
//!
//! ```
//! use stache::{Engine, Value};
//! use streamtable::{PageTarget, StreamTable, TableOptions};
//!
//! let mut options = TableOptions::default();
//! options.pagination.per_page = Some(2);
//!
//! let mut table = StreamTable::builder()
//!     .options(options)
//!     .template_view(&Engine::new(), "<li>{{index}}. {{record.name}}</li>")?
//!     .rows(["Heat", "Ran", "Alien"].map(|name| Value::object([("name", name)])))
//!     .build()?;
//!
//! assert_eq!(table.rendered(), "<li>1. Heat</li><li>2. Ran</li>");
//! table.paginate(PageTarget::Next);
//! assert_eq!(table.rendered(), "<li>3. Alien</li>");
//! # Ok::<(), streamtable::TableError>(())
//! ```

mod error;
mod index;
mod loader;
mod options;
mod pagination;
mod sort;
mod source;
mod table;
mod view;

pub use error::{FetchError, TableError};
pub use index::SearchIndex;
pub use loader::{FetchQuery, RowSource, StreamHandle, StreamLoader, Tick};
pub use options::{PaginationOptions, TableOptions};
pub use pagination::{
    PageLink, PageTarget, PaginationSummary, links_markup, page_count, page_links,
    per_page_select_markup, search_box_markup,
};
pub use sort::{Direction, SortSpec, ValueType};
pub use source::{FnSource, InMemorySource, JsonFileSource, decode_rows, from_fn};
pub use table::{AfterAdd, SharedTable, StreamTable, StreamTableBuilder};
pub use view::{RowView, TemplateView};

//! The table state engine.
//!
//! A table owns every row it has been given, a search index with one entry
//! per row, and (when sortable columns are declared) an order index of row
//! offsets. Searching narrows the rows to a filtered set; pagination slices
//! the visible set; the view turns the slice into markup.

use indexmap::IndexMap;
use stache::{Engine, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::error::TableError;
use crate::index::SearchIndex;
use crate::options::TableOptions;
use crate::pagination::{
    PageLink, PageTarget, PaginationSummary, links_markup, page_count, page_links,
    per_page_select_markup, search_box_markup,
};
use crate::sort::SortSpec;
use crate::view::{RowView, TemplateView};

/// A table shared between its owner and a [`StreamLoader`](crate::StreamLoader)
///
/// Callbacks run while the table is mutably borrowed: a callback must not
/// borrow the `SharedTable` it belongs to. Use the [`AfterAdd`] event to
/// stop streaming from inside `after_add`. The loader skips a tick when it
/// finds the table borrowed.
pub type SharedTable = Rc<RefCell<StreamTable>>;

type PaginationCallback = Box<dyn FnMut(&PaginationSummary)>;
type BeforeAddCallback = Box<dyn FnMut(&[Value]) -> Option<Vec<Value>>>;
type AfterAddCallback = Box<dyn FnMut(&mut AfterAdd)>;

#[derive(Default)]
struct Callbacks {
    pagination: Option<PaginationCallback>,
    before_add: Option<BeforeAddCallback>,
    after_add: Option<AfterAddCallback>,
}

/// What the `after_add` callback sees once a batch has been appended
#[derive(Debug)]
pub struct AfterAdd {
    /// Rows appended by this batch
    pub added: usize,
    /// Rows in the table
    pub total_rows: usize,
    /// Rows matching the current search
    pub visible_rows: usize,
    stop: bool,
}

impl AfterAdd {
    /// Ask the stream loader to stop fetching.
    pub fn stop_streaming(&mut self) {
        self.stop = true;
    }
}

/// The result of a search when sort columns are declared: row offsets in
/// the current sort order. Otherwise: the matching rows themselves.
#[derive(Debug, Clone)]
enum Filtered {
    Offsets(Vec<usize>),
    Rows(Vec<Value>),
}

impl Filtered {
    fn len(&self) -> usize {
        match self {
            Filtered::Offsets(offsets) => offsets.len(),
            Filtered::Rows(rows) => rows.len(),
        }
    }
}

#[derive(Debug)]
struct Sorting {
    /// Declared columns; each remembers the direction its next toggle uses
    columns: IndexMap<String, SortSpec>,
    /// Row offsets in sort order
    order: Vec<usize>,
    active: Option<SortSpec>,
}

/// A paginated, searchable, sortable table.
///
/// Rows only ever grow. Every mutation recomputes the derived state: the
/// filtered set, the order, the rendered page and the page links.
pub struct StreamTable {
    options: TableOptions,
    view: Box<dyn RowView>,
    callbacks: Callbacks,
    rows: Vec<Value>,
    search_index: SearchIndex,
    sorting: Option<Sorting>,
    query: String,
    filtered: Filtered,
    current_page: usize,
    per_page: usize,
    rendered: String,
    links: Vec<PageLink>,
    stop_streaming: bool,
}

impl fmt::Debug for StreamTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTable")
            .field("rows", &self.rows.len())
            .field("query", &self.query)
            .field("visible", &self.visible_len())
            .field("current_page", &self.current_page)
            .field("per_page", &self.per_page)
            .field("active_sort", &self.active_sort())
            .field("stop_streaming", &self.stop_streaming)
            .finish_non_exhaustive()
    }
}

/// Builder for [`StreamTable`]
#[derive(Default)]
pub struct StreamTableBuilder {
    options: TableOptions,
    view: Option<Box<dyn RowView>>,
    callbacks: Callbacks,
    rows: Vec<Value>,
}

impl StreamTableBuilder {
    /// Replace the options.
    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Render rows with `view`.
    pub fn view(mut self, view: impl RowView + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    /// Render rows with a template compiled by `engine`. The template text is
    /// used as written, surrounding whitespace included. See [`TemplateView`].
    pub fn template_view(self, engine: &Engine, template: &str) -> Result<Self, TableError> {
        Ok(self.view(TemplateView::compile(engine, template)?))
    }

    /// Called with the summary whenever the visible page changes. Runs while
    /// the table is borrowed; see [`SharedTable`].
    pub fn on_pagination(mut self, f: impl FnMut(&PaginationSummary) + 'static) -> Self {
        self.callbacks.pagination = Some(Box::new(f));
        self
    }

    /// Called with each incoming batch; a returned batch replaces it.
    pub fn before_add(mut self, f: impl FnMut(&[Value]) -> Option<Vec<Value>> + 'static) -> Self {
        self.callbacks.before_add = Some(Box::new(f));
        self
    }

    /// Called after a non-empty batch has been appended. Runs while the
    /// table is borrowed; see [`SharedTable`].
    pub fn after_add(mut self, f: impl FnMut(&mut AfterAdd) + 'static) -> Self {
        self.callbacks.after_add = Some(Box::new(f));
        self
    }

    /// Rows the table starts with.
    pub fn rows(mut self, rows: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.rows = rows.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the options and build the table. The first declared sort
    /// column is applied, then the initial rows are added.
    pub fn build(self) -> Result<StreamTable, TableError> {
        self.options.validate()?;
        let view = self.view.ok_or(TableError::MissingView)?;
        let columns: IndexMap<String, SortSpec> = self
            .options
            .sort_columns()?
            .into_iter()
            .map(|spec| (spec.field.clone(), spec))
            .collect();
        let first_column = columns.keys().next().cloned();
        let sorting = (!columns.is_empty()).then(|| Sorting {
            columns,
            order: Vec::new(),
            active: None,
        });

        let mut table = StreamTable {
            per_page: self.options.pagination.initial_per_page(),
            filtered: if sorting.is_some() {
                Filtered::Offsets(Vec::new())
            } else {
                Filtered::Rows(Vec::new())
            },
            options: self.options,
            view,
            callbacks: self.callbacks,
            rows: Vec::new(),
            search_index: SearchIndex::default(),
            sorting,
            query: String::new(),
            current_page: 0,
            rendered: String::new(),
            links: Vec::new(),
            stop_streaming: false,
        };
        table.refresh_links();

        if let Some(field) = first_column {
            table.toggle_sort(&field)?;
        }
        if !self.rows.is_empty() {
            table.add_rows(self.rows);
        }
        Ok(table)
    }
}

impl StreamTable {
    /// Start building a table.
    pub fn builder() -> StreamTableBuilder {
        StreamTableBuilder::default()
    }

    /// Wrap the table for sharing with a stream loader.
    pub fn into_shared(self) -> SharedTable {
        Rc::new(RefCell::new(self))
    }

    /// Append a batch of rows and return how many were appended.
    ///
    /// `before_add` may replace the batch first. An empty batch changes
    /// nothing and fires no callbacks.
    pub fn add_rows(&mut self, batch: Vec<Value>) -> usize {
        let batch = match self.callbacks.before_add.as_mut() {
            Some(before_add) => before_add(&batch).unwrap_or(batch),
            None => batch,
        };
        if batch.is_empty() {
            return 0;
        }

        let added = batch.len();
        let start = self.rows.len();
        self.search_index
            .extend(&batch, self.options.fields.as_deref());
        self.rows.extend(batch);
        if let Some(sorting) = &mut self.sorting {
            sorting.order.extend(start..self.rows.len());
        }
        debug!(added, total = self.rows.len(), "rows added");

        if !self.query.is_empty() {
            self.filter();
        }
        if let Some(active) = self.active_sort().cloned() {
            self.apply_sort(&active);
        }

        self.render_page(self.current_page);
        self.refresh_links();

        let mut event = AfterAdd {
            added,
            total_rows: self.rows.len(),
            visible_rows: self.visible_len(),
            stop: false,
        };
        if let Some(after_add) = self.callbacks.after_add.as_mut() {
            after_add(&mut event);
            if event.stop {
                self.stop_streaming();
            }
        }
        self.fire_pagination();
        added
    }

    /// Filter the rows by `text`, case-insensitively. Returns `false` when
    /// the trimmed text equals the current search.
    pub fn search(&mut self, text: &str) -> bool {
        let query = text.trim();
        if query == self.query {
            return false;
        }
        self.query = query.to_string();

        if self.query.is_empty() {
            self.clear_filter();
        } else {
            self.filter();
        }
        trace!(query = %self.query, visible = self.visible_len(), "search");

        self.current_page = 0;
        self.render_page(0);
        self.refresh_links();
        self.fire_pagination();
        true
    }

    /// Sort by `spec` and re-render the current page. Returns `false` when no
    /// sort columns were declared.
    pub fn sort(&mut self, spec: SortSpec) -> bool {
        let Some(sorting) = &mut self.sorting else {
            return false;
        };
        sorting.active = Some(spec.clone());
        self.apply_sort(&spec);
        self.render_page(self.current_page);
        true
    }

    /// Sort by a declared column in its current direction, then flip the
    /// direction for the next call.
    pub fn toggle_sort(&mut self, field: &str) -> Result<SortSpec, TableError> {
        let spec = self
            .sorting
            .as_mut()
            .and_then(|sorting| sorting.columns.get_mut(field))
            .map(|column| {
                let spec = column.clone();
                column.direction = column.direction.toggled();
                spec
            })
            .ok_or_else(|| TableError::UnknownSortColumn {
                field: field.to_string(),
            })?;
        self.sort(spec.clone());
        Ok(spec)
    }

    /// Move to another page. Returns the new zero-based page, or `None` when
    /// the target is the current page or does not exist.
    pub fn paginate(&mut self, target: PageTarget) -> Option<usize> {
        let page = target
            .resolve(self.current_page, self.page_count())
            .filter(|&page| page != self.current_page)?;
        self.render_page(page);
        self.current_page = page;
        self.refresh_links();
        self.fire_pagination();
        Some(page)
    }

    /// Change the page size and go back to the first page. Returns `false`
    /// when the size is unchanged.
    pub fn set_page_size(&mut self, per_page: usize) -> Result<bool, TableError> {
        if per_page == self.per_page {
            return Ok(false);
        }
        if per_page == 0 {
            return Err(TableError::ZeroPageSize);
        }
        self.per_page = per_page;
        self.current_page = 0;
        self.render_page(0);
        self.refresh_links();
        self.fire_pagination();
        Ok(true)
    }

    /// Ask the stream loader to stop. Permanent.
    pub fn stop_streaming(&mut self) {
        if !self.stop_streaming {
            debug!(rows = self.rows.len(), "streaming stopped");
        }
        self.stop_streaming = true;
    }

    /// Has streaming been stopped?
    pub fn is_streaming_stopped(&self) -> bool {
        self.stop_streaming
    }

    /// Number of pages of the visible set
    pub fn page_count(&self) -> usize {
        page_count(self.visible_len(), self.per_page)
    }

    /// Rows matching the current search (all rows when not searching)
    pub fn visible_len(&self) -> usize {
        match (&self.sorting, self.query.is_empty()) {
            (_, false) => self.filtered.len(),
            (Some(sorting), true) => sorting.order.len(),
            (None, true) => self.rows.len(),
        }
    }

    /// Rows in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Does the table hold no rows?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every row, in insertion order
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// The visible rows, in display order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &Value> + '_ {
        (0..self.visible_len()).filter_map(|i| self.visible_row(i))
    }

    /// Zero-based current page
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Rows per page
    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// The current (trimmed) search text
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The sort applied last, if any
    pub fn active_sort(&self) -> Option<&SortSpec> {
        self.sorting.as_ref().and_then(|s| s.active.as_ref())
    }

    /// The table's options
    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Summary of the current page
    pub fn summary(&self) -> PaginationSummary {
        PaginationSummary::new(self.current_page, self.per_page, self.visible_len())
    }

    /// Markup of the rows on the current page
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// The page link bar
    pub fn pagination_links(&self) -> &[PageLink] {
        &self.links
    }

    /// The page link bar as markup
    pub fn pagination_markup(&self) -> String {
        links_markup(&self.links, &self.options.pagination)
    }

    /// The page-size selector as markup
    pub fn per_page_select_markup(&self) -> String {
        per_page_select_markup(&self.options.pagination, self.per_page)
    }

    /// The whole widget: search box, page-size selector, the rows of the
    /// current page and the page links.
    pub fn container_markup(&self) -> String {
        format!(
            "{}{}\n{}\n<div class=\"st_pagination\">{}</div>",
            search_box_markup(&self.query),
            self.per_page_select_markup(),
            self.rendered,
            self.pagination_markup(),
        )
    }

    fn visible_row(&self, i: usize) -> Option<&Value> {
        if !self.query.is_empty() {
            return match &self.filtered {
                Filtered::Offsets(offsets) => offsets.get(i).and_then(|&o| self.rows.get(o)),
                Filtered::Rows(rows) => rows.get(i),
            };
        }
        match &self.sorting {
            Some(sorting) => sorting.order.get(i).and_then(|&o| self.rows.get(o)),
            None => self.rows.get(i),
        }
    }

    /// Recompute the filtered set from the current query.
    fn filter(&mut self) {
        let needle = self.query.to_uppercase();
        let index = &self.search_index;
        self.filtered = match &self.sorting {
            Some(sorting) => Filtered::Offsets(
                sorting
                    .order
                    .iter()
                    .copied()
                    .filter(|&offset| index.matches(offset, &needle))
                    .collect(),
            ),
            None => Filtered::Rows(
                self.rows
                    .iter()
                    .enumerate()
                    .filter(|(offset, _)| index.matches(*offset, &needle))
                    .map(|(_, row)| row.clone())
                    .collect(),
            ),
        };
    }

    fn clear_filter(&mut self) {
        self.filtered = match self.filtered {
            Filtered::Offsets(_) => Filtered::Offsets(Vec::new()),
            Filtered::Rows(_) => Filtered::Rows(Vec::new()),
        };
    }

    /// Reorder the order index and the filtered offsets. Stable.
    fn apply_sort(&mut self, spec: &SortSpec) {
        let rows = &self.rows;
        let compare = |a: &usize, b: &usize| spec.compare(&rows[*a], &rows[*b]);
        if let Some(sorting) = &mut self.sorting {
            sorting.order.sort_by(compare);
        }
        if let Filtered::Offsets(offsets) = &mut self.filtered {
            offsets.sort_by(compare);
        }
        trace!(sort = %spec, "sorted");
    }

    fn render_page(&mut self, page: usize) {
        let start = page.saturating_mul(self.per_page);
        let end = start.saturating_add(self.per_page).min(self.visible_len());
        let mut html = String::new();
        for i in start..end {
            if let Some(row) = self.visible_row(i) {
                html.push_str(&self.view.render_row(row, i + 1));
            }
        }
        self.rendered = html;
    }

    fn refresh_links(&mut self) {
        self.links = page_links(
            self.page_count(),
            self.current_page,
            self.options.pagination.span,
        );
    }

    fn fire_pagination(&mut self) {
        let summary = self.summary();
        if let Some(pagination) = self.callbacks.pagination.as_mut() {
            pagination(&summary);
        }
    }
}

//! Page arithmetic, page links and their markup.

use serde::Serialize;
use stache::escape_html;
use std::fmt::Write;
use std::str::FromStr;

use crate::options::PaginationOptions;

/// Number of pages needed for `total` rows.
pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        0
    } else {
        total.div_ceil(per_page)
    }
}

/// What the pagination callback receives: a 1-based row range of the
/// current page, the number of visible rows and the zero-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationSummary {
    /// First row shown, 1-based; 0 when there are no rows
    pub from: usize,
    /// Last row shown, clamped to `total`
    pub to: usize,
    /// Rows matching the current search
    pub total: usize,
    /// Zero-based current page
    pub page: usize,
}

impl PaginationSummary {
    /// Summary of `page` at `per_page` rows per page.
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        let first = per_page * page;
        Self {
            from: if total == 0 { 0 } else { first + 1 },
            to: (first + per_page).min(total),
            total,
            page,
        }
    }
}

/// A page to move to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTarget {
    /// 1-based page number
    Page(usize),
    /// The page before the current one
    Previous,
    /// The page after the current one
    Next,
    /// Page 1
    First,
    /// The last page
    Last,
}

impl PageTarget {
    /// Resolve to a zero-based page, if it exists.
    pub fn resolve(self, current: usize, page_count: usize) -> Option<usize> {
        let page = match self {
            PageTarget::Page(n) => n.checked_sub(1),
            PageTarget::Previous => current.checked_sub(1),
            PageTarget::Next => current.checked_add(1),
            PageTarget::First => Some(0),
            PageTarget::Last => page_count.checked_sub(1),
        }?;
        (page < page_count).then_some(page)
    }
}

impl FromStr for PageTarget {
    type Err = String;

    /// `prev`, `next`, `first`, `last` or a 1-based page number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "prev" | "previous" => Ok(PageTarget::Previous),
            "next" => Ok(PageTarget::Next),
            "first" => Ok(PageTarget::First),
            "last" => Ok(PageTarget::Last),
            other => other
                .parse()
                .map(PageTarget::Page)
                .map_err(|_| format!("not a page: `{other}`")),
        }
    }
}

/// One entry of the page link bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    /// Jump to page 1
    First,
    /// One page back
    Previous,
    /// A numbered page (zero-based index)
    Page {
        /// Zero-based page index
        index: usize,
        /// Is this the current page?
        active: bool,
    },
    /// One page forward
    Next,
    /// Jump to the last page
    Last,
}

/// Build the link bar for `current` out of `page_count` pages.
///
/// When there are more pages than `span`, only a window of `span` pages
/// around the current one is listed, framed by First and Last.
pub fn page_links(page_count: usize, current: usize, span: usize) -> Vec<PageLink> {
    let windowed = page_count > span;
    let (start, end) = if windowed {
        let center = span.div_ceil(2);
        let start = current
            .saturating_sub(center.saturating_sub(1))
            .min(page_count - span);
        (start, start + span)
    } else {
        (0, page_count)
    };

    let mut links = Vec::with_capacity(end - start + 4);
    if windowed {
        links.push(PageLink::First);
    }
    links.push(PageLink::Previous);
    links.extend((start..end).map(|index| PageLink::Page {
        index,
        active: index == current,
    }));
    links.push(PageLink::Next);
    if windowed {
        links.push(PageLink::Last);
    }
    links
}

/// Render the link bar as a `<ul class="pagination">` list.
pub fn links_markup(links: &[PageLink], options: &PaginationOptions) -> String {
    let mut html = String::new();
    let _ = write!(html, r#"<ul class="{}">"#, class_list("pagination", &options.ul_class));
    for link in links {
        let _ = match link {
            PageLink::First => write!(html, r##"<li><a href="#" class="first">First</a></li>"##),
            PageLink::Previous => write!(
                html,
                r##"<li><a href="#" class="prev">{}</a></li>"##,
                options.prev_text
            ),
            PageLink::Page {
                index,
                active: true,
            } => write!(
                html,
                r##"<li class="active" data-page="{index}"><a href="#" class="active">{}</a></li>"##,
                index + 1
            ),
            PageLink::Page {
                index,
                active: false,
            } => write!(
                html,
                r##"<li data-page="{index}"><a href="#">{}</a></li>"##,
                index + 1
            ),
            PageLink::Next => write!(
                html,
                r##"<li><a href="#" class="next">{}</a></li>"##,
                options.next_text
            ),
            PageLink::Last => write!(html, r##"<li><a href="#" class="last">Last</a></li>"##),
        };
    }
    html.push_str("</ul>");
    html
}

/// Render the page-size selector, with `per_page` selected. Empty when the
/// selector is disabled.
pub fn per_page_select_markup(options: &PaginationOptions, per_page: usize) -> String {
    if !options.per_page_select {
        return String::new();
    }
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<select size="1" name="per_page" class="{}">"#,
        class_list("st_per_page", &options.per_page_class)
    );
    for &size in &options.per_page_options {
        let selected = if size == per_page { " selected" } else { "" };
        let _ = write!(html, r#"<option value="{size}"{selected}>{size}</option>"#);
    }
    html.push_str("</select>");
    html
}

/// Render the search box holding `query`.
pub fn search_box_markup(query: &str) -> String {
    format!(
        r#"<input name="search" type="text" id="st_search" class="st_search" placeholder="Search Here" value="{}">"#,
        escape_html(query)
    )
}

fn class_list(base: &str, extra: &Option<String>) -> String {
    match extra.as_deref().map(str::trim) {
        Some(extra) if !extra.is_empty() => format!("{base} {}", escape_html(extra)),
        _ => base.to_string(),
    }
}

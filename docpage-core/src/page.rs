//! Pagination requests and result pages.
//!
//! Pages are cursor-based: a [`Page`] carries the cursor of its last item when
//! more results follow, and the next request passes it back in
//! [`Pagination::cursor`].

use serde::{Deserialize, Serialize};

/// Page size used when a request does not specify one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// use docpage::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_next_cursor(Some("65f0c0ffee00112233445566".to_string()))
///     .build();
///
/// assert!(page.has_more);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items of this page, in query order.
    pub items: Vec<T>,
    /// Whether more results exist after this page.
    pub has_more: bool,
    /// Cursor for the next page; present iff `has_more`.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Converts the items of this page, keeping its position.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_more: self.has_more,
            next_cursor: self.next_cursor,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { items: Vec::new(), has_more: false, next_cursor: None }
    }
}

pub struct PageBuilder<T> {
    items: Vec<T>,
    next_cursor: Option<String>,
}

impl<T> PageBuilder<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, next_cursor: None }
    }

    /// Sets the next cursor (or `None` if this is the last page).
    pub fn with_next_cursor(mut self, next_cursor: Option<String>) -> Self {
        self.next_cursor = next_cursor;
        self
    }

    pub fn build(self) -> Page<T> {
        Page {
            items: self.items,
            has_more: self.next_cursor.is_some(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Parameters for requesting one page.
///
/// # Example
///
/// ```ignore
/// use docpage::page::Pagination;
///
/// let first = Pagination::new(2);
/// let next = Pagination::builder().with_limit(2).with_cursor(page.next_cursor).build();
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Pagination {
    /// Maximum number of items on the page; the repository default applies when absent.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Cursor returned with the previous page, absent for the first page.
    #[serde(default)]
    pub cursor: Option<String>,
}

impl Pagination {
    /// First page with the given size.
    pub fn new(limit: usize) -> Self {
        Self { limit: Some(limit), cursor: None }
    }

    pub fn builder() -> PaginationBuilder {
        PaginationBuilder::new()
    }

    /// The page following `page`, or `None` if `page` was the last one.
    pub fn after<T>(&self, page: &Page<T>) -> Option<Self> {
        page.next_cursor
            .as_ref()
            .map(|cursor| Self { limit: self.limit, cursor: Some(cursor.clone()) })
    }
}

#[derive(Default)]
pub struct PaginationBuilder {
    limit: Option<usize>,
    cursor: Option<String>,
}

impl PaginationBuilder {
    pub fn new() -> Self {
        Self { limit: None, cursor: None }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn build(self) -> Pagination {
        Pagination { limit: self.limit, cursor: self.cursor }
    }
}

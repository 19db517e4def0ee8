//! Pagination merging.
//!
//! AWS list operations spell their continuation cursor differently
//! (`NextToken`, `NextMarker`, `Marker`, `nextToken`). The merger only sees a
//! [`Page`]; callers decide where the cursor lives.

use std::future::Future;
use tracing::{debug, warn};

/// Upper bound on pages followed for a single listing.
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// A final page.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// The cursor to follow, if any. Empty cursors end the listing.
    pub fn cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationMerger {
    max_pages: usize,
}

impl Default for PaginationMerger {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl PaginationMerger {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }

    /// Follow cursors from `first` until a page has none, concatenating
    /// items in page order.
    ///
    /// Any page error aborts the listing. Reaching `max_pages` stops with
    /// what was collected so far.
    pub async fn drain<T, E, F, Fut>(&self, first: Page<T>, mut fetch_next: F) -> Result<Vec<T>, E>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        let mut cursor = first.cursor().map(str::to_string);
        let mut items = first.items;
        let mut pages = 1;

        while let Some(next) = cursor {
            if pages >= self.max_pages {
                warn!(
                    "Stopping pagination after {} pages with {} items",
                    pages,
                    items.len()
                );
                break;
            }

            let page = fetch_next(next).await?;
            pages += 1;
            cursor = page.cursor().map(str::to_string);
            items.extend(page.items);
        }

        debug!("Merged {} pages into {} items", pages, items.len());
        Ok(items)
    }
}

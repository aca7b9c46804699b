//! Ordered cache of fetched pages.

use log::debug;
use log::warn;

use crate::error::TableError;

use super::Advance;
use super::Page;
use super::advance;

/// Pages fetched for one query identity, in fetch order.
///
/// Offsets strictly increase from one page to the next. The cache only grows
/// by [`append`](PageCache::append); it shrinks only through a wholesale
/// [`reset`](PageCache::reset) or [`replace_all`](PageCache::replace_all).
#[derive(Debug)]
pub struct PageCache<R> {
    pages: Vec<Page<R>>,
    /// Sticky exhaustion for the current identity.
    exhausted: bool,
}

impl<R> Default for PageCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> PageCache<R> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            exhausted: false,
        }
    }

    /// Drops every page and the exhaustion flag.
    pub fn reset(&mut self) {
        debug!("[paging] reset cache ({} pages dropped)", self.pages.len());
        self.pages.clear();
        self.exhausted = false;
    }

    /// Appends `page` as the new last entry.
    ///
    /// Rejects a page whose cursor is already cached, and one whose offset
    /// does not follow the last cached page. A rejected page leaves the cache
    /// untouched.
    pub fn append(&mut self, page: Page<R>) -> Result<usize, TableError> {
        let cursor = page.cursor();

        if self.pages.iter().any(|p| p.cursor() == cursor) {
            warn!("[paging] duplicate fetch for {}, page dropped", cursor);
            return Err(TableError::DuplicateFetch {
                offset: cursor.offset,
            });
        }

        if let Some(last) = self.pages.last()
            && cursor.offset <= last.cursor().offset
        {
            warn!(
                "[paging] page at offset {} does not follow offset {}, page dropped",
                cursor.offset,
                last.cursor().offset
            );
            return Err(TableError::OutOfOrderPage {
                offset: cursor.offset,
                last: last.cursor().offset,
            });
        }

        if page.is_terminal() {
            self.exhausted = true;
        }

        self.pages.push(page);
        debug!("[paging] appended page {} at {}", self.pages.len() - 1, cursor);
        Ok(self.pages.len() - 1)
    }

    /// Swaps in a freshly fetched set of pages.
    ///
    /// Used by a full refetch. Exhaustion stays set: the identity has not
    /// changed, so a cache that reached the end stays at the end.
    pub fn replace_all(&mut self, pages: Vec<Page<R>>) {
        self.exhausted |= pages.iter().any(Page::is_terminal);
        self.pages = pages;
    }

    /// Returns `true` if no further pages exist for this identity.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns what to fetch after the last page.
    ///
    /// `None` means the cache is empty and the base cursor should be used.
    pub fn next(&self) -> Option<Advance> {
        if self.exhausted {
            return Some(Advance::Exhausted);
        }
        self.pages.last().map(advance)
    }

    /// Returns the page at `index`.
    pub fn get(&self, index: usize) -> Option<&Page<R>> {
        self.pages.get(index)
    }

    /// Returns the last page.
    pub fn last(&self) -> Option<&Page<R>> {
        self.pages.last()
    }

    /// Returns all pages in fetch order.
    pub fn pages(&self) -> &[Page<R>] {
        &self.pages
    }

    /// Returns the number of cached pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

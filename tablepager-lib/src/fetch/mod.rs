//! Fetch transport.
//!
//! The table never performs I/O itself. It hands a [`PageQuery`] to a
//! [`PageFetcher`] and applies whatever comes back. [`HttpFetcher`] is the
//! reqwest-backed implementation that talks to the catalog endpoint contract.

mod http;
mod retry;

pub use http::*;
pub use retry::*;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::Cursor;
use crate::model::FilterSet;

/// Everything a fetcher needs to load one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// Resource name (for HTTP, the path segment and response key).
    pub resource: String,
    /// Page position.
    pub cursor: Cursor,
    /// Filters to apply at the source.
    pub filters: FilterSet,
}

/// Rows returned for a page query.
#[derive(Debug, Clone)]
pub struct FetchResponse<R> {
    /// Rows, at most `cursor.limit` of them.
    pub rows: Vec<R>,
    /// Explicit next-page signal, when the source provides one.
    pub has_more: Option<bool>,
}

impl<R> FetchResponse<R> {
    /// Creates a response without a next-page signal.
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            has_more: None,
        }
    }

    /// Sets the next-page signal.
    pub fn with_has_more(mut self, has_more: bool) -> Self {
        self.has_more = Some(has_more);
        self
    }
}

/// Loads pages of rows.
///
/// Any error is terminal for that attempt as far as the table is concerned.
/// Implementations that want retries do them internally.
#[async_trait]
pub trait PageFetcher<R>: Send + Sync {
    /// Fetches the page described by `query`.
    async fn fetch(&self, query: &PageQuery) -> Result<FetchResponse<R>, FetchError>;
}

//! A fetched page of rows.

use chrono::DateTime;
use chrono::Utc;

use crate::model::Cursor;

/// A page of rows together with the cursor that fetched it.
///
/// Pages are created once per successful fetch and never mutated afterwards.
/// The page cache owns them.
#[derive(Debug, Clone)]
pub struct Page<R> {
    rows: Vec<R>,
    cursor: Cursor,
    /// Explicit next-page signal from the fetch layer, if it sent one.
    has_more: Option<bool>,
    fetched_at: DateTime<Utc>,
}

impl<R> Page<R> {
    /// Creates a new page fetched now.
    pub fn new(rows: Vec<R>, cursor: Cursor) -> Self {
        Self {
            rows,
            cursor,
            has_more: None,
            fetched_at: Utc::now(),
        }
    }

    /// Sets the fetch layer's next-page signal.
    pub fn with_has_more(mut self, has_more: Option<bool>) -> Self {
        self.has_more = has_more;
        self
    }

    /// Returns the rows in this page.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Returns the cursor used to fetch this page.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the fetch layer's next-page signal.
    pub fn has_more(&self) -> Option<bool> {
        self.has_more
    }

    /// Returns when this page was fetched.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Returns `true` if this page has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows in this page.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if this page ends the result stream.
    ///
    /// A page ends the stream when it came back short of its limit or when
    /// the fetch layer said there is nothing after it.
    pub fn is_terminal(&self) -> bool {
        self.rows.len() < self.cursor.limit.get() || self.has_more == Some(false)
    }
}

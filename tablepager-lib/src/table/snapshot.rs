//! Read-only view of the table for rendering.

use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;

use crate::model::FilterSet;
use crate::store::ColumnDef;

/// Everything a renderer needs to draw the table.
#[derive(Debug, Clone)]
pub struct TableSnapshot<R> {
    /// Rows on the displayed page, after local filters.
    pub rows: Vec<R>,
    /// Columns in display order.
    pub columns: Vec<ColumnDef>,
    /// Filter descriptors as currently edited.
    pub filters: FilterSet,
    /// Selected row ids.
    pub selected: HashSet<String>,
    /// 1-based number of the displayed page.
    pub page: usize,
    /// Number of cached pages.
    pub pages_cached: usize,
    /// When the displayed page was fetched.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Whether "next" is enabled.
    pub can_next: bool,
    /// Whether "previous" is enabled.
    pub can_previous: bool,
    /// Whether "refetch" is enabled.
    pub can_refetch: bool,
    /// Whether a fetch is in flight.
    pub is_fetching: bool,
    /// Whether the result stream is exhausted.
    pub is_exhausted: bool,
    /// Message of the last failed fetch, cleared by the next success.
    pub last_error: Option<String>,
}

impl<R> TableSnapshot<R> {
    /// Returns `true` if the displayed page shows no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

//! Paging state errors

/// Internal paging errors.
///
/// None of these reach the rendering layer as an error flag. They are logged
/// and the offending result is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// A page with the same cursor is already cached.
    #[error("page at offset {offset} is already cached")]
    DuplicateFetch {
        /// Offset of the rejected page.
        offset: usize,
    },

    /// The page offset does not follow the last cached page.
    #[error("page at offset {offset} does not follow cached offset {last}")]
    OutOfOrderPage {
        /// Offset of the rejected page.
        offset: usize,
        /// Offset of the last cached page.
        last: usize,
    },

    /// The fetch settled after the query identity changed.
    #[error("fetch settled for an outdated query")]
    StaleFetch,
}

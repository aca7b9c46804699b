//! Error types

mod catalog;
mod fetch;
mod table;

pub use catalog::*;
pub use fetch::*;
pub use table::*;

/// Top-level error for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fetching a page failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Paging state rejected a result.
    #[error(transparent)]
    Table(#[from] TableError),

    /// The catalog endpoint failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

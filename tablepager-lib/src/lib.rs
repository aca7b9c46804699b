//! Paginated, filterable table state
//!
//! Cursor-based paging over a remote data source with a page cache, a view
//! index that walks the cached pages, debounced column filters, row selection
//! and column sizing. The state performs no I/O; a [`fetch::PageFetcher`]
//! supplies pages and [`table::PagedTable`] drives the two together.
//!
//! The [`catalog`] module provides a small REST endpoint implementing the
//! paging contract the HTTP fetcher speaks.

pub mod catalog;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod model;
pub mod observer;
pub mod paging;
pub mod store;
pub mod table;

pub use error::Error;
pub use table::PagedTable;
pub use table::TableState;

//! Cursor paging: pages, the page cache, cursor advancing and the view index.
//!
//! - [`Page`] - rows fetched with one cursor
//! - [`PageCache`] - pages for the current query identity, in fetch order
//! - [`advance`] - next cursor or exhaustion
//! - [`ViewIndex`] - which cached page is displayed

mod advance;
mod cache;
mod page;
mod view;

pub use advance::Advance;
pub use advance::advance;
pub use cache::PageCache;
pub use page::Page;
pub use view::Bounds;
pub use view::NavRejected;
pub use view::Step;
pub use view::ViewIndex;

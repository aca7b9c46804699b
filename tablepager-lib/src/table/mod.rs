//! The table: paging, filters, selection and columns wired together.
//!
//! [`TableState`] is the synchronous core. It issues [`FetchRequest`]s as
//! values and applies their results through [`TableState::settle`].
//! [`PagedTable`] owns a fetcher and drives the state across the fetch
//! suspension point.

mod paged;
mod request;
mod snapshot;
mod state;

pub use paged::*;
pub use request::*;
pub use snapshot::*;
pub use state::*;

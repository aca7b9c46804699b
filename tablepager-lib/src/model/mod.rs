//! Data model: rows, cursors, filters and query identity.

mod cursor;
mod filter;
mod identity;
mod row;

pub use cursor::*;
pub use filter::*;
pub use identity::*;
pub use row::*;

//! Selection, filter and column state.

mod columns;
mod filters;
mod selection;

pub use columns::*;
pub use filters::*;
pub use selection::*;

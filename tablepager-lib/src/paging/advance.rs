//! Next-cursor computation.

use crate::model::Cursor;

use super::Page;

/// Outcome of advancing past a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Fetch this cursor next.
    Next(Cursor),
    /// No further pages exist.
    Exhausted,
}

impl Advance {
    /// Returns the next cursor, if any.
    pub fn cursor(self) -> Option<Cursor> {
        match self {
            Self::Next(cursor) => Some(cursor),
            Self::Exhausted => None,
        }
    }
}

/// Computes what comes after `last`.
///
/// The next cursor moves the offset forward by the limit. A page shorter than
/// its limit, or one the fetch layer marked as final, exhausts the stream.
pub fn advance<R>(last: &Page<R>) -> Advance {
    if last.is_terminal() {
        Advance::Exhausted
    } else {
        Advance::Next(last.cursor().following())
    }
}

//! Offset/limit pagination cursor.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Number of rows requested per page.
///
/// Only 5, 10 and 20 are accepted, both by the table and by the catalog
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PageSize {
    /// Five rows per page.
    #[default]
    Five,
    /// Ten rows per page.
    Ten,
    /// Twenty rows per page.
    Twenty,
}

impl PageSize {
    /// Returns the page size as a row count.
    pub fn get(self) -> usize {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
            Self::Twenty => 20,
        }
    }
}

impl TryFrom<u32> for PageSize {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            10 => Ok(Self::Ten),
            20 => Ok(Self::Twenty),
            other => Err(other),
        }
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.get() as u32
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Position of a page in a result stream.
///
/// A cursor is immutable once used to fetch a page; the next position is a
/// new cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// Index of the first row of the page.
    pub offset: usize,
    /// Rows requested.
    pub limit: PageSize,
}

impl Cursor {
    /// Creates a cursor.
    pub fn new(offset: usize, limit: PageSize) -> Self {
        Self { offset, limit }
    }

    /// Creates a cursor at the start of the stream.
    pub fn first(limit: PageSize) -> Self {
        Self { offset: 0, limit }
    }

    /// Returns the cursor directly after this one, with the same limit.
    pub fn following(&self) -> Self {
        Self {
            offset: self.offset + self.limit.get(),
            limit: self.limit,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset={} limit={}", self.offset, self.limit)
    }
}

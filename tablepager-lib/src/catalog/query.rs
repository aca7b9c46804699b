//! Catalog query string parsing.

use crate::error::QueryError;
use crate::model::Cursor;
use crate::model::FilterSet;
use crate::model::PageSize;
use crate::model::Row;

/// A parsed `?limit=&offset=&filterBy=` query.
///
/// Absent parameters take their defaults (`limit=5`, `offset=0`, no
/// filters). Anything present but malformed is an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogQuery {
    /// Requested page.
    pub cursor: Cursor,
    /// Filters from `filterBy`.
    pub filters: FilterSet,
}

impl CatalogQuery {
    /// Parses a raw query string.
    pub fn parse(query: Option<&str>) -> Result<Self, QueryError> {
        let mut parsed = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "limit" => {
                    let limit: u32 = value.parse().map_err(|_| QueryError::InvalidNumber {
                        param: "limit",
                        value: value.to_string(),
                    })?;
                    parsed.cursor.limit = PageSize::try_from(limit).map_err(QueryError::InvalidLimit)?;
                }
                "offset" => {
                    parsed.cursor.offset = value.parse().map_err(|_| QueryError::InvalidNumber {
                        param: "offset",
                        value: value.to_string(),
                    })?;
                }
                "filterBy" => {
                    parsed.filters =
                        serde_json::from_str(&value).map_err(|e| QueryError::InvalidFilter(e.to_string()))?;
                }
                _ => {}
            }
        }

        Ok(parsed)
    }

    /// Returns the requested slice of the rows that pass the filters.
    pub fn apply<'a, R: Row>(&self, rows: &'a [R]) -> Vec<&'a R> {
        rows.iter()
            .filter(|row| self.filters.matches(*row))
            .skip(self.cursor.offset)
            .take(self.cursor.limit.get())
            .collect()
    }
}

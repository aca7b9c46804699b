//! Composite query identity.

use std::fmt;

use serde::Serialize;

use super::Cursor;
use super::FilterSet;

/// Everything that decides which pages are relevant.
///
/// Two identities are equal iff resource, base cursor and filters are all
/// structurally equal. The table keeps the last identity it observed and
/// compares each freshly built one against it; only inequality invalidates
/// the page cache.
///
/// # Example
///
/// ```
/// use tablepager_lib::model::{Cursor, FilterDescriptor, FilterSet, PageSize, QueryIdentity};
///
/// let filters = FilterSet::new().with("title", FilterDescriptor::text("bag"));
/// let a = QueryIdentity::new("products", Cursor::first(PageSize::Five), filters.clone());
/// let b = QueryIdentity::new("products", Cursor::first(PageSize::Five), filters);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryIdentity {
    resource: String,
    base_cursor: Cursor,
    filters: FilterSet,
}

impl QueryIdentity {
    /// Builds an identity from its inputs.
    pub fn new(resource: impl Into<String>, base_cursor: Cursor, filters: FilterSet) -> Self {
        Self {
            resource: resource.into(),
            base_cursor,
            filters,
        }
    }

    /// Returns the resource name.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the cursor of the first page.
    pub fn base_cursor(&self) -> Cursor {
        self.base_cursor
    }

    /// Returns the filters sent to the data source.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }
}

impl fmt::Display for QueryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters = serde_json::to_string(&self.filters).unwrap_or_default();
        write!(f, "{}[{}] filters={}", self.resource, self.base_cursor, filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilterDescriptor;
    use crate::model::PageSize;

    fn identity(filters: FilterSet) -> QueryIdentity {
        QueryIdentity::new("products", Cursor::first(PageSize::Five), filters)
    }

    #[test]
    fn test_filter_value_changes_identity() {
        let a = identity(FilterSet::new().with("title", FilterDescriptor::text("bag")));
        let b = identity(FilterSet::new().with("title", FilterDescriptor::text("bags")));
        assert_ne!(a, b);
    }

    #[test]
    fn test_cursor_shape_changes_identity() {
        let a = identity(FilterSet::new());
        let b = QueryIdentity::new("products", Cursor::first(PageSize::Ten), FilterSet::new());
        assert_ne!(a, b);
    }

    #[test]
    fn test_rebuilt_identity_is_equal() {
        let a = identity(FilterSet::new().with("category", FilterDescriptor::empty_text()));
        let b = identity(FilterSet::new().with("category", FilterDescriptor::empty_text()));
        assert_eq!(a, b);
    }
}

//! Column filter descriptors.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::FieldValue;
use super::Row;

/// How a text filter compares its value. Comparisons ignore case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextMatch {
    /// Whole value equals the filter value.
    Equal,
    /// Value contains the filter value.
    #[default]
    Contains,
    /// Value starts with the filter value.
    StartsWith,
    /// Value ends with the filter value.
    EndsWith,
}

/// How a number filter compares its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NumberMatch {
    /// `field == value`
    #[default]
    Equal,
    /// `field != value`
    NotEqual,
    /// `field > value`
    GreaterThan,
    /// `field >= value`
    GreaterThanOrEqual,
    /// `field < value`
    LessThan,
    /// `field <= value`
    LessThanOrEqual,
}

/// A filter on a single column.
///
/// A descriptor without a value is inactive and matches every row, which is
/// how an empty filter input behaves.
///
/// # Example
///
/// ```
/// use tablepager_lib::model::{FilterDescriptor, NumberMatch};
///
/// let title = FilterDescriptor::text("shirt");
/// let cheap = FilterDescriptor::number(NumberMatch::LessThan, 20.0);
/// let band = FilterDescriptor::range(Some(10.0), Some(50.0));
///
/// assert!(title.is_active());
/// assert!(!FilterDescriptor::empty_text().is_active());
/// # let _ = (cheap, band);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "camelCase")]
pub enum FilterDescriptor {
    /// Text comparison.
    Text {
        /// Comparison mode.
        #[serde(rename = "filterType", default)]
        match_mode: TextMatch,
        /// Filter value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Numeric comparison against a single value.
    Number {
        /// Comparison mode.
        #[serde(rename = "filterType", default)]
        match_mode: NumberMatch,
        /// Filter value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
    },
    /// Inclusive numeric range; either bound may be open.
    NumberRange {
        /// Lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        /// Upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
}

// Numbers compare by bit pattern so that equality stays reflexive, NaN
// included. Query identities are built from descriptors and must equal
// themselves.
impl PartialEq for FilterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Text { match_mode: a, value: x },
                Self::Text { match_mode: b, value: y },
            ) => a == b && x == y,
            (
                Self::Number { match_mode: a, value: x },
                Self::Number { match_mode: b, value: y },
            ) => a == b && same_number(*x, *y),
            (Self::NumberRange { min: a, max: b }, Self::NumberRange { min: c, max: d }) => {
                same_number(*a, *c) && same_number(*b, *d)
            }
            _ => false,
        }
    }
}

impl Eq for FilterDescriptor {}

fn same_number(a: Option<f64>, b: Option<f64>) -> bool {
    a.map(f64::to_bits) == b.map(f64::to_bits)
}

impl FilterDescriptor {
    /// Creates a case-insensitive substring filter.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            match_mode: TextMatch::Contains,
            value: Some(value.into()),
        }
    }

    /// Creates a text filter with an explicit mode.
    pub fn text_with(match_mode: TextMatch, value: impl Into<String>) -> Self {
        Self::Text {
            match_mode,
            value: Some(value.into()),
        }
    }

    /// Creates an inactive text filter, used to register a filterable column.
    pub fn empty_text() -> Self {
        Self::Text {
            match_mode: TextMatch::Contains,
            value: None,
        }
    }

    /// Creates a numeric filter.
    pub fn number(match_mode: NumberMatch, value: f64) -> Self {
        Self::Number {
            match_mode,
            value: Some(value),
        }
    }

    /// Creates a numeric range filter.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::NumberRange { min, max }
    }

    /// Returns a copy carrying a new text value.
    ///
    /// Non-text descriptors are returned unchanged, which mirrors how a text
    /// input only ever edits a text filter.
    pub fn with_text_value(&self, value: impl Into<String>) -> Self {
        match self {
            Self::Text { match_mode, .. } => Self::Text {
                match_mode: *match_mode,
                value: Some(value.into()),
            },
            other => other.clone(),
        }
    }

    /// Returns `true` if this filter constrains anything.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Text { value, .. } => value.as_deref().is_some_and(|v| !v.is_empty()),
            Self::Number { value, .. } => value.is_some(),
            Self::NumberRange { min, max } => min.is_some() || max.is_some(),
        }
    }

    /// Returns `true` if `field` passes this filter.
    pub fn matches(&self, field: &FieldValue) -> bool {
        if !self.is_active() {
            return true;
        }

        match self {
            Self::Text { match_mode, value } => {
                let (Some(needle), Some(haystack)) = (value.as_deref(), field.as_text()) else {
                    return false;
                };
                let needle = needle.to_lowercase();
                let haystack = haystack.to_lowercase();
                match match_mode {
                    TextMatch::Equal => haystack == needle,
                    TextMatch::Contains => haystack.contains(&needle),
                    TextMatch::StartsWith => haystack.starts_with(&needle),
                    TextMatch::EndsWith => haystack.ends_with(&needle),
                }
            }
            Self::Number { match_mode, value } => {
                let (Some(target), Some(n)) = (*value, field.as_number()) else {
                    return false;
                };
                match match_mode {
                    NumberMatch::Equal => n == target,
                    NumberMatch::NotEqual => n != target,
                    NumberMatch::GreaterThan => n > target,
                    NumberMatch::GreaterThanOrEqual => n >= target,
                    NumberMatch::LessThan => n < target,
                    NumberMatch::LessThanOrEqual => n <= target,
                }
            }
            Self::NumberRange { min, max } => {
                let Some(n) = field.as_number() else {
                    return false;
                };
                min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi)
            }
        }
    }
}

/// Filters keyed by column id.
///
/// Keys are unique and ordered, so two sets with the same entries compare
/// equal and serialize identically no matter how they were built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: BTreeMap<String, FilterDescriptor>,
}

impl FilterSet {
    /// Creates an empty filter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter, builder style.
    pub fn with(mut self, column: impl Into<String>, filter: FilterDescriptor) -> Self {
        self.filters.insert(column.into(), filter);
        self
    }

    /// Replaces the filter for `column`, returning the previous one.
    pub fn insert(&mut self, column: impl Into<String>, filter: FilterDescriptor) -> Option<FilterDescriptor> {
        self.filters.insert(column.into(), filter)
    }

    /// Removes the filter for `column`.
    pub fn remove(&mut self, column: &str) -> Option<FilterDescriptor> {
        self.filters.remove(column)
    }

    /// Returns the filter for `column`.
    pub fn get(&self, column: &str) -> Option<&FilterDescriptor> {
        self.filters.get(column)
    }

    /// Returns `true` if a filter is registered for `column`.
    pub fn contains(&self, column: &str) -> bool {
        self.filters.contains_key(column)
    }

    /// Iterates over `(column, filter)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterDescriptor)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filters are registered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns `true` if any filter constrains rows.
    pub fn has_active(&self) -> bool {
        self.filters.values().any(FilterDescriptor::is_active)
    }

    /// Returns only the filters that constrain rows.
    pub fn active(&self) -> FilterSet {
        self.filters
            .iter()
            .filter(|(_, f)| f.is_active())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns `true` if `row` passes every filter.
    pub fn matches<R: Row>(&self, row: &R) -> bool {
        self.filters
            .iter()
            .all(|(column, filter)| filter.matches(&row.field(column)))
    }

    /// Serializes the active filters for the `filterBy` query parameter.
    ///
    /// Returns `None` when nothing is active.
    pub fn to_query_param(&self) -> Result<Option<String>, serde_json::Error> {
        if !self.has_active() {
            return Ok(None);
        }

        let active: BTreeMap<&str, &FilterDescriptor> = self
            .filters
            .iter()
            .filter(|(_, f)| f.is_active())
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        serde_json::to_string(&active).map(Some)
    }
}

impl<K: Into<String>> FromIterator<(K, FilterDescriptor)> for FilterSet {
    fn from_iter<T: IntoIterator<Item = (K, FilterDescriptor)>>(iter: T) -> Self {
        Self {
            filters: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_text_matching_ignores_case() {
        let filter = FilterDescriptor::text("SHIRT");
        assert!(filter.matches(&"Slim Fit T-Shirt".into()));
        assert!(!filter.matches(&"Jacket".into()));
        assert!(!filter.matches(&FieldValue::Null));

        let exact = FilterDescriptor::text_with(TextMatch::Equal, "jewelery");
        assert!(exact.matches(&"Jewelery".into()));
        assert!(!exact.matches(&"jewelery box".into()));

        let prefix = FilterDescriptor::text_with(TextMatch::StartsWith, "men");
        assert!(prefix.matches(&"men's clothing".into()));
        assert!(!prefix.matches(&"women's clothing".into()));
    }

    #[test]
    fn test_nan_descriptor_equals_itself() {
        let nan = FilterDescriptor::number(NumberMatch::GreaterThan, f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(FilterDescriptor::range(Some(f64::NAN), None), FilterDescriptor::range(Some(f64::NAN), None));
        assert_ne!(nan, FilterDescriptor::number(NumberMatch::LessThan, f64::NAN));
        assert_ne!(FilterDescriptor::number(NumberMatch::Equal, 1.0), FilterDescriptor::number(NumberMatch::Equal, 2.0));
    }

    #[test]
    fn test_inactive_filters_match_everything() {
        assert!(FilterDescriptor::empty_text().matches(&FieldValue::Null));
        assert!(FilterDescriptor::text("").matches(&"anything".into()));
        assert!(FilterDescriptor::range(None, None).matches(&FieldValue::Null));
    }

    #[test]
    fn test_number_filters() {
        let ge = FilterDescriptor::number(NumberMatch::GreaterThanOrEqual, 100.0);
        assert!(ge.matches(&100.0.into()));
        assert!(!ge.matches(&99.5.into()));
        assert!(!ge.matches(&"100".into()));

        let band = FilterDescriptor::range(Some(10.0), Some(20.0));
        assert!(band.matches(&10.0.into()));
        assert!(band.matches(&20.0.into()));
        assert!(!band.matches(&20.01.into()));

        let open = FilterDescriptor::range(None, Some(5.0));
        assert!(open.matches(&(-3.0).into()));
    }

    #[test]
    fn test_filter_set_equality_ignores_insertion_order() {
        let a = FilterSet::new()
            .with("title", FilterDescriptor::text("bag"))
            .with("category", FilterDescriptor::text("men"));
        let b = FilterSet::new()
            .with("category", FilterDescriptor::text("men"))
            .with("title", FilterDescriptor::text("bag"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_filter_set_matches_rows() {
        let set = FilterSet::new()
            .with("category", FilterDescriptor::text("elec"))
            .with("price", FilterDescriptor::number(NumberMatch::LessThan, 100.0));

        assert!(set.matches(&json!({"id": 1, "category": "electronics", "price": 64.0})));
        assert!(!set.matches(&json!({"id": 2, "category": "electronics", "price": 599.0})));
        assert!(!set.matches(&json!({"id": 3, "category": "jewelery", "price": 9.9})));
    }

    #[test]
    fn test_wire_format() {
        let set = FilterSet::new()
            .with("title", FilterDescriptor::text("bag"))
            .with("category", FilterDescriptor::empty_text());

        let param = set.to_query_param().unwrap().unwrap();
        assert_eq!(
            param,
            r#"{"title":{"dataType":"text","filterType":"CONTAINS","value":"bag"}}"#
        );

        let parsed: FilterSet = serde_json::from_str(&param).unwrap();
        assert_eq!(parsed.get("title"), Some(&FilterDescriptor::text("bag")));
        assert_eq!(FilterSet::new().to_query_param().unwrap(), None);
    }

    #[test]
    fn test_parse_range() {
        let parsed: FilterSet =
            serde_json::from_str(r#"{"price":{"dataType":"numberRange","min":5}}"#).unwrap();
        assert_eq!(parsed.get("price"), Some(&FilterDescriptor::range(Some(5.0), None)));
    }
}

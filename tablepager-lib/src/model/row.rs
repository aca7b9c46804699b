//! Row trait and field values.

use std::fmt;

/// A single cell value as seen by filters.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Missing or null value.
    #[default]
    Null,
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Bool(bool),
}

impl FieldValue {
    /// Returns the value as text, rendering numbers and booleans.
    ///
    /// Returns `None` for [`FieldValue::Null`].
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(n.to_string()),
            Self::Bool(b) => Some(b.to_string()),
        }
    }

    /// Returns the value as a number if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns `true` for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Trait for records that can be shown as table rows.
///
/// Column ids are plain strings. Nested fields use dotted paths
/// (`"rating.rate"`), which is how the JSON implementation resolves them.
///
/// # Example
///
/// ```
/// use tablepager_lib::model::{FieldValue, Row};
///
/// #[derive(Clone)]
/// struct User {
///     id: u32,
///     name: String,
/// }
///
/// impl Row for User {
///     fn id(&self) -> String {
///         self.id.to_string()
///     }
///
///     fn field(&self, column: &str) -> FieldValue {
///         match column {
///             "name" => self.name.as_str().into(),
///             _ => FieldValue::Null,
///         }
///     }
/// }
/// ```
pub trait Row: Clone + Send + Sync + 'static {
    /// Stable identifier used for selection.
    fn id(&self) -> String;

    /// Value of the given column.
    fn field(&self, column: &str) -> FieldValue;
}

impl Row for serde_json::Value {
    fn id(&self) -> String {
        match self.get("id") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    fn field(&self, column: &str) -> FieldValue {
        let mut current = self;
        for part in column.split('.') {
            match current.get(part) {
                Some(next) => current = next,
                None => return FieldValue::Null,
            }
        }

        match current {
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or_default(),
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Null => FieldValue::Null,
            other => FieldValue::Text(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_json_row_fields() {
        let row = json!({
            "id": 7,
            "title": "Backpack",
            "rating": { "rate": 3.9, "count": 120 }
        });

        assert_eq!(row.id(), "7");
        assert_eq!(row.field("title"), FieldValue::Text("Backpack".into()));
        assert_eq!(row.field("rating.rate"), FieldValue::Number(3.9));
        assert!(row.field("rating.missing").is_null());
        assert!(row.field("nope").is_null());
    }

    #[test]
    fn test_string_id() {
        let row = json!({ "id": "sku-1" });
        assert_eq!(row.id(), "sku-1");
    }
}

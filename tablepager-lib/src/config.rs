//! Table configuration

use std::time::Duration;

use serde::Deserialize;

use crate::model::PageSize;
use crate::store::FilterMode;
use crate::store::SelectionMode;

/// Configuration for a paged table.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tablepager_lib::config::TableConfig;
/// use tablepager_lib::model::PageSize;
/// use tablepager_lib::store::FilterMode;
///
/// let config = TableConfig::default()
///     .with_page_size(PageSize::Ten)
///     .with_debounce(Duration::from_millis(250))
///     .with_filter_mode(FilterMode::Local);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows per page.
    ///
    /// Default: 5
    pub page_size: PageSize,

    /// How long filter edits wait before they take effect.
    ///
    /// Default: 500 ms
    #[serde(with = "duration_millis", rename = "debounce_ms")]
    pub debounce: Duration,

    /// Whether filters go to the data source or apply to the displayed page.
    ///
    /// Default: remote
    pub filter_mode: FilterMode,

    /// Row selection behavior.
    ///
    /// Default: multi
    #[serde(skip)]
    pub selection_mode: SelectionMode,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::Five,
            debounce: Duration::from_millis(500),
            filter_mode: FilterMode::Remote,
            selection_mode: SelectionMode::Multi,
        }
    }
}

impl TableConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the filter debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the filter mode.
    pub fn with_filter_mode(mut self, filter_mode: FilterMode) -> Self {
        self.filter_mode = filter_mode;
        self
    }

    /// Sets the selection mode.
    pub fn with_selection_mode(mut self, selection_mode: SelectionMode) -> Self {
        self.selection_mode = selection_mode;
        self
    }

    /// Parses a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

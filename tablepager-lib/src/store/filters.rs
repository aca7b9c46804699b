//! Column filter state.

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tokio::time::Instant;

use crate::debounce::Debounced;
use crate::model::FilterDescriptor;
use crate::model::FilterSet;
use crate::model::Row;

/// Where column filters are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Filters go to the data source and become part of the query identity.
    #[default]
    Remote,
    /// Filters narrow the displayed page without a refetch.
    Local,
}

/// Per-column filter descriptors with debounced propagation.
///
/// Edits land in the live set immediately (that is what an input shows) and
/// reach the settled set after the debounce delay. Only the settled set is
/// ever sent to the data source or applied to rows.
#[derive(Debug, Clone)]
pub struct FilterStore {
    mode: FilterMode,
    filters: Debounced<FilterSet>,
}

impl FilterStore {
    /// Creates a store with the initial descriptors already settled.
    pub fn new(mode: FilterMode, initial: FilterSet, delay: Duration) -> Self {
        Self {
            mode,
            filters: Debounced::new(initial, delay),
        }
    }

    /// Returns the filter mode.
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Replaces the live descriptor for `column`.
    ///
    /// Returns `false` if the descriptor is unchanged. Nothing else happens
    /// until the debounce settles.
    pub fn set_filter(&mut self, column: &str, filter: FilterDescriptor, now: Instant) -> bool {
        if self.filters.value().get(column) == Some(&filter) {
            return false;
        }
        self.filters.update(
            |set| {
                set.insert(column, filter);
            },
            now,
        );
        true
    }

    /// Sets the text value of an already registered text filter.
    ///
    /// Returns `false` if the column has no filter registered.
    pub fn set_text(&mut self, column: &str, value: &str, now: Instant) -> bool {
        let Some(current) = self.filters.value().get(column) else {
            return false;
        };
        let next = current.with_text_value(value);
        self.set_filter(column, next, now)
    }

    /// Removes the live descriptor for `column`.
    pub fn remove_filter(&mut self, column: &str, now: Instant) -> bool {
        if !self.filters.value().contains(column) {
            return false;
        }
        self.filters.update(
            |set| {
                set.remove(column);
            },
            now,
        );
        true
    }

    /// Promotes the live set once the debounce is over.
    ///
    /// Returns `true` if the settled set changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let before = self.filters.settled().clone();
        match self.filters.poll(now) {
            Some(after) => *after != before,
            None => false,
        }
    }

    /// Settles the live set immediately. Returns `true` if it changed.
    pub fn flush(&mut self) -> bool {
        let before = self.filters.settled().clone();
        *self.filters.flush() != before
    }

    /// Returns when pending edits settle.
    pub fn deadline(&self) -> Option<Instant> {
        self.filters.deadline()
    }

    /// Returns the descriptors as currently edited.
    pub fn live(&self) -> &FilterSet {
        self.filters.value()
    }

    /// Returns the descriptors in effect.
    pub fn settled(&self) -> &FilterSet {
        self.filters.settled()
    }

    /// Returns the filters that belong in the query identity.
    ///
    /// Only active settled filters count, so clearing an input lands back on
    /// the unfiltered identity. Empty in local mode.
    pub fn remote_filters(&self) -> FilterSet {
        match self.mode {
            FilterMode::Remote => self.filters.settled().active(),
            FilterMode::Local => FilterSet::new(),
        }
    }

    /// Returns `true` if `row` passes the local filters.
    ///
    /// Always `true` in remote mode; the data source already filtered.
    pub fn accepts<R: Row>(&self, row: &R) -> bool {
        match self.mode {
            FilterMode::Remote => true,
            FilterMode::Local => self.filters.settled().matches(row),
        }
    }

    /// Returns `true` if `column` has a filter registered.
    pub fn is_filterable(&self, column: &str) -> bool {
        self.filters.value().contains(column)
    }
}

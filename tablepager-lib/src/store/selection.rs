//! Row selection on the displayed page.

use std::collections::HashSet;
use std::fmt;

/// Selection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Rows cannot be selected.
    None,
    /// At most one row is selected.
    Single,
    /// Any number of rows may be selected (checkbox style).
    #[default]
    Multi,
}

/// A change to the selection.
///
/// Either a full replacement or a read-modify-write function of the previous
/// set, so toggles compose.
pub enum SelectionUpdate {
    /// Replace the selection.
    Replace(HashSet<String>),
    /// Compute the new selection from the previous one.
    With(Box<dyn FnOnce(&HashSet<String>) -> HashSet<String> + Send>),
}

impl SelectionUpdate {
    /// Builds a read-modify-write update.
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&HashSet<String>) -> HashSet<String> + Send + 'static,
    {
        Self::With(Box::new(f))
    }
}

impl From<HashSet<String>> for SelectionUpdate {
    fn from(set: HashSet<String>) -> Self {
        Self::Replace(set)
    }
}

impl fmt::Debug for SelectionUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(set) => f.debug_tuple("Replace").field(set).finish(),
            Self::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Selected row ids.
///
/// Only rows on the displayed page are meaningful; the table clears the set on
/// every page transition, refetch and query change.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    mode: SelectionMode,
    selected: HashSet<String>,
}

impl Selection {
    /// Creates an empty selection in the given mode.
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            selected: HashSet::new(),
        }
    }

    /// Returns the selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Toggles one row. Returns `true` if the selection changed.
    pub fn toggle(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        match self.mode {
            SelectionMode::None => false,
            SelectionMode::Single => {
                if self.selected.contains(&id) {
                    self.selected.clear();
                } else {
                    self.selected.clear();
                    self.selected.insert(id);
                }
                true
            }
            SelectionMode::Multi => {
                if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
                true
            }
        }
    }

    /// Applies an update. Returns `true` if the selection changed.
    ///
    /// Ids for which `selectable` is `false` are dropped from the result.
    /// [`SelectionMode::None`] keeps nothing, and [`SelectionMode::Single`]
    /// refuses a result with more than one id.
    pub fn apply(&mut self, update: SelectionUpdate, selectable: impl Fn(&str) -> bool) -> bool {
        let mut next = match update {
            SelectionUpdate::Replace(set) => set,
            SelectionUpdate::With(f) => f(&self.selected),
        };
        next.retain(|id| selectable(id));

        match self.mode {
            SelectionMode::None => next.clear(),
            SelectionMode::Single if next.len() > 1 => return false,
            _ => {}
        }

        if next == self.selected {
            return false;
        }
        self.selected = next;
        true
    }

    /// Returns `true` if `id` is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Clears the selection. Returns `true` if anything was selected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.selected.is_empty();
        self.selected.clear();
        changed
    }

    /// Returns the selected ids.
    pub fn ids(&self) -> &HashSet<String> {
        &self.selected
    }

    /// Returns the number of selected rows.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_toggle() {
        let mut selection = Selection::new(SelectionMode::Multi);
        assert!(selection.toggle("1"));
        assert!(selection.toggle("2"));
        assert_eq!(selection.len(), 2);
        assert!(selection.toggle("1"));
        assert!(!selection.is_selected("1"));
        assert!(selection.is_selected("2"));
    }

    #[test]
    fn test_single_toggle_replaces() {
        let mut selection = Selection::new(SelectionMode::Single);
        selection.toggle("1");
        selection.toggle("2");
        assert_eq!(selection.len(), 1);
        assert!(selection.is_selected("2"));
    }

    #[test]
    fn test_none_mode_ignores_everything() {
        let mut selection = Selection::new(SelectionMode::None);
        assert!(!selection.toggle("1"));
        assert!(!selection.apply(SelectionUpdate::Replace(["1".to_string()].into()), |_| true));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_updater_reads_previous() {
        let mut selection = Selection::new(SelectionMode::Multi);
        selection.toggle("a");
        let changed = selection.apply(
            SelectionUpdate::with(|prev| {
                let mut next = prev.clone();
                next.insert("b".to_string());
                next
            }),
            |_| true,
        );
        assert!(changed);
        assert!(selection.is_selected("a"));
        assert!(selection.is_selected("b"));

        assert!(!selection.apply(SelectionUpdate::with(|prev| prev.clone()), |_| true));
    }

    #[test]
    fn test_single_refuses_many() {
        let mut selection = Selection::new(SelectionMode::Single);
        selection.toggle("a");

        let many: HashSet<String> = ["b", "c"].map(String::from).into();
        assert!(!selection.apply(SelectionUpdate::Replace(many), |_| true));
        assert_eq!(selection.ids(), &HashSet::from(["a".to_string()]));

        let one: HashSet<String> = ["b".to_string()].into();
        assert!(selection.apply(SelectionUpdate::Replace(one), |_| true));
        assert!(selection.is_selected("b"));
    }

    #[test]
    fn test_unselectable_ids_are_dropped() {
        let mut selection = Selection::new(SelectionMode::Multi);
        let update: HashSet<String> = ["1", "2", "999"].map(String::from).into();
        assert!(selection.apply(SelectionUpdate::Replace(update), |id| id != "999"));
        assert_eq!(selection.len(), 2);
        assert!(!selection.is_selected("999"));
    }

    #[test]
    fn test_clear_reports_change() {
        let mut selection = Selection::new(SelectionMode::Multi);
        assert!(!selection.clear());
        selection.toggle("x");
        assert!(selection.clear());
        assert!(selection.is_empty());
    }
}

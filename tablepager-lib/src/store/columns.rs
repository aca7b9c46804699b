//! Column definitions and sizing.

/// A table column.
///
/// # Examples
///
/// ```
/// use tablepager_lib::store::ColumnDef;
///
/// let columns = vec![
///     ColumnDef::new("id", "ID").width(60),
///     ColumnDef::new("title", "Title").width(240).min_width(120),
///     ColumnDef::new("rating.rate", "Rating"),
/// ];
/// # let _ = columns;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column id, also the row field it displays.
    pub id: String,
    /// Header text.
    pub header: String,
    /// Current width in pixels.
    pub width: u32,
    /// Smallest width a resize may produce.
    pub min_width: u32,
    /// Largest width a resize may produce.
    pub max_width: u32,
}

impl ColumnDef {
    /// Default column width.
    pub const DEFAULT_WIDTH: u32 = 150;
    /// Default lower resize bound.
    pub const DEFAULT_MIN_WIDTH: u32 = 20;
    /// Default upper resize bound.
    pub const DEFAULT_MAX_WIDTH: u32 = u16::MAX as u32;

    /// Creates a column with the default sizing.
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            width: Self::DEFAULT_WIDTH,
            min_width: Self::DEFAULT_MIN_WIDTH,
            max_width: Self::DEFAULT_MAX_WIDTH,
        }
    }

    /// Sets the width.
    pub fn width(mut self, width: u32) -> Self {
        self.width = width.clamp(self.min_width, self.max_width);
        self
    }

    /// Sets the lower resize bound.
    pub fn min_width(mut self, min: u32) -> Self {
        self.min_width = min.min(self.max_width);
        self.width = self.width.max(self.min_width);
        self
    }

    /// Sets the upper resize bound.
    pub fn max_width(mut self, max: u32) -> Self {
        self.max_width = max.max(self.min_width);
        self.width = self.width.min(self.max_width);
        self
    }
}

/// Ordered column list with resize support.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    columns: Vec<ColumnDef>,
}

impl Columns {
    /// Creates a column list.
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// Resizes a column, clamped to its bounds.
    ///
    /// Returns `false` for an unknown column or when the width is unchanged.
    pub fn resize(&mut self, id: &str, width: u32) -> bool {
        let Some(column) = self.columns.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        let width = width.clamp(column.min_width, column.max_width);
        if column.width == width {
            return false;
        }
        column.width = width;
        true
    }

    /// Returns the column with the given id.
    pub fn get(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Returns all columns in display order.
    pub fn as_slice(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Returns the sum of all column widths.
    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|c| c.width).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_clamps() {
        let mut columns = Columns::new(vec![
            ColumnDef::new("title", "Title").min_width(100).max_width(300),
        ]);

        assert!(columns.resize("title", 50));
        assert_eq!(columns.get("title").unwrap().width, 100);
        assert!(columns.resize("title", 1000));
        assert_eq!(columns.get("title").unwrap().width, 300);
        assert!(!columns.resize("title", 301));
    }

    #[test]
    fn test_resize_unknown_column() {
        let mut columns = Columns::new(vec![ColumnDef::new("id", "ID")]);
        assert!(!columns.resize("price", 80));
    }

    #[test]
    fn test_total_width() {
        let columns = Columns::new(vec![
            ColumnDef::new("id", "ID").width(50),
            ColumnDef::new("title", "Title").width(200),
        ]);
        assert_eq!(columns.total_width(), 250);
    }
}

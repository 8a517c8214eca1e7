//! Column layout: partition N rows into K visual columns.
//!
//! Renderers stream rows in order and ask the layout, per row index,
//! whether a column boundary falls immediately before it. Ordered lists
//! additionally re-emit a start marker at each boundary so numbering stays
//! visually contiguous across columns.

use serde::{Deserialize, Serialize};

/// Precomputed layout for a fixed row count and column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    total_rows: usize,
    columns: usize,
    rows_per_column: usize,
    width_percent: usize,
    responsive: bool,
}

impl ColumnLayout {
    /// Create a layout for `total_rows` rows across `columns` columns.
    ///
    /// `columns == 0` is a caller error, normalized to a single column with
    /// a responsive-layout hint. `columns <= 1` disables column layout
    /// entirely.
    pub fn new(total_rows: usize, columns: usize) -> Self {
        let responsive = columns == 0;
        let columns = columns.max(1);
        let rows_per_column = total_rows.div_ceil(columns).max(1);
        Self {
            total_rows,
            columns,
            rows_per_column,
            width_percent: 100 / columns,
            responsive,
        }
    }

    /// Number of columns after normalization.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Rows per column, `ceil(total_rows / columns)`.
    pub fn rows_per_column(&self) -> usize {
        self.rows_per_column
    }

    /// Column width as a whole percentage, `floor(100 / columns)`.
    pub fn width_percent(&self) -> usize {
        self.width_percent
    }

    /// True when the caller asked for responsive (auto) columns.
    pub fn is_responsive(&self) -> bool {
        self.responsive
    }

    /// True when column markup should be emitted at all.
    pub fn is_active(&self) -> bool {
        self.columns > 1
    }

    /// Does a column boundary fall immediately before row `index`?
    ///
    /// Row 0 always starts column 0 and is never a boundary; no boundary
    /// exists at or past the end.
    pub fn is_boundary(&self, index: usize) -> bool {
        self.is_active()
            && index > 0
            && index < self.total_rows
            && index % self.rows_per_column == 0
    }

    /// Start number an ordered list must resume with when the boundary
    /// before row `index` is crossed.
    pub fn continuation_start(&self, index: usize) -> usize {
        index + 1
    }
}

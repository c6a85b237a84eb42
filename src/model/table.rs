//! Table types.

use super::paragraph::{plain_text, Inline};
use serde::{Deserialize, Serialize};

/// A GFM table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column alignments, one per column
    pub alignments: Vec<Alignment>,

    /// Header row (may be empty)
    pub header: TableRow,

    /// Body rows
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body row.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of body rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest of header, alignments and rows).
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.len())
            .chain([self.header.cells.len(), self.alignments.len()])
            .max()
            .unwrap_or(0)
    }

    /// Check if the table has neither header nor body cells.
    pub fn is_empty(&self) -> bool {
        self.header.cells.is_empty() && self.rows.iter().all(|r| r.cells.is_empty())
    }

    /// Alignment of the given column.
    pub fn alignment(&self, column: usize) -> Alignment {
        self.alignments.get(column).copied().unwrap_or_default()
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        std::iter::once(&self.header)
            .chain(self.rows.iter())
            .filter(|row| !row.cells.is_empty())
            .map(TableRow::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A row of table cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a row from cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }

    /// Get plain text with tab-separated cells.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(TableCell::plain_text)
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A single table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Inline content of the cell
    pub content: Vec<Inline>,
}

impl TableCell {
    /// Create a cell holding plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Inline::text(text)],
        }
    }

    /// Get plain text of the cell.
    pub fn plain_text(&self) -> String {
        plain_text(&self.content)
    }
}

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// No explicit alignment (rendered left)
    #[default]
    None,
    /// Left aligned
    Left,
    /// Centered
    Center,
    /// Right aligned
    Right,
}

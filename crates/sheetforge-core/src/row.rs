//! Row types

use crate::cell::{Cell, CellAddress, CellValue};

/// A worksheet row and the cells written into it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    /// Row number (1-based)
    pub index: u32,
    /// Custom height in points (None = default)
    pub height: Option<f64>,
    /// Cells in write order
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create an empty row
    pub fn new(index: u32) -> Self {
        Self {
            index,
            height: None,
            cells: Vec::new(),
        }
    }

    /// Set a custom height
    pub fn with_height(mut self, height: Option<f64>) -> Self {
        self.height = height;
        self
    }

    /// Append a cell in the given column
    pub fn push(&mut self, column: u32, value: CellValue, style_index: Option<u32>) {
        self.cells.push(
            Cell::new(
                CellAddress {
                    row: self.index,
                    column,
                },
                value,
            )
            .with_style(style_index),
        );
    }

    /// Get the cell in a column
    pub fn cell(&self, column: u32) -> Option<&Cell> {
        self.cells.iter().find(|c| c.address.column == column)
    }

    /// Get the cell in a column for modification
    pub fn cell_mut(&mut self, column: u32) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.address.column == column)
    }

    /// Check if row has any cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highest column holding a cell
    pub fn last_column(&self) -> Option<u32> {
        self.cells.iter().map(|c| c.address.column).max()
    }
}

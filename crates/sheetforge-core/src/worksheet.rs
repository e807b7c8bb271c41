//! Worksheet: rows, merged ranges and placed images

use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellRange, CellValue};
use crate::error::Result;
use crate::image::{ImageAnchor, ImagePlacement};
use crate::row::Row;

/// A single sheet of a document
///
/// Rows are kept ordered by index. Merged ranges are stored as requested;
/// overlapping merges are accepted.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, Row>,
    merges: Vec<CellRange>,
    images: Vec<ImagePlacement>,
    anchor: ImageAnchor,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // === Rows ===

    /// Insert a row, replacing any row with the same index
    pub fn insert_row(&mut self, row: Row) -> Option<Row> {
        self.rows.insert(row.index, row)
    }

    /// Get a row by index
    pub fn row(&self, index: u32) -> Option<&Row> {
        self.rows.get(&index)
    }

    /// Get a row by index for modification
    pub fn row_mut(&mut self, index: u32) -> Option<&mut Row> {
        self.rows.get_mut(&index)
    }

    /// Get or create the row at `index`
    pub fn row_entry(&mut self, index: u32) -> &mut Row {
        self.rows.entry(index).or_insert_with(|| Row::new(index))
    }

    /// Rows in index order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Number of rows holding data or settings
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Highest row index in use
    pub fn last_row(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    // === Cells ===

    /// Get a cell
    pub fn cell(&self, address: CellAddress) -> Option<&Cell> {
        self.rows.get(&address.row)?.cell(address.column)
    }

    /// Get a cell for modification
    pub fn cell_mut(&mut self, address: CellAddress) -> Option<&mut Cell> {
        self.rows.get_mut(&address.row)?.cell_mut(address.column)
    }

    /// Write a cell, creating the row if needed and replacing an existing cell
    pub fn set_cell(&mut self, address: CellAddress, value: CellValue, style_index: Option<u32>) {
        let row = self.row_entry(address.row);
        match row.cell_mut(address.column) {
            Some(cell) => {
                cell.value = value;
                cell.style_index = style_index;
            }
            None => row.push(address.column, value, style_index),
        }
    }

    /// Parse an A1 reference and get the cell behind it
    pub fn cell_at(&self, reference: &str) -> Result<Option<&Cell>> {
        Ok(self.cell(CellAddress::parse(reference)?))
    }

    // === Merges ===

    /// Record a merged range
    pub fn add_merge(&mut self, range: CellRange) {
        self.merges.push(range);
    }

    /// Merged ranges in insertion order
    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    // === Images ===

    /// Probe `data` and anchor it at the top-left corner of a cell
    ///
    /// Returns the placement id.
    pub fn place_image(
        &mut self,
        address: CellAddress,
        data: Vec<u8>,
        description: impl Into<String>,
        custom_width_px: Option<u32>,
    ) -> Result<u32> {
        let placement = self.anchor.place(
            address.column,
            address.row,
            data,
            description,
            custom_width_px,
        )?;
        let id = placement.id;
        self.images.push(placement);
        Ok(id)
    }

    /// Add an already-sized placement, as read from a document
    pub fn push_image(&mut self, placement: ImagePlacement) {
        self.anchor.observe(placement.id);
        self.images.push(placement);
    }

    /// Placed images in placement order
    pub fn images(&self) -> &[ImagePlacement] {
        &self.images
    }

    /// Id the next placed image will receive
    pub fn next_image_id(&self) -> u32 {
        self.anchor.next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::fixtures::png;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_set_and_get_cell() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell(addr("B3"), CellValue::text("x"), Some(6));
        ws.set_cell(addr("A1"), CellValue::number("1"), None);

        assert_eq!(ws.cell(addr("B3")).map(|c| c.value.as_str()), Some("x"));
        assert_eq!(ws.cell(addr("B3")).and_then(|c| c.style_index), Some(6));
        assert!(ws.cell(addr("C3")).is_none());
        assert_eq!(ws.last_row(), Some(3));

        let indices: Vec<u32> = ws.rows().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn test_set_cell_replaces() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell(addr("A1"), CellValue::text("old"), Some(1));
        ws.set_cell(addr("A1"), CellValue::text("new"), None);
        let row = ws.row(1).unwrap();
        assert_eq!(row.cells.len(), 1);
        assert_eq!(row.cells[0].value, CellValue::text("new"));
        assert_eq!(row.cells[0].style_index, None);
    }

    #[test]
    fn test_overlapping_merges_are_kept() {
        let mut ws = Worksheet::new("Data");
        ws.add_merge(CellRange::parse("A1:C1").unwrap());
        ws.add_merge(CellRange::parse("B1:D1").unwrap());
        assert_eq!(ws.merges().len(), 2);
    }

    #[test]
    fn test_image_ids_continue_after_loaded_images() {
        let mut ws = Worksheet::new("Data");
        let mut loaded = ImageAnchor::new();
        let mut placement = loaded.place(1, 1, png(2, 2, None), "", None).unwrap();
        placement.id = 5;
        ws.push_image(placement);

        let id = ws.place_image(addr("B2"), png(2, 2, None), "b.png", None).unwrap();
        assert_eq!(id, 6);
        assert_eq!(ws.images().len(), 2);
    }
}

//! Region styling: apply one style mutation over a rectangular range
//!
//! Every touched cell ends up with a new cell-format entry cloned from its
//! current one. Borders are computed once per region and broadcast; fills,
//! alignments and fonts are cloned and appended for each cell.

use log::trace;

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::style::{Alignment, Border, BorderLineStyle, Color, Fill, Font, StyleCatalog, StyleRecord};
use crate::worksheet::Worksheet;

/// How a mutation's catalog entries are shared across a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStrategy {
    /// One new entry, derived from the first existing cell, assigned to all cells
    Broadcast,
    /// One new entry per existing cell
    PerCell,
}

/// A single style change requested for a region
#[derive(Debug, Clone, PartialEq)]
pub enum StyleMutation {
    /// All four sides set to this line, in the system foreground color
    Border(BorderLineStyle),
    /// Solid fill in this color
    Fill(Color),
    Alignment(Alignment),
    Font(Font),
}

impl StyleMutation {
    /// Parse a fill color given as hex (`#` prefix optional)
    pub fn fill_rgb(rgb: &str) -> Result<Self> {
        Color::from_hex(rgb)
            .map(StyleMutation::Fill)
            .ok_or_else(|| Error::other(format!("Invalid fill color: {}", rgb)))
    }

    pub fn strategy(&self) -> ApplyStrategy {
        match self {
            StyleMutation::Border(_) => ApplyStrategy::Broadcast,
            _ => ApplyStrategy::PerCell,
        }
    }

    /// Apply to a detached record, appending whatever table entry it needs
    fn mutate(&self, record: &mut StyleRecord, catalog: &mut StyleCatalog) {
        match self {
            StyleMutation::Border(line) => {
                record.border_id =
                    catalog.insert_border(Border::all(*line, Color::SYSTEM_FOREGROUND));
            }
            StyleMutation::Fill(color) => {
                record.fill_id = catalog.insert_fill(Fill::solid_over_auto(*color));
            }
            StyleMutation::Alignment(alignment) => {
                record.alignment = Some(alignment.clone());
            }
            StyleMutation::Font(font) => {
                record.font_id = catalog.insert_font(font.clone());
            }
        }
    }
}

/// Applies style mutations to ranges of one worksheet
pub struct RegionStyler<'a> {
    catalog: &'a mut StyleCatalog,
    sheet: &'a mut Worksheet,
}

impl<'a> RegionStyler<'a> {
    pub fn new(catalog: &'a mut StyleCatalog, sheet: &'a mut Worksheet) -> Self {
        Self { catalog, sheet }
    }

    /// Apply a mutation to every existing cell of `range`, row by row
    ///
    /// Missing cells are skipped, never created. Returns the number of cells
    /// touched.
    pub fn apply(&mut self, range: CellRange, mutation: &StyleMutation) -> usize {
        let touched = match mutation.strategy() {
            ApplyStrategy::Broadcast => self.broadcast(range, mutation),
            ApplyStrategy::PerCell => self.per_cell(range, mutation),
        };
        trace!(
            "{:?} over {} touched {} cells, cell formats now {}",
            mutation,
            range,
            touched,
            self.catalog.cell_formats().len()
        );
        touched
    }

    fn broadcast(&mut self, range: CellRange, mutation: &StyleMutation) -> usize {
        let mut shared: Option<u32> = None;
        let mut touched = 0;

        for address in range.cells() {
            let Some(cell) = self.sheet.cell_mut(address) else {
                continue;
            };
            let index = match shared {
                Some(index) => index,
                None => {
                    let mut record = self.catalog.clone_format(cell.style_index);
                    mutation.mutate(&mut record, self.catalog);
                    let index = self.catalog.insert_cell_format(record);
                    shared = Some(index);
                    index
                }
            };
            cell.style_index = Some(index);
            touched += 1;
        }

        touched
    }

    fn per_cell(&mut self, range: CellRange, mutation: &StyleMutation) -> usize {
        let mut touched = 0;

        for address in range.cells() {
            let Some(cell) = self.sheet.cell_mut(address) else {
                continue;
            };
            let mut record = self.catalog.clone_format(cell.style_index);
            mutation.mutate(&mut record, self.catalog);
            cell.style_index = Some(self.catalog.insert_cell_format(record));
            touched += 1;
        }

        touched
    }

    /// Set all four border sides over the range
    pub fn apply_border(&mut self, range: CellRange, line: BorderLineStyle) -> usize {
        self.apply(range, &StyleMutation::Border(line))
    }

    /// Solid-fill the range with a hex color (`#` prefix optional)
    pub fn apply_fill(&mut self, range: CellRange, rgb: &str) -> Result<usize> {
        Ok(self.apply(range, &StyleMutation::fill_rgb(rgb)?))
    }

    /// Set the alignment of the range
    pub fn apply_alignment(&mut self, range: CellRange, alignment: &Alignment) -> usize {
        self.apply(range, &StyleMutation::Alignment(alignment.clone()))
    }

    /// Set the font of the range
    pub fn apply_font(&mut self, range: CellRange, font: &Font) -> usize {
        self.apply(range, &StyleMutation::Font(font.clone()))
    }

    /// Style index of a cell, if it exists
    pub fn style_index(&self, address: CellAddress) -> Option<u32> {
        self.sheet.cell(address).and_then(|c| c.style_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::style::HorizontalAlignment;
    use pretty_assertions::assert_eq;

    fn sheet_2x2() -> Worksheet {
        let mut ws = Worksheet::new("S");
        for reference in ["A1", "B1", "A2", "B2"] {
            ws.set_cell(
                CellAddress::parse(reference).unwrap(),
                CellValue::text(reference),
                Some(6),
            );
        }
        ws
    }

    fn range(s: &str) -> CellRange {
        CellRange::parse(s).unwrap()
    }

    #[test]
    fn test_border_is_broadcast() {
        let mut catalog = StyleCatalog::new();
        let mut ws = sheet_2x2();
        let borders = catalog.borders().len();
        let formats = catalog.cell_formats().len();

        let touched = RegionStyler::new(&mut catalog, &mut ws)
            .apply_border(range("A1:B2"), BorderLineStyle::Thin);

        assert_eq!(touched, 4);
        assert_eq!(catalog.borders().len(), borders + 1);
        assert_eq!(catalog.cell_formats().len(), formats + 1);

        let styles: Vec<Option<u32>> = range("A1:B2")
            .cells()
            .map(|a| ws.cell(a).and_then(|c| c.style_index))
            .collect();
        assert_eq!(styles, vec![Some(12); 4]);

        let record = catalog.cell_format(12).unwrap();
        assert_eq!(record.number_format_id, 167);
        let border = catalog.border(record.border_id).unwrap();
        assert_eq!(
            border.left.map(|e| e.color),
            Some(Color::SYSTEM_FOREGROUND)
        );
    }

    #[test]
    fn test_fill_is_per_cell() {
        let mut catalog = StyleCatalog::new();
        let mut ws = sheet_2x2();
        let fills = catalog.fills().len();
        let formats = catalog.cell_formats().len();

        let touched = RegionStyler::new(&mut catalog, &mut ws)
            .apply_fill(range("A1:B2"), "#FFEE00")
            .unwrap();

        assert_eq!(touched, 4);
        assert_eq!(catalog.fills().len(), fills + 4);
        assert_eq!(catalog.cell_formats().len(), formats + 4);
        assert_eq!(
            catalog.fill(fills as u32),
            Some(&Fill::solid_over_auto(Color::rgb(0xFF, 0xEE, 0x00)))
        );
    }

    #[test]
    fn test_alignment_and_font_per_cell() {
        let mut catalog = StyleCatalog::new();
        let mut ws = sheet_2x2();
        let fonts = catalog.fonts().len();
        let formats = catalog.cell_formats().len();
        let mut styler = RegionStyler::new(&mut catalog, &mut ws);

        let alignment = Alignment::new().with_horizontal(HorizontalAlignment::Center);
        assert_eq!(styler.apply_alignment(range("A1:B1"), &alignment), 2);
        assert_eq!(styler.apply_font(range("A2:B2"), &Font::new().with_bold(true)), 2);
        let a1 = styler.style_index(CellAddress::parse("A1").unwrap());

        assert_eq!(catalog.cell_formats().len(), formats + 4);
        assert_eq!(catalog.fonts().len(), fonts + 2);
        let record = catalog.cell_format(a1.unwrap()).unwrap();
        assert_eq!(record.alignment, Some(alignment));
    }

    #[test]
    fn test_missing_cells_are_skipped() {
        let mut catalog = StyleCatalog::new();
        let mut ws = sheet_2x2();
        let formats = catalog.cell_formats().len();

        let mut styler = RegionStyler::new(&mut catalog, &mut ws);
        assert_eq!(styler.apply_border(range("C3:D4"), BorderLineStyle::Thin), 0);
        assert_eq!(styler.apply_border(range("B2:C3"), BorderLineStyle::Thin), 1);

        assert_eq!(catalog.cell_formats().len(), formats + 1);
        assert!(ws.cell(CellAddress::parse("C3").unwrap()).is_none());
    }

    #[test]
    fn test_invalid_fill_color() {
        let mut catalog = StyleCatalog::new();
        let mut ws = sheet_2x2();
        let result = RegionStyler::new(&mut catalog, &mut ws).apply_fill(range("A1"), "blue");
        assert!(result.is_err());
    }

    #[test]
    fn test_unstyled_cell_clones_default() {
        let mut catalog = StyleCatalog::new();
        let mut ws = Worksheet::new("S");
        ws.set_cell(CellAddress::parse("A1").unwrap(), CellValue::number("1"), None);

        RegionStyler::new(&mut catalog, &mut ws).apply_border(range("A1"), BorderLineStyle::Medium);

        let index = ws.cell(CellAddress::parse("A1").unwrap()).and_then(|c| c.style_index);
        let record = catalog.cell_format(index.unwrap()).unwrap();
        assert_eq!(record.number_format_id, 0);
        assert!(!record.apply_number_format);
    }
}

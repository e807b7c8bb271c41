//! The style catalog: append-only tables of formatting records
//!
//! Every table is an arena addressed by insertion position. Cells refer to
//! entries of the cell-format table, which in turn refer to fonts, fills,
//! borders and number formats by index (number formats by id). Nothing is
//! ever deduplicated: styling the same region twice grows the tables twice.

use log::{trace, warn};

use super::number_format::{builtin_code, FIRST_CUSTOM_ID};
use super::table::Table;
use super::{Alignment, Border, BorderLineStyle, Color, Fill, Font, NumberFormat};
use crate::error::{Error, Result};

/// Composite cell format, the entry cells point at through their style index
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleRecord {
    pub number_format_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    pub alignment: Option<Alignment>,
    pub apply_number_format: bool,
}

impl StyleRecord {
    /// Record referencing the given table entries, with the number format applied
    pub fn preset(number_format_id: u32, font_id: u32, fill_id: u32, border_id: u32) -> Self {
        Self {
            number_format_id,
            font_id,
            fill_id,
            border_id,
            alignment: None,
            apply_number_format: true,
        }
    }
}

/// Indices of the cell-format presets created by [`StyleCatalog::new`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellFormatPreset {
    /// General, no formatting
    General = 0,
    /// Built-in short date (id 14)
    ShortDate = 1,
    /// Built-in `#,##0.00` (id 4)
    Decimal = 2,
    /// `dd/mm/yyyy hh:mm:ss`
    DateTime = 3,
    /// `#,##0.0000`
    Decimal4 = 4,
    /// `#,##0.00` (custom)
    Decimal2 = 5,
    /// Forced text (`@`)
    Text = 6,
    /// Forced text, bold font
    TextBold = 7,
    /// Forced text, thin border on all sides
    TextBordered = 8,
    /// 2-decimal, light-blue fill, top and bottom border
    DecimalHighlighted = 9,
    /// Forced text, light-blue fill, top and bottom border
    TextHighlighted = 10,
    /// Forced text, bold, dodger-blue fill, top and bottom border
    TextHeader = 11,
}

impl CellFormatPreset {
    /// Position of the preset in the cell-format table
    pub const fn index(self) -> u32 {
        self as u32
    }
}

/// Settings shared by everything that reads or writes cell values
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogSettings {
    /// Decimal separator for displayed and parsed numbers; stored text always uses `.`
    pub decimal_separator: char,
    /// `chrono` pattern for rendering date serials on read
    pub short_date_format: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            short_date_format: "%d/%m/%Y".to_string(),
        }
    }
}

/// Append-only style tables for one document
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    fonts: Table<Font>,
    fills: Table<Fill>,
    borders: Table<Border>,
    number_formats: Table<NumberFormat>,
    cell_formats: Table<StyleRecord>,
    next_number_format_id: u32,
    settings: CatalogSettings,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleCatalog {
    /// Create a catalog holding the preset palette
    pub fn new() -> Self {
        Self::with_settings(CatalogSettings::default())
    }

    /// Create a catalog holding the preset palette, with custom settings
    pub fn with_settings(settings: CatalogSettings) -> Self {
        let mut catalog = Self::empty(settings);
        catalog.bootstrap();
        catalog
    }

    /// Create a catalog with no entries at all
    ///
    /// Used when loading an existing document, whose own tables are then
    /// appended entry by entry.
    pub fn empty(settings: CatalogSettings) -> Self {
        Self {
            fonts: Table::new(),
            fills: Table::new(),
            borders: Table::new(),
            number_formats: Table::new(),
            cell_formats: Table::new(),
            next_number_format_id: FIRST_CUSTOM_ID,
            settings,
        }
    }

    fn bootstrap(&mut self) {
        self.insert_font(Font::default());
        self.insert_font(Font::default().with_bold(true));

        self.insert_fill(Fill::None);
        self.insert_fill(Fill::gray125());
        self.insert_fill(Fill::solid(Color::LIGHT_BLUE));
        self.insert_fill(Fill::solid(Color::DODGER_BLUE));

        self.insert_border(Border::new());
        self.insert_border(Border::all(BorderLineStyle::Thin, Color::Auto));
        self.insert_border(Border::top_bottom(BorderLineStyle::Thin, Color::Auto));

        let date_time = self.insert_number_format("dd/mm/yyyy hh:mm:ss");
        let decimal4 = self.insert_number_format("#,##0.0000");
        let decimal2 = self.insert_number_format("#,##0.00");
        let text = self.insert_number_format("@");

        self.insert_cell_format(StyleRecord::default());
        for (number_format_id, font_id, fill_id, border_id) in [
            (14, 0, 0, 0),
            (4, 0, 0, 0),
            (date_time, 0, 0, 0),
            (decimal4, 0, 0, 0),
            (decimal2, 0, 0, 0),
            (text, 0, 0, 0),
            (text, 1, 0, 0),
            (text, 0, 0, 1),
            (decimal2, 0, 2, 2),
            (text, 0, 2, 2),
            (text, 1, 3, 2),
        ] {
            self.insert_cell_format(StyleRecord::preset(
                number_format_id,
                font_id,
                fill_id,
                border_id,
            ));
        }
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Append a font, returning its index
    pub fn insert_font(&mut self, font: Font) -> u32 {
        self.fonts.push(font)
    }

    /// Append a fill, returning its index
    pub fn insert_fill(&mut self, fill: Fill) -> u32 {
        self.fills.push(fill)
    }

    /// Append a border, returning its index
    pub fn insert_border(&mut self, border: Border) -> u32 {
        self.borders.push(border)
    }

    /// Append a custom number format, returning its newly allocated id
    pub fn insert_number_format<S: Into<String>>(&mut self, code: S) -> u32 {
        let id = self.next_number_format_id;
        self.number_formats.push(NumberFormat::new(id, code));
        self.next_number_format_id += 1;
        id
    }

    /// Append a number format that already carries an id, as found in a loaded document
    pub fn register_number_format(&mut self, format: NumberFormat) -> u32 {
        let id = format.id;
        self.next_number_format_id = self.next_number_format_id.max(id.saturating_add(1));
        self.number_formats.push(format);
        id
    }

    /// Append a cell format, returning its style index
    pub fn insert_cell_format(&mut self, record: StyleRecord) -> u32 {
        let index = self.cell_formats.push(record);
        trace!("cell format table grew to {}", self.cell_formats.len());
        index
    }

    /// Cell format at a style index
    pub fn cell_format(&self, index: u32) -> Result<&StyleRecord> {
        self.cell_formats
            .get(index)
            .ok_or(Error::UnknownStyleIndex(index))
    }

    /// Detached copy of the cell format at `index`, or a default record
    ///
    /// An absent or unknown index yields `StyleRecord::default()`; the unknown
    /// case is logged.
    pub fn clone_format(&self, index: Option<u32>) -> StyleRecord {
        match index {
            None => StyleRecord::default(),
            Some(index) => match self.cell_format(index) {
                Ok(record) => record.clone(),
                Err(e) => {
                    warn!("{}; falling back to the default cell format", e);
                    StyleRecord::default()
                }
            },
        }
    }

    /// Number-format id behind a style index (0 for unknown indices)
    pub fn number_format_id(&self, style_index: u32) -> u32 {
        self.cell_format(style_index)
            .map(|record| record.number_format_id)
            .unwrap_or(0)
    }

    /// Format code for a number-format id, custom entries first
    pub fn number_format_code(&self, id: u32) -> Option<&str> {
        self.number_formats
            .iter()
            .rev()
            .find(|f| f.id == id)
            .map(|f| f.code.as_str())
            .or_else(|| builtin_code(id))
    }

    pub fn font(&self, index: u32) -> Option<&Font> {
        self.fonts.get(index)
    }

    pub fn fill(&self, index: u32) -> Option<&Fill> {
        self.fills.get(index)
    }

    pub fn border(&self, index: u32) -> Option<&Border> {
        self.borders.get(index)
    }

    pub fn fonts(&self) -> &Table<Font> {
        &self.fonts
    }

    pub fn fills(&self) -> &Table<Fill> {
        &self.fills
    }

    pub fn borders(&self) -> &Table<Border> {
        &self.borders
    }

    pub fn number_formats(&self) -> &Table<NumberFormat> {
        &self.number_formats
    }

    pub fn cell_formats(&self) -> &Table<StyleRecord> {
        &self.cell_formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::PatternType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bootstrap_tables() {
        let catalog = StyleCatalog::new();
        assert_eq!(catalog.fonts().len(), 2);
        assert_eq!(catalog.fills().len(), 4);
        assert_eq!(catalog.borders().len(), 3);
        assert_eq!(catalog.cell_formats().len(), 12);

        let ids: Vec<u32> = catalog.number_formats().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![164, 165, 166, 167]);
        assert_eq!(catalog.number_format_code(164), Some("dd/mm/yyyy hh:mm:ss"));
        assert_eq!(catalog.number_format_code(167), Some("@"));
        assert_eq!(catalog.number_format_code(14), Some("d/m/yyyy"));
    }

    #[test]
    fn test_bootstrap_presets() {
        let catalog = StyleCatalog::new();
        let tuples: Vec<(u32, u32, u32, u32)> = catalog
            .cell_formats()
            .iter()
            .map(|r| (r.number_format_id, r.font_id, r.fill_id, r.border_id))
            .collect();
        assert_eq!(
            tuples,
            vec![
                (0, 0, 0, 0),
                (14, 0, 0, 0),
                (4, 0, 0, 0),
                (164, 0, 0, 0),
                (165, 0, 0, 0),
                (166, 0, 0, 0),
                (167, 0, 0, 0),
                (167, 1, 0, 0),
                (167, 0, 0, 1),
                (166, 0, 2, 2),
                (167, 0, 2, 2),
                (167, 1, 3, 2),
            ]
        );
        assert!(!catalog.cell_formats()[0].apply_number_format);
        assert!(catalog
            .cell_formats()
            .iter()
            .skip(1)
            .all(|r| r.apply_number_format));
        assert_eq!(CellFormatPreset::TextHeader.index(), 11);
    }

    #[test]
    fn test_bootstrap_palette_entries() {
        let catalog = StyleCatalog::new();
        assert_eq!(catalog.font(0).map(|f| f.size), Some(10.0));
        assert_eq!(catalog.font(1).map(|f| f.bold), Some(true));
        assert_eq!(catalog.fill(1).map(Fill::pattern), Some(PatternType::Gray125));
        assert_eq!(catalog.fill(3), Some(&Fill::solid(Color::DODGER_BLUE)));
        assert!(catalog.border(0).map(Border::is_empty).unwrap_or(false));
        assert!(catalog.border(2).map(|b| b.left.is_none()).unwrap_or(false));
    }

    #[test]
    fn test_insert_appends_without_dedup() {
        let mut catalog = StyleCatalog::new();
        let a = catalog.insert_cell_format(StyleRecord::default());
        let b = catalog.insert_cell_format(StyleRecord::default());
        assert_eq!((a, b), (12, 13));
        assert_eq!(catalog.insert_fill(Fill::None), 4);
        assert_eq!(catalog.insert_number_format("0.0"), 168);
        assert_eq!(catalog.insert_number_format("0.0"), 169);
    }

    #[test]
    fn test_register_number_format_advances_ids() {
        let mut catalog = StyleCatalog::empty(CatalogSettings::default());
        catalog.register_number_format(NumberFormat::new(170, "0.000"));
        assert_eq!(catalog.insert_number_format("0.0"), 171);
    }

    #[test]
    fn test_clone_format_falls_back_to_default() {
        let catalog = StyleCatalog::new();
        assert_eq!(catalog.clone_format(None), StyleRecord::default());
        assert_eq!(catalog.clone_format(Some(999)), StyleRecord::default());
        assert_eq!(catalog.clone_format(Some(11)).fill_id, 3);
        assert!(matches!(
            catalog.cell_format(999),
            Err(Error::UnknownStyleIndex(999))
        ));
        assert_eq!(catalog.number_format_id(999), 0);
    }
}

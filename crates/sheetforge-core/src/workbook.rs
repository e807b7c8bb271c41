//! Workbook: one style catalog shared by an ordered list of worksheets

use crate::error::{Error, Result};
use crate::style::{CatalogSettings, StyleCatalog};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A spreadsheet document
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    catalog: StyleCatalog,
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook with the preset style palette
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty workbook with custom catalog settings
    pub fn with_settings(settings: CatalogSettings) -> Self {
        Self::with_catalog(StyleCatalog::with_settings(settings))
    }

    /// Create a workbook around an existing catalog (e.g. one loaded from a file)
    pub fn with_catalog(catalog: StyleCatalog) -> Self {
        Self {
            catalog,
            worksheets: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut StyleCatalog {
        &mut self.catalog
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a worksheet by name (case-insensitive)
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).map(|i| &self.worksheets[i])
    }

    /// Find a sheet's index by name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets
            .iter()
            .position(|ws| ws.name().eq_ignore_ascii_case(name))
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Catalog and one worksheet, borrowed mutably together
    pub fn split_mut(&mut self, index: usize) -> Option<(&mut StyleCatalog, &mut Worksheet)> {
        let sheet = self.worksheets.get_mut(index)?;
        Some((&mut self.catalog, sheet))
    }

    /// Append a worksheet after validating its name
    pub fn add_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    /// Validate a sheet name against the naming rules and existing sheets
    pub fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        let lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == lower)
        {
            return Err(Error::DuplicateSheetName(name.to_string()));
        }

        Ok(())
    }
}

/// Hands a finished workbook to a storage format
pub trait PersistenceSink {
    /// Error type of the sink; core errors must convert into it
    type Error: From<Error>;

    /// Store the workbook
    fn persist(&mut self, workbook: &Workbook) -> std::result::Result<(), Self::Error>;
}

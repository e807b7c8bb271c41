//! Cell value types

use std::fmt;

use super::CellAddress;

/// Stored value of a cell
///
/// Numbers keep their stored text so decimal values survive exactly as
/// written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValue {
    /// Numeric value, as its storage text (e.g. "12.50")
    Number(String),
    /// Text value
    Text(String),
    /// Boolean value, only produced when loading existing documents
    Boolean(bool),
}

impl CellValue {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    /// Create a numeric value from its storage text
    pub fn number<S: Into<String>>(s: S) -> Self {
        CellValue::Number(s.into())
    }

    /// Get the stored text
    pub fn as_str(&self) -> &str {
        match self {
            CellValue::Number(s) | CellValue::Text(s) => s,
            CellValue::Boolean(true) => "1",
            CellValue::Boolean(false) => "0",
        }
    }

    /// Check if this is a number
    pub fn is_number(&self) -> bool {
        matches!(self, CellValue::Number(_))
    }

    /// Check if this is text
    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A written cell: location, value and optional style index
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub address: CellAddress,
    pub value: CellValue,
    /// Index into the catalog's cell-format table; `None` means unstyled
    pub style_index: Option<u32>,
}

impl Cell {
    pub fn new(address: CellAddress, value: CellValue) -> Self {
        Self {
            address,
            value,
            style_index: None,
        }
    }

    /// Set the style index
    pub fn with_style(mut self, style_index: Option<u32>) -> Self {
        self.style_index = style_index;
        self
    }

    /// A1-style reference of the cell
    pub fn reference(&self) -> String {
        self.address.to_a1_string()
    }
}

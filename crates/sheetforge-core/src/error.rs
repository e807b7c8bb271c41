//! Error types for sheetforge-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetforge-core
#[derive(Debug, Error)]
pub enum Error {
    /// Column or row number below 1
    #[error("Address out of range: column {column}, row {row} (both must be >= 1)")]
    AddressOutOfRange { column: u32, row: u32 },

    /// Invalid cell reference text
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Image source could not be found or opened
    #[error("Could not find file '{0}'.")]
    MissingImageSource(String),

    /// Image bytes in a format we cannot place
    #[error("Image type could not be determined: {0}")]
    UnsupportedImage(String),

    /// Style index with no cell format behind it
    #[error("Unknown style index: {0}")]
    UnknownStyleIndex(u32),

    /// A cell's text could not be converted to the requested field type
    #[error("Cell {reference}, value \"{value}\" => conversion error {target}")]
    ValueConversionFailure {
        reference: String,
        value: String,
        target: &'static str,
    },

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// IO error while reading an image source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether the error is recovered by substituting its message into a cell
    pub fn is_missing_image_source(&self) -> bool {
        matches!(self, Error::MissingImageSource(_))
    }
}

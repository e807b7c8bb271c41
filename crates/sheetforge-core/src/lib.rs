//! # sheetforge-core
//!
//! Style and layout engine for the sheetforge spreadsheet library.
//!
//! This crate holds the in-memory document and everything that builds it:
//! - [`CellAddress`] and [`CellRange`] - 1-based cell addressing and A1 references
//! - [`StyleCatalog`] - append-only font, fill, border, number format and cell format tables
//! - [`RegionStyler`] - applies a style mutation to a rectangle of cells
//! - [`SheetAssembler`] - lays out text lines and tables row by row, then finalizes them into a [`Worksheet`]
//! - [`ImageProbe`] / [`ImageAnchor`] - picture sizing and placement
//! - [`RecordImporter`] - reads typed records back out of a stored sheet
//!
//! Storage formats live in separate crates that implement [`PersistenceSink`].
//!
//! ## Example
//!
//! ```rust
//! use sheetforge_core::{CellStyle, MemoryImageSource, SheetAssembler, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let mut assembler = SheetAssembler::new();
//! assembler
//!     .append_text("Quarterly report", Some(CellStyle::new().with_merge_count(3)))
//!     .unwrap()
//!     .append_line();
//! assembler.append_text(42, None).unwrap();
//!
//! let report = assembler
//!     .finalize(&mut workbook, "Report", &MemoryImageSource::new())
//!     .unwrap();
//! assert_eq!(report.merges, 1);
//!
//! let sheet = workbook.worksheet_by_name("Report").unwrap();
//! assert_eq!(sheet.cell_at("A3").unwrap().unwrap().value.as_str(), "42");
//! ```

pub mod assembler;
pub mod cell;
pub mod codec;
pub mod error;
pub mod export;
pub mod image;
pub mod import;
pub mod region;
pub mod row;
pub mod style;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use assembler::{
    AssemblerState, CellStyle, FieldDescriptor, FinalizeReport, ImageField, SheetAssembler,
    TableSetting,
};
pub use cell::{
    cell_reference, column_label, column_number, parse_reference, Cell, CellAddress, CellRange,
    CellValue, ParsedReference,
};
pub use codec::{classify, decode, FieldValue, RawCell, RawCellType};
pub use error::{Error, Result};
pub use export::export_table;
pub use image::{
    FsImageSource, ImageAnchor, ImageFormat, ImageInfo, ImagePlacement, ImageProbe, ImageSource,
    MemoryImageSource, Resolution,
};
pub use import::{FieldBinding, RawRow, RawSheet, Record, RecordImporter, TargetType};
pub use region::{ApplyStrategy, RegionStyler, StyleMutation};
pub use row::Row;
pub use workbook::{PersistenceSink, Workbook};
pub use worksheet::Worksheet;

// Re-export all style types for convenience
pub use style::{
    Alignment, Border, BorderEdge, BorderLineStyle, CatalogSettings, CellFormatPreset, Color,
    Fill, Font, HorizontalAlignment, NumberFormat, PatternType, StyleCatalog, StyleRecord,
    VerticalAlignment,
};

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;

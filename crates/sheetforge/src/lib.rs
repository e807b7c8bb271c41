//! # sheetforge
//!
//! Build styled XLSX reports from typed records, and read records back.
//!
//! ## Features
//!
//! - Row-by-row sheet assembly with deferred region styling and merges
//! - Table export from field descriptors, with embedded images
//! - Appending sheets to existing workbooks
//! - Typed record import keyed by header captions
//!
//! ## Example
//!
//! ```rust
//! use sheetforge::prelude::*;
//!
//! struct Item {
//!     name: &'static str,
//!     qty: i32,
//! }
//!
//! let items = vec![Item { name: "Bolt", qty: 12 }, Item { name: "Nut", qty: 40 }];
//! let fields = vec![
//!     FieldDescriptor::new("name", |i: &Item| i.name).with_display_name("Name"),
//!     FieldDescriptor::new("qty", |i: &Item| i.qty).with_display_name("Quantity"),
//! ];
//!
//! let mut builder = SheetBuilder::new();
//! builder.append_table(&items, &fields, &TableSetting::new()).unwrap();
//!
//! // Save to file
//! // builder.save_to_file("stock.xlsx", "Stock", true).unwrap();
//! ```

pub mod builder;
pub mod prelude;

pub use builder::{export_to_file, read_records, read_records_with_settings, SheetBuilder};

// Re-export core types
pub use sheetforge_core::{
    cell_reference,
    column_label,
    column_number,
    export_table,
    parse_reference,
    // Style types
    Alignment,
    ApplyStrategy,
    Border,
    BorderEdge,
    BorderLineStyle,
    CatalogSettings,
    // Cell types
    Cell,
    CellAddress,
    CellFormatPreset,
    CellRange,
    CellStyle,
    CellValue,
    Color,
    // Error types
    Error,
    // Assembly types
    FieldDescriptor,
    FieldValue,
    Fill,
    FinalizeReport,
    Font,
    FsImageSource,
    HorizontalAlignment,
    ImageField,
    ImageFormat,
    ImagePlacement,
    ImageSource,
    MemoryImageSource,
    NumberFormat,
    PatternType,
    PersistenceSink,
    Result,
    Row,
    SheetAssembler,
    StyleCatalog,
    StyleRecord,
    TableSetting,
    VerticalAlignment,
    // Main types
    Workbook,
    Worksheet,
    // Import types
    FieldBinding,
    Record,
    RecordImporter,
    TargetType,
    // Constants
    MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use sheetforge_xlsx::{RawDocument, XlsxError, XlsxReader, XlsxResult, XlsxSink, XlsxWriter};

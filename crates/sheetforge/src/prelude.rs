//! Prelude module - common imports for sheetforge users
//!
//! ```rust
//! use sheetforge::prelude::*;
//! ```

pub use crate::{
    // Entry points
    export_to_file,
    read_records,
    // Style types
    Alignment,
    BorderLineStyle,
    CatalogSettings,
    CellAddress,
    CellRange,
    CellStyle,
    CellValue,
    Color,
    // Error types
    Error,
    // Assembly types
    FieldDescriptor,
    FieldValue,
    Font,
    HorizontalAlignment,
    // Import types
    FieldBinding,
    Record,
    Result,
    SheetBuilder,
    TableSetting,
    TargetType,
    VerticalAlignment,
    // Main types
    Workbook,
    Worksheet,
    // I/O types
    XlsxError,
    XlsxReader,
    XlsxWriter,
};

//! # sheetforge-xlsx
//!
//! XLSX (Office Open XML) reader and writer for sheetforge.
//!
//! The writer stores the style catalog verbatim, so cell style indices in the
//! package are the catalog's own indices. The reader restores a
//! [`Workbook`](sheetforge_core::Workbook) that can be appended to, or
//! exposes a sheet's raw cells for record import.

pub mod error;
pub mod reader;
pub mod sink;
pub mod writer;

mod drawing;
mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::{RawDocument, XlsxReader};
pub use sink::XlsxSink;
pub use writer::XlsxWriter;

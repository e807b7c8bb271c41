//! Cell-related types and address arithmetic
//!
//! - [`CellAddress`] / [`CellRange`] - 1-based locations
//! - [`column_label`], [`column_number`], [`cell_reference`], [`parse_reference`] - A1 codec
//! - [`Cell`] / [`CellValue`] - stored cells

mod address;
mod value;

pub use address::{
    cell_reference, column_label, column_number, parse_reference, CellAddress, CellRange,
    CellRangeIterator, ParsedReference,
};
pub use value::{Cell, CellValue};

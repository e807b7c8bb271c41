//! Cell formatting records and the catalog that owns them
//!
//! - [`StyleCatalog`] - append-only tables referenced by index
//! - [`StyleRecord`] - composite cell format
//! - [`Font`], [`Fill`], [`Border`], [`Alignment`], [`NumberFormat`] - table entries
//! - [`Color`] - color representation

mod alignment;
mod border;
mod catalog;
mod color;
mod fill;
mod font;
mod number_format;
mod table;

pub use alignment::{Alignment, HorizontalAlignment, VerticalAlignment};
pub use border::{Border, BorderEdge, BorderLineStyle};
pub use catalog::{CatalogSettings, CellFormatPreset, StyleCatalog, StyleRecord};
pub use color::Color;
pub use fill::{Fill, PatternType};
pub use font::Font;
pub use number_format::{builtin_code, FormatCode, NumberFormat, FIRST_CUSTOM_ID};
pub use table::Table;

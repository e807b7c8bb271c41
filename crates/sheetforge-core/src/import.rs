//! Reading typed records back out of a sheet
//!
//! Row 1 is the header. Each header cell is matched to a [`FieldBinding`] by
//! its description (case-insensitive, trimmed) or its exact name; every later
//! row becomes a [`Record`] whose values are converted to the binding's
//! target type.

use std::str::FromStr;

use ahash::AHashMap;
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use rust_decimal::Decimal;

use crate::cell::parse_reference;
use crate::codec::{date_from_serial, decode, FieldValue, RawCell};
use crate::error::{Error, Result};
use crate::style::{CatalogSettings, StyleCatalog};

/// Type a column's text is converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Text,
    Int,
    Long,
    Decimal,
    Float,
    Bool,
    DateTime,
}

impl TargetType {
    /// Name used in conversion errors
    pub fn name(&self) -> &'static str {
        match self {
            TargetType::Text => "String",
            TargetType::Int => "Int32",
            TargetType::Long => "Int64",
            TargetType::Decimal => "Decimal",
            TargetType::Float => "Double",
            TargetType::Bool => "Boolean",
            TargetType::DateTime => "DateTime",
        }
    }
}

/// How one record field is found in the header and typed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub name: String,
    /// Header caption to match, compared case-insensitively
    pub description: Option<String>,
    pub target: TargetType,
    /// Blank cells become absent instead of failing conversion
    pub nullable: bool,
}

impl FieldBinding {
    pub fn new<S: Into<String>>(name: S, target: TargetType) -> Self {
        Self {
            name: name.into(),
            description: None,
            target,
            nullable: false,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Whether a header caption names this binding
    fn matches(&self, caption: &str) -> bool {
        let by_description = self
            .description
            .as_deref()
            .map(|d| d.trim().to_lowercase() == caption.trim().to_lowercase())
            .unwrap_or(false);
        by_description || self.name == caption
    }
}

/// A stored row, as cells in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub index: u32,
    pub cells: Vec<RawCell>,
}

/// A stored sheet, ready for importing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<RawRow>,
}

/// One imported row: field name to typed value, absent fields omitted
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: AHashMap<String, FieldValue>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text of a field, if present
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Converts the rows of a stored sheet into [`Record`]s
pub struct RecordImporter<'a> {
    bindings: &'a [FieldBinding],
    catalog: &'a StyleCatalog,
    shared_strings: &'a [String],
}

impl<'a> RecordImporter<'a> {
    pub fn new(
        bindings: &'a [FieldBinding],
        catalog: &'a StyleCatalog,
        shared_strings: &'a [String],
    ) -> Self {
        Self {
            bindings,
            catalog,
            shared_strings,
        }
    }

    /// Import every data row of `sheet`
    ///
    /// Rows whose fields all come out absent are skipped. The first
    /// conversion failure aborts the import.
    pub fn import(&self, sheet: &RawSheet) -> Result<Vec<Record>> {
        let mut columns: AHashMap<String, usize> = AHashMap::new();
        let mut records = Vec::new();

        for row in &sheet.rows {
            let mut record = Record::default();

            for (position, cell) in row.cells.iter().enumerate() {
                let column = column_key(cell, position);
                let text = decode(cell, self.catalog, self.shared_strings)?;

                if row.index == 1 {
                    let caption = text.unwrap_or_default();
                    if let Some(binding) = self.bindings.iter().position(|b| b.matches(&caption)) {
                        columns.insert(column, binding);
                    }
                    continue;
                }

                let Some(&binding) = columns.get(&column) else {
                    continue;
                };
                let binding = &self.bindings[binding];
                let reference = cell
                    .reference
                    .clone()
                    .unwrap_or_else(|| format!("{}{}", column, row.index));

                if let Some(value) = convert(
                    text.as_deref(),
                    binding,
                    &reference,
                    self.catalog.settings(),
                )? {
                    record.values.insert(binding.name.clone(), value);
                }
            }

            if row.index > 1 && !record.is_empty() {
                records.push(record);
            }
        }

        debug!(
            "imported {} records from sheet '{}'",
            records.len(),
            sheet.name
        );
        Ok(records)
    }
}

/// Column letters of a cell, or its 1-based position when it has no reference
fn column_key(cell: &RawCell, position: usize) -> String {
    cell.reference
        .as_deref()
        .and_then(|r| parse_reference(r).column)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or_else(|| (position + 1).to_string())
}

/// Convert decoded text to a binding's target type
///
/// `Ok(None)` means the field is absent.
fn convert(
    text: Option<&str>,
    binding: &FieldBinding,
    reference: &str,
    settings: &CatalogSettings,
) -> Result<Option<FieldValue>> {
    let blank = text.map(|t| t.trim().is_empty()).unwrap_or(true);
    if blank && binding.nullable {
        return Ok(None);
    }
    let Some(text) = text else {
        return match binding.target {
            TargetType::Text => Ok(None),
            _ => Err(failure(reference, "", binding.target)),
        };
    };

    let trimmed = text.trim();
    let value = match binding.target {
        TargetType::Text => Some(FieldValue::Text(text.to_string())),
        TargetType::Int => trimmed.parse::<i32>().ok().map(FieldValue::Int),
        TargetType::Long => trimmed.parse::<i64>().ok().map(FieldValue::Long),
        TargetType::Decimal => parse_decimal(trimmed, settings).map(FieldValue::Decimal),
        TargetType::Float => parse_decimal(trimmed, settings)
            .and_then(|d| f64::from_str(&d.to_string()).ok())
            .or_else(|| trimmed.parse::<f64>().ok())
            .map(FieldValue::Float),
        TargetType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(FieldValue::Bool(true)),
            "false" => Some(FieldValue::Bool(false)),
            _ => None,
        },
        TargetType::DateTime => parse_date(trimmed, settings).map(FieldValue::DateTime),
    };

    value
        .map(Some)
        .ok_or_else(|| failure(reference, text, binding.target))
}

fn failure(reference: &str, value: &str, target: TargetType) -> Error {
    Error::ValueConversionFailure {
        reference: reference.to_string(),
        value: value.to_string(),
        target: target.name(),
    }
}

fn parse_decimal(text: &str, settings: &CatalogSettings) -> Option<Decimal> {
    let normalized = text.replace(settings.decimal_separator, ".").replace(',', ".");
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

fn parse_date(text: &str, settings: &CatalogSettings) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(text, &settings.short_date_format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| text.parse::<f64>().ok().and_then(date_from_serial))
}

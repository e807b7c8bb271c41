//! Value classification (write path) and decoding (read path)
//!
//! On write, native values are mapped to a storage type and an optional
//! cell-format preset. On read, the stored text is turned back into display
//! text using the cell's storage type and number-format id, with date serials
//! rendered through the catalog's short-date pattern.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::cell::CellValue;
use crate::error::{Error, Result};
use crate::style::{FormatCode, StyleCatalog};

/// A native value handed to the builder by a field accessor
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    Int(i32),
    Long(i64),
    Decimal(Decimal),
    Float(f64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
    /// Absent value, written as empty text
    Empty,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Long(v) => write!(f, "{}", v),
            FieldValue::Decimal(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::DateTime(v) => write!(f, "{}", v),
            FieldValue::Empty => Ok(()),
        }
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Long(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        FieldValue::Decimal(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Empty, Into::into)
    }
}

/// Storage decision for one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub value: CellValue,
    /// Cell-format preset to apply, if any
    pub style_index: Option<u32>,
}

/// Map a native value to its storage type and preset format
///
/// Integers are stored as unstyled numbers. Decimals are stored as numbers
/// styled with the `Decimal` preset; stored numeric text always uses `.`.
/// Anything else becomes text through its `Display` rendering.
pub fn classify(value: &FieldValue) -> Classified {
    match value {
        FieldValue::Int(v) => Classified {
            value: CellValue::Number(v.to_string()),
            style_index: None,
        },
        FieldValue::Long(v) => Classified {
            value: CellValue::Number(v.to_string()),
            style_index: None,
        },
        FieldValue::Decimal(v) => Classified {
            value: CellValue::Number(v.to_string()),
            style_index: Some(FormatCode::Decimal.id()),
        },
        other => Classified {
            value: CellValue::Text(other.to_string()),
            style_index: None,
        },
    }
}

/// Storage type attribute of a cell as found in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawCellType {
    /// Explicit number (`t="n"`)
    Number,
    /// Index into the shared string table (`t="s"`)
    SharedString,
    /// Inline rich string (`t="inlineStr"`)
    InlineString,
    /// Formula string result (`t="str"`)
    FormulaString,
    /// Boolean (`t="b"`)
    Boolean,
    /// Error literal (`t="e"`)
    Error,
    /// ISO 8601 date (`t="d"`)
    Date,
}

impl RawCellType {
    /// Parse the `t` attribute of a cell
    pub fn from_attr(t: &str) -> Option<Self> {
        Some(match t {
            "n" => RawCellType::Number,
            "s" => RawCellType::SharedString,
            "inlineStr" => RawCellType::InlineString,
            "str" => RawCellType::FormulaString,
            "b" => RawCellType::Boolean,
            "e" => RawCellType::Error,
            "d" => RawCellType::Date,
            _ => return None,
        })
    }
}

/// A cell exactly as stored, before any decoding
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCell {
    /// A1 reference, if the document carried one
    pub reference: Option<String>,
    /// Storage type; `None` means number or date
    pub data_type: Option<RawCellType>,
    pub style_index: Option<u32>,
    /// Stored text (`None` for cells without a value)
    pub value: Option<String>,
}

/// Turn a stored cell back into display text
///
/// Returns `Ok(None)` for cells without a value. Only cells with no storage
/// type take the number/date path; a shared-string index past the end of the
/// table is a conversion failure.
pub fn decode(
    cell: &RawCell,
    catalog: &StyleCatalog,
    shared_strings: &[String],
) -> Result<Option<String>> {
    let Some(raw) = cell.value.as_deref() else {
        return Ok(None);
    };

    let decoded = match cell.data_type {
        None => {
            let settings = catalog.settings();
            match cell.style_index {
                Some(style_index)
                    if FormatCode::is_date_id(catalog.number_format_id(style_index)) =>
                {
                    format_date_serial(raw, &settings.short_date_format)
                }
                _ => display_number(raw, settings.decimal_separator),
            }
        }
        Some(RawCellType::SharedString) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i))
            .cloned()
            .ok_or_else(|| Error::ValueConversionFailure {
                reference: cell.reference.clone().unwrap_or_default(),
                value: raw.to_string(),
                target: "shared string",
            })?,
        Some(RawCellType::Boolean) => {
            if raw == "0" {
                "false".to_string()
            } else {
                "true".to_string()
            }
        }
        Some(_) => raw.to_string(),
    };

    Ok(Some(decoded))
}

/// Stored numeric text with the display separator in place of `.`
fn display_number(raw: &str, separator: char) -> String {
    if separator == '.' {
        raw.to_string()
    } else {
        raw.replace('.', &separator.to_string())
    }
}

fn serial_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Date for a serial day number (days since 1899-12-30, fraction = time of day)
pub fn date_from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * 86_400_000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    serial_epoch().checked_add_signed(Duration::milliseconds(millis as i64))
}

/// Serial day number for a date
pub fn serial_from_date(date: NaiveDateTime) -> f64 {
    let elapsed = date - serial_epoch();
    elapsed.num_milliseconds() as f64 / 86_400_000.0
}

/// Render stored serial text as a short date; unparsable text renders empty
fn format_date_serial(raw: &str, pattern: &str) -> String {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(date_from_serial)
        .map(|d| d.format(pattern).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::CatalogSettings;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn raw(data_type: Option<RawCellType>, style_index: Option<u32>, value: &str) -> RawCell {
        RawCell {
            reference: Some("B2".into()),
            data_type,
            style_index,
            value: Some(value.into()),
        }
    }

    #[test]
    fn test_classify_integers_unstyled() {
        assert_eq!(
            classify(&FieldValue::Int(42)),
            Classified {
                value: CellValue::number("42"),
                style_index: None
            }
        );
        assert_eq!(
            classify(&FieldValue::Long(-7_000_000_000)).value,
            CellValue::number("-7000000000")
        );
    }

    #[test]
    fn test_classify_decimal_uses_decimal_preset() {
        let classified = classify(
            &FieldValue::Decimal(Decimal::from_str("1234.50").unwrap()),
        );
        assert_eq!(classified.value, CellValue::number("1234.50"));
        assert_eq!(classified.style_index, Some(2));
    }

    #[test]
    fn test_stored_decimal_ignores_display_separator() {
        let classified = classify(&FieldValue::Decimal(Decimal::new(314, 2)));
        assert_eq!(classified.value, CellValue::number("3.14"));

        let catalog = StyleCatalog::with_settings(CatalogSettings {
            decimal_separator: ',',
            ..CatalogSettings::default()
        });
        let cell = raw(None, classified.style_index, classified.value.as_str());
        assert_eq!(
            decode(&cell, &catalog, &[]).unwrap(),
            Some("3,14".into())
        );
        // Date serials keep their own rendering
        let cell = raw(None, Some(1), "45292.5");
        assert_eq!(
            decode(&cell, &catalog, &[]).unwrap(),
            Some("01/01/2024".into())
        );
    }

    #[test]
    fn test_classify_everything_else_is_text() {
        assert_eq!(
            classify(&FieldValue::Float(1.5)).value,
            CellValue::text("1.5")
        );
        assert_eq!(
            classify(&FieldValue::Bool(true)).value,
            CellValue::text("true")
        );
        assert_eq!(
            classify(&FieldValue::Empty).value,
            CellValue::text("")
        );
        assert_eq!(
            classify(&FieldValue::from(None::<i32>)).value,
            CellValue::text("")
        );
    }

    #[test]
    fn test_decimal_roundtrip_through_decode() {
        let catalog = StyleCatalog::new();
        let value = Decimal::from_str("98.765").unwrap();
        let classified = classify(&FieldValue::Decimal(value));

        let cell = raw(None, classified.style_index, classified.value.as_str());
        let decoded = decode(&cell, &catalog, &[]).unwrap().unwrap();
        assert_eq!(Decimal::from_str(&decoded).unwrap(), value);
    }

    #[test]
    fn test_decode_missing_value() {
        let catalog = StyleCatalog::new();
        let cell = RawCell::default();
        assert_eq!(decode(&cell, &catalog, &[]).unwrap(), None);
    }

    #[test]
    fn test_decode_unstyled_number() {
        let catalog = StyleCatalog::new();
        assert_eq!(
            decode(&raw(None, None, "45000"), &catalog, &[]).unwrap(),
            Some("45000".into())
        );
    }

    #[test]
    fn test_decode_date_serial() {
        let catalog = StyleCatalog::new();
        // Preset 1 carries the built-in short date (id 14)
        let cell = raw(None, Some(1), "45292.75");
        assert_eq!(
            decode(&cell, &catalog, &[]).unwrap(),
            Some("01/01/2024".into())
        );

        // Preset 4 carries id 165, which decodes as a date too
        let cell = raw(None, Some(4), "1");
        assert_eq!(
            decode(&cell, &catalog, &[]).unwrap(),
            Some("31/12/1899".into())
        );
    }

    #[test]
    fn test_decode_unparsable_serial_is_empty() {
        let catalog = StyleCatalog::new();
        let cell = raw(None, Some(1), "soon");
        assert_eq!(decode(&cell, &catalog, &[]).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_decode_unknown_style_is_general() {
        let catalog = StyleCatalog::new();
        let cell = raw(None, Some(500), "45292");
        assert_eq!(
            decode(&cell, &catalog, &[]).unwrap(),
            Some("45292".into())
        );
    }

    #[test]
    fn test_decode_typed_cells() {
        let catalog = StyleCatalog::new();
        let strings = vec!["alpha".to_string(), "beta".to_string()];

        assert_eq!(
            decode(&raw(Some(RawCellType::SharedString), None, "1"), &catalog, &strings).unwrap(),
            Some("beta".into())
        );
        assert_eq!(
            decode(&raw(Some(RawCellType::Boolean), None, "0"), &catalog, &strings).unwrap(),
            Some("false".into())
        );
        assert_eq!(
            decode(&raw(Some(RawCellType::Boolean), None, "1"), &catalog, &strings).unwrap(),
            Some("true".into())
        );
        // Explicitly typed numbers skip date decoding
        assert_eq!(
            decode(&raw(Some(RawCellType::Number), Some(1), "45292"), &catalog, &strings).unwrap(),
            Some("45292".into())
        );
    }

    #[test]
    fn test_decode_shared_string_out_of_range() {
        let catalog = StyleCatalog::new();
        let err = decode(&raw(Some(RawCellType::SharedString), None, "9"), &catalog, &[])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ValueConversionFailure { ref reference, .. } if reference == "B2"
        ));
    }

    #[test]
    fn test_serial_conversion() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        assert_eq!(serial_from_date(date), 45292.75);
        assert_eq!(date_from_serial(45292.75), Some(date));
        assert_eq!(date_from_serial(f64::NAN), None);
    }
}

//! Number formats

/// First id available to custom (non built-in) number formats
pub const FIRST_CUSTOM_ID: u32 = 164;

/// Custom number-format entry of the style catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumberFormat {
    /// Format id referenced by cell formats (>= 164 for custom codes)
    pub id: u32,
    /// Format code, e.g. `#,##0.00`
    pub code: String,
}

impl NumberFormat {
    pub fn new<S: Into<String>>(id: u32, code: S) -> Self {
        Self {
            id,
            code: code.into(),
        }
    }
}

/// Format code for a built-in number-format id
pub fn builtin_code(id: u32) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "d/m/yyyy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "H:mm",
        21 => "H:mm:ss",
        22 => "m/d/yyyy H:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

/// Symbolic format codes
///
/// Most are number-format ids, but `Decimal` doubles as the index of the
/// decimal cell-format preset, and `DateLong` / `Time` name ids that the
/// bootstrap palette spends on the 4- and 2-decimal custom formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FormatCode {
    General = 0,
    Number = 1,
    Decimal = 2,
    Decimal2 = 3,
    Decimal3 = 4,
    Percentage = 10,
    Scientific = 11,
    Fraction = 12,
    DateShort = 14,
    Accounting2 = 43,
    Accounting = 44,
    Text = 49,
    Currency = 164,
    DateLong = 165,
    Time = 166,
}

impl FormatCode {
    /// Numeric value of the code
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Whether a number-format id renders as a date on read
    pub fn is_date_id(id: u32) -> bool {
        id == FormatCode::DateShort.id() || id == FormatCode::DateLong.id()
    }
}

//! Cell address arithmetic
//!
//! Addresses are 1-based on both axes: column 1 is `A`, row 1 is the first row.
//! Column labels are bijective base-26 (no zero digit), so 26 is `Z` and 27 is `AA`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\$?([A-Za-z]+)?\$?([0-9]+)?\s*$").expect("static reference pattern")
});

/// Convert a 1-based column number to its letter label (1 = A, 27 = AA)
///
/// # Examples
/// ```
/// use sheetforge_core::cell::column_label;
///
/// assert_eq!(column_label(1).unwrap(), "A");
/// assert_eq!(column_label(703).unwrap(), "AAA");
/// assert!(column_label(0).is_err());
/// ```
pub fn column_label(column: u32) -> Result<String> {
    if column < 1 {
        return Err(Error::AddressOutOfRange { column, row: 1 });
    }
    Ok(label_unchecked(column))
}

/// Letters for a column already known to be at least 1
fn label_unchecked(column: u32) -> String {
    let mut label = Vec::with_capacity(4);
    let mut n = column;
    while n > 0 {
        let modulo = (n - 1) % 26;
        label.push(b'A' + modulo as u8);
        n = (n - modulo) / 26;
    }
    label.reverse();

    // Only ASCII uppercase letters were pushed
    label.into_iter().map(char::from).collect()
}

/// Convert a column label back to its 1-based number (A = 1, AA = 27)
pub fn column_number(label: &str) -> Result<u32> {
    if label.is_empty() {
        return Err(Error::InvalidAddress("empty column letters".into()));
    }

    let mut column: u32 = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidAddress(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        column = column
            .checked_mul(26)
            .and_then(|n| n.checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
            .ok_or_else(|| Error::InvalidAddress(format!("column '{}' too large", label)))?;
    }

    Ok(column)
}

/// Format an A1-style reference from a 1-based column and row
pub fn cell_reference(column: u32, row: u32) -> Result<String> {
    if row < 1 {
        return Err(Error::AddressOutOfRange { column, row });
    }
    Ok(format!("{}{}", column_label(column)?, row))
}

/// Parts of an A1-style reference, split but not resolved
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReference {
    /// Leading column letters, as written
    pub column: Option<String>,
    /// Trailing row digits
    pub row: Option<u32>,
}

/// Split a reference into its column letters and row number
///
/// The column part is returned unparsed; use [`column_number`] to resolve it.
/// Absent parts (or text that is not a reference at all) come back as `None`.
pub fn parse_reference(reference: &str) -> ParsedReference {
    let Some(caps) = REFERENCE_PATTERN.captures(reference) else {
        return ParsedReference::default();
    };

    ParsedReference {
        column: caps.get(1).map(|m| m.as_str().to_string()),
        row: caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()),
    }
}

/// A cell location, 1-based on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Row number (1-based); ordered first so addresses sort row-major
    pub row: u32,
    /// Column number (1-based, A = 1)
    pub column: u32,
}

impl CellAddress {
    /// Create an address, rejecting zero on either axis
    pub fn new(column: u32, row: u32) -> Result<Self> {
        if column < 1 || row < 1 {
            return Err(Error::AddressOutOfRange { column, row });
        }
        Ok(Self { row, column })
    }

    /// Parse a fully specified A1 reference (`$` markers are accepted and ignored)
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = parse_reference(s);
        match (parsed.column, parsed.row) {
            (Some(letters), Some(row)) => Self::new(column_number(&letters)?, row),
            (None, _) => Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            ))),
            (_, None) => Err(Error::InvalidAddress(format!("no row number in '{}'", s))),
        }
    }

    /// Format as an A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", label_unchecked(self.column), self.row)
    }

    /// Zero-based (column, row) pair, as used by drawing anchors
    pub fn zero_based(&self) -> (u32, u32) {
        (self.column - 1, self.row - 1)
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular, inclusive range of cells (e.g., "A1:C3")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    /// Top-left corner
    pub from: CellAddress,
    /// Bottom-right corner
    pub to: CellAddress,
}

impl CellRange {
    /// Create a range, normalizing so `from` is top-left and `to` bottom-right
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            from: CellAddress {
                row: a.row.min(b.row),
                column: a.column.min(b.column),
            },
            to: CellAddress {
                row: a.row.max(b.row),
                column: a.column.max(b.column),
            },
        }
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            from: addr,
            to: addr,
        }
    }

    /// Horizontal run on one row, columns `first..=last`
    pub fn on_row(row: u32, first: u32, last: u32) -> Result<Self> {
        Ok(Self::new(
            CellAddress::new(first, row)?,
            CellAddress::new(last, row)?,
        ))
    }

    /// Parse from "A1:B2" or single-cell "C3" notation
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            Some((a, b)) => Ok(Self::new(CellAddress::parse(a)?, CellAddress::parse(b)?)),
            None => Ok(Self::single(CellAddress::parse(s)?)),
        }
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.from.row
            && addr.row <= self.to.row
            && addr.column >= self.from.column
            && addr.column <= self.to.column
    }

    /// Number of rows covered
    pub fn row_count(&self) -> u32 {
        self.to.row - self.from.row + 1
    }

    /// Number of columns covered
    pub fn column_count(&self) -> u32 {
        self.to.column - self.from.column + 1
    }

    /// Total number of cells covered
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.column_count() as u64
    }

    /// Iterate over every address in the range, row by row
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.from.row,
            current_column: self.from.column,
        }
    }

    /// Format as "A1:B2" ("A1" for a single cell)
    pub fn to_a1_string(&self) -> String {
        if self.from == self.to {
            self.from.to_a1_string()
        } else {
            format!("{}:{}", self.from, self.to)
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Row-major iterator over the addresses of a [`CellRange`]
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_column: u32,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.to.row {
            return None;
        }

        let addr = CellAddress {
            row: self.current_row,
            column: self.current_column,
        };

        self.current_column += 1;
        if self.current_column > self.range.to.column {
            self.current_column = self.range.from.column;
            self.current_row += 1;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.current_row > self.range.to.row {
            return (0, Some(0));
        }
        let full_rows = (self.range.to.row - self.current_row) as usize;
        let remaining = full_rows * self.range.column_count() as usize
            + (self.range.to.column - self.current_column + 1) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_column_label() {
        assert_eq!(column_label(1).unwrap(), "A");
        assert_eq!(column_label(26).unwrap(), "Z");
        assert_eq!(column_label(27).unwrap(), "AA");
        assert_eq!(column_label(52).unwrap(), "AZ");
        assert_eq!(column_label(702).unwrap(), "ZZ");
        assert_eq!(column_label(703).unwrap(), "AAA");
        assert_eq!(column_label(16384).unwrap(), "XFD");
    }

    #[test]
    fn test_column_label_rejects_zero() {
        assert!(matches!(
            column_label(0),
            Err(Error::AddressOutOfRange { column: 0, .. })
        ));
    }

    #[test]
    fn test_column_number() {
        assert_eq!(column_number("A").unwrap(), 1);
        assert_eq!(column_number("Z").unwrap(), 26);
        assert_eq!(column_number("AA").unwrap(), 27);
        assert_eq!(column_number("zz").unwrap(), 702);
        assert!(column_number("").is_err());
        assert!(column_number("A1").is_err());
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(cell_reference(3, 4).unwrap(), "C4");
        assert_eq!(cell_reference(28, 100).unwrap(), "AB100");
        assert!(cell_reference(1, 0).is_err());
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse_reference("C4"),
            ParsedReference {
                column: Some("C".into()),
                row: Some(4)
            }
        );
        assert_eq!(
            parse_reference("$AB$12"),
            ParsedReference {
                column: Some("AB".into()),
                row: Some(12)
            }
        );
        assert_eq!(parse_reference("AB").row, None);
        assert_eq!(parse_reference("12").column, None);
        assert_eq!(parse_reference("not a ref!"), ParsedReference::default());
    }

    #[test]
    fn test_cell_address_parse_and_display() {
        let addr = CellAddress::parse("B7").unwrap();
        assert_eq!(addr.column, 2);
        assert_eq!(addr.row, 7);
        assert_eq!(addr.to_string(), "B7");
        assert_eq!(addr.zero_based(), (1, 6));

        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("7").is_err());
        assert!(CellAddress::new(0, 1).is_err());
    }

    #[test]
    fn test_address_display_matches_column_label() {
        for column in [1, 26, 27, 52, 702, 703, 16_384] {
            let addr = CellAddress::new(column, 9).unwrap();
            assert_eq!(addr.to_string(), format!("{}9", column_label(column).unwrap()));
        }
    }

    #[test]
    fn test_cell_range_iterator_is_row_major() {
        let range = CellRange::parse("A1:B2").unwrap();
        let cells: Vec<String> = range.cells().map(|a| a.to_string()).collect();
        assert_eq!(cells, vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(range.cells().len(), 4);
    }

    #[test]
    fn test_cell_range_normalizes() {
        let range = CellRange::new(
            CellAddress::parse("C3").unwrap(),
            CellAddress::parse("A1").unwrap(),
        );
        assert_eq!(range.to_string(), "A1:C3");
        assert!(range.contains(&CellAddress::parse("B2").unwrap()));
        assert!(!range.contains(&CellAddress::parse("D1").unwrap()));
    }

    fn shortlex_lt(a: &str, b: &str) -> bool {
        (a.len(), a) < (b.len(), b)
    }

    proptest! {
        #[test]
        fn prop_column_label_strictly_increasing(n in 1u32..100_000) {
            let a = column_label(n).unwrap();
            let b = column_label(n + 1).unwrap();
            prop_assert!(shortlex_lt(&a, &b));
        }

        #[test]
        fn prop_column_label_roundtrips(n in 1u32..1_000_000) {
            let label = column_label(n).unwrap();
            prop_assert_eq!(column_number(&label).unwrap(), n);
        }
    }
}

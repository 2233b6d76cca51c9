//! Cell address grammar and fast byte parsers.
//!
//! Addresses are `<Letters><Digits>` (`"B3"`); the in-memory model is 0-based,
//! so `"B3"` is row 2, column 1.

use crate::error::{CodecError, Result};

/// Maximum number of columns (XFD = 16384).
pub const MAX_COLUMN: u32 = 16384;
/// Maximum number of rows.
pub const MAX_ROW: u32 = 1_048_576;

/// A 0-based `(row, column)` pair.
pub type CellAddress = (u32, u32);

/// An inclusive 0-based rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl CellRange {
    /// Build a range from two corners in any order.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        CellRange {
            first_row: a.0.min(b.0),
            first_col: a.1.min(b.1),
            last_row: a.0.max(b.0),
            last_col: a.1.max(b.1),
        }
    }

    pub fn single(row: u32, col: u32) -> Self {
        CellRange::new((row, col), (row, col))
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    pub fn top_left(&self) -> CellAddress {
        (self.first_row, self.first_col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }
}

/// Parse an address from bytes into a 0-based (row, column).
///
/// `$` markers before the column or row are accepted and ignored.
/// This is the fast path used by the sheet parser; it never allocates.
#[inline]
pub fn parse_address_bytes(bytes: &[u8]) -> Option<CellAddress> {
    let mut i = 0usize;
    if bytes.first() == Some(&b'$') {
        i += 1;
    }

    let letters_start = i;
    let mut column: u32 = 0;
    while i < bytes.len() {
        let upper = match bytes[i] {
            b @ b'a'..=b'z' => b - 32,
            b @ b'A'..=b'Z' => b,
            _ => break,
        };
        column = column.checked_mul(26)?.checked_add((upper - b'A' + 1) as u32)?;
        if column > MAX_COLUMN {
            return None;
        }
        i += 1;
    }
    if i == letters_start {
        return None;
    }

    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }

    let mut row: u32 = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            return None;
        }
        row = row.checked_mul(10)?.checked_add((b - b'0') as u32)?;
        if row > MAX_ROW {
            return None;
        }
        i += 1;
    }
    if row == 0 {
        return None;
    }

    Some((row - 1, column - 1))
}

/// Parse an address such as `"B3"` into a 0-based (row, column).
pub fn parse_address(address: &str) -> Result<CellAddress> {
    parse_address_bytes(address.trim().as_bytes())
        .ok_or_else(|| CodecError::InvalidAddress(address.to_string()))
}

/// Format a 0-based (row, column) as an address such as `"B3"`.
///
/// [`parse_address`] inverts this only inside the sheet grid, rows below
/// [`MAX_ROW`] and columns below [`MAX_COLUMN`]. Coordinates past those limits
/// still format but do not parse back.
pub fn format_address(row: u32, col: u32) -> String {
    let mut out = column_to_letters(col);
    let mut buf = itoa::Buffer::new();
    out.push_str(buf.format(row as u64 + 1));
    out
}

/// Absolute form used by defined names: `$B$3`.
pub fn format_absolute_address(row: u32, col: u32) -> String {
    let mut buf = itoa::Buffer::new();
    format!("${}${}", column_to_letters(col), buf.format(row as u64 + 1))
}

/// Parse `"A1:B10"` (or a single address) into a range.
pub fn parse_range(range: &str) -> Result<CellRange> {
    let range = range.trim();
    match range.split_once(':') {
        Some((start, end)) => {
            let start = parse_address_bytes(start.as_bytes());
            let end = parse_address_bytes(end.as_bytes());
            match (start, end) {
                (Some(a), Some(b)) => Ok(CellRange::new(a, b)),
                _ => Err(CodecError::InvalidAddress(range.to_string())),
            }
        }
        None => parse_address(range).map(|(r, c)| CellRange::single(r, c)),
    }
}

/// Format a range; a single cell formats as one address.
pub fn format_range(range: &CellRange) -> String {
    if range.is_single_cell() {
        format_address(range.first_row, range.first_col)
    } else {
        format!(
            "{}:{}",
            format_address(range.first_row, range.first_col),
            format_address(range.last_row, range.last_col)
        )
    }
}

/// Convert column letters (e.g. "A", "AB", "XFD") to a 0-based column index.
pub fn letters_to_column(letters: &str) -> Result<u32> {
    let mut result: u32 = 0;
    for &b in letters.as_bytes() {
        let upper = match b {
            b'a'..=b'z' => b - 32,
            b'A'..=b'Z' => b,
            _ => return Err(CodecError::InvalidAddress(letters.to_string())),
        };
        result = result
            .checked_mul(26)
            .and_then(|r| r.checked_add((upper - b'A' + 1) as u32))
            .filter(|&r| r <= MAX_COLUMN)
            .ok_or_else(|| CodecError::InvalidAddress(letters.to_string()))?;
    }
    if result == 0 {
        return Err(CodecError::InvalidAddress(letters.to_string()));
    }
    Ok(result - 1)
}

/// Convert a 0-based column index to letters (0 -> "A", 27 -> "AB").
pub fn column_to_letters(col: u32) -> String {
    let mut bytes = [0u8; 8];
    let mut pos = bytes.len();
    let mut n = col as u64 + 1;
    while n > 0 {
        n -= 1;
        pos -= 1;
        bytes[pos] = b'A' + (n % 26) as u8;
        n /= 26;
    }
    String::from_utf8_lossy(&bytes[pos..]).into_owned()
}

/// Parse a u32 directly from bytes without string allocation.
#[inline]
pub fn parse_u32_bytes(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() {
        return None;
    }
    let mut result: u32 = 0;
    for &b in bytes {
        if !b.is_ascii_digit() {
            return None;
        }
        result = result.checked_mul(10)?.checked_add((b - b'0') as u32)?;
    }
    Some(result)
}

/// Parse an f64 directly from bytes, with a fast path for plain integers.
#[inline]
pub fn parse_f64_bytes(bytes: &[u8]) -> Option<f64> {
    if !bytes.is_empty() && bytes.len() < 16 && bytes.iter().all(|&b| b.is_ascii_digit()) {
        let mut result: f64 = 0.0;
        for &b in bytes {
            result = result * 10.0 + (b - b'0') as f64;
        }
        return Some(result);
    }
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("A1").unwrap(), (0, 0));
        assert_eq!(parse_address("B3").unwrap(), (2, 1));
        assert_eq!(parse_address("Z1").unwrap(), (0, 25));
        assert_eq!(parse_address("AA1").unwrap(), (0, 26));
        assert_eq!(parse_address("ab10").unwrap(), (9, 27));
        assert_eq!(parse_address("$C$7").unwrap(), (6, 2));
        assert_eq!(parse_address("XFD1048576").unwrap(), (1_048_575, 16_383));
    }

    #[test]
    fn test_parse_address_errors() {
        for bad in ["", "3B", "A", "1", "A0", "A1B", "$$A1", "A-1", "XFE1", "A1048577"] {
            assert!(
                matches!(parse_address(bad), Err(CodecError::InvalidAddress(_))),
                "{bad:?} should be rejected"
            );
        }
        // long inputs must fail without overflowing
        assert!(parse_address("AAAAAAAAAA1").is_err());
        assert!(parse_address("A99999999999999999999").is_err());
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0, 0), "A1");
        assert_eq!(format_address(2, 1), "B3");
        assert_eq!(format_address(9, 27), "AB10");
        assert_eq!(format_absolute_address(0, 2), "$C$1");
    }

    #[test]
    fn test_address_roundtrip() {
        for row in [0u32, 1, 9, 99, 65_535, MAX_ROW - 1] {
            for col in [0u32, 1, 25, 26, 701, 702, MAX_COLUMN - 1] {
                assert_eq!(parse_address(&format_address(row, col)).unwrap(), (row, col));
            }
        }
    }

    #[test]
    fn test_address_outside_grid_does_not_parse() {
        assert_eq!(format_address(MAX_ROW, 0), "A1048577");
        assert!(parse_address(&format_address(MAX_ROW, 0)).is_err());
        assert_eq!(format_address(0, MAX_COLUMN), "XFE1");
        assert!(parse_address(&format_address(0, MAX_COLUMN)).is_err());
    }

    #[test]
    fn test_column_letters_roundtrip() {
        for col in 0..MAX_COLUMN {
            assert_eq!(letters_to_column(&column_to_letters(col)).unwrap(), col);
        }
        assert!(letters_to_column("XFE").is_err());
        assert!(letters_to_column("").is_err());
    }

    #[test]
    fn test_parse_range() {
        let range = parse_range("A1:B10").unwrap();
        assert_eq!(range, CellRange::new((0, 0), (9, 1)));
        assert_eq!(format_range(&range), "A1:B10");
        // reversed corners normalize
        assert_eq!(parse_range("B10:A1").unwrap(), range);
        assert_eq!(parse_range("$A$1:$B$10").unwrap(), range);
        assert_eq!(format_range(&parse_range("C4").unwrap()), "C4");
        assert!(parse_range("A1:").is_err());
    }

    #[test]
    fn test_range_contains_and_intersects() {
        let r = parse_range("B2:C3").unwrap();
        assert!(r.contains(1, 1));
        assert!(r.contains(2, 2));
        assert!(!r.contains(0, 1));
        assert!(r.intersects(&parse_range("C3:D4").unwrap()));
        assert!(!r.intersects(&parse_range("D4:E5").unwrap()));
    }

    #[test]
    fn test_parse_u32_bytes_overflow() {
        assert!(parse_u32_bytes(b"99999999999999999999").is_none());
        assert_eq!(parse_u32_bytes(b"123"), Some(123));
        assert_eq!(parse_u32_bytes(b"4294967295"), Some(u32::MAX));
    }

    #[test]
    fn test_parse_f64_bytes() {
        assert_eq!(parse_f64_bytes(b"42"), Some(42.0));
        assert_eq!(parse_f64_bytes(b"-1.5"), Some(-1.5));
        assert_eq!(parse_f64_bytes(b"1E-3"), Some(0.001));
        assert_eq!(parse_f64_bytes(b"abc"), None);
    }
}

//! Workbook: ordered worksheets, named ranges, load and save entry points.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use crate::error::{CodecError, Result};
use crate::package::CompressionLevel;
use crate::utils::{format_absolute_address, parse_address_bytes, parse_range, CellRange};
use crate::worksheet::Worksheet;
use crate::{reader, writer};

/// Longest sheet title a spreadsheet application accepts.
const MAX_SHEET_TITLE: usize = 31;

/// Target file format of a save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// Zip-packaged OOXML.
    #[default]
    Xlsx,
    /// The legacy compound-file format. Recognized, never written.
    LegacyBinary,
}

/// Options for a save call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SaveOptions {
    pub compression: CompressionLevel,
    /// Emit the Office theme part.
    pub write_theme: bool,
    pub format: FileFormat,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            compression: CompressionLevel::default(),
            write_theme: true,
            format: FileFormat::Xlsx,
        }
    }
}

/// A named cell range, e.g. `Totals` → `Summary!$B$2:$B$9`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedRange {
    pub name: String,
    /// Sheet the range points into.
    pub sheet: String,
    pub range: CellRange,
    /// Sheet the name is visible from; `None` for workbook scope.
    pub scope: Option<String>,
}

impl NamedRange {
    /// The reference as stored in the file: `'My Sheet'!$A$1:$B$2`.
    pub fn reference(&self) -> String {
        let start = format_absolute_address(self.range.first_row, self.range.first_col);
        let target = if self.range.is_single_cell() {
            start
        } else {
            format!(
                "{}:{}",
                start,
                format_absolute_address(self.range.last_row, self.range.last_col)
            )
        };
        format!("{}!{}", quote_sheet_name(&self.sheet), target)
    }
}

/// Quote a sheet name for use in a reference when it is not a plain identifier
/// or could be read as a cell reference.
pub(crate) fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && parse_address_bytes(name.as_bytes()).is_none()
        && !is_r1c1_reference(name);
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// `R`, `C`, `R1`, `C2`, `R1C1` and friends, in any case.
fn is_r1c1_reference(name: &str) -> bool {
    let rest = match name.strip_prefix(['R', 'r']) {
        Some(rest) => rest.trim_start_matches(|c: char| c.is_ascii_digit()),
        None => name,
    };
    if rest.len() == name.len() {
        // no row part: a bare column reference such as `C3`
        return match name.strip_prefix(['C', 'c']) {
            Some(digits) => digits.chars().all(|c| c.is_ascii_digit()),
            None => false,
        };
    }
    match rest.strip_prefix(['C', 'c']) {
        Some(digits) => digits.chars().all(|c| c.is_ascii_digit()),
        None => rest.is_empty(),
    }
}

/// Split `Sheet!$A$1:$B$2` (optionally `=`-prefixed, sheet optionally quoted).
pub(crate) fn parse_sheet_reference(text: &str) -> Result<(String, CellRange)> {
    let text = text.trim();
    let text = text.strip_prefix('=').unwrap_or(text);
    let (sheet, range) = text
        .rsplit_once('!')
        .ok_or_else(|| CodecError::InvalidAddress(text.to_string()))?;
    let sheet = match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => sheet.to_string(),
    };
    if sheet.is_empty() {
        return Err(CodecError::InvalidAddress(text.to_string()));
    }
    Ok((sheet, parse_range(range)?))
}

fn validate_title(title: &str) -> Result<()> {
    let invalid = title.is_empty()
        || title.chars().count() > MAX_SHEET_TITLE
        || title.contains(['[', ']', ':', '*', '?', '/', '\\'])
        || title.starts_with('\'')
        || title.ends_with('\'');
    if invalid {
        return Err(CodecError::UnsupportedOperation(format!(
            "invalid worksheet title '{}'",
            title
        )));
    }
    Ok(())
}

/// A workbook containing worksheets.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    /// Worksheets in tab order.
    pub worksheets: Vec<Worksheet>,
    pub named_ranges: Vec<NamedRange>,
    active: usize,
}

impl Workbook {
    /// Create a new empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a workbook from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            CodecError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to open '{}': {}", path.display(), e),
            ))
        })?;
        Self::read_stream(BufReader::new(file))
    }

    /// Load a workbook from bytes.
    pub fn load_from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_stream(Cursor::new(data))
    }

    /// Load a workbook from any seekable stream.
    pub fn read_stream<R: Read + Seek>(source: R) -> Result<Self> {
        reader::read_stream(source)
    }

    /// Save to a file with default options.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut out = self.save_with_options(BufWriter::new(file), &SaveOptions::default())?;
        out.flush()?;
        Ok(())
    }

    /// Save to an in-memory byte vector.
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        let cursor = self.save_with_options(Cursor::new(Vec::new()), &SaveOptions::default())?;
        Ok(cursor.into_inner())
    }

    /// Save to any writer that implements Write + Seek.
    pub fn save_to_writer<W: Write + Seek>(&self, writer: W) -> Result<()> {
        self.save_with_options(writer, &SaveOptions::default())?;
        Ok(())
    }

    /// Save with explicit options, handing the writer back.
    pub fn save_with_options<W: Write + Seek>(&self, writer: W, options: &SaveOptions) -> Result<W> {
        writer::write_stream(self, writer, options)
    }

    /// The active worksheet.
    pub fn active(&self) -> Result<&Worksheet> {
        self.worksheets.get(self.active).ok_or(CodecError::NoWorksheets)
    }

    pub fn active_mut(&mut self) -> Result<&mut Worksheet> {
        self.worksheets.get_mut(self.active).ok_or(CodecError::NoWorksheets)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(CodecError::WorksheetNotFound(format!("index {}", index)));
        }
        self.active = index;
        Ok(())
    }

    /// Sheet titles in tab order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|ws| ws.title()).collect()
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.title() == name)
    }

    /// Get a worksheet by name.
    pub fn get_sheet_by_name(&self, name: &str) -> Result<&Worksheet> {
        self.sheet_index(name)
            .map(|i| &self.worksheets[i])
            .ok_or_else(|| CodecError::WorksheetNotFound(name.to_string()))
    }

    pub fn get_sheet_by_name_mut(&mut self, name: &str) -> Result<&mut Worksheet> {
        match self.sheet_index(name) {
            Some(i) => Ok(&mut self.worksheets[i]),
            None => Err(CodecError::WorksheetNotFound(name.to_string())),
        }
    }

    /// Get a worksheet by tab position.
    pub fn get_sheet_by_index(&self, index: usize) -> Result<&Worksheet> {
        self.worksheets
            .get(index)
            .ok_or_else(|| CodecError::WorksheetNotFound(format!("index {}", index)))
    }

    pub fn get_sheet_by_index_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        self.worksheets
            .get_mut(index)
            .ok_or_else(|| CodecError::WorksheetNotFound(format!("index {}", index)))
    }

    /// Append a worksheet. Titles default to `SheetN` and are unique ignoring ASCII case.
    pub fn create_sheet(&mut self, title: Option<String>) -> Result<&mut Worksheet> {
        let title = match title {
            Some(t) => t,
            None => {
                let mut n = self.worksheets.len() + 1;
                loop {
                    let candidate = format!("Sheet{}", n);
                    if !self.has_title(&candidate) {
                        break candidate;
                    }
                    n += 1;
                }
            }
        };
        validate_title(&title)?;
        if self.has_title(&title) {
            return Err(CodecError::WorksheetAlreadyExists(title));
        }

        self.worksheets.push(Worksheet::new(title));
        let last = self.worksheets.len() - 1;
        Ok(&mut self.worksheets[last])
    }

    fn has_title(&self, title: &str) -> bool {
        self.worksheets.iter().any(|ws| ws.title().eq_ignore_ascii_case(title))
    }

    /// Remove a worksheet and the named ranges that point into or are scoped to it.
    pub fn remove_sheet(&mut self, sheet_name: &str) -> Result<Worksheet> {
        let index = self
            .sheet_index(sheet_name)
            .ok_or_else(|| CodecError::WorksheetNotFound(sheet_name.to_string()))?;
        let removed = self.worksheets.remove(index);
        self.named_ranges
            .retain(|nr| nr.sheet != sheet_name && nr.scope.as_deref() != Some(sheet_name));
        if self.active >= self.worksheets.len() {
            self.active = self.worksheets.len().saturating_sub(1);
        }
        Ok(removed)
    }

    /// Define a workbook-scoped name for a reference such as `Sheet1!$A$1:$B$10`.
    pub fn create_named_range(&mut self, name: String, range: String) -> Result<()> {
        let (sheet, range) = parse_sheet_reference(&range)?;
        if self.sheet_index(&sheet).is_none() {
            return Err(CodecError::WorksheetNotFound(sheet));
        }
        self.add_named_range(NamedRange { name, sheet, range, scope: None })
    }

    /// Register a fully built named range. Names are unique per scope.
    pub fn add_named_range(&mut self, named: NamedRange) -> Result<()> {
        if self
            .named_ranges
            .iter()
            .any(|nr| nr.scope == named.scope && nr.name.eq_ignore_ascii_case(&named.name))
        {
            return Err(CodecError::NamedRangeAlreadyExists(named.name));
        }
        self.named_ranges.push(named);
        Ok(())
    }

    /// Look up a workbook-scoped name, falling back to any sheet-scoped one.
    pub fn get_named_range(&self, name: &str) -> Option<&NamedRange> {
        self.named_ranges
            .iter()
            .find(|nr| nr.scope.is_none() && nr.name.eq_ignore_ascii_case(name))
            .or_else(|| self.named_ranges.iter().find(|nr| nr.name.eq_ignore_ascii_case(name)))
    }

    /// Structural equality of every sheet, in order, plus named ranges.
    pub fn content_eq(&self, other: &Workbook) -> bool {
        self.worksheets.len() == other.worksheets.len()
            && self
                .worksheets
                .iter()
                .zip(&other.worksheets)
                .all(|(a, b)| a.title() == b.title() && a.hidden == b.hidden && a.content_eq(b))
            && self.named_ranges == other.named_ranges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    #[test]
    fn test_workbook_new() {
        let wb = Workbook::new();
        assert!(wb.worksheets.is_empty());
        assert!(matches!(wb.active(), Err(CodecError::NoWorksheets)));
    }

    #[test]
    fn test_create_sheet() {
        let mut wb = Workbook::new();
        let _ = wb.create_sheet(Some("Sheet1".to_string())).unwrap();
        let _ = wb.create_sheet(None).unwrap();
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Sheet2"]);
    }

    #[test]
    fn test_create_sheet_duplicate() {
        let mut wb = Workbook::new();
        let _ = wb.create_sheet(Some("Sheet1".to_string())).unwrap();
        let result = wb.create_sheet(Some("SHEET1".to_string()));
        assert!(matches!(result, Err(CodecError::WorksheetAlreadyExists(_))));
    }

    #[test]
    fn test_create_sheet_invalid_title() {
        let mut wb = Workbook::new();
        assert!(wb.create_sheet(Some("a/b".to_string())).is_err());
        assert!(wb.create_sheet(Some(String::new())).is_err());
        assert!(wb.create_sheet(Some("x".repeat(32))).is_err());
    }

    #[test]
    fn test_get_sheet_by_name() {
        let mut wb = Workbook::new();
        let _ = wb.create_sheet(Some("MySheet".to_string())).unwrap();
        let ws = wb.get_sheet_by_name("MySheet").unwrap();
        assert_eq!(ws.title(), "MySheet");
        assert!(wb.get_sheet_by_name("Other").is_err());
        assert!(wb.get_sheet_by_index(3).is_err());
    }

    #[test]
    fn test_remove_sheet() {
        let mut wb = Workbook::new();
        let _ = wb.create_sheet(Some("Sheet1".to_string())).unwrap();
        let _ = wb.create_sheet(Some("Sheet2".to_string())).unwrap();
        wb.create_named_range("Gone".to_string(), "Sheet1!$A$1".to_string()).unwrap();
        wb.set_active(1).unwrap();

        let removed = wb.remove_sheet("Sheet1").unwrap();
        assert_eq!(removed.title(), "Sheet1");
        assert_eq!(wb.sheet_names(), vec!["Sheet2"]);
        assert!(wb.named_ranges.is_empty());
        assert_eq!(wb.active().unwrap().title(), "Sheet2");
    }

    #[test]
    fn test_named_ranges() {
        let mut wb = Workbook::new();
        let _ = wb.create_sheet(Some("My Sheet".to_string())).unwrap();
        wb.create_named_range("MyRange".to_string(), "'My Sheet'!$A$1:$B$10".to_string())
            .unwrap();

        let nr = wb.get_named_range("MyRange").unwrap();
        assert_eq!(nr.sheet, "My Sheet");
        assert_eq!(nr.range, CellRange::new((0, 0), (9, 1)));
        assert_eq!(nr.reference(), "'My Sheet'!$A$1:$B$10");

        let dup = wb.create_named_range("myrange".to_string(), "'My Sheet'!A1".to_string());
        assert!(matches!(dup, Err(CodecError::NamedRangeAlreadyExists(_))));
        let missing = wb.create_named_range("Other".to_string(), "Nope!A1".to_string());
        assert!(matches!(missing, Err(CodecError::WorksheetNotFound(_))));
    }

    #[test]
    fn test_parse_sheet_reference() {
        assert_eq!(
            parse_sheet_reference("=Data!$C$3").unwrap(),
            ("Data".to_string(), CellRange::single(2, 2))
        );
        assert_eq!(
            parse_sheet_reference("'Bob''s'!A1:B2").unwrap().0,
            "Bob's".to_string()
        );
        assert!(parse_sheet_reference("A1:B2").is_err());
        assert!(parse_sheet_reference("Data!3B").is_err());
        assert_eq!(quote_sheet_name("Data_1"), "Data_1");
        assert_eq!(quote_sheet_name("2024"), "'2024'");
    }

    #[test]
    fn test_reference_like_sheet_names_are_quoted() {
        for name in ["A1", "xfd1048576", "R1C1", "r2c", "R", "C", "C12", "R1"] {
            assert_eq!(quote_sheet_name(name), format!("'{}'", name), "{name}");
        }
        for name in ["Data", "Sheet1", "XFE1", "Rate", "Cost", "RC2x"] {
            assert_eq!(quote_sheet_name(name), name, "{name}");
        }

        let mut wb = Workbook::new();
        wb.create_sheet(Some("A1".to_string())).unwrap();
        wb.create_named_range("Top".to_string(), "'A1'!$A$1".to_string()).unwrap();
        assert_eq!(wb.get_named_range("Top").unwrap().reference(), "'A1'!$A$1");
        let loaded = Workbook::load_from_bytes(&wb.save_to_bytes().unwrap()).unwrap();
        assert_eq!(loaded.get_named_range("Top").unwrap().sheet, "A1");
    }

    #[test]
    fn test_save_to_bytes() {
        let mut wb = Workbook::new();
        let ws = wb.create_sheet(Some("Test".to_string())).unwrap();
        ws.set_cell_value(0, 0, CellValue::from("Hello"));
        ws.set_cell_value(0, 1, CellValue::Number(42.0));
        ws.set_cell_value(1, 0, CellValue::Boolean(true));

        let bytes = wb.save_to_bytes().unwrap();

        // Verify it's a valid ZIP file (starts with PK)
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_save_without_sheets_fails() {
        let wb = Workbook::new();
        assert!(matches!(wb.save_to_bytes(), Err(CodecError::NoWorksheets)));
    }

    #[test]
    fn test_save_legacy_format_unsupported() {
        let mut wb = Workbook::new();
        let _ = wb.create_sheet(None).unwrap();
        let options = SaveOptions { format: FileFormat::LegacyBinary, ..Default::default() };
        let result = wb.save_with_options(Cursor::new(Vec::new()), &options);
        assert!(matches!(result, Err(CodecError::UnsupportedOperation(_))));
    }

    #[test]
    fn test_load_from_bytes() {
        let mut wb = Workbook::new();
        let ws = wb.create_sheet(Some("TestSheet".to_string())).unwrap();
        ws.set_cell_value(0, 0, CellValue::from("Hello World"));
        ws.set_cell_value(0, 1, CellValue::Number(123.45));

        let bytes = wb.save_to_bytes().unwrap();
        let wb2 = Workbook::load_from_bytes(&bytes).unwrap();

        assert_eq!(wb2.sheet_names(), vec!["TestSheet"]);
        let ws2 = wb2.get_sheet_by_name("TestSheet").unwrap();
        match &ws2.get_cell(0, 0).unwrap().value {
            CellValue::String(s) => assert_eq!(s.as_ref(), "Hello World"),
            other => panic!("Expected String value, got {:?}", other),
        }
        match &ws2.get_cell(0, 1).unwrap().value {
            CellValue::Number(n) => assert!((n - 123.45).abs() < 0.001),
            other => panic!("Expected Number value, got {:?}", other),
        }
    }

    #[test]
    fn test_bytes_roundtrip_with_multiple_sheets() {
        let mut wb = Workbook::new();
        let ws1 = wb.create_sheet(Some("Sheet1".to_string())).unwrap();
        ws1.set_cell_value(0, 0, CellValue::from("Sheet1 Data"));
        let ws2 = wb.create_sheet(Some("Sheet2".to_string())).unwrap();
        ws2.set_cell_value(0, 0, CellValue::from("Sheet2 Data"));
        ws2.set_cell_value(1, 1, CellValue::Number(999.0));
        ws2.hidden = true;
        wb.set_active(0).unwrap();
        wb.create_named_range("Cell".to_string(), "Sheet2!$B$2".to_string()).unwrap();

        let bytes = wb.save_to_bytes().unwrap();
        let wb2 = Workbook::load_from_bytes(&bytes).unwrap();

        assert_eq!(wb2.sheet_names(), vec!["Sheet1", "Sheet2"]);
        assert!(wb2.get_sheet_by_index(1).unwrap().hidden);
        assert_eq!(wb2.get_named_range("Cell").unwrap().range, CellRange::single(1, 1));
        assert!(wb2.content_eq(&wb));
    }
}

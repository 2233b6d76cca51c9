//! Worksheet model: a sparse cell grid plus sizing, merge, border, view and
//! page metadata.
//!
//! Rows and columns are 0-based. Sizes are in pixels at 96 DPI.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::cell::{Cell, CellValue};
use crate::drawing::DrawingObject;
use crate::grid::borders::{BorderGrid, BorderSide};
use crate::number_format::DataFormat;
use crate::style::{BorderLine, CellBorders, CellStyle};
use crate::units::{DEFAULT_COLUMN_WIDTH_PX, DEFAULT_ROW_HEIGHT_PX};
use crate::utils::{parse_range, CellRange};
use crate::error::Result;

/// Pack row and column into one sortable key (row-major).
#[inline]
pub fn cell_key(row: u32, col: u32) -> u64 {
    ((row as u64) << 32) | col as u64
}

#[inline]
pub fn key_to_cell(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

/// Sheet view flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetView {
    pub show_grid_lines: bool,
    pub show_headers: bool,
    /// Zoom percentage, 10..=400.
    pub zoom: u32,
}

impl Default for SheetView {
    fn default() -> Self {
        SheetView { show_grid_lines: true, show_headers: true, zoom: 100 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSetup {
    pub orientation: Orientation,
    /// Paper size code, e.g. 1 = Letter, 9 = A4.
    pub paper_size: Option<u32>,
    /// Print scale percentage.
    pub scale: Option<u32>,
    /// Fit to this many pages wide, when fit-to-page is on.
    pub fit_to_width: Option<u32>,
    pub fit_to_height: Option<u32>,
}

impl PageSetup {
    pub fn fits_to_page(&self) -> bool {
        self.fit_to_width.is_some() || self.fit_to_height.is_some()
    }
}

/// Page margins in inches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        PageMargins { left: 0.7, right: 0.7, top: 0.75, bottom: 0.75, header: 0.3, footer: 0.3 }
    }
}

/// A single worksheet.
#[derive(Clone, Debug)]
pub struct Worksheet {
    title: String,
    /// Cells keyed by [`cell_key`].
    pub cells: BTreeMap<u64, Cell>,
    pub borders: BorderGrid,
    merged_cells: Vec<CellRange>,
    row_heights: BTreeMap<u32, u32>,
    column_widths: BTreeMap<u32, u32>,
    hidden_rows: BTreeSet<u32>,
    hidden_columns: BTreeSet<u32>,
    auto_width_columns: BTreeSet<u32>,
    row_styles: BTreeMap<u32, Arc<CellStyle>>,
    column_styles: BTreeMap<u32, Arc<CellStyle>>,
    pub default_row_height: u32,
    pub default_column_width: u32,
    /// Frozen `(rows, columns)` at the top-left.
    freeze: Option<(u32, u32)>,
    pub view: SheetView,
    pub page_setup: Option<PageSetup>,
    pub page_margins: Option<PageMargins>,
    pub hidden: bool,
    pub drawings: Vec<DrawingObject>,
}

impl Worksheet {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Worksheet {
            title: title.into(),
            cells: BTreeMap::new(),
            borders: BorderGrid::new(),
            merged_cells: Vec::new(),
            row_heights: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            hidden_rows: BTreeSet::new(),
            hidden_columns: BTreeSet::new(),
            auto_width_columns: BTreeSet::new(),
            row_styles: BTreeMap::new(),
            column_styles: BTreeMap::new(),
            default_row_height: DEFAULT_ROW_HEIGHT_PX,
            default_column_width: DEFAULT_COLUMN_WIDTH_PX,
            freeze: None,
            view: SheetView::default(),
            page_setup: None,
            page_margins: None,
            hidden: false,
            drawings: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = title.into();
    }

    pub fn get_cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&cell_key(row, col))
    }

    pub fn get_cell_mut(&mut self, row: u32, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&cell_key(row, col))
    }

    pub fn get_or_create_cell_mut(&mut self, row: u32, col: u32) -> &mut Cell {
        self.cells.entry(cell_key(row, col)).or_default()
    }

    /// Store a whole cell, replacing any existing one.
    pub fn set_cell(&mut self, row: u32, col: u32, cell: Cell) {
        self.cells.insert(cell_key(row, col), cell);
    }

    pub fn get_cell_value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.get_cell(row, col).map(|c| &c.value)
    }

    /// Set a value. Date values without a date format get the default one.
    pub fn set_cell_value(&mut self, row: u32, col: u32, value: CellValue) {
        let cell = self.get_or_create_cell_mut(row, col);
        if matches!(value, CellValue::DateTime(_)) && !cell.format.is_datetime() {
            cell.format = DataFormat::default_datetime();
        }
        cell.value = value;
    }

    /// Formula text; a leading `=` is stripped.
    pub fn set_cell_formula(&mut self, row: u32, col: u32, formula: &str) {
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        self.get_or_create_cell_mut(row, col).formula = Some(formula.to_string());
    }

    pub fn get_cell_formula(&self, row: u32, col: u32) -> Option<&str> {
        self.get_cell(row, col).and_then(|c| c.formula.as_deref())
    }

    pub fn set_cell_style(&mut self, row: u32, col: u32, style: CellStyle) {
        self.set_cell_style_arc(row, col, Arc::new(style));
    }

    /// Share one style allocation across many cells.
    pub fn set_cell_style_arc(&mut self, row: u32, col: u32, style: Arc<CellStyle>) {
        self.get_or_create_cell_mut(row, col).style = Some(style);
    }

    pub fn get_cell_style(&self, row: u32, col: u32) -> Option<&CellStyle> {
        self.get_cell(row, col).and_then(|c| c.style.as_deref())
    }

    pub fn set_cell_format(&mut self, row: u32, col: u32, format: DataFormat) {
        self.get_or_create_cell_mut(row, col).format = format;
    }

    pub fn get_cell_format(&self, row: u32, col: u32) -> Option<&DataFormat> {
        self.get_cell(row, col).map(|c| &c.format)
    }

    /// Set all four edges of a cell; `None` sides are cleared.
    pub fn set_cell_borders(&mut self, row: u32, col: u32, borders: CellBorders) {
        self.borders.set(row, col, BorderSide::Top, borders.top);
        self.borders.set(row, col, BorderSide::Bottom, borders.bottom);
        self.borders.set(row, col, BorderSide::Left, borders.left);
        self.borders.set(row, col, BorderSide::Right, borders.right);
    }

    pub fn set_cell_border(&mut self, row: u32, col: u32, side: BorderSide, line: Option<BorderLine>) {
        self.borders.set(row, col, side, line);
    }

    pub fn get_cell_borders(&self, row: u32, col: u32) -> CellBorders {
        self.borders.cell_borders(row, col)
    }

    /// Remove a cell; borders stay on the grid.
    pub fn clear_cell(&mut self, row: u32, col: u32) -> Option<Cell> {
        self.cells.remove(&cell_key(row, col))
    }

    /// Merge a range given as `A1:B2`.
    pub fn merge_cells(&mut self, range: &str) -> Result<()> {
        let range = parse_range(range)?;
        self.add_merged_cell(range);
        Ok(())
    }

    /// Add a merge. Ranges overlapping an existing merge replace it.
    pub fn add_merged_cell(&mut self, range: CellRange) {
        if range.is_single_cell() {
            return;
        }
        self.merged_cells.retain(|m| !m.intersects(&range));
        self.merged_cells.push(range);
    }

    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        let before = self.merged_cells.len();
        self.merged_cells.retain(|m| m != range);
        before != self.merged_cells.len()
    }

    pub fn merged_cells(&self) -> &[CellRange] {
        &self.merged_cells
    }

    /// The merge containing a cell.
    pub fn merge_at(&self, row: u32, col: u32) -> Option<&CellRange> {
        self.merged_cells.iter().find(|m| m.contains(row, col))
    }

    /// True for cells inside a merge other than its top-left anchor.
    pub fn is_covered_by_merge(&self, row: u32, col: u32) -> bool {
        self.merge_at(row, col)
            .map(|m| m.top_left() != (row, col))
            .unwrap_or(false)
    }

    /// Row height in pixels; unset rows use the sheet default.
    pub fn row_height(&self, row: u32) -> u32 {
        self.row_heights.get(&row).copied().unwrap_or(self.default_row_height)
    }

    pub fn has_custom_row_height(&self, row: u32) -> bool {
        self.row_heights.contains_key(&row)
    }

    pub fn set_row_height(&mut self, row: u32, pixels: u32) {
        self.row_heights.insert(row, pixels);
    }

    pub fn reset_row_height(&mut self, row: u32) {
        self.row_heights.remove(&row);
    }

    /// Column width in pixels; unset columns use the sheet default.
    pub fn column_width(&self, col: u32) -> u32 {
        self.column_widths.get(&col).copied().unwrap_or(self.default_column_width)
    }

    pub fn has_custom_column_width(&self, col: u32) -> bool {
        self.column_widths.contains_key(&col)
    }

    pub fn set_column_width(&mut self, col: u32, pixels: u32) {
        self.column_widths.insert(col, pixels);
    }

    pub fn reset_column_width(&mut self, col: u32) {
        self.column_widths.remove(&col);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.contains(&row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    pub fn is_column_hidden(&self, col: u32) -> bool {
        self.hidden_columns.contains(&col)
    }

    pub fn set_column_hidden(&mut self, col: u32, hidden: bool) {
        if hidden {
            self.hidden_columns.insert(col);
        } else {
            self.hidden_columns.remove(&col);
        }
    }

    /// Auto width ("best fit") flag of a column.
    pub fn is_column_auto_width(&self, col: u32) -> bool {
        self.auto_width_columns.contains(&col)
    }

    pub fn set_column_auto_width(&mut self, col: u32, auto: bool) {
        if auto {
            self.auto_width_columns.insert(col);
        } else {
            self.auto_width_columns.remove(&col);
        }
    }

    pub fn row_style(&self, row: u32) -> Option<&Arc<CellStyle>> {
        self.row_styles.get(&row)
    }

    pub fn set_row_style(&mut self, row: u32, style: Option<Arc<CellStyle>>) {
        match style {
            Some(s) => self.row_styles.insert(row, s),
            None => self.row_styles.remove(&row),
        };
    }

    pub fn column_style(&self, col: u32) -> Option<&Arc<CellStyle>> {
        self.column_styles.get(&col)
    }

    pub fn set_column_style(&mut self, col: u32, style: Option<Arc<CellStyle>>) {
        match style {
            Some(s) => self.column_styles.insert(col, s),
            None => self.column_styles.remove(&col),
        };
    }

    /// Frozen rows and columns at the top-left, if any.
    pub fn freeze_panes(&self) -> Option<(u32, u32)> {
        self.freeze
    }

    /// Freeze `rows` rows and `cols` columns; `(0, 0)` unfreezes.
    pub fn set_freeze_panes(&mut self, rows: u32, cols: u32) {
        self.freeze = if rows == 0 && cols == 0 { None } else { Some((rows, cols)) };
    }

    /// Rows that carry sizing, visibility or style metadata.
    pub(crate) fn rows_with_metadata(&self) -> BTreeSet<u32> {
        self.row_heights
            .keys()
            .chain(self.hidden_rows.iter())
            .chain(self.row_styles.keys())
            .copied()
            .collect()
    }

    /// Columns that carry sizing, visibility or style metadata.
    pub(crate) fn columns_with_metadata(&self) -> BTreeSet<u32> {
        self.column_widths
            .keys()
            .chain(self.hidden_columns.iter())
            .chain(self.auto_width_columns.iter())
            .chain(self.column_styles.keys())
            .copied()
            .collect()
    }

    /// Bounding range of all non-blank cells, or `None` for an empty sheet.
    pub fn dimensions(&self) -> Option<CellRange> {
        let mut bounds: Option<CellRange> = None;
        for (&key, cell) in &self.cells {
            if cell.is_blank() {
                continue;
            }
            let (row, col) = key_to_cell(key);
            bounds = Some(match bounds {
                None => CellRange::single(row, col),
                Some(b) => CellRange::new(
                    (b.first_row.min(row), b.first_col.min(col)),
                    (b.last_row.max(row), b.last_col.max(col)),
                ),
            });
        }
        bounds
    }

    /// Structural equality: cells by value, formula, format and style, borders,
    /// row and column sizing and visibility, merges, freeze position, view and
    /// page settings. Blank cells compare equal to missing ones.
    pub fn content_eq(&self, other: &Worksheet) -> bool {
        fn non_blank(ws: &Worksheet) -> Vec<(u64, &Cell)> {
            ws.cells
                .iter()
                .filter(|(_, c)| !c.is_blank())
                .map(|(k, c)| (*k, c))
                .collect()
        }
        fn sorted(ranges: &[CellRange]) -> Vec<CellRange> {
            let mut v = ranges.to_vec();
            v.sort_by_key(|r| (r.first_row, r.first_col, r.last_row, r.last_col));
            v
        }
        fn styles_eq(a: &BTreeMap<u32, Arc<CellStyle>>, b: &BTreeMap<u32, Arc<CellStyle>>) -> bool {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|((ka, sa), (kb, sb))| ka == kb && sa == sb)
        }

        let cells_a = non_blank(self);
        let cells_b = non_blank(other);
        cells_a.len() == cells_b.len()
            && cells_a
                .iter()
                .zip(cells_b.iter())
                .all(|((ka, ca), (kb, cb))| ka == kb && ca.content_eq(cb))
            && self.title == other.title
            && self.borders.content_eq(&other.borders)
            && sorted(&self.merged_cells) == sorted(&other.merged_cells)
            && self.row_heights == other.row_heights
            && self.column_widths == other.column_widths
            && self.hidden_rows == other.hidden_rows
            && self.hidden_columns == other.hidden_columns
            && self.auto_width_columns == other.auto_width_columns
            && styles_eq(&self.row_styles, &other.row_styles)
            && styles_eq(&self.column_styles, &other.column_styles)
            && self.default_row_height == other.default_row_height
            && self.default_column_width == other.default_column_width
            && self.freeze == other.freeze
            && self.view == other.view
            && self.page_setup == other.page_setup
            && self.page_margins == other.page_margins
            && self.hidden == other.hidden
            && self.drawings == other.drawings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Font;
    use chrono::NaiveDate;

    #[test]
    fn test_cell_key_order_is_row_major() {
        assert!(cell_key(0, 500) < cell_key(1, 0));
        assert_eq!(key_to_cell(cell_key(7, 3)), (7, 3));
    }

    #[test]
    fn test_set_and_get_values() {
        let mut ws = Worksheet::new("Data");
        ws.set_cell_value(0, 0, CellValue::from("Hello"));
        ws.set_cell_value(0, 1, CellValue::Number(42.0));
        ws.set_cell_formula(1, 1, "=B1*2");
        assert_eq!(ws.get_cell_value(0, 0), Some(&CellValue::from("Hello")));
        assert_eq!(ws.get_cell_formula(1, 1), Some("B1*2"));
        assert_eq!(ws.get_cell_value(5, 5), None);
        assert_eq!(ws.dimensions(), Some(CellRange::new((0, 0), (1, 1))));
    }

    #[test]
    fn test_date_value_gets_date_format() {
        let mut ws = Worksheet::new("S");
        let dt = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        ws.set_cell_value(0, 0, CellValue::DateTime(dt));
        assert!(ws.get_cell_format(0, 0).unwrap().is_datetime());

        ws.set_cell_format(1, 0, DataFormat::date("yyyy"));
        ws.set_cell_value(1, 0, CellValue::DateTime(dt));
        assert_eq!(ws.get_cell_format(1, 0), Some(&DataFormat::date("yyyy")));
    }

    #[test]
    fn test_merges() {
        let mut ws = Worksheet::new("S");
        ws.merge_cells("B2:C3").unwrap();
        assert!(ws.is_covered_by_merge(2, 2));
        assert!(!ws.is_covered_by_merge(1, 1));
        ws.merge_cells("C3:D4").unwrap();
        assert_eq!(ws.merged_cells().len(), 1);
        assert!(ws.merge_cells("bogus").is_err());
    }

    #[test]
    fn test_sizes_and_freeze() {
        let mut ws = Worksheet::new("S");
        assert_eq!(ws.row_height(3), DEFAULT_ROW_HEIGHT_PX);
        ws.set_row_height(3, 40);
        ws.set_column_width(2, 120);
        assert_eq!(ws.row_height(3), 40);
        assert_eq!(ws.column_width(2), 120);
        ws.set_freeze_panes(1, 0);
        assert_eq!(ws.freeze_panes(), Some((1, 0)));
        ws.set_freeze_panes(0, 0);
        assert_eq!(ws.freeze_panes(), None);
    }

    #[test]
    fn test_content_eq_ignores_blank_cells() {
        let mut a = Worksheet::new("S");
        let mut b = Worksheet::new("S");
        a.set_cell_value(0, 0, CellValue::Number(1.0));
        b.set_cell_value(0, 0, CellValue::Number(1.0));
        b.get_or_create_cell_mut(4, 4);
        assert!(a.content_eq(&b));

        b.set_cell_style(0, 0, CellStyle::new().with_font(Font::new().with_bold(true)));
        assert!(!a.content_eq(&b));
    }
}

#![no_main]

//! Fuzz target for save/load round trips.
//!
//! Builds a small workbook from the input, saves it, loads it back and requires
//! the result to be structurally equal to what was built.

use std::sync::Arc;

use arbitrary::{Arbitrary, Unstructured};
use gridcodec_core::number_format::{NegativeStyle, NumberArgs};
use gridcodec_core::{
    Alignment, BorderLine, BorderLineStyle, BorderSide, CellStyle, CellValue, DataFormat, Font,
    HorizontalAlignment, SolidColor, VerticalAlignment, Workbook,
};
use libfuzzer_sys::fuzz_target;

const MAX_ROWS: u32 = 50;
const MAX_COLS: u32 = 20;
const MAX_SHEETS: usize = 3;
const MAX_CELLS_PER_SHEET: usize = 100;

#[derive(Debug, Clone)]
enum FuzzCellValue {
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    Formula(&'static str),
}

impl<'a> Arbitrary<'a> for FuzzCellValue {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let choice: u8 = u.int_in_range(0..=4)?;
        Ok(match choice {
            0 => FuzzCellValue::Empty,
            1 => {
                let len: usize = u.int_in_range(1..=50)?;
                let s: String = (0..len)
                    .map(|_| u.int_in_range(32..=126u8).unwrap_or(b'x') as char)
                    .collect();
                FuzzCellValue::String(s)
            }
            2 => {
                let n: f64 = u.arbitrary()?;
                // non-finite numbers are stored as #NUM!
                FuzzCellValue::Number(if n.is_finite() { n } else { 0.0 })
            }
            3 => FuzzCellValue::Boolean(u.arbitrary()?),
            _ => {
                let formulas = ["A1+B1", "SUM(A1:A10)", "1+1", "IF(A1>0,1,0)", "NOW()"];
                FuzzCellValue::Formula(formulas[u.int_in_range(0..=4usize)?])
            }
        })
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzCell {
    row: u8,
    col: u8,
    value: FuzzCellValue,
    has_style: bool,
    bold: bool,
    italic: bool,
    font_size: u8,
    bg_color: Option<[u8; 3]>,
    h_align: u8,
    v_align: u8,
    format: u8,
    top_border: Option<u8>,
}

#[derive(Debug)]
struct FuzzSheet {
    name: String,
    cells: Vec<FuzzCell>,
    merged_ranges: Vec<String>,
    freeze: Option<(u8, u8)>,
}

impl<'a> Arbitrary<'a> for FuzzSheet {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let name_len: usize = u.int_in_range(1..=15)?;
        let name: String = (0..name_len)
            .map(|_| {
                let c: u8 = u.int_in_range(0..=35).unwrap_or(0);
                if c < 10 {
                    (b'0' + c) as char
                } else {
                    (b'A' + c - 10) as char
                }
            })
            .collect();

        let num_cells: usize = u.int_in_range(0..=MAX_CELLS_PER_SHEET)?;
        let mut cells = Vec::with_capacity(num_cells);
        for _ in 0..num_cells {
            cells.push(u.arbitrary()?);
        }

        let num_merged: usize = u.int_in_range(0..=3)?;
        let mut merged_ranges = Vec::with_capacity(num_merged);
        for _ in 0..num_merged {
            let r1: u8 = u.int_in_range(1..=5)?;
            let c1: u8 = u.int_in_range(1..=5)?;
            let r2: u8 = u.int_in_range(r1..=r1 + 2)?;
            let c2: u8 = u.int_in_range(c1..=c1 + 2)?;
            if r1 != r2 || c1 != c2 {
                let col1 = (b'A' + c1 - 1) as char;
                let col2 = (b'A' + c2 - 1) as char;
                merged_ranges.push(format!("{}{}:{}{}", col1, r1, col2, r2));
            }
        }

        let freeze = if u.arbitrary()? { Some((u.int_in_range(0..=5)?, u.int_in_range(0..=5)?)) } else { None };

        Ok(FuzzSheet { name, cells, merged_ranges, freeze })
    }
}

#[derive(Debug)]
struct FuzzWorkbook {
    sheets: Vec<FuzzSheet>,
}

impl<'a> Arbitrary<'a> for FuzzWorkbook {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_sheets: usize = u.int_in_range(1..=MAX_SHEETS)?;
        let mut sheets = Vec::with_capacity(num_sheets);
        for _ in 0..num_sheets {
            sheets.push(u.arbitrary()?);
        }
        Ok(FuzzWorkbook { sheets })
    }
}

fn build_style(cell: &FuzzCell) -> Option<CellStyle> {
    if !cell.has_style {
        return None;
    }
    let font = Font::new()
        .with_name("Arial")
        .with_size(cell.font_size.clamp(8, 72) as f64)
        .with_bold(cell.bold)
        .with_italic(cell.italic);
    let mut alignment = Alignment::new();
    alignment.horizontal = match cell.h_align % 4 {
        0 => HorizontalAlignment::General,
        1 => HorizontalAlignment::Left,
        2 => HorizontalAlignment::Center,
        _ => HorizontalAlignment::Right,
    };
    alignment.vertical = match cell.v_align % 3 {
        0 => VerticalAlignment::Bottom,
        1 => VerticalAlignment::Top,
        _ => VerticalAlignment::Center,
    };
    let mut style = CellStyle::new().with_font(font).with_alignment(alignment);
    if let Some([r, g, b]) = cell.bg_color {
        style = style.with_background(SolidColor::rgb(r, g, b));
    }
    Some(style)
}

fn build_format(selector: u8) -> DataFormat {
    match selector % 6 {
        0 => DataFormat::General,
        1 => DataFormat::Number(NumberArgs::new(selector % 4, selector % 2 == 0)),
        2 => DataFormat::Percent(NumberArgs::new(selector % 3, false)),
        3 => DataFormat::Number(NumberArgs::new(2, true).with_negative(NegativeStyle::RedBrackets)),
        4 => DataFormat::Text,
        _ => DataFormat::Custom("0.000E+00;;\"zero\"".to_string()),
    }
}

fn border_line(selector: u8) -> BorderLine {
    let style = match selector % 4 {
        0 => BorderLineStyle::Thin,
        1 => BorderLineStyle::Medium,
        2 => BorderLineStyle::Dashed,
        _ => BorderLineStyle::Double,
    };
    BorderLine::new(style)
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(fuzz_wb) = FuzzWorkbook::arbitrary(&mut u) else {
        return;
    };

    let mut wb = Workbook::new();
    for fuzz_sheet in &fuzz_wb.sheets {
        // duplicate titles are rejected; skip those sheets
        let Ok(sheet) = wb.create_sheet(Some(fuzz_sheet.name.clone())) else {
            continue;
        };
        for range in &fuzz_sheet.merged_ranges {
            let _ = sheet.merge_cells(range);
        }
        if let Some((rows, cols)) = fuzz_sheet.freeze {
            sheet.set_freeze_panes(rows as u32, cols as u32);
        }

        for cell in &fuzz_sheet.cells {
            let row = cell.row as u32 % MAX_ROWS;
            let col = cell.col as u32 % MAX_COLS;
            if let Some(selector) = cell.top_border {
                sheet.set_cell_border(row, col, BorderSide::Top, Some(border_line(selector)));
            }
            // cells under a merge keep only their borders
            if sheet.is_covered_by_merge(row, col) {
                continue;
            }
            match &cell.value {
                FuzzCellValue::Empty => sheet.set_cell_value(row, col, CellValue::Empty),
                FuzzCellValue::String(s) => sheet.set_cell_value(row, col, CellValue::String(Arc::from(s.as_str()))),
                FuzzCellValue::Number(n) => sheet.set_cell_value(row, col, CellValue::Number(*n)),
                FuzzCellValue::Boolean(b) => sheet.set_cell_value(row, col, CellValue::Boolean(*b)),
                FuzzCellValue::Formula(f) => sheet.set_cell_formula(row, col, f),
            }
            if let Some(style) = build_style(cell) {
                sheet.set_cell_style(row, col, style);
            }
            sheet.set_cell_format(row, col, build_format(cell.format));
        }
    }
    if wb.worksheets.is_empty() {
        return;
    }

    let bytes = match wb.save_to_bytes() {
        Ok(bytes) => bytes,
        Err(e) => panic!("failed to save a generated workbook: {:?}", e),
    };
    let loaded = match Workbook::load_from_bytes(&bytes) {
        Ok(wb) => wb,
        Err(e) => panic!("failed to load a workbook we just saved: {:?}", e),
    };
    assert!(loaded.content_eq(&wb), "round trip changed the workbook:\n{:#?}", fuzz_wb);
});

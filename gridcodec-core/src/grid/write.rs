//! Worksheet model to worksheet part.

use std::collections::BTreeMap;
use std::io::Write;

use crate::cell::{Cell, CellValue};
use crate::error::Result;
use crate::number_format::DataFormat;
use crate::parts::shared_strings::{SharedRun, SharedString, SharedStringTable};
use crate::parts::worksheet::{
    write_head, write_row, write_tail, CellData, CellRecord, ColumnRecord, PageMarginsRecord,
    PageSetupRecord, PaneRecord, RowRecord, SheetFormatRecord, SheetViewRecord, WorksheetMeta,
};
use crate::style::CellBorders;
use crate::style_writer::{run_font_record, StyleWriter};
use crate::units::{datetime_to_serial, pixels_to_column_width, pixels_to_points, DEFAULT_COLUMN_WIDTH_PX};
use crate::utils::format_address;
use crate::worksheet::{key_to_cell, Orientation, Worksheet};

/// Document-wide tables a sheet is written into.
pub struct SheetWriteContext<'a> {
    pub styles: &'a mut StyleWriter,
    pub shared_strings: &'a mut SharedStringTable,
}

/// Stream `ws` as a worksheet part.
pub fn write_sheet<W: Write>(
    out: &mut W,
    ws: &Worksheet,
    ctx: &mut SheetWriteContext<'_>,
    drawing_rel: Option<String>,
    tab_selected: bool,
) -> Result<()> {
    let meta = sheet_meta(ws, ctx, drawing_rel, tab_selected);
    write_head(out, &meta)?;

    let layout = row_layout(ws);
    let mut rows_written = 0usize;
    for (row, cols) in &layout {
        let record = row_record(ws, *row, cols, ctx);
        if record.cells.is_empty() && !row_deviates(&record) {
            continue;
        }
        write_row(out, &record)?;
        rows_written += 1;
    }

    write_tail(out, &meta)?;
    log::debug!(
        "wrote sheet '{}': {} rows, {} column runs, {} merges",
        ws.title(),
        rows_written,
        meta.columns.len(),
        meta.merges.len()
    );
    Ok(())
}

/// Rows to visit, each with the columns that need a `<c>`: every non-blank
/// cell plus every cell carrying a border edge.
fn row_layout(ws: &Worksheet) -> BTreeMap<u32, Vec<u32>> {
    let mut layout: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (&key, cell) in &ws.cells {
        if !cell.is_blank() {
            let (row, col) = key_to_cell(key);
            layout.entry(row).or_default().push(col);
        }
    }
    for (row, col) in ws.borders.carrier_cells() {
        layout.entry(row).or_default().push(col);
    }
    for row in ws.rows_with_metadata() {
        layout.entry(row).or_default();
    }
    for cols in layout.values_mut() {
        cols.sort_unstable();
        cols.dedup();
    }
    layout
}

fn row_deviates(record: &RowRecord) -> bool {
    record.custom_height || record.hidden || record.style.is_some()
}

fn row_record(ws: &Worksheet, row: u32, cols: &[u32], ctx: &mut SheetWriteContext<'_>) -> RowRecord {
    let height = ws
        .has_custom_row_height(row)
        .then(|| pixels_to_points(ws.row_height(row)));
    let style = ws
        .row_style(row)
        .map(|s| ctx.styles.intern_to_format_index(Some(s.as_ref()), &CellBorders::default(), &DataFormat::General));

    let mut cells = Vec::with_capacity(cols.len());
    for &col in cols {
        let borders = ws.get_cell_borders(row, col);
        let covered = ws.is_covered_by_merge(row, col);
        if let Some(record) = cell_record(ws.get_cell(row, col), col, &borders, covered, ctx) {
            cells.push(record);
        }
    }

    RowRecord {
        index: row,
        height,
        custom_height: height.is_some(),
        hidden: ws.is_row_hidden(row),
        style,
        cells,
    }
}

/// Build one `<c>`. Cells hidden under a merge keep their style but not their value.
fn cell_record(
    cell: Option<&Cell>,
    col: u32,
    borders: &CellBorders,
    covered: bool,
    ctx: &mut SheetWriteContext<'_>,
) -> Option<CellRecord> {
    let default_cell = Cell::default();
    let cell = cell.unwrap_or(&default_cell);

    let format = match &cell.value {
        CellValue::DateTime(_) if !cell.format.is_datetime() => DataFormat::default_datetime(),
        _ => cell.format.clone(),
    };
    let style = ctx
        .styles
        .intern_to_format_index(cell.style.as_deref(), borders, &format);

    let (data, formula) = if covered {
        (CellData::Empty, None)
    } else {
        cell_slots(cell, ctx.shared_strings)
    };
    if style == 0 && data == CellData::Empty && formula.is_none() {
        return None;
    }
    Some(CellRecord { col, style, data, formula })
}

/// Value and formula slots for a cell. Booleans carry a literal `TRUE`/`FALSE`
/// formula, text produced by a formula is written inline, and other text goes
/// through the shared string table.
fn cell_slots(cell: &Cell, strings: &mut SharedStringTable) -> (CellData, Option<String>) {
    let formula = cell.formula.clone();
    let data = match &cell.value {
        CellValue::Empty => CellData::Empty,
        CellValue::Number(n) if n.is_finite() => CellData::Number(*n),
        CellValue::Number(_) => CellData::Error("#NUM!".to_string()),
        CellValue::DateTime(dt) => CellData::Number(datetime_to_serial(*dt)),
        CellValue::Boolean(b) => {
            let literal = if *b { "TRUE" } else { "FALSE" };
            return (CellData::Boolean(*b), formula.or_else(|| Some(literal.to_string())));
        }
        CellValue::Error(e) => CellData::Error(e.clone()),
        CellValue::String(s) if formula.is_some() => CellData::InlineString(s.to_string()),
        CellValue::String(s) => CellData::SharedString(strings.insert_text(s)),
        CellValue::RichText(rt) if formula.is_some() => CellData::InlineString(rt.text()),
        CellValue::RichText(rt) => CellData::SharedString(strings.insert(SharedString::Rich(
            rt.runs
                .iter()
                .map(|run| SharedRun {
                    text: run.text.clone(),
                    font: run.font.as_ref().map(run_font_record),
                })
                .collect(),
        ))),
    };
    (data, formula)
}

fn sheet_meta(
    ws: &Worksheet,
    ctx: &mut SheetWriteContext<'_>,
    drawing_rel: Option<String>,
    tab_selected: bool,
) -> WorksheetMeta {
    let pane = ws.freeze_panes().map(|(rows, cols)| PaneRecord {
        x_split: cols,
        y_split: rows,
        top_left_cell: Some(format_address(rows, cols)),
        frozen: true,
    });
    let page_setup = ws.page_setup.as_ref();

    WorksheetMeta {
        dimension: ws.dimensions(),
        view: SheetViewRecord {
            tab_selected,
            show_grid_lines: ws.view.show_grid_lines,
            show_headers: ws.view.show_headers,
            zoom_scale: ws.view.zoom.clamp(10, 400),
            pane,
        },
        format: SheetFormatRecord {
            default_row_height: Some(pixels_to_points(ws.default_row_height)),
            default_col_width: (ws.default_column_width != DEFAULT_COLUMN_WIDTH_PX)
                .then(|| pixels_to_column_width(ws.default_column_width)),
            base_col_width: None,
        },
        columns: column_records(ws, ctx),
        merges: ws.merged_cells().to_vec(),
        fit_to_page: page_setup.map(|p| p.fits_to_page()).unwrap_or(false),
        page_margins: ws.page_margins.map(|m| PageMarginsRecord {
            left: m.left,
            right: m.right,
            top: m.top,
            bottom: m.bottom,
            header: m.header,
            footer: m.footer,
        }),
        page_setup: page_setup.map(|p| PageSetupRecord {
            orientation: Some(
                match p.orientation {
                    Orientation::Portrait => "portrait",
                    Orientation::Landscape => "landscape",
                }
                .to_string(),
            ),
            paper_size: p.paper_size,
            scale: p.scale,
            fit_to_width: p.fit_to_width,
            fit_to_height: p.fit_to_height,
        }),
        drawing_rel,
    }
}

/// One `<col>` per run of adjacent columns with equal width, style,
/// visibility and auto-width flag.
fn column_records(ws: &Worksheet, ctx: &mut SheetWriteContext<'_>) -> Vec<ColumnRecord> {
    let mut records: Vec<ColumnRecord> = Vec::new();
    for col in ws.columns_with_metadata() {
        let custom_width = ws.has_custom_column_width(col);
        let record = ColumnRecord {
            min: col,
            max: col,
            width: custom_width.then(|| pixels_to_column_width(ws.column_width(col))),
            style: ws
                .column_style(col)
                .map(|s| ctx.styles.intern_to_format_index(Some(s.as_ref()), &CellBorders::default(), &DataFormat::General)),
            custom_width,
            hidden: ws.is_column_hidden(col),
            best_fit: ws.is_column_auto_width(col),
        };
        if let Some(last) = records.last_mut() {
            if last.max + 1 == col
                && last.width == record.width
                && last.style == record.style
                && last.custom_width == record.custom_width
                && last.hidden == record.hidden
                && last.best_fit == record.best_fit
            {
                last.max = col;
                continue;
            }
        }
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::borders::BorderSide;
    use crate::style::{BorderLine, CellStyle, Font};
    use std::sync::Arc;

    fn write(ws: &Worksheet) -> (String, StyleWriter, SharedStringTable) {
        let mut styles = StyleWriter::new();
        let mut strings = SharedStringTable::new();
        let mut out = Vec::new();
        {
            let mut ctx = SheetWriteContext { styles: &mut styles, shared_strings: &mut strings };
            write_sheet(&mut out, ws, &mut ctx, None, true).unwrap();
        }
        (String::from_utf8(out).unwrap(), styles, strings)
    }

    #[test]
    fn test_values_and_shared_strings() {
        let mut ws = Worksheet::new("S");
        ws.set_cell_value(0, 0, CellValue::from("Hello"));
        ws.set_cell_value(0, 1, CellValue::Number(42.0));
        ws.set_cell_value(1, 0, CellValue::from("Hello"));
        ws.set_cell_value(1, 1, CellValue::Boolean(false));
        ws.set_cell_value(2, 0, CellValue::from("computed"));
        ws.set_cell_formula(2, 0, "UPPER(A1)");

        let (xml, _, strings) = write(&ws);
        assert_eq!(strings.len(), 1);
        assert!(xml.contains(r#"<c r="A1" t="s"><v>0</v></c><c r="B1"><v>42</v></c>"#));
        assert!(xml.contains(r#"<c r="A2" t="s"><v>0</v></c><c r="B2" t="b"><f>FALSE</f><v>0</v></c>"#));
        assert!(xml.contains(r#"<c r="A3" t="inlineStr"><f>UPPER(A1)</f><is><t>computed</t></is></c>"#));
        assert!(xml.contains(r#"<dimension ref="A1:B3"/>"#));
        assert!(xml.contains(r#"tabSelected="1""#));
    }

    #[test]
    fn test_border_only_cells_are_emitted() {
        let mut ws = Worksheet::new("S");
        for col in 0..3 {
            ws.set_cell_border(1, col, BorderSide::Top, Some(BorderLine::thin()));
        }
        let (xml, styles, _) = write(&ws);
        // the edge above row 2 is carried as the bottom of row 1
        assert!(xml.contains(r#"<row r="1"><c r="A1" s="1"/><c r="B1" s="1"/><c r="C1" s="1"/></row>"#));
        assert_eq!(styles.stylesheet().borders.len(), 2);
    }

    #[test]
    fn test_columns_coalesce() {
        let mut ws = Worksheet::new("S");
        for col in 1..4 {
            ws.set_column_width(col, 100);
        }
        ws.set_column_width(5, 100);
        ws.set_column_hidden(6, true);
        let (xml, _, _) = write(&ws);
        assert!(xml.contains(r#"<col min="2" max="4" width="13.5703125" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="6" max="6""#));
        assert!(xml.contains(r#"<col min="7" max="7" hidden="1"/>"#));
    }

    #[test]
    fn test_rows_only_when_deviating() {
        let mut ws = Worksheet::new("S");
        ws.set_row_height(3, 40);
        ws.set_row_hidden(5, true);
        ws.set_row_style(7, Some(Arc::new(CellStyle::new().with_font(Font::new().with_italic(true)))));
        ws.set_freeze_panes(1, 2);
        let (xml, _, _) = write(&ws);
        assert!(xml.contains(r#"<row r="4" ht="30" customHeight="1"/>"#));
        assert!(xml.contains(r#"<row r="6" hidden="1"/>"#));
        assert!(xml.contains(r#"<row r="8" s="1" customFormat="1"/>"#));
        assert!(!xml.contains(r#"<row r="1""#));
        assert!(xml.contains(r#"xSplit="2" ySplit="1" topLeftCell="C2" activePane="bottomRight" state="frozen""#));
    }

    #[test]
    fn test_merged_cells_drop_covered_values() {
        let mut ws = Worksheet::new("S");
        ws.set_cell_value(0, 0, CellValue::from("anchor"));
        ws.set_cell_value(0, 1, CellValue::from("hidden"));
        ws.merge_cells("A1:B1").unwrap();
        let (xml, _, strings) = write(&ws);
        assert!(!xml.contains(r#"r="B1""#));
        assert_eq!(strings.len(), 1);
        assert!(xml.contains(r#"<mergeCell ref="A1:B1"/>"#));
    }
}

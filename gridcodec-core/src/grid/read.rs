//! Worksheet part to worksheet model.

use std::io::BufRead;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::cell::{Cell, CellValue, RichText, TextRun};
use crate::error::Result;
use crate::number_format::DataFormat;
use crate::parts::shared_strings::{SharedString, SharedStringTable};
use crate::parts::worksheet::{parse_worksheet, CellData, CellRecord, RowRecord, WorksheetMeta};
use crate::style_resolver::StyleResolver;
use crate::units::{column_width_to_pixels, points_to_pixels, serial_to_datetime};
use crate::worksheet::{Orientation, PageMargins, PageSetup, SheetView, Worksheet};

/// Document-wide tables a sheet is read against.
pub struct SheetReadContext<'a, 'b> {
    pub shared_strings: &'b SharedStringTable,
    pub styles: &'b mut StyleResolver<'a>,
}

/// Populate `ws` from a worksheet part. Returns the part's metadata so the
/// caller can follow its drawing relationship.
pub fn read_sheet<R: BufRead>(
    source: R,
    part: &str,
    ctx: &mut SheetReadContext<'_, '_>,
    ws: &mut Worksheet,
) -> Result<WorksheetMeta> {
    let mut next_row = 0u32;
    let mut implied_rows = 0u64;
    let mut cell_count = 0usize;

    let meta = parse_worksheet(source, part, |row| {
        if row.index > next_row {
            // rows missing from the file are blank rows at the default height
            implied_rows += (row.index - next_row) as u64;
        }
        next_row = row.index + 1;
        cell_count += row.cells.len();
        apply_row(row, ctx, ws)
    })?;

    apply_meta(&meta, ctx, ws);
    ws.borders.compact();

    log::debug!(
        "read '{}': {} cells, {} rows implied by gaps, {} border runs",
        part,
        cell_count,
        implied_rows,
        ws.borders.run_count()
    );
    Ok(meta)
}

fn apply_row(row: RowRecord, ctx: &mut SheetReadContext<'_, '_>, ws: &mut Worksheet) -> Result<()> {
    let r = row.index;
    if row.custom_height {
        if let Some(points) = row.height {
            ws.set_row_height(r, points_to_pixels(points));
        }
    }
    if row.hidden {
        ws.set_row_hidden(r, true);
    }
    if let Some(xf) = row.style {
        ws.set_row_style(r, ctx.styles.resolve(xf).style.clone());
    }

    for record in row.cells {
        let col = record.col;
        let resolved = ctx.styles.resolve(record.style);
        ws.borders.apply(r, col, &resolved.borders);

        let CellRecord { mut data, mut formula, .. } = record;
        if let Some(b) = literal_boolean(&data, formula.as_deref()) {
            data = CellData::Boolean(b);
            formula = None;
        }
        let mut cell = Cell {
            value: CellValue::Empty,
            formula,
            style: resolved.style.clone(),
            format: resolved.format.clone(),
        };
        cell.value = cell_value(data, &mut cell.format, ctx);
        if !cell.is_blank() {
            ws.set_cell(r, col, cell);
        }
    }
    Ok(())
}

/// A bare `TRUE`/`FALSE` formula with no other cached result is a boolean.
fn literal_boolean(data: &CellData, formula: Option<&str>) -> Option<bool> {
    if !matches!(data, CellData::Empty | CellData::Boolean(_)) {
        return None;
    }
    match formula.map(str::trim) {
        Some(f) if f.eq_ignore_ascii_case("TRUE") => Some(true),
        Some(f) if f.eq_ignore_ascii_case("FALSE") => Some(false),
        _ => None,
    }
}

fn cell_value(data: CellData, format: &mut DataFormat, ctx: &mut SheetReadContext<'_, '_>) -> CellValue {
    let strings = ctx.shared_strings;
    match data {
        CellData::Empty => CellValue::Empty,
        CellData::Number(n) if format.is_datetime() => match serial_to_datetime(n) {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Number(n),
        },
        CellData::Number(n) => CellValue::Number(n),
        CellData::Boolean(b) => CellValue::Boolean(b),
        CellData::Error(e) => CellValue::Error(e),
        CellData::InlineString(s) | CellData::FormulaString(s) => CellValue::from(s),
        CellData::IsoDate(s) => match parse_iso_datetime(&s) {
            Some(dt) => {
                if !format.is_datetime() {
                    *format = DataFormat::default_datetime();
                }
                CellValue::DateTime(dt)
            }
            None => {
                log::warn!("unparsable ISO date '{}' read as text", s);
                CellValue::from(s)
            }
        },
        CellData::SharedString(i) => match strings.get(i as usize) {
            Some(SharedString::Plain(s)) => CellValue::String(Arc::from(s.as_str())),
            Some(SharedString::Rich(runs)) => CellValue::RichText(RichText {
                runs: runs
                    .iter()
                    .map(|run| TextRun {
                        text: run.text.clone(),
                        font: run.font.as_ref().map(|f| ctx.styles.run_font(f)),
                    })
                    .collect(),
            }),
            None => {
                log::warn!(
                    "shared string index {} out of range ({} strings)",
                    i,
                    strings.len()
                );
                CellValue::Empty
            }
        },
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn apply_meta(meta: &WorksheetMeta, ctx: &mut SheetReadContext<'_, '_>, ws: &mut Worksheet) {
    if let Some(points) = meta.format.default_row_height {
        ws.default_row_height = points_to_pixels(points);
    }
    if let Some(chars) = meta.format.default_col_width {
        ws.default_column_width = column_width_to_pixels(chars);
    }

    for column in &meta.columns {
        let style = column.style.and_then(|xf| ctx.styles.resolve(xf).style.clone());
        for col in column.min..=column.max {
            if let Some(chars) = column.width {
                if column.custom_width || !column.best_fit {
                    ws.set_column_width(col, column_width_to_pixels(chars));
                }
            }
            if column.hidden {
                ws.set_column_hidden(col, true);
            }
            if column.best_fit {
                ws.set_column_auto_width(col, true);
            }
            if style.is_some() {
                ws.set_column_style(col, style.clone());
            }
        }
    }

    for range in &meta.merges {
        ws.add_merged_cell(*range);
    }

    ws.view = SheetView {
        show_grid_lines: meta.view.show_grid_lines,
        show_headers: meta.view.show_headers,
        zoom: meta.view.zoom_scale,
    };
    if let Some(pane) = meta.view.pane.as_ref().filter(|p| p.frozen) {
        ws.set_freeze_panes(pane.y_split, pane.x_split);
    }

    ws.page_margins = meta.page_margins.as_ref().map(|m| PageMargins {
        left: m.left,
        right: m.right,
        top: m.top,
        bottom: m.bottom,
        header: m.header,
        footer: m.footer,
    });
    ws.page_setup = meta.page_setup.as_ref().map(|p| PageSetup {
        orientation: match p.orientation.as_deref() {
            Some("landscape") => Orientation::Landscape,
            _ => Orientation::Portrait,
        },
        paper_size: p.paper_size,
        scale: p.scale,
        fit_to_width: if meta.fit_to_page { p.fit_to_width } else { None },
        fit_to_height: if meta.fit_to_page { p.fit_to_height } else { None },
    });
}

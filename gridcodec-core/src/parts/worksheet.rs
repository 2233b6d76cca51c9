//! `xl/worksheets/sheetN.xml`.
//!
//! Rows are streamed: the parser hands each `<row>` to a callback as soon as it
//! closes, and the writer emits head, rows and tail separately so a sheet never
//! has to exist as one XML string.

use std::io::{BufRead, Write};

use quick_xml::events::{BytesStart, Event};

use crate::error::{CodecError, Result};
use crate::parts::{NS_MAIN, NS_REL};
use crate::utils::{self, format_address, format_range, parse_range, CellRange};
use crate::xml::{self, escape_xml, format_f64, format_u32, needs_space_preserve, XML_DECLARATION};

/// The value slot of a `<c>` element.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellData {
    #[default]
    Empty,
    Number(f64),
    /// `t="s"`: index into the shared string table.
    SharedString(u32),
    /// `t="inlineStr"`.
    InlineString(String),
    /// `t="str"`: the cached text result of a formula.
    FormulaString(String),
    Boolean(bool),
    /// `t="e"`, e.g. `#DIV/0!`.
    Error(String),
    /// `t="d"`: an ISO 8601 timestamp.
    IsoDate(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellRecord {
    pub col: u32,
    pub style: u32,
    pub data: CellData,
    /// Formula text without the leading `=`.
    pub formula: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowRecord {
    /// 0-based row index.
    pub index: u32,
    pub height: Option<f64>,
    pub custom_height: bool,
    pub hidden: bool,
    pub style: Option<u32>,
    pub cells: Vec<CellRecord>,
}

/// A `<col>` run, 0-based inclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnRecord {
    pub min: u32,
    pub max: u32,
    /// Width in characters.
    pub width: Option<f64>,
    pub style: Option<u32>,
    pub custom_width: bool,
    pub hidden: bool,
    pub best_fit: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaneRecord {
    pub x_split: u32,
    pub y_split: u32,
    pub top_left_cell: Option<String>,
    pub frozen: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SheetViewRecord {
    pub tab_selected: bool,
    pub show_grid_lines: bool,
    pub show_headers: bool,
    pub zoom_scale: u32,
    pub pane: Option<PaneRecord>,
}

impl Default for SheetViewRecord {
    fn default() -> Self {
        SheetViewRecord {
            tab_selected: false,
            show_grid_lines: true,
            show_headers: true,
            zoom_scale: 100,
            pane: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SheetFormatRecord {
    /// Points.
    pub default_row_height: Option<f64>,
    /// Characters.
    pub default_col_width: Option<f64>,
    pub base_col_width: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSetupRecord {
    /// `portrait` or `landscape`.
    pub orientation: Option<String>,
    pub paper_size: Option<u32>,
    pub scale: Option<u32>,
    pub fit_to_width: Option<u32>,
    pub fit_to_height: Option<u32>,
}

/// Margins in inches.
#[derive(Clone, Debug, PartialEq)]
pub struct PageMarginsRecord {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

/// Everything in a worksheet part except the rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorksheetMeta {
    pub dimension: Option<CellRange>,
    pub view: SheetViewRecord,
    pub format: SheetFormatRecord,
    pub columns: Vec<ColumnRecord>,
    pub merges: Vec<CellRange>,
    pub fit_to_page: bool,
    pub page_margins: Option<PageMarginsRecord>,
    pub page_setup: Option<PageSetupRecord>,
    /// `r:id` of the sheet's `<drawing>`.
    pub drawing_rel: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum TextSlot {
    None,
    Value,
    Formula,
    Inline,
}

/// Stream a worksheet part, handing every row to `on_row` in file order.
pub fn parse_worksheet<R, F>(source: R, part: &str, mut on_row: F) -> Result<WorksheetMeta>
where
    R: BufRead,
    F: FnMut(RowRecord) -> Result<()>,
{
    let mut reader = xml::reader(source);
    let mut buf = Vec::new();
    let mut meta = WorksheetMeta::default();

    let mut row: Option<RowRecord> = None;
    let mut next_row = 0u32;
    let mut cell: Option<(CellRecord, Option<String>)> = None;
    let mut text = String::new();
    let mut slot = TextSlot::None;
    let mut in_phonetic = false;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| CodecError::parse(part, e))?;
        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        let record = parse_row_attrs(e, next_row, part)?;
                        next_row = record.index + 1;
                        if is_empty {
                            on_row(record)?;
                        } else {
                            row = Some(record);
                        }
                    }
                    b"c" => {
                        let next_col = row
                            .as_ref()
                            .and_then(|r| r.cells.last())
                            .map(|c| c.col + 1)
                            .unwrap_or(0);
                        let col = match xml::attr_str(e, b"r") {
                            Some(r) => utils::parse_address(&r)?.1,
                            None => next_col,
                        };
                        let record = CellRecord {
                            col,
                            style: xml::attr_u32(e, b"s").unwrap_or(0),
                            data: CellData::Empty,
                            formula: None,
                        };
                        let cell_type = xml::attr_str(e, b"t");
                        if is_empty {
                            if let Some(r) = row.as_mut() {
                                r.cells.push(record);
                            }
                        } else {
                            cell = Some((record, cell_type));
                        }
                    }
                    b"v" if cell.is_some() => {
                        text.clear();
                        slot = TextSlot::Value;
                    }
                    b"f" if cell.is_some() => {
                        text.clear();
                        slot = if is_empty { TextSlot::None } else { TextSlot::Formula };
                    }
                    b"is" if cell.is_some() => text.clear(),
                    b"t" if cell.is_some() && !in_phonetic => slot = TextSlot::Inline,
                    b"rPh" if !is_empty => in_phonetic = true,
                    b"dimension" => {
                        meta.dimension = xml::attr_str(e, b"ref").and_then(|r| parse_range(&r).ok());
                    }
                    b"sheetView" => {
                        meta.view = SheetViewRecord {
                            tab_selected: xml::attr_bool(e, b"tabSelected", false),
                            show_grid_lines: xml::attr_bool(e, b"showGridLines", true),
                            show_headers: xml::attr_bool(e, b"showRowColHeaders", true),
                            zoom_scale: xml::attr_u32(e, b"zoomScale").unwrap_or(100).clamp(10, 400),
                            pane: None,
                        };
                    }
                    b"pane" => {
                        let state = xml::attr_str(e, b"state");
                        meta.view.pane = Some(PaneRecord {
                            x_split: xml::attr_f64(e, b"xSplit").map(|v| v as u32).unwrap_or(0),
                            y_split: xml::attr_f64(e, b"ySplit").map(|v| v as u32).unwrap_or(0),
                            top_left_cell: xml::attr_str(e, b"topLeftCell"),
                            frozen: matches!(state.as_deref(), Some("frozen") | Some("frozenSplit")),
                        });
                    }
                    b"sheetFormatPr" => {
                        meta.format = SheetFormatRecord {
                            default_row_height: xml::attr_f64(e, b"defaultRowHeight"),
                            default_col_width: xml::attr_f64(e, b"defaultColWidth"),
                            base_col_width: xml::attr_u32(e, b"baseColWidth"),
                        };
                    }
                    b"col" => meta.columns.push(parse_col_attrs(e)),
                    b"mergeCell" => {
                        if let Some(r) = xml::attr_str(e, b"ref") {
                            match parse_range(&r) {
                                Ok(range) => meta.merges.push(range),
                                Err(_) => log::warn!("ignoring malformed merge '{}' in '{}'", r, part),
                            }
                        }
                    }
                    b"pageSetUpPr" => meta.fit_to_page = xml::attr_bool(e, b"fitToPage", false),
                    b"pageMargins" => {
                        meta.page_margins = Some(PageMarginsRecord {
                            left: xml::attr_f64(e, b"left").unwrap_or(0.7),
                            right: xml::attr_f64(e, b"right").unwrap_or(0.7),
                            top: xml::attr_f64(e, b"top").unwrap_or(0.75),
                            bottom: xml::attr_f64(e, b"bottom").unwrap_or(0.75),
                            header: xml::attr_f64(e, b"header").unwrap_or(0.3),
                            footer: xml::attr_f64(e, b"footer").unwrap_or(0.3),
                        });
                    }
                    b"pageSetup" => {
                        meta.page_setup = Some(PageSetupRecord {
                            orientation: xml::attr_str(e, b"orientation"),
                            paper_size: xml::attr_u32(e, b"paperSize"),
                            scale: xml::attr_u32(e, b"scale"),
                            fit_to_width: xml::attr_u32(e, b"fitToWidth"),
                            fit_to_height: xml::attr_u32(e, b"fitToHeight"),
                        });
                    }
                    b"drawing" => {
                        meta.drawing_rel = xml::attr_exact(e, b"r:id").or_else(|| xml::attr_str(e, b"id"));
                    }
                    _ => {}
                }
            }
            Event::Text(e) if slot != TextSlot::None => {
                let unescaped = e.unescape().map_err(|err| CodecError::parse(part, err))?;
                text.push_str(&unescaped);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => {
                    if let Some((record, cell_type)) = cell.as_mut() {
                        record.data = cell_data(cell_type.as_deref(), &text, part)?;
                    }
                    slot = TextSlot::None;
                }
                b"f" => {
                    if let Some((record, _)) = cell.as_mut() {
                        if slot == TextSlot::Formula {
                            record.formula = Some(std::mem::take(&mut text));
                        }
                    }
                    slot = TextSlot::None;
                }
                b"t" if slot == TextSlot::Inline => slot = TextSlot::None,
                b"rPh" => in_phonetic = false,
                b"is" => {
                    if let Some((record, _)) = cell.as_mut() {
                        record.data = CellData::InlineString(std::mem::take(&mut text));
                    }
                }
                b"c" => {
                    if let (Some((record, _)), Some(r)) = (cell.take(), row.as_mut()) {
                        r.cells.push(record);
                    }
                }
                b"row" => {
                    if let Some(r) = row.take() {
                        on_row(r)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(meta)
}

fn parse_row_attrs(e: &BytesStart, next_row: u32, part: &str) -> Result<RowRecord> {
    let index = match xml::attr_u32(e, b"r") {
        Some(0) => return Err(CodecError::parse(part, "row index 0")),
        Some(r) => r - 1,
        None => next_row,
    };
    Ok(RowRecord {
        index,
        height: xml::attr_f64(e, b"ht"),
        custom_height: xml::attr_bool(e, b"customHeight", false),
        hidden: xml::attr_bool(e, b"hidden", false),
        style: if xml::attr_bool(e, b"customFormat", false) {
            xml::attr_u32(e, b"s")
        } else {
            None
        },
        cells: Vec::new(),
    })
}

fn parse_col_attrs(e: &BytesStart) -> ColumnRecord {
    let min = xml::attr_u32(e, b"min").unwrap_or(1).max(1) - 1;
    let max = xml::attr_u32(e, b"max").unwrap_or(min + 1).max(min + 1) - 1;
    ColumnRecord {
        min,
        max,
        width: xml::attr_f64(e, b"width"),
        style: xml::attr_u32(e, b"style"),
        custom_width: xml::attr_bool(e, b"customWidth", false),
        hidden: xml::attr_bool(e, b"hidden", false),
        best_fit: xml::attr_bool(e, b"bestFit", false),
    }
}

fn cell_data(cell_type: Option<&str>, text: &str, part: &str) -> Result<CellData> {
    Ok(match cell_type {
        Some("s") => match utils::parse_u32_bytes(text.trim().as_bytes()) {
            Some(i) => CellData::SharedString(i),
            None => return Err(CodecError::parse(part, format!("bad shared string index '{}'", text))),
        },
        Some("str") => CellData::FormulaString(text.to_string()),
        Some("inlineStr") => CellData::InlineString(text.to_string()),
        Some("b") => CellData::Boolean(matches!(text.trim(), "1" | "true" | "TRUE")),
        Some("e") => CellData::Error(text.to_string()),
        Some("d") => CellData::IsoDate(text.to_string()),
        _ => match utils::parse_f64_bytes(text.trim().as_bytes()) {
            Some(n) => CellData::Number(n),
            None => return Err(CodecError::parse(part, format!("bad numeric value '{}'", text))),
        },
    })
}

/// Everything up to and including `<sheetData>`.
pub fn write_head<W: Write>(out: &mut W, meta: &WorksheetMeta) -> Result<()> {
    let mut s = String::with_capacity(512);
    s.push_str(XML_DECLARATION);
    s.push_str(&format!("<worksheet xmlns=\"{}\" xmlns:r=\"{}\">", NS_MAIN, NS_REL));
    if meta.fit_to_page {
        s.push_str("<sheetPr><pageSetUpPr fitToPage=\"1\"/></sheetPr>");
    }
    let dimension = meta
        .dimension
        .map(|d| format_range(&d))
        .unwrap_or_else(|| "A1".to_string());
    s.push_str(&format!("<dimension ref=\"{}\"/>", dimension));

    let view = &meta.view;
    s.push_str("<sheetViews><sheetView");
    if view.tab_selected {
        s.push_str(" tabSelected=\"1\"");
    }
    if !view.show_grid_lines {
        s.push_str(" showGridLines=\"0\"");
    }
    if !view.show_headers {
        s.push_str(" showRowColHeaders=\"0\"");
    }
    if view.zoom_scale != 100 {
        s.push_str(&format!(" zoomScale=\"{}\"", view.zoom_scale));
    }
    s.push_str(" workbookViewId=\"0\"");
    match &view.pane {
        Some(pane) if pane.x_split > 0 || pane.y_split > 0 => {
            let active = match (pane.x_split > 0, pane.y_split > 0) {
                (true, true) => "bottomRight",
                (false, true) => "bottomLeft",
                _ => "topRight",
            };
            s.push_str("><pane");
            if pane.x_split > 0 {
                s.push_str(&format!(" xSplit=\"{}\"", pane.x_split));
            }
            if pane.y_split > 0 {
                s.push_str(&format!(" ySplit=\"{}\"", pane.y_split));
            }
            let top_left = pane
                .top_left_cell
                .clone()
                .unwrap_or_else(|| format_address(pane.y_split, pane.x_split));
            s.push_str(&format!(
                " topLeftCell=\"{}\" activePane=\"{}\" state=\"{}\"/>",
                top_left,
                active,
                if pane.frozen { "frozen" } else { "split" }
            ));
            s.push_str(&format!("<selection pane=\"{}\"/></sheetView>", active));
        }
        _ => s.push_str("/>"),
    }
    s.push_str("</sheetViews>");

    s.push_str("<sheetFormatPr");
    if let Some(base) = meta.format.base_col_width {
        s.push_str(&format!(" baseColWidth=\"{}\"", base));
    }
    if let Some(width) = meta.format.default_col_width {
        s.push_str(&format!(" defaultColWidth=\"{}\"", format_f64(width)));
    }
    s.push_str(&format!(
        " defaultRowHeight=\"{}\"/>",
        format_f64(meta.format.default_row_height.unwrap_or(crate::units::DEFAULT_ROW_HEIGHT_PT))
    ));

    if !meta.columns.is_empty() {
        s.push_str("<cols>");
        for col in &meta.columns {
            s.push_str(&format!("<col min=\"{}\" max=\"{}\"", col.min + 1, col.max + 1));
            if let Some(w) = col.width {
                s.push_str(&format!(" width=\"{}\"", format_f64(w)));
            }
            if let Some(style) = col.style {
                s.push_str(&format!(" style=\"{}\"", style));
            }
            if col.hidden {
                s.push_str(" hidden=\"1\"");
            }
            if col.best_fit {
                s.push_str(" bestFit=\"1\"");
            }
            if col.custom_width {
                s.push_str(" customWidth=\"1\"");
            }
            s.push_str("/>");
        }
        s.push_str("</cols>");
    }
    s.push_str("<sheetData>");
    out.write_all(s.as_bytes())?;
    Ok(())
}

/// One `<row>` element.
pub fn write_row<W: Write>(out: &mut W, row: &RowRecord) -> Result<()> {
    let mut s = String::with_capacity(64 + row.cells.len() * 32);
    let row_number = row.index + 1;
    s.push_str("<row r=\"");
    s.push_str(&format_u32(row_number));
    s.push('"');
    if let Some(style) = row.style {
        s.push_str(&format!(" s=\"{}\" customFormat=\"1\"", style));
    }
    if let Some(h) = row.height {
        s.push_str(&format!(" ht=\"{}\"", format_f64(h)));
    }
    if row.hidden {
        s.push_str(" hidden=\"1\"");
    }
    if row.custom_height {
        s.push_str(" customHeight=\"1\"");
    }
    if row.cells.is_empty() {
        s.push_str("/>");
        out.write_all(s.as_bytes())?;
        return Ok(());
    }
    s.push('>');
    for cell in &row.cells {
        write_cell(&mut s, row.index, cell);
    }
    s.push_str("</row>");
    out.write_all(s.as_bytes())?;
    Ok(())
}

fn write_cell(s: &mut String, row: u32, cell: &CellRecord) {
    s.push_str("<c r=\"");
    s.push_str(&format_address(row, cell.col));
    s.push('"');
    if cell.style != 0 {
        s.push_str(" s=\"");
        s.push_str(&format_u32(cell.style));
        s.push('"');
    }
    let cell_type = match &cell.data {
        CellData::SharedString(_) => Some("s"),
        CellData::InlineString(_) => Some("inlineStr"),
        CellData::FormulaString(_) => Some("str"),
        CellData::Boolean(_) => Some("b"),
        CellData::Error(_) => Some("e"),
        CellData::IsoDate(_) => Some("d"),
        CellData::Number(_) | CellData::Empty => None,
    };
    if let Some(t) = cell_type {
        s.push_str(" t=\"");
        s.push_str(t);
        s.push('"');
    }
    if cell.formula.is_none() && cell.data == CellData::Empty {
        s.push_str("/>");
        return;
    }
    s.push('>');
    if let Some(f) = &cell.formula {
        s.push_str("<f>");
        s.push_str(&escape_xml(f));
        s.push_str("</f>");
    }
    match &cell.data {
        CellData::Empty => {}
        CellData::Number(n) => push_value(s, &format_f64(*n)),
        CellData::SharedString(i) => push_value(s, &format_u32(*i)),
        CellData::Boolean(b) => push_value(s, if *b { "1" } else { "0" }),
        CellData::FormulaString(t) | CellData::Error(t) | CellData::IsoDate(t) => {
            push_value(s, &escape_xml(t))
        }
        CellData::InlineString(t) => {
            if needs_space_preserve(t) {
                s.push_str("<is><t xml:space=\"preserve\">");
            } else {
                s.push_str("<is><t>");
            }
            s.push_str(&escape_xml(t));
            s.push_str("</t></is>");
        }
    }
    s.push_str("</c>");
}

fn push_value(s: &mut String, v: &str) {
    s.push_str("<v>");
    s.push_str(v);
    s.push_str("</v>");
}

/// `</sheetData>` and everything after it.
pub fn write_tail<W: Write>(out: &mut W, meta: &WorksheetMeta) -> Result<()> {
    let mut s = String::from("</sheetData>");
    if !meta.merges.is_empty() {
        s.push_str(&format!("<mergeCells count=\"{}\">", meta.merges.len()));
        for m in &meta.merges {
            s.push_str(&format!("<mergeCell ref=\"{}\"/>", format_range(m)));
        }
        s.push_str("</mergeCells>");
    }
    if let Some(m) = &meta.page_margins {
        s.push_str(&format!(
            "<pageMargins left=\"{}\" right=\"{}\" top=\"{}\" bottom=\"{}\" header=\"{}\" footer=\"{}\"/>",
            format_f64(m.left),
            format_f64(m.right),
            format_f64(m.top),
            format_f64(m.bottom),
            format_f64(m.header),
            format_f64(m.footer)
        ));
    }
    if let Some(p) = &meta.page_setup {
        s.push_str("<pageSetup");
        if let Some(size) = p.paper_size {
            s.push_str(&format!(" paperSize=\"{}\"", size));
        }
        if let Some(scale) = p.scale {
            s.push_str(&format!(" scale=\"{}\"", scale));
        }
        if let Some(w) = p.fit_to_width {
            s.push_str(&format!(" fitToWidth=\"{}\"", w));
        }
        if let Some(h) = p.fit_to_height {
            s.push_str(&format!(" fitToHeight=\"{}\"", h));
        }
        if let Some(o) = &p.orientation {
            s.push_str(&format!(" orientation=\"{}\"", escape_xml(o)));
        }
        s.push_str("/>");
    }
    if let Some(id) = &meta.drawing_rel {
        s.push_str(&format!("<drawing r:id=\"{}\"/>", escape_xml(id)));
    }
    s.push_str("</worksheet>");
    out.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetPr><pageSetUpPr fitToPage="1"/></sheetPr>
  <dimension ref="A1:D5"/>
  <sheetViews><sheetView showGridLines="0" zoomScale="150" workbookViewId="0">
    <pane xSplit="1" ySplit="2" topLeftCell="B3" activePane="bottomRight" state="frozen"/>
  </sheetView></sheetViews>
  <sheetFormatPr defaultRowHeight="15" baseColWidth="10"/>
  <cols><col min="2" max="3" width="20.5" customWidth="1"/><col min="5" max="5" hidden="1"/></cols>
  <sheetData>
    <row r="1" spans="1:4"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>42</v></c><c r="C1" s="3"><v>-5</v></c></row>
    <row r="3" ht="30" customHeight="1" hidden="1">
      <c r="A3" t="str"><f>UPPER("x")</f><v>X</v></c>
      <c r="B3" t="b"><v>1</v></c>
      <c r="C3" t="e"><v>#DIV/0!</v></c>
      <c r="D3" t="inlineStr"><is><t xml:space="preserve"> a &amp; b</t></is></c>
      <c r="E3" s="2"/>
    </row>
    <row r="4"><c><v>1</v></c><c><v>2.5</v></c></row>
  </sheetData>
  <mergeCells count="1"><mergeCell ref="A5:C5"/></mergeCells>
  <pageMargins left="0.5" right="0.5" top="1" bottom="1" header="0.3" footer="0.3"/>
  <pageSetup paperSize="9" orientation="landscape" fitToWidth="1" fitToHeight="0"/>
  <drawing r:id="rId1"/>
</worksheet>"#;

    fn parse(xml: &str) -> (WorksheetMeta, Vec<RowRecord>) {
        let mut rows = Vec::new();
        let meta = parse_worksheet(xml.as_bytes(), "sheet1.xml", |row| {
            rows.push(row);
            Ok(())
        })
        .unwrap();
        (meta, rows)
    }

    #[test]
    fn test_parse_rows_and_cells() {
        let (_, rows) = parse(SHEET);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].cells[0].data, CellData::SharedString(0));
        assert_eq!(rows[0].cells[1].data, CellData::Number(42.0));
        assert_eq!(rows[0].cells[2].style, 3);

        let row = &rows[1];
        assert_eq!(row.index, 2);
        assert_eq!(row.height, Some(30.0));
        assert!(row.custom_height && row.hidden);
        assert_eq!(row.cells[0].formula.as_deref(), Some("UPPER(\"x\")"));
        assert_eq!(row.cells[0].data, CellData::FormulaString("X".into()));
        assert_eq!(row.cells[1].data, CellData::Boolean(true));
        assert_eq!(row.cells[2].data, CellData::Error("#DIV/0!".into()));
        assert_eq!(row.cells[3].data, CellData::InlineString(" a & b".into()));
        assert_eq!(row.cells[4].col, 4);
        assert_eq!(row.cells[4].data, CellData::Empty);

        // Cells without an address follow the previous one.
        assert_eq!(rows[2].cells[0].col, 0);
        assert_eq!(rows[2].cells[1].col, 1);
    }

    #[test]
    fn test_parse_meta() {
        let (meta, _) = parse(SHEET);
        assert!(meta.fit_to_page);
        assert_eq!(meta.dimension, Some(CellRange::new((0, 0), (4, 3))));
        assert!(!meta.view.show_grid_lines);
        assert_eq!(meta.view.zoom_scale, 150);
        let pane = meta.view.pane.as_ref().unwrap();
        assert_eq!((pane.x_split, pane.y_split, pane.frozen), (1, 2, true));
        assert_eq!(meta.format.default_row_height, Some(15.0));
        assert_eq!(meta.columns.len(), 2);
        assert_eq!((meta.columns[0].min, meta.columns[0].max), (1, 2));
        assert!(meta.columns[1].hidden);
        assert_eq!(meta.merges, vec![CellRange::new((4, 0), (4, 2))]);
        assert_eq!(meta.page_setup.as_ref().unwrap().orientation.as_deref(), Some("landscape"));
        assert_eq!(meta.page_margins.as_ref().unwrap().top, 1.0);
        assert_eq!(meta.drawing_rel.as_deref(), Some("rId1"));
    }

    #[test]
    fn test_written_sheet_parses_back() {
        let (meta, rows) = parse(SHEET);
        let mut out = Vec::new();
        write_head(&mut out, &meta).unwrap();
        for row in &rows {
            write_row(&mut out, row).unwrap();
        }
        write_tail(&mut out, &meta).unwrap();
        let xml = String::from_utf8(out).unwrap();
        let (meta2, rows2) = parse(&xml);
        assert_eq!(meta2, meta);
        assert_eq!(rows2, rows);
    }

    #[test]
    fn test_bad_values_are_errors() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>abc</v></c></row></sheetData></worksheet>"#;
        let result = parse_worksheet(xml.as_bytes(), "sheet1.xml", |_| Ok(()));
        assert!(matches!(result, Err(CodecError::SchemaParse { .. })));

        let xml = r#"<worksheet><sheetData><row r="1"><c r="1A"><v>1</v></c></row></sheetData></worksheet>"#;
        let result = parse_worksheet(xml.as_bytes(), "sheet1.xml", |_| Ok(()));
        assert!(matches!(result, Err(CodecError::InvalidAddress(_))));
    }
}

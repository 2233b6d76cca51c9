//! `xl/styles.xml`: the index-addressed font, fill, border and cell-format tables.

use std::io::Cursor;

use quick_xml::events::{BytesStart, Event};

use crate::color::{ColorRef, SolidColor};
use crate::error::{CodecError, Result};
use crate::number_format::{builtin_code, FIRST_CUSTOM_FORMAT_ID};
use crate::parts::{sheet_color, write_sheet_color, NS_MAIN};
use crate::style::{BorderLineStyle, HorizontalAlignment, VerticalAlignment};
use crate::xml::{self, escape_xml, format_f64, format_u32, XML_DECLARATION};

/// A `<font>` (or rich-run `<rPr>`) record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontRecord {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub color: Option<ColorRef>,
}

impl FontRecord {
    /// Font 0 of every stylesheet this crate writes.
    pub fn calibri() -> Self {
        FontRecord {
            name: Some("Calibri".to_string()),
            size: Some(11.0),
            ..Default::default()
        }
    }
}

/// A `<fill>` record.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum FillRecord {
    #[default]
    None,
    Pattern {
        /// `patternType`, e.g. `solid`, `gray125`, `darkGray`.
        pattern: String,
        fg: Option<ColorRef>,
        bg: Option<ColorRef>,
    },
    Gradient {
        degree: f64,
        stops: Vec<(f64, ColorRef)>,
    },
}

impl FillRecord {
    pub fn solid(color: ColorRef) -> Self {
        FillRecord::Pattern {
            pattern: "solid".to_string(),
            fg: Some(color),
            bg: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BorderSideRecord {
    pub style: BorderLineStyle,
    pub color: Option<ColorRef>,
}

/// A `<border>` record. Diagonals are not modelled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BorderRecord {
    pub left: Option<BorderSideRecord>,
    pub right: Option<BorderSideRecord>,
    pub top: Option<BorderSideRecord>,
    pub bottom: Option<BorderSideRecord>,
}

/// The `<alignment>` child of an xf. `text_rotation` is the raw file value
/// (0-90 counter-clockwise, 91-180 clockwise, 255 vertical text).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AlignmentRecord {
    pub horizontal: Option<HorizontalAlignment>,
    pub vertical: Option<VerticalAlignment>,
    pub wrap_text: bool,
    pub text_rotation: u32,
    pub indent: u32,
}

/// One `<xf>` record of `cellXfs`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XfRecord {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    pub alignment: Option<AlignmentRecord>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stylesheet {
    /// Custom number formats, `(id, code)`.
    pub num_fmts: Vec<(u32, String)>,
    pub fonts: Vec<FontRecord>,
    pub fills: Vec<FillRecord>,
    pub borders: Vec<BorderRecord>,
    pub cell_xfs: Vec<XfRecord>,
    /// `<colors><indexedColors>` override of the legacy palette.
    pub indexed_colors: Vec<SolidColor>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Other,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    IndexedColors,
}

#[derive(Clone, Copy, PartialEq)]
enum BorderEdge {
    Left,
    Right,
    Top,
    Bottom,
    Ignored,
}

impl Stylesheet {
    /// The mandatory defaults: font 0, fills `none` and `gray125`, an empty
    /// border and xf 0 pointing at all of them.
    pub fn excel_defaults() -> Self {
        Stylesheet {
            num_fmts: Vec::new(),
            fonts: vec![FontRecord::calibri()],
            fills: vec![
                FillRecord::None,
                FillRecord::Pattern {
                    pattern: "gray125".to_string(),
                    fg: None,
                    bg: None,
                },
            ],
            borders: vec![BorderRecord::default()],
            cell_xfs: vec![XfRecord::default()],
            indexed_colors: Vec::new(),
        }
    }

    /// Format code for a number format id: custom table first, then built-ins.
    pub fn number_format_code(&self, id: u32) -> Option<&str> {
        self.num_fmts
            .iter()
            .find(|(fmt_id, _)| *fmt_id == id)
            .map(|(_, code)| code.as_str())
            .or_else(|| builtin_code(id))
    }

    /// Next free custom number format id.
    pub fn next_num_fmt_id(&self) -> u32 {
        self.num_fmts
            .iter()
            .map(|(id, _)| id + 1)
            .max()
            .unwrap_or(FIRST_CUSTOM_FORMAT_ID)
            .max(FIRST_CUSTOM_FORMAT_ID)
    }

    pub fn parse(data: &[u8], part: &str) -> Result<Stylesheet> {
        let mut reader = xml::reader(Cursor::new(data));
        let mut buf = Vec::new();
        let mut sheet = Stylesheet::default();

        let mut section = Section::Other;
        let mut font: Option<FontRecord> = None;
        let mut fill: Option<FillRecord> = None;
        let mut stop_position: Option<f64> = None;
        let mut border: Option<BorderRecord> = None;
        let mut edge = BorderEdge::Ignored;
        let mut xf: Option<XfRecord> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| CodecError::parse(part, e))?;
            let (e, is_empty) = match &event {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(e) => {
                    match e.local_name().as_ref() {
                        b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs"
                        | b"indexedColors" => section = Section::Other,
                        b"font" => {
                            if let Some(f) = font.take() {
                                sheet.fonts.push(f);
                            }
                        }
                        b"fill" => {
                            if let Some(f) = fill.take() {
                                sheet.fills.push(f);
                            }
                        }
                        b"stop" => stop_position = None,
                        b"border" => {
                            if let Some(b) = border.take() {
                                sheet.borders.push(b);
                            }
                        }
                        b"left" | b"right" | b"top" | b"bottom" | b"start" | b"end"
                        | b"diagonal" => edge = BorderEdge::Ignored,
                        b"xf" => {
                            if let Some(x) = xf.take() {
                                sheet.cell_xfs.push(x);
                            }
                        }
                        _ => {}
                    }
                    buf.clear();
                    continue;
                }
                Event::Eof => break,
                _ => {
                    buf.clear();
                    continue;
                }
            };

            match e.local_name().as_ref() {
                b"numFmts" => section = Section::NumFmts,
                b"fonts" => section = Section::Fonts,
                b"fills" => section = Section::Fills,
                b"borders" => section = Section::Borders,
                b"cellXfs" => section = Section::CellXfs,
                b"indexedColors" => section = Section::IndexedColors,
                b"cellStyleXfs" | b"dxfs" | b"cellStyles" | b"mruColors" | b"extLst" => {
                    section = Section::Other
                }
                b"numFmt" if section == Section::NumFmts => {
                    if let (Some(id), Some(code)) =
                        (xml::attr_u32(e, b"numFmtId"), xml::attr_str(e, b"formatCode"))
                    {
                        sheet.num_fmts.push((id, code));
                    }
                }
                b"rgbColor" if section == Section::IndexedColors => {
                    let color = xml::attr_str(e, b"rgb")
                        .and_then(|v| SolidColor::from_hex(&v))
                        .unwrap_or(SolidColor::BLACK);
                    sheet.indexed_colors.push(color);
                }
                b"font" if section == Section::Fonts => {
                    if is_empty {
                        sheet.fonts.push(FontRecord::default());
                    } else {
                        font = Some(FontRecord::default());
                    }
                }
                _ if font.is_some() => {
                    if let Some(f) = font.as_mut() {
                        parse_font_child(e, f);
                    }
                }
                b"fill" if section == Section::Fills => {
                    if is_empty {
                        sheet.fills.push(FillRecord::None);
                    } else {
                        fill = Some(FillRecord::None);
                    }
                }
                b"patternFill" if fill.is_some() => {
                    let pattern = xml::attr_str(e, b"patternType").unwrap_or_else(|| "none".into());
                    fill = Some(if pattern == "none" {
                        FillRecord::None
                    } else {
                        FillRecord::Pattern { pattern, fg: None, bg: None }
                    });
                }
                b"fgColor" | b"bgColor" => {
                    if let Some(FillRecord::Pattern { fg, bg, .. }) = fill.as_mut() {
                        let color = sheet_color(e);
                        if e.local_name().as_ref() == b"fgColor" {
                            *fg = color;
                        } else {
                            *bg = color;
                        }
                    }
                }
                b"gradientFill" if fill.is_some() => {
                    if xml::attr_str(e, b"type").as_deref() == Some("path") {
                        log::warn!("path gradient fill in '{}' read as linear", part);
                    }
                    fill = Some(FillRecord::Gradient {
                        degree: xml::attr_f64(e, b"degree").unwrap_or(0.0),
                        stops: Vec::new(),
                    });
                }
                b"stop" => stop_position = xml::attr_f64(e, b"position"),
                b"border" if section == Section::Borders => {
                    if is_empty {
                        sheet.borders.push(BorderRecord::default());
                    } else {
                        border = Some(BorderRecord::default());
                    }
                }
                b"left" | b"right" | b"top" | b"bottom" | b"start" | b"end" | b"diagonal"
                    if border.is_some() =>
                {
                    let side = xml::attr_str(e, b"style")
                        .and_then(|s| BorderLineStyle::from_attr(&s))
                        .map(|style| BorderSideRecord { style, color: None });
                    let which = match e.local_name().as_ref() {
                        b"left" | b"start" => BorderEdge::Left,
                        b"right" | b"end" => BorderEdge::Right,
                        b"top" => BorderEdge::Top,
                        b"bottom" => BorderEdge::Bottom,
                        _ => BorderEdge::Ignored,
                    };
                    if let Some(b) = border.as_mut() {
                        match which {
                            BorderEdge::Left => b.left = side,
                            BorderEdge::Right => b.right = side,
                            BorderEdge::Top => b.top = side,
                            BorderEdge::Bottom => b.bottom = side,
                            BorderEdge::Ignored => {}
                        }
                    }
                    if !is_empty {
                        edge = which;
                    }
                }
                b"color" => {
                    if let (Some(b), true) = (border.as_mut(), edge != BorderEdge::Ignored) {
                        let target = match edge {
                            BorderEdge::Left => b.left.as_mut(),
                            BorderEdge::Right => b.right.as_mut(),
                            BorderEdge::Top => b.top.as_mut(),
                            BorderEdge::Bottom => b.bottom.as_mut(),
                            BorderEdge::Ignored => None,
                        };
                        if let Some(side) = target {
                            side.color = sheet_color(e);
                        }
                    } else if let (Some(FillRecord::Gradient { stops, .. }), Some(pos)) =
                        (fill.as_mut(), stop_position)
                    {
                        if let Some(color) = sheet_color(e) {
                            stops.push((pos, color));
                        }
                    }
                }
                b"xf" if section == Section::CellXfs => {
                    let record = XfRecord {
                        num_fmt_id: xml::attr_u32(e, b"numFmtId").unwrap_or(0),
                        font_id: xml::attr_u32(e, b"fontId").unwrap_or(0),
                        fill_id: xml::attr_u32(e, b"fillId").unwrap_or(0),
                        border_id: xml::attr_u32(e, b"borderId").unwrap_or(0),
                        alignment: None,
                    };
                    if is_empty {
                        sheet.cell_xfs.push(record);
                    } else {
                        xf = Some(record);
                    }
                }
                b"alignment" => {
                    if let Some(x) = xf.as_mut() {
                        x.alignment = Some(parse_alignment(e));
                    }
                }
                _ => {}
            }
            buf.clear();
        }

        log::debug!(
            "stylesheet '{}': {} fonts, {} fills, {} borders, {} xfs, {} custom formats",
            part,
            sheet.fonts.len(),
            sheet.fills.len(),
            sheet.borders.len(),
            sheet.cell_xfs.len(),
            sheet.num_fmts.len()
        );
        Ok(sheet)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push_str("<styleSheet xmlns=\"");
        out.push_str(NS_MAIN);
        out.push_str("\">");

        if !self.num_fmts.is_empty() {
            out.push_str(&format!("<numFmts count=\"{}\">", self.num_fmts.len()));
            for (id, code) in &self.num_fmts {
                out.push_str(&format!(
                    "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml(code)
                ));
            }
            out.push_str("</numFmts>");
        }

        out.push_str(&format!("<fonts count=\"{}\">", self.fonts.len()));
        for font in &self.fonts {
            out.push_str("<font>");
            write_font_props(&mut out, font, "name");
            out.push_str("</font>");
        }
        out.push_str("</fonts>");

        out.push_str(&format!("<fills count=\"{}\">", self.fills.len()));
        for fill in &self.fills {
            write_fill(&mut out, fill);
        }
        out.push_str("</fills>");

        out.push_str(&format!("<borders count=\"{}\">", self.borders.len()));
        for border in &self.borders {
            out.push_str("<border>");
            write_border_side(&mut out, "left", border.left.as_ref());
            write_border_side(&mut out, "right", border.right.as_ref());
            write_border_side(&mut out, "top", border.top.as_ref());
            write_border_side(&mut out, "bottom", border.bottom.as_ref());
            out.push_str("<diagonal/></border>");
        }
        out.push_str("</borders>");

        out.push_str(
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
        );

        out.push_str(&format!("<cellXfs count=\"{}\">", self.cell_xfs.len()));
        for xf in &self.cell_xfs {
            write_xf(&mut out, xf);
        }
        out.push_str("</cellXfs>");

        out.push_str(
            "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
        );
        out.push_str("<dxfs count=\"0\"/>");
        out.push_str(
            "<tableStyles count=\"0\" defaultTableStyle=\"TableStyleMedium2\" defaultPivotStyle=\"PivotStyleLight16\"/>",
        );

        if !self.indexed_colors.is_empty() {
            out.push_str("<colors><indexedColors>");
            for c in &self.indexed_colors {
                out.push_str("<rgbColor rgb=\"");
                out.push_str(&c.to_argb_hex());
                out.push_str("\"/>");
            }
            out.push_str("</indexedColors></colors>");
        }

        out.push_str("</styleSheet>");
        out
    }
}

/// One child of `<font>` or `<rPr>`.
pub(crate) fn parse_font_child(e: &BytesStart, font: &mut FontRecord) {
    match e.local_name().as_ref() {
        b"b" => font.bold = xml::attr_bool(e, b"val", true),
        b"i" => font.italic = xml::attr_bool(e, b"val", true),
        b"strike" => font.strike = xml::attr_bool(e, b"val", true),
        b"u" => {
            font.underline = !matches!(xml::attr_str(e, b"val").as_deref(), Some("none"));
        }
        b"sz" => font.size = xml::attr_f64(e, b"val"),
        b"name" | b"rFont" => font.name = xml::attr_str(e, b"val"),
        b"color" => font.color = sheet_color(e),
        _ => {}
    }
}

/// Font properties, in Excel's element order. `name_tag` is `name` in the
/// stylesheet and `rFont` inside rich-text runs.
pub(crate) fn write_font_props(out: &mut String, font: &FontRecord, name_tag: &str) {
    if font.bold {
        out.push_str("<b/>");
    }
    if font.italic {
        out.push_str("<i/>");
    }
    if font.strike {
        out.push_str("<strike/>");
    }
    if font.underline {
        out.push_str("<u/>");
    }
    if let Some(size) = font.size {
        out.push_str("<sz val=\"");
        out.push_str(&format_f64(size));
        out.push_str("\"/>");
    }
    if let Some(color) = &font.color {
        write_sheet_color(out, "color", color);
    }
    if let Some(name) = &font.name {
        out.push('<');
        out.push_str(name_tag);
        out.push_str(" val=\"");
        out.push_str(&escape_xml(name));
        out.push_str("\"/>");
    }
}

fn write_fill(out: &mut String, fill: &FillRecord) {
    match fill {
        FillRecord::None => out.push_str("<fill><patternFill patternType=\"none\"/></fill>"),
        FillRecord::Pattern { pattern, fg, bg } => {
            out.push_str("<fill><patternFill patternType=\"");
            out.push_str(&escape_xml(pattern));
            if fg.is_none() && bg.is_none() {
                out.push_str("\"/></fill>");
                return;
            }
            out.push_str("\">");
            if let Some(c) = fg {
                write_sheet_color(out, "fgColor", c);
            }
            match bg {
                Some(c) => write_sheet_color(out, "bgColor", c),
                None => out.push_str("<bgColor indexed=\"64\"/>"),
            }
            out.push_str("</patternFill></fill>");
        }
        FillRecord::Gradient { degree, stops } => {
            out.push_str("<fill><gradientFill degree=\"");
            out.push_str(&format_f64(*degree));
            out.push_str("\">");
            for (position, color) in stops {
                out.push_str("<stop position=\"");
                out.push_str(&format_f64(*position));
                out.push_str("\">");
                write_sheet_color(out, "color", color);
                out.push_str("</stop>");
            }
            out.push_str("</gradientFill></fill>");
        }
    }
}

fn write_border_side(out: &mut String, tag: &str, side: Option<&BorderSideRecord>) {
    match side {
        None => {
            out.push('<');
            out.push_str(tag);
            out.push_str("/>");
        }
        Some(side) => {
            out.push_str(&format!("<{} style=\"{}\"", tag, side.style.as_attr()));
            match &side.color {
                Some(color) => {
                    out.push('>');
                    write_sheet_color(out, "color", color);
                    out.push_str(&format!("</{}>", tag));
                }
                None => out.push_str("/>"),
            }
        }
    }
}

fn write_xf(out: &mut String, xf: &XfRecord) {
    out.push_str("<xf numFmtId=\"");
    out.push_str(&format_u32(xf.num_fmt_id));
    out.push_str("\" fontId=\"");
    out.push_str(&format_u32(xf.font_id));
    out.push_str("\" fillId=\"");
    out.push_str(&format_u32(xf.fill_id));
    out.push_str("\" borderId=\"");
    out.push_str(&format_u32(xf.border_id));
    out.push_str("\" xfId=\"0\"");
    if xf.num_fmt_id != 0 {
        out.push_str(" applyNumberFormat=\"1\"");
    }
    if xf.font_id != 0 {
        out.push_str(" applyFont=\"1\"");
    }
    if xf.fill_id != 0 {
        out.push_str(" applyFill=\"1\"");
    }
    if xf.border_id != 0 {
        out.push_str(" applyBorder=\"1\"");
    }
    match &xf.alignment {
        None => out.push_str("/>"),
        Some(align) => {
            out.push_str(" applyAlignment=\"1\"><alignment");
            if let Some(h) = align.horizontal {
                out.push_str(" horizontal=\"");
                out.push_str(h.as_attr());
                out.push('"');
            }
            if let Some(v) = align.vertical {
                out.push_str(" vertical=\"");
                out.push_str(v.as_attr());
                out.push('"');
            }
            if align.text_rotation != 0 {
                out.push_str(" textRotation=\"");
                out.push_str(&format_u32(align.text_rotation));
                out.push('"');
            }
            if align.wrap_text {
                out.push_str(" wrapText=\"1\"");
            }
            if align.indent != 0 {
                out.push_str(" indent=\"");
                out.push_str(&format_u32(align.indent));
                out.push('"');
            }
            out.push_str("/></xf>");
        }
    }
}

fn parse_alignment(e: &BytesStart) -> AlignmentRecord {
    let horizontal = xml::attr_str(e, b"horizontal").and_then(|v| {
        let parsed = HorizontalAlignment::from_attr(&v);
        if parsed.is_none() {
            log::warn!("ignoring unknown horizontal alignment '{}'", v);
        }
        parsed
    });
    let vertical = xml::attr_str(e, b"vertical").and_then(|v| {
        let parsed = VerticalAlignment::from_attr(&v);
        if parsed.is_none() {
            log::warn!("ignoring unknown vertical alignment '{}'", v);
        }
        parsed
    });
    AlignmentRecord {
        horizontal,
        vertical,
        wrap_text: xml::attr_bool(e, b"wrapText", false),
        text_rotation: xml::attr_u32(e, b"textRotation").unwrap_or(0),
        indent: xml::attr_u32(e, b"indent").unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorTransform, ThemeSlot};

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0.00;[Red]\(&quot;$&quot;#,##0.00\)"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/></font>
    <font><b/><i val="0"/><u val="none"/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="4">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4" tint="0.39997558519241921"/><bgColor indexed="64"/></patternFill></fill>
    <fill><gradientFill degree="90"><stop position="0"><color rgb="FFFFFFFF"/></stop><stop position="1"><color theme="4"/></stop></gradientFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border><left style="thin"><color indexed="64"/></left><right/><top style="double"/><bottom style="medium"><color auto="1"/></bottom><diagonal/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="2" borderId="1" xfId="0" applyAlignment="1"><alignment horizontal="left" vertical="top" wrapText="1" indent="2" textRotation="135"/></xf>
  </cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
  <dxfs count="1"><dxf><font><b/></font><fill><patternFill><bgColor rgb="FF00FF00"/></patternFill></fill></dxf></dxfs>
  <colors><indexedColors><rgbColor rgb="FF111111"/><rgbColor rgb="FF222222"/></indexedColors></colors>
</styleSheet>"#;

    #[test]
    fn test_parse_tables() {
        let sheet = Stylesheet::parse(STYLES.as_bytes(), "xl/styles.xml").unwrap();
        assert_eq!(sheet.fonts.len(), 2);
        assert_eq!(sheet.fills.len(), 4);
        assert_eq!(sheet.borders.len(), 2);
        assert_eq!(sheet.cell_xfs.len(), 2);
        assert_eq!(sheet.indexed_colors.len(), 2);
        assert_eq!(sheet.number_format_code(164), Some("\"$\"#,##0.00;[Red]\\(\"$\"#,##0.00\\)"));
        assert_eq!(sheet.number_format_code(14), Some("mm-dd-yy"));

        let bold = &sheet.fonts[1];
        assert!(bold.bold);
        assert!(!bold.italic);
        assert!(!bold.underline);
        assert_eq!(bold.size, Some(14.0));
        assert_eq!(bold.name.as_deref(), Some("Arial"));

        match &sheet.fills[2] {
            FillRecord::Pattern { pattern, fg, bg } => {
                assert_eq!(pattern, "solid");
                assert_eq!(
                    fg,
                    &Some(ColorRef::Theme {
                        slot: ThemeSlot::Accent1,
                        transforms: vec![ColorTransform::SheetTint(39_998)]
                    })
                );
                assert_eq!(bg, &Some(ColorRef::Indexed(64)));
            }
            other => panic!("unexpected fill {:?}", other),
        }
        match &sheet.fills[3] {
            FillRecord::Gradient { degree, stops } => {
                assert_eq!(*degree, 90.0);
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[1].0, 1.0);
            }
            other => panic!("unexpected fill {:?}", other),
        }

        let border = &sheet.borders[1];
        assert_eq!(border.left.as_ref().unwrap().color, Some(ColorRef::Indexed(64)));
        assert_eq!(border.top.as_ref().unwrap().style, BorderLineStyle::Double);
        assert_eq!(border.bottom.as_ref().unwrap().color, Some(ColorRef::Auto));
        assert!(border.right.is_none());

        let xf = &sheet.cell_xfs[1];
        assert_eq!((xf.num_fmt_id, xf.font_id, xf.fill_id, xf.border_id), (164, 1, 2, 1));
        let align = xf.alignment.as_ref().unwrap();
        assert_eq!(align.horizontal, Some(HorizontalAlignment::Left));
        assert_eq!(align.vertical, Some(VerticalAlignment::Top));
        assert!(align.wrap_text);
        assert_eq!(align.indent, 2);
        assert_eq!(align.text_rotation, 135);
    }

    #[test]
    fn test_write_then_parse_preserves_tables() {
        let sheet = Stylesheet::parse(STYLES.as_bytes(), "xl/styles.xml").unwrap();
        let xml = sheet.to_xml();
        let again = Stylesheet::parse(xml.as_bytes(), "xl/styles.xml").unwrap();
        assert_eq!(again.fonts, sheet.fonts);
        assert_eq!(again.borders, sheet.borders);
        assert_eq!(again.cell_xfs, sheet.cell_xfs);
        assert_eq!(again.num_fmts, sheet.num_fmts);
        assert_eq!(again.indexed_colors, sheet.indexed_colors);
        assert_eq!(again.fills[3], sheet.fills[3]);
    }

    #[test]
    fn test_excel_defaults() {
        let sheet = Stylesheet::excel_defaults();
        let xml = sheet.to_xml();
        assert!(xml.contains("<patternFill patternType=\"gray125\"/>"));
        assert!(xml.contains("<cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/>"));
        assert_eq!(sheet.next_num_fmt_id(), FIRST_CUSTOM_FORMAT_ID);
        let parsed = Stylesheet::parse(xml.as_bytes(), "xl/styles.xml").unwrap();
        assert_eq!(parsed.cell_xfs.len(), 1);
        assert_eq!(parsed.fills.len(), 2);
    }
}

//! `xl/drawings/drawingN.xml`: anchored pictures, shapes and chart frames.

use std::io::Cursor;

use quick_xml::events::Event;

use crate::color::ColorRef;
use crate::error::{CodecError, Result};
use crate::parts::fill::{line_from_attrs, write_drawing_fill, write_drawing_line, DrawingFill, DrawingLine, FillReader};
use crate::parts::{add_transform, color_transform, drawing_color, is_drawing_color, write_drawing_color, NS_DRAWINGML, NS_REL};
use crate::xml::{self, escape_xml, XML_DECLARATION};

const NS_SPREADSHEET_DRAWING: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub(crate) const NS_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

/// A cell position plus an EMU offset into that cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnchorPoint {
    pub col: u32,
    pub col_offset: i64,
    pub row: u32,
    pub row_offset: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnchorRecord {
    TwoCell { from: AnchorPoint, to: AnchorPoint },
    /// Size is an EMU extent.
    OneCell { from: AnchorPoint, cx: i64, cy: i64 },
    Absolute { x: i64, y: i64, cx: i64, cy: i64 },
}

/// A theme style reference (`fillRef`, `lnRef`): 1-based index plus the color
/// that replaces `phClr`.
#[derive(Clone, Debug, PartialEq)]
pub struct StyleRef {
    pub idx: u32,
    pub color: Option<ColorRef>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectRecord {
    Picture {
        id: u32,
        name: String,
        description: Option<String>,
        embed_rel: String,
    },
    Shape {
        id: u32,
        name: String,
        geometry: String,
        fill: Option<DrawingFill>,
        line: Option<DrawingLine>,
        fill_ref: Option<StyleRef>,
        line_ref: Option<StyleRef>,
        text: Option<String>,
    },
    GraphicFrame {
        id: u32,
        name: String,
        chart_rel: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawingAnchor {
    pub anchor: AnchorRecord,
    pub object: ObjectRecord,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawingPart {
    pub anchors: Vec<DrawingAnchor>,
}

#[derive(Clone, Copy, PartialEq)]
enum PointField {
    None,
    Col,
    ColOff,
    Row,
    RowOff,
}

#[derive(Clone, Copy, PartialEq)]
enum RefTarget {
    Fill,
    Line,
}

#[derive(Default)]
struct ObjectState {
    kind: Option<&'static str>,
    id: u32,
    name: String,
    description: Option<String>,
    rel: Option<String>,
    geometry: Option<String>,
    fill: Option<DrawingFill>,
    line: Option<DrawingLine>,
    in_line: bool,
    fill_ref: Option<StyleRef>,
    line_ref: Option<StyleRef>,
    paragraphs: Vec<String>,
}

impl ObjectState {
    fn finish(self) -> Option<ObjectRecord> {
        match self.kind? {
            "pic" => Some(ObjectRecord::Picture {
                id: self.id,
                name: self.name,
                description: self.description,
                embed_rel: self.rel?,
            }),
            "graphicFrame" => Some(ObjectRecord::GraphicFrame {
                id: self.id,
                name: self.name,
                chart_rel: self.rel?,
            }),
            _ => Some(ObjectRecord::Shape {
                id: self.id,
                name: self.name,
                geometry: self.geometry.unwrap_or_else(|| "rect".to_string()),
                fill: self.fill,
                line: self.line,
                fill_ref: self.fill_ref,
                line_ref: self.line_ref,
                text: if self.paragraphs.is_empty() {
                    None
                } else {
                    Some(self.paragraphs.join("\n"))
                },
            }),
        }
    }
}

impl DrawingPart {
    pub fn parse(data: &[u8], part: &str) -> Result<DrawingPart> {
        let mut reader = xml::reader(Cursor::new(data));
        let mut buf = Vec::new();
        let mut drawing = DrawingPart::default();

        let mut anchor: Option<AnchorRecord> = None;
        let mut point: Option<bool> = None; // Some(true) = from, Some(false) = to
        let mut field = PointField::None;
        let mut object: Option<ObjectState> = None;
        let mut group_depth = 0u32;
        let mut in_sp_pr = false;
        let mut in_text = false;
        let mut in_t = false;
        let mut ref_target: Option<RefTarget> = None;
        let mut ref_color: Option<ColorRef> = None;
        let mut fills = FillReader::default();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| CodecError::parse(part, e))?;
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = e.local_name();
                    let name = name.as_ref();
                    if group_depth > 0 {
                        if name == b"grpSp" && !is_empty {
                            group_depth += 1;
                        }
                        buf.clear();
                        continue;
                    }
                    match name {
                        b"twoCellAnchor" => {
                            anchor = Some(AnchorRecord::TwoCell {
                                from: AnchorPoint::default(),
                                to: AnchorPoint::default(),
                            })
                        }
                        b"oneCellAnchor" => {
                            anchor = Some(AnchorRecord::OneCell { from: AnchorPoint::default(), cx: 0, cy: 0 })
                        }
                        b"absoluteAnchor" => {
                            anchor = Some(AnchorRecord::Absolute { x: 0, y: 0, cx: 0, cy: 0 })
                        }
                        b"from" if object.is_none() => point = Some(true),
                        b"to" if object.is_none() => point = Some(false),
                        b"col" if point.is_some() => field = PointField::Col,
                        b"colOff" if point.is_some() => field = PointField::ColOff,
                        b"row" if point.is_some() => field = PointField::Row,
                        b"rowOff" if point.is_some() => field = PointField::RowOff,
                        b"ext" if object.is_none() => match anchor.as_mut() {
                            Some(AnchorRecord::OneCell { cx, cy, .. })
                            | Some(AnchorRecord::Absolute { cx, cy, .. }) => {
                                *cx = xml::attr_i64(e, b"cx").unwrap_or(0);
                                *cy = xml::attr_i64(e, b"cy").unwrap_or(0);
                            }
                            _ => {}
                        },
                        b"pos" if object.is_none() => {
                            if let Some(AnchorRecord::Absolute { x, y, .. }) = anchor.as_mut() {
                                *x = xml::attr_i64(e, b"x").unwrap_or(0);
                                *y = xml::attr_i64(e, b"y").unwrap_or(0);
                            }
                        }
                        b"grpSp" => {
                            log::warn!("skipping grouped shapes in '{}'", part);
                            if !is_empty {
                                group_depth = 1;
                            }
                        }
                        b"pic" | b"sp" | b"cxnSp" | b"graphicFrame" if anchor.is_some() => {
                            object = Some(ObjectState {
                                kind: Some(match name {
                                    b"pic" => "pic",
                                    b"graphicFrame" => "graphicFrame",
                                    _ => "sp",
                                }),
                                ..Default::default()
                            });
                        }
                        b"cNvPr" => {
                            if let Some(obj) = object.as_mut() {
                                obj.id = xml::attr_u32(e, b"id").unwrap_or(0);
                                obj.name = xml::attr_str(e, b"name").unwrap_or_default();
                                obj.description = xml::attr_str(e, b"descr");
                            }
                        }
                        b"blip" => {
                            if let Some(obj) = object.as_mut() {
                                obj.rel = xml::attr_exact(e, b"r:embed").or_else(|| xml::attr_str(e, b"embed"));
                            }
                        }
                        b"chart" => {
                            if let Some(obj) = object.as_mut() {
                                obj.rel = xml::attr_exact(e, b"r:id").or_else(|| xml::attr_str(e, b"id"));
                            }
                        }
                        b"spPr" if !is_empty => in_sp_pr = true,
                        b"prstGeom" if in_sp_pr => {
                            if let Some(obj) = object.as_mut() {
                                obj.geometry = xml::attr_str(e, b"prst");
                            }
                        }
                        b"ln" if in_sp_pr => {
                            if let Some(obj) = object.as_mut() {
                                obj.line = Some(line_from_attrs(e));
                                obj.in_line = !is_empty;
                            }
                        }
                        b"prstDash" if in_sp_pr => {
                            if let Some(line) = object.as_mut().and_then(|o| o.line.as_mut()) {
                                line.dash = xml::attr_str(e, b"val");
                            }
                        }
                        _ if in_sp_pr && (fills.active() || FillReader::is_fill_element(name)) => {
                            if let Some(fill) = fills.start(e, is_empty) {
                                store_fill(object.as_mut(), fill);
                            }
                        }
                        b"fillRef" | b"lnRef" => {
                            let target = if name == b"fillRef" { RefTarget::Fill } else { RefTarget::Line };
                            let style_ref = StyleRef { idx: xml::attr_u32(e, b"idx").unwrap_or(0), color: None };
                            if let Some(obj) = object.as_mut() {
                                match target {
                                    RefTarget::Fill => obj.fill_ref = Some(style_ref),
                                    RefTarget::Line => obj.line_ref = Some(style_ref),
                                }
                            }
                            if !is_empty {
                                ref_target = Some(target);
                            }
                        }
                        n if ref_target.is_some() && is_drawing_color(n) => {
                            ref_color = drawing_color(e);
                            if is_empty {
                                store_ref_color(object.as_mut(), ref_target, ref_color.take());
                            }
                        }
                        _ if ref_color.is_some() => {
                            if let (Some(color), Some(t)) = (ref_color.as_mut(), color_transform(e)) {
                                add_transform(color, t);
                            }
                        }
                        b"txBody" => in_text = !is_empty,
                        b"t" if in_text => in_t = !is_empty,
                        b"p" if in_text => {
                            if let Some(obj) = object.as_mut() {
                                obj.paragraphs.push(String::new());
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(e) => {
                    if group_depth > 0 {
                        buf.clear();
                        continue;
                    }
                    let text = e.unescape().map_err(|err| CodecError::parse(part, err))?;
                    if field != PointField::None {
                        let value: i64 = text.trim().parse().unwrap_or(0);
                        let target = match (anchor.as_mut(), point) {
                            (Some(AnchorRecord::TwoCell { from, .. }), Some(true))
                            | (Some(AnchorRecord::OneCell { from, .. }), Some(true)) => Some(from),
                            (Some(AnchorRecord::TwoCell { to, .. }), Some(false)) => Some(to),
                            _ => None,
                        };
                        if let Some(p) = target {
                            match field {
                                PointField::Col => p.col = value.max(0) as u32,
                                PointField::ColOff => p.col_offset = value,
                                PointField::Row => p.row = value.max(0) as u32,
                                PointField::RowOff => p.row_offset = value,
                                PointField::None => {}
                            }
                        }
                    } else if in_t {
                        if let Some(paragraph) = object.as_mut().and_then(|o| o.paragraphs.last_mut()) {
                            paragraph.push_str(&text);
                        }
                    }
                }
                Event::End(e) => {
                    let name = e.local_name();
                    let name = name.as_ref();
                    if group_depth > 0 {
                        if name == b"grpSp" {
                            group_depth -= 1;
                        }
                        buf.clear();
                        continue;
                    }
                    match name {
                        b"col" | b"colOff" | b"row" | b"rowOff" => field = PointField::None,
                        b"from" | b"to" => point = None,
                        b"spPr" => in_sp_pr = false,
                        b"txBody" => in_text = false,
                        b"t" => in_t = false,
                        b"ln" if in_sp_pr => {
                            if let Some(obj) = object.as_mut() {
                                obj.in_line = false;
                            }
                        }
                        b"fillRef" | b"lnRef" => ref_target = None,
                        n if ref_target.is_some() && is_drawing_color(n) => {
                            store_ref_color(object.as_mut(), ref_target, ref_color.take());
                        }
                        b"pic" | b"sp" | b"cxnSp" | b"graphicFrame" => {
                            if let (Some(a), Some(obj)) = (anchor.clone(), object.take()) {
                                match obj.finish() {
                                    Some(o) => drawing.anchors.push(DrawingAnchor { anchor: a, object: o }),
                                    None => log::warn!("dropping drawing object without a target in '{}'", part),
                                }
                            }
                        }
                        b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => anchor = None,
                        _ if in_sp_pr && fills.active() => {
                            if let Some(fill) = fills.end(name) {
                                store_fill(object.as_mut(), fill);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        log::debug!("drawing '{}': {} anchored objects", part, drawing.anchors.len());
        Ok(drawing)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(XML_DECLARATION);
        out.push_str(&format!(
            "<xdr:wsDr xmlns:xdr=\"{}\" xmlns:a=\"{}\" xmlns:r=\"{}\" xmlns:c=\"{}\">",
            NS_SPREADSHEET_DRAWING, NS_DRAWINGML, NS_REL, NS_CHART
        ));
        for item in &self.anchors {
            match &item.anchor {
                AnchorRecord::TwoCell { from, to } => {
                    out.push_str("<xdr:twoCellAnchor editAs=\"oneCell\">");
                    write_point(&mut out, "from", from);
                    write_point(&mut out, "to", to);
                }
                AnchorRecord::OneCell { from, cx, cy } => {
                    out.push_str("<xdr:oneCellAnchor>");
                    write_point(&mut out, "from", from);
                    out.push_str(&format!("<xdr:ext cx=\"{}\" cy=\"{}\"/>", cx, cy));
                }
                AnchorRecord::Absolute { x, y, cx, cy } => {
                    out.push_str("<xdr:absoluteAnchor>");
                    out.push_str(&format!("<xdr:pos x=\"{}\" y=\"{}\"/>", x, y));
                    out.push_str(&format!("<xdr:ext cx=\"{}\" cy=\"{}\"/>", cx, cy));
                }
            }
            write_object(&mut out, &item.object);
            out.push_str("<xdr:clientData/>");
            out.push_str(match item.anchor {
                AnchorRecord::TwoCell { .. } => "</xdr:twoCellAnchor>",
                AnchorRecord::OneCell { .. } => "</xdr:oneCellAnchor>",
                AnchorRecord::Absolute { .. } => "</xdr:absoluteAnchor>",
            });
        }
        out.push_str("</xdr:wsDr>");
        out
    }
}

fn store_fill(object: Option<&mut ObjectState>, fill: DrawingFill) {
    if let Some(obj) = object {
        match obj.line.as_mut() {
            Some(line) if obj.in_line => line.fill = Some(fill),
            _ => obj.fill = Some(fill),
        }
    }
}

fn store_ref_color(object: Option<&mut ObjectState>, target: Option<RefTarget>, color: Option<ColorRef>) {
    let Some(obj) = object else {
        return;
    };
    let slot = match target {
        Some(RefTarget::Fill) => obj.fill_ref.as_mut(),
        Some(RefTarget::Line) => obj.line_ref.as_mut(),
        None => None,
    };
    if let Some(style_ref) = slot {
        style_ref.color = color;
    }
}

fn write_point(out: &mut String, tag: &str, p: &AnchorPoint) {
    out.push_str(&format!(
        "<xdr:{0}><xdr:col>{1}</xdr:col><xdr:colOff>{2}</xdr:colOff><xdr:row>{3}</xdr:row><xdr:rowOff>{4}</xdr:rowOff></xdr:{0}>",
        tag, p.col, p.col_offset, p.row, p.row_offset
    ));
}

fn write_cnv_pr(out: &mut String, id: u32, name: &str, description: Option<&str>) {
    out.push_str(&format!("<xdr:cNvPr id=\"{}\" name=\"{}\"", id, escape_xml(name)));
    if let Some(d) = description {
        out.push_str(&format!(" descr=\"{}\"", escape_xml(d)));
    }
    out.push_str("/>");
}

fn write_style_ref(out: &mut String, tag: &str, style_ref: Option<&StyleRef>) {
    let idx = style_ref.map(|r| r.idx).unwrap_or(0);
    out.push_str(&format!("<a:{} idx=\"{}\">", tag, idx));
    match style_ref.and_then(|r| r.color.as_ref()) {
        Some(color) => write_drawing_color(out, color),
        None => out.push_str("<a:schemeClr val=\"accent1\"/>"),
    }
    out.push_str(&format!("</a:{}>", tag));
}

fn write_object(out: &mut String, object: &ObjectRecord) {
    match object {
        ObjectRecord::Picture { id, name, description, embed_rel } => {
            out.push_str("<xdr:pic><xdr:nvPicPr>");
            write_cnv_pr(out, *id, name, description.as_deref());
            out.push_str("<xdr:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></xdr:cNvPicPr></xdr:nvPicPr>");
            out.push_str(&format!(
                "<xdr:blipFill><a:blip r:embed=\"{}\"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>",
                escape_xml(embed_rel)
            ));
            out.push_str("<xdr:spPr><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>");
        }
        ObjectRecord::Shape { id, name, geometry, fill, line, fill_ref, line_ref, text } => {
            out.push_str("<xdr:sp macro=\"\" textlink=\"\"><xdr:nvSpPr>");
            write_cnv_pr(out, *id, name, None);
            out.push_str("<xdr:cNvSpPr/></xdr:nvSpPr><xdr:spPr>");
            out.push_str(&format!("<a:prstGeom prst=\"{}\"><a:avLst/></a:prstGeom>", escape_xml(geometry)));
            if let Some(f) = fill {
                write_drawing_fill(out, f);
            }
            if let Some(l) = line {
                write_drawing_line(out, l);
            }
            out.push_str("</xdr:spPr>");
            if fill_ref.is_some() || line_ref.is_some() {
                out.push_str("<xdr:style>");
                write_style_ref(out, "lnRef", line_ref.as_ref());
                write_style_ref(out, "fillRef", fill_ref.as_ref());
                out.push_str("<a:effectRef idx=\"0\"><a:schemeClr val=\"accent1\"/></a:effectRef>");
                out.push_str("<a:fontRef idx=\"minor\"><a:schemeClr val=\"lt1\"/></a:fontRef>");
                out.push_str("</xdr:style>");
            }
            if let Some(t) = text {
                out.push_str("<xdr:txBody><a:bodyPr/><a:lstStyle/>");
                for paragraph in t.split('\n') {
                    if paragraph.is_empty() {
                        out.push_str("<a:p/>");
                    } else {
                        out.push_str(&format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape_xml(paragraph)));
                    }
                }
                out.push_str("</xdr:txBody>");
            }
            out.push_str("</xdr:sp>");
        }
        ObjectRecord::GraphicFrame { id, name, chart_rel } => {
            out.push_str("<xdr:graphicFrame macro=\"\"><xdr:nvGraphicFramePr>");
            write_cnv_pr(out, *id, name, None);
            out.push_str("<xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr>");
            out.push_str("<xdr:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"0\" cy=\"0\"/></xdr:xfrm>");
            out.push_str(&format!(
                "<a:graphic><a:graphicData uri=\"{}\"><c:chart r:id=\"{}\"/></a:graphicData></a:graphic>",
                NS_CHART,
                escape_xml(chart_rel)
            ));
            out.push_str("</xdr:graphicFrame>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorTransform, SolidColor, ThemeSlot};

    const DRAWING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<xdr:twoCellAnchor editAs="oneCell">
  <xdr:from><xdr:col>1</xdr:col><xdr:colOff>95250</xdr:colOff><xdr:row>2</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
  <xdr:to><xdr:col>4</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>8</xdr:row><xdr:rowOff>19050</xdr:rowOff></xdr:to>
  <xdr:pic><xdr:nvPicPr><xdr:cNvPr id="2" name="Picture 1" descr="logo"/><xdr:cNvPicPr/></xdr:nvPicPr>
    <xdr:blipFill><a:blip r:embed="rId1"/></xdr:blipFill>
    <xdr:spPr><a:xfrm><a:off x="1" y="2"/><a:ext cx="3" cy="4"/></a:xfrm><a:prstGeom prst="rect"/></xdr:spPr></xdr:pic>
  <xdr:clientData/>
</xdr:twoCellAnchor>
<xdr:oneCellAnchor>
  <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>10</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
  <xdr:ext cx="952500" cy="476250"/>
  <xdr:sp macro="" textlink=""><xdr:nvSpPr><xdr:cNvPr id="3" name="Oval 2"/><xdr:cNvSpPr/></xdr:nvSpPr>
    <xdr:spPr><a:prstGeom prst="ellipse"><a:avLst/></a:prstGeom>
      <a:solidFill><a:srgbClr val="FF0000"/></a:solidFill>
      <a:ln w="12700"><a:solidFill><a:schemeClr val="accent2"/></a:solidFill><a:prstDash val="dash"/></a:ln>
    </xdr:spPr>
    <xdr:style><a:lnRef idx="2"><a:schemeClr val="accent1"><a:shade val="50000"/></a:schemeClr></a:lnRef><a:fillRef idx="1"><a:schemeClr val="accent1"/></a:fillRef><a:effectRef idx="0"><a:schemeClr val="accent1"/></a:effectRef><a:fontRef idx="minor"><a:schemeClr val="lt1"/></a:fontRef></xdr:style>
    <xdr:txBody><a:bodyPr/><a:p><a:r><a:rPr><a:solidFill><a:srgbClr val="00FF00"/></a:solidFill></a:rPr><a:t>Line one</a:t></a:r></a:p><a:p><a:r><a:t>two</a:t></a:r></a:p></xdr:txBody>
  </xdr:sp>
  <xdr:clientData/>
</xdr:oneCellAnchor>
<xdr:absoluteAnchor><xdr:pos x="0" y="0"/><xdr:ext cx="100" cy="200"/>
  <xdr:grpSp><xdr:sp><xdr:nvSpPr><xdr:cNvPr id="9" name="inner"/></xdr:nvSpPr></xdr:sp></xdr:grpSp>
  <xdr:clientData/>
</xdr:absoluteAnchor>
<xdr:twoCellAnchor>
  <xdr:from><xdr:col>5</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
  <xdr:to><xdr:col>10</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>15</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
  <xdr:graphicFrame macro=""><xdr:nvGraphicFramePr><xdr:cNvPr id="4" name="Chart 3"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr>
    <xdr:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></xdr:xfrm>
    <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="rId2"/></a:graphicData></a:graphic>
  </xdr:graphicFrame>
  <xdr:clientData/>
</xdr:twoCellAnchor>
</xdr:wsDr>"#;

    #[test]
    fn test_parse_anchors_and_objects() {
        let drawing = DrawingPart::parse(DRAWING.as_bytes(), "xl/drawings/drawing1.xml").unwrap();
        assert_eq!(drawing.anchors.len(), 3);

        let pic = &drawing.anchors[0];
        assert_eq!(
            pic.anchor,
            AnchorRecord::TwoCell {
                from: AnchorPoint { col: 1, col_offset: 95250, row: 2, row_offset: 0 },
                to: AnchorPoint { col: 4, col_offset: 0, row: 8, row_offset: 19050 },
            }
        );
        assert_eq!(
            pic.object,
            ObjectRecord::Picture {
                id: 2,
                name: "Picture 1".into(),
                description: Some("logo".into()),
                embed_rel: "rId1".into()
            }
        );

        let shape = &drawing.anchors[1];
        assert_eq!(
            shape.anchor,
            AnchorRecord::OneCell {
                from: AnchorPoint { col: 0, col_offset: 0, row: 10, row_offset: 0 },
                cx: 952500,
                cy: 476250
            }
        );
        match &shape.object {
            ObjectRecord::Shape { geometry, fill, line, fill_ref, line_ref, text, .. } => {
                assert_eq!(geometry, "ellipse");
                assert_eq!(fill, &Some(DrawingFill::Solid(ColorRef::Rgb(SolidColor::rgb(255, 0, 0)))));
                let line = line.as_ref().unwrap();
                assert_eq!(line.width_emu, Some(12700));
                assert_eq!(line.dash.as_deref(), Some("dash"));
                assert_eq!(line.fill, Some(DrawingFill::Solid(ColorRef::theme(ThemeSlot::Accent2))));
                assert_eq!(fill_ref.as_ref().unwrap().idx, 1);
                assert_eq!(
                    line_ref.as_ref().unwrap().color,
                    Some(ColorRef::Theme {
                        slot: ThemeSlot::Accent1,
                        transforms: vec![ColorTransform::Shade(50_000)]
                    })
                );
                assert_eq!(text.as_deref(), Some("Line one\ntwo"));
            }
            other => panic!("expected a shape, got {:?}", other),
        }

        assert_eq!(
            drawing.anchors[2].object,
            ObjectRecord::GraphicFrame { id: 4, name: "Chart 3".into(), chart_rel: "rId2".into() }
        );
    }

    #[test]
    fn test_written_drawing_parses_back() {
        let drawing = DrawingPart::parse(DRAWING.as_bytes(), "drawing").unwrap();
        let again = DrawingPart::parse(drawing.to_xml().as_bytes(), "drawing").unwrap();
        assert_eq!(again, drawing);
    }
}

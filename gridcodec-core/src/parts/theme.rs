//! `xl/theme/theme1.xml`: the color scheme and the fill/line format scheme.

use std::io::Cursor;

use quick_xml::events::Event;

use crate::color::{ColorRef, ColorScheme, ColorTransform, SolidColor, ThemeSlot};
use crate::error::{CodecError, Result};
use crate::parts::fill::{line_from_attrs, write_drawing_fill, write_drawing_line, DrawingFill, DrawingLine, FillReader};
use crate::parts::{drawing_color, is_drawing_color, NS_DRAWINGML};
use crate::xml::{self, escape_xml, XML_DECLARATION};

#[derive(Clone, Debug, PartialEq)]
pub struct Theme {
    pub name: String,
    pub colors: ColorScheme,
    /// `fillStyleLst`, addressed 1-based by `fillRef idx`.
    pub fill_styles: Vec<DrawingFill>,
    /// `bgFillStyleLst`, addressed by `fillRef idx` from 1001.
    pub bg_fill_styles: Vec<DrawingFill>,
    /// `lnStyleLst`, addressed 1-based by `lnRef idx`.
    pub line_styles: Vec<DrawingLine>,
}

#[derive(Clone, Copy, PartialEq)]
enum List {
    None,
    Fill,
    BgFill,
    Line,
}

fn placeholder(transforms: Vec<ColorTransform>) -> ColorRef {
    ColorRef::Theme { slot: ThemeSlot::Placeholder, transforms }
}

impl Default for Theme {
    /// The Office theme.
    fn default() -> Self {
        let gradient = |stops: [(f64, ColorTransform, i32); 3]| DrawingFill::Gradient {
            angle: 270.0,
            stops: stops
                .iter()
                .map(|(pos, t, sat)| (*pos, placeholder(vec![*t, ColorTransform::SatMod(*sat)])))
                .collect(),
        };
        Theme {
            name: "Office Theme".to_string(),
            colors: ColorScheme::default(),
            fill_styles: vec![
                DrawingFill::Solid(placeholder(Vec::new())),
                gradient([
                    (0.0, ColorTransform::Tint(50_000), 300_000),
                    (0.35, ColorTransform::Tint(37_000), 300_000),
                    (1.0, ColorTransform::Tint(15_000), 350_000),
                ]),
                gradient([
                    (0.0, ColorTransform::Shade(51_000), 130_000),
                    (0.8, ColorTransform::Shade(93_000), 130_000),
                    (1.0, ColorTransform::Shade(94_000), 135_000),
                ]),
            ],
            bg_fill_styles: vec![
                DrawingFill::Solid(placeholder(Vec::new())),
                DrawingFill::Solid(placeholder(vec![ColorTransform::Tint(95_000)])),
                DrawingFill::Solid(placeholder(vec![ColorTransform::Shade(80_000)])),
            ],
            line_styles: [9525, 25400, 38100]
                .iter()
                .enumerate()
                .map(|(i, w)| DrawingLine {
                    width_emu: Some(*w),
                    fill: Some(DrawingFill::Solid(placeholder(if i == 0 {
                        vec![ColorTransform::Shade(95_000), ColorTransform::SatMod(105_000)]
                    } else {
                        Vec::new()
                    }))),
                    dash: Some("solid".to_string()),
                })
                .collect(),
        }
    }
}

impl Theme {
    /// Fill style for a `fillRef idx`. Index 0 means no fill.
    pub fn fill_style(&self, idx: u32) -> Option<&DrawingFill> {
        match idx {
            0 => None,
            1..=999 => self.fill_styles.get(idx as usize - 1),
            _ => self.bg_fill_styles.get(idx.checked_sub(1001)? as usize),
        }
    }

    /// Line style for an `lnRef idx`. Index 0 means no line.
    pub fn line_style(&self, idx: u32) -> Option<&DrawingLine> {
        idx.checked_sub(1).and_then(|i| self.line_styles.get(i as usize))
    }

    pub fn parse(data: &[u8], part: &str) -> Result<Theme> {
        let mut reader = xml::reader(Cursor::new(data));
        let mut buf = Vec::new();

        let mut theme = Theme {
            name: String::new(),
            colors: ColorScheme::default(),
            fill_styles: Vec::new(),
            bg_fill_styles: Vec::new(),
            line_styles: Vec::new(),
        };
        let mut in_scheme = false;
        let mut slot: Option<ThemeSlot> = None;
        let mut list = List::None;
        let mut fills = FillReader::default();
        let mut line: Option<DrawingLine> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| CodecError::parse(part, e))?;
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = e.local_name();
                    let name = name.as_ref();
                    match name {
                        b"theme" => theme.name = xml::attr_str(e, b"name").unwrap_or_default(),
                        b"clrScheme" => {
                            in_scheme = true;
                            theme.colors.name = xml::attr_str(e, b"name").unwrap_or_default();
                        }
                        b"fillStyleLst" => list = List::Fill,
                        b"bgFillStyleLst" => list = List::BgFill,
                        b"lnStyleLst" => list = List::Line,
                        b"effectStyleLst" => list = List::None,
                        _ if in_scheme && slot.is_none() => {
                            slot = std::str::from_utf8(name).ok().and_then(ThemeSlot::from_scheme_name);
                        }
                        _ if in_scheme && is_drawing_color(name) => {
                            if let Some(ColorRef::Rgb(color)) = drawing_color(e) {
                                if let Some(s) = slot {
                                    theme.colors.set(s, color);
                                }
                            }
                        }
                        b"ln" if list == List::Line => {
                            let parsed = line_from_attrs(e);
                            if is_empty {
                                theme.line_styles.push(parsed);
                            } else {
                                line = Some(parsed);
                            }
                        }
                        b"prstDash" => {
                            if let Some(l) = line.as_mut() {
                                l.dash = xml::attr_str(e, b"val");
                            }
                        }
                        _ if list != List::None
                            && (fills.active() || FillReader::is_fill_element(name)) =>
                        {
                            if let Some(fill) = fills.start(e, is_empty) {
                                push_fill(&mut theme, list, &mut line, fill);
                            }
                        }
                        _ => {}
                    }
                }
                Event::End(e) => {
                    let name = e.local_name();
                    let name = name.as_ref();
                    match name {
                        b"clrScheme" => in_scheme = false,
                        b"fillStyleLst" | b"bgFillStyleLst" | b"lnStyleLst" => list = List::None,
                        b"ln" => {
                            if let Some(l) = line.take() {
                                theme.line_styles.push(l);
                            }
                        }
                        _ if in_scheme && slot.map(|s| s.scheme_name().as_bytes() == name).unwrap_or(false) => {
                            slot = None;
                        }
                        _ if fills.active() => {
                            if let Some(fill) = fills.end(name) {
                                push_fill(&mut theme, list, &mut line, fill);
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

        log::debug!(
            "theme '{}': {} fill styles, {} line styles",
            theme.name,
            theme.fill_styles.len(),
            theme.line_styles.len()
        );
        Ok(theme)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push_str(&format!(
            "<a:theme xmlns:a=\"{}\" name=\"{}\"><a:themeElements>",
            NS_DRAWINGML,
            escape_xml(&self.name)
        ));

        out.push_str(&format!("<a:clrScheme name=\"{}\">", escape_xml(&self.colors.name)));
        for slot in ThemeSlot::SCHEME {
            let color = self.colors.get(slot).unwrap_or(SolidColor::BLACK);
            let tag = slot.scheme_name();
            match slot {
                ThemeSlot::Dark1 => out.push_str(&format!(
                    "<a:{0}><a:sysClr val=\"windowText\" lastClr=\"{1}\"/></a:{0}>",
                    tag,
                    color.to_rgb_hex()
                )),
                ThemeSlot::Light1 => out.push_str(&format!(
                    "<a:{0}><a:sysClr val=\"window\" lastClr=\"{1}\"/></a:{0}>",
                    tag,
                    color.to_rgb_hex()
                )),
                _ => out.push_str(&format!(
                    "<a:{0}><a:srgbClr val=\"{1}\"/></a:{0}>",
                    tag,
                    color.to_rgb_hex()
                )),
            }
        }
        out.push_str("</a:clrScheme>");

        out.push_str(
            "<a:fontScheme name=\"Office\">\
             <a:majorFont><a:latin typeface=\"Cambria\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:majorFont>\
             <a:minorFont><a:latin typeface=\"Calibri\"/><a:ea typeface=\"\"/><a:cs typeface=\"\"/></a:minorFont>\
             </a:fontScheme>",
        );

        out.push_str("<a:fmtScheme name=\"Office\"><a:fillStyleLst>");
        for fill in &self.fill_styles {
            write_drawing_fill(&mut out, fill);
        }
        out.push_str("</a:fillStyleLst><a:lnStyleLst>");
        for line in &self.line_styles {
            write_drawing_line(&mut out, line);
        }
        out.push_str("</a:lnStyleLst><a:effectStyleLst>");
        for _ in 0..3 {
            out.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
        }
        out.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
        for fill in &self.bg_fill_styles {
            write_drawing_fill(&mut out, fill);
        }
        out.push_str("</a:bgFillStyleLst></a:fmtScheme>");

        out.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
        out
    }
}

fn push_fill(theme: &mut Theme, list: List, line: &mut Option<DrawingLine>, fill: DrawingFill) {
    if let Some(l) = line.as_mut() {
        l.fill = Some(fill);
        return;
    }
    match list {
        List::Fill => theme.fill_styles.push(fill),
        List::BgFill => theme.bg_fill_styles.push(fill),
        List::Line | List::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme_roundtrips() {
        let theme = Theme::default();
        let xml = theme.to_xml();
        let parsed = Theme::parse(xml.as_bytes(), "xl/theme/theme1.xml").unwrap();
        assert_eq!(parsed, theme);
    }

    #[test]
    fn test_parse_custom_scheme() {
        let xml = r#"<?xml version="1.0"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Custom">
<a:themeElements><a:clrScheme name="Mine">
<a:dk1><a:sysClr val="windowText" lastClr="101010"/></a:dk1>
<a:lt1><a:sysClr val="window" lastClr="FAFAFA"/></a:lt1>
<a:dk2><a:srgbClr val="1F497D"/></a:dk2>
<a:lt2><a:srgbClr val="EEECE1"/></a:lt2>
<a:accent1><a:srgbClr val="123456"/></a:accent1>
</a:clrScheme>
<a:fmtScheme name="x"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>
<a:lnStyleLst><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst></a:fmtScheme>
</a:themeElements></a:theme>"#;
        let theme = Theme::parse(xml.as_bytes(), "theme").unwrap();
        assert_eq!(theme.name, "Custom");
        assert_eq!(theme.colors.name, "Mine");
        assert_eq!(theme.colors.get(ThemeSlot::Dark1), Some(SolidColor::rgb(0x10, 0x10, 0x10)));
        assert_eq!(theme.colors.get(ThemeSlot::Light1), Some(SolidColor::rgb(0xFA, 0xFA, 0xFA)));
        assert_eq!(theme.colors.get(ThemeSlot::Accent1), Some(SolidColor::rgb(0x12, 0x34, 0x56)));
        // Slots the document leaves out keep the Office defaults.
        assert_eq!(theme.colors.get(ThemeSlot::Accent2), Some(SolidColor::rgb(0xC0, 0x50, 0x4D)));
        assert_eq!(theme.fill_styles.len(), 1);
        assert_eq!(theme.line_style(1).unwrap().width_emu, Some(12700));
        assert!(theme.line_style(1).unwrap().fill.is_some());
        assert!(theme.fill_style(0).is_none());
        assert!(theme.fill_style(2).is_none());
    }
}

//! Typed models of the XML parts, with their parsers and serializers.
//!
//! Each part keeps the file's own vocabulary (indices, relationship ids, EMUs,
//! color references); translating to the worksheet model happens in the mappers.

pub mod chart;
pub mod drawing;
pub mod fill;
pub mod shared_strings;
pub mod styles;
pub mod theme;
pub mod workbook;
pub mod worksheet;

use quick_xml::events::BytesStart;

use crate::color::{apply_transforms, ColorRef, ColorTransform, SolidColor, ThemeSlot};
use crate::xml;

pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const NS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_DRAWINGML: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// SpreadsheetML `<color>`-like element (`color`, `fgColor`, `bgColor`).
pub(crate) fn sheet_color(e: &BytesStart) -> Option<ColorRef> {
    if let Some(rgb) = xml::attr_str(e, b"rgb") {
        return SolidColor::from_hex(&rgb).map(ColorRef::Rgb);
    }
    if let Some(theme) = xml::attr_u32(e, b"theme") {
        let tint = xml::attr_f64(e, b"tint").unwrap_or(0.0);
        return ColorRef::sheet_theme(theme, tint);
    }
    if let Some(indexed) = xml::attr_u32(e, b"indexed") {
        return Some(ColorRef::Indexed(indexed));
    }
    if xml::attr_bool(e, b"auto", false) {
        return Some(ColorRef::Auto);
    }
    None
}

/// Serialize a SpreadsheetML color element.
pub(crate) fn write_sheet_color(out: &mut String, tag: &str, color: &ColorRef) {
    out.push('<');
    out.push_str(tag);
    match color {
        ColorRef::Rgb(c) => {
            out.push_str(" rgb=\"");
            out.push_str(&c.to_argb_hex());
            out.push('"');
        }
        ColorRef::Indexed(i) => {
            out.push_str(" indexed=\"");
            out.push_str(&xml::format_u32(*i));
            out.push('"');
        }
        ColorRef::Auto => out.push_str(" auto=\"1\""),
        ColorRef::Theme { slot, transforms } => {
            out.push_str(" theme=\"");
            out.push_str(&xml::format_u32(slot.sheet_index().unwrap_or(1)));
            out.push('"');
            let tint: i32 = transforms
                .iter()
                .map(|t| match t {
                    ColorTransform::SheetTint(v) => *v,
                    _ => 0,
                })
                .sum();
            if tint != 0 {
                out.push_str(" tint=\"");
                out.push_str(&xml::format_f64(tint as f64 / 100_000.0));
                out.push('"');
            }
        }
    }
    out.push_str("/>");
}

/// DrawingML color choice element (`srgbClr`, `schemeClr`, `sysClr`, `prstClr`).
pub(crate) fn drawing_color(e: &BytesStart) -> Option<ColorRef> {
    match e.local_name().as_ref() {
        b"srgbClr" => xml::attr_str(e, b"val")
            .and_then(|v| SolidColor::from_hex(&v))
            .map(ColorRef::Rgb),
        b"schemeClr" => xml::attr_str(e, b"val")
            .and_then(|v| ThemeSlot::from_scheme_name(&v))
            .map(ColorRef::theme),
        b"sysClr" => xml::attr_str(e, b"lastClr")
            .and_then(|v| SolidColor::from_hex(&v))
            .or_else(|| match xml::attr_str(e, b"val").as_deref() {
                Some("window") => Some(SolidColor::WHITE),
                Some(_) => Some(SolidColor::BLACK),
                None => None,
            })
            .map(ColorRef::Rgb),
        b"prstClr" => xml::attr_str(e, b"val").map(|v| {
            ColorRef::Rgb(match v.as_str() {
                "white" => SolidColor::WHITE,
                "red" => SolidColor::rgb(0xFF, 0, 0),
                "green" => SolidColor::rgb(0, 0x80, 0),
                "blue" => SolidColor::rgb(0, 0, 0xFF),
                "yellow" => SolidColor::rgb(0xFF, 0xFF, 0),
                "gray" => SolidColor::rgb(0x80, 0x80, 0x80),
                _ => SolidColor::BLACK,
            })
        }),
        _ => None,
    }
}

pub(crate) fn is_drawing_color(local_name: &[u8]) -> bool {
    matches!(local_name, b"srgbClr" | b"schemeClr" | b"sysClr" | b"prstClr" | b"scrgbClr" | b"hslClr")
}

/// A DrawingML color modifier child (`shade`, `tint`, `lumMod`, ...).
pub(crate) fn color_transform(e: &BytesStart) -> Option<ColorTransform> {
    let val = xml::attr_i32(e, b"val")?;
    Some(match e.local_name().as_ref() {
        b"shade" => ColorTransform::Shade(val),
        b"tint" => ColorTransform::Tint(val),
        b"lumMod" => ColorTransform::LumMod(val),
        b"lumOff" => ColorTransform::LumOff(val),
        b"satMod" => ColorTransform::SatMod(val),
        _ => return None,
    })
}

/// Attach a modifier. Literal colors are adjusted right away.
pub(crate) fn add_transform(color: &mut ColorRef, transform: ColorTransform) {
    match color {
        ColorRef::Rgb(c) => *c = apply_transforms(*c, &[transform]),
        ColorRef::Theme { transforms, .. } => transforms.push(transform),
        ColorRef::Indexed(_) | ColorRef::Auto => {}
    }
}

/// Serialize a DrawingML color reference.
pub(crate) fn write_drawing_color(out: &mut String, color: &ColorRef) {
    let (open, close) = match color {
        ColorRef::Theme { slot, transforms } => {
            out.push_str("<a:schemeClr val=\"");
            out.push_str(slot.scheme_name());
            out.push('"');
            if transforms.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for t in transforms {
                let (name, v) = match *t {
                    ColorTransform::Shade(v) => ("shade", v),
                    ColorTransform::Tint(v) => ("tint", v),
                    ColorTransform::LumMod(v) => ("lumMod", v),
                    ColorTransform::LumOff(v) => ("lumOff", v),
                    ColorTransform::SatMod(v) => ("satMod", v),
                    ColorTransform::SheetTint(_) => continue,
                };
                out.push_str(&format!("<a:{} val=\"{}\"/>", name, v));
            }
            ("", "</a:schemeClr>")
        }
        ColorRef::Rgb(c) => {
            out.push_str("<a:srgbClr val=\"");
            out.push_str(&c.to_rgb_hex());
            ("\"", "/>")
        }
        ColorRef::Indexed(_) | ColorRef::Auto => {
            out.push_str("<a:srgbClr val=\"000000");
            ("\"", "/>")
        }
    };
    out.push_str(open);
    out.push_str(close);
}

//! DrawingML fills and outlines, shared by the theme and drawing parts.

use quick_xml::events::BytesStart;

use crate::color::ColorRef;
use crate::parts::{add_transform, color_transform, drawing_color, is_drawing_color, write_drawing_color};
use crate::xml::{self, escape_xml, format_f64};

/// DrawingML angles are in 60000ths of a degree.
const ANGLE_UNITS: f64 = 60_000.0;
/// Gradient stop positions are in 1000ths of a percent.
const POSITION_UNITS: f64 = 100_000.0;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawingFill {
    None,
    Solid(ColorRef),
    /// `angle` in degrees, stop positions in `0.0..=1.0`.
    Gradient { angle: f64, stops: Vec<(f64, ColorRef)> },
    Pattern { preset: String, fg: ColorRef, bg: ColorRef },
}

/// An `<a:ln>` outline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawingLine {
    pub width_emu: Option<i64>,
    pub fill: Option<DrawingFill>,
    /// `prstDash` value, e.g. `dash`, `sysDot`.
    pub dash: Option<String>,
}

#[derive(Clone, Copy, PartialEq)]
enum ColorTarget {
    Solid,
    Stop,
    PatternFg,
    PatternBg,
}

/// Incremental reader for one fill element and its children.
///
/// Feed it start/empty/end events; a finished fill comes back from [`FillReader::end`]
/// (or from [`FillReader::start`] for self-closing fills).
#[derive(Default)]
pub(crate) struct FillReader {
    fill: Option<DrawingFill>,
    target: Option<ColorTarget>,
    stop_position: f64,
    color: Option<ColorRef>,
    pattern_fg: Option<ColorRef>,
    pattern_bg: Option<ColorRef>,
}

impl FillReader {
    pub(crate) fn is_fill_element(local_name: &[u8]) -> bool {
        matches!(local_name, b"solidFill" | b"gradFill" | b"pattFill" | b"noFill")
    }

    /// True while a fill element is open.
    pub(crate) fn active(&self) -> bool {
        self.fill.is_some()
    }

    /// Handle an opening or self-closing element.
    pub(crate) fn start(&mut self, e: &BytesStart, is_empty: bool) -> Option<DrawingFill> {
        let name = e.local_name();
        match name.as_ref() {
            b"noFill" => {
                if !is_empty {
                    self.fill = Some(DrawingFill::None);
                    return None;
                }
                return Some(DrawingFill::None);
            }
            b"solidFill" => {
                if is_empty {
                    return None;
                }
                self.fill = Some(DrawingFill::None);
                self.target = Some(ColorTarget::Solid);
            }
            b"gradFill" => {
                self.fill = Some(DrawingFill::Gradient { angle: 0.0, stops: Vec::new() });
                if is_empty {
                    return self.fill.take();
                }
            }
            b"pattFill" => {
                let preset = xml::attr_str(e, b"prst").unwrap_or_else(|| "pct5".to_string());
                self.pattern_fg = None;
                self.pattern_bg = None;
                self.fill = Some(DrawingFill::Pattern {
                    preset,
                    fg: ColorRef::Auto,
                    bg: ColorRef::Auto,
                });
                if is_empty {
                    return self.fill.take();
                }
            }
            b"gs" => {
                self.stop_position = xml::attr_f64(e, b"pos").unwrap_or(0.0) / POSITION_UNITS;
                self.target = Some(ColorTarget::Stop);
            }
            b"lin" => {
                if let Some(DrawingFill::Gradient { angle, .. }) = self.fill.as_mut() {
                    *angle = xml::attr_f64(e, b"ang").unwrap_or(0.0) / ANGLE_UNITS;
                }
            }
            b"fgClr" => self.target = Some(ColorTarget::PatternFg),
            b"bgClr" => self.target = Some(ColorTarget::PatternBg),
            n if is_drawing_color(n) => {
                self.color = drawing_color(e);
                if self.color.is_none() {
                    log::warn!("unsupported DrawingML color '{}'", String::from_utf8_lossy(n));
                    self.color = Some(ColorRef::Auto);
                }
                if is_empty {
                    self.commit_color();
                }
            }
            _ => {
                if let (Some(color), Some(t)) = (self.color.as_mut(), color_transform(e)) {
                    add_transform(color, t);
                }
            }
        }
        None
    }

    /// Handle a closing element.
    pub(crate) fn end(&mut self, local_name: &[u8]) -> Option<DrawingFill> {
        match local_name {
            n if is_drawing_color(n) => {
                self.commit_color();
                None
            }
            b"gs" | b"fgClr" | b"bgClr" => {
                self.target = None;
                None
            }
            b"solidFill" | b"gradFill" | b"noFill" => {
                self.target = None;
                self.fill.take()
            }
            b"pattFill" => {
                self.target = None;
                let fg = self.pattern_fg.take();
                let bg = self.pattern_bg.take();
                match self.fill.take() {
                    Some(DrawingFill::Pattern { preset, .. }) => Some(DrawingFill::Pattern {
                        preset,
                        fg: fg.unwrap_or(ColorRef::Auto),
                        bg: bg.unwrap_or(ColorRef::Auto),
                    }),
                    other => other,
                }
            }
            _ => None,
        }
    }

    fn commit_color(&mut self) {
        let Some(color) = self.color.take() else {
            return;
        };
        match (self.target, self.fill.as_mut()) {
            (Some(ColorTarget::Solid), Some(fill)) => *fill = DrawingFill::Solid(color),
            (Some(ColorTarget::Stop), Some(DrawingFill::Gradient { stops, .. })) => {
                stops.push((self.stop_position, color))
            }
            (Some(ColorTarget::PatternFg), _) => self.pattern_fg = Some(color),
            (Some(ColorTarget::PatternBg), _) => self.pattern_bg = Some(color),
            _ => {}
        }
    }
}

/// Read the attributes of an `<a:ln>` start tag.
pub(crate) fn line_from_attrs(e: &BytesStart) -> DrawingLine {
    DrawingLine {
        width_emu: xml::attr_i64(e, b"w"),
        fill: None,
        dash: None,
    }
}

pub(crate) fn write_drawing_fill(out: &mut String, fill: &DrawingFill) {
    match fill {
        DrawingFill::None => out.push_str("<a:noFill/>"),
        DrawingFill::Solid(color) => {
            out.push_str("<a:solidFill>");
            write_drawing_color(out, color);
            out.push_str("</a:solidFill>");
        }
        DrawingFill::Gradient { angle, stops } => {
            out.push_str("<a:gradFill rotWithShape=\"1\"><a:gsLst>");
            for (position, color) in stops {
                out.push_str("<a:gs pos=\"");
                out.push_str(&format_f64((position * POSITION_UNITS).round()));
                out.push_str("\">");
                write_drawing_color(out, color);
                out.push_str("</a:gs>");
            }
            out.push_str("</a:gsLst><a:lin ang=\"");
            out.push_str(&format_f64((angle * ANGLE_UNITS).round()));
            out.push_str("\" scaled=\"1\"/></a:gradFill>");
        }
        DrawingFill::Pattern { preset, fg, bg } => {
            out.push_str("<a:pattFill prst=\"");
            out.push_str(&escape_xml(preset));
            out.push_str("\"><a:fgClr>");
            write_drawing_color(out, fg);
            out.push_str("</a:fgClr><a:bgClr>");
            write_drawing_color(out, bg);
            out.push_str("</a:bgClr></a:pattFill>");
        }
    }
}

pub(crate) fn write_drawing_line(out: &mut String, line: &DrawingLine) {
    out.push_str("<a:ln");
    if let Some(w) = line.width_emu {
        out.push_str(" w=\"");
        out.push_str(&w.to_string());
        out.push('"');
    }
    if line.fill.is_none() && line.dash.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if let Some(fill) = &line.fill {
        write_drawing_fill(out, fill);
    }
    if let Some(dash) = &line.dash {
        out.push_str("<a:prstDash val=\"");
        out.push_str(&escape_xml(dash));
        out.push_str("\"/>");
    }
    out.push_str("</a:ln>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorTransform, SolidColor, ThemeSlot};
    use quick_xml::events::Event;

    fn read_fills(xml: &str) -> Vec<DrawingFill> {
        let mut reader = crate::xml::reader(xml.as_bytes());
        let mut buf = Vec::new();
        let mut fills = Vec::new();
        let mut fill_reader = FillReader::default();
        loop {
            match reader.read_event_into(&mut buf).unwrap() {
                Event::Start(e) => fills.extend(fill_reader.start(&e, false)),
                Event::Empty(e) => fills.extend(fill_reader.start(&e, true)),
                Event::End(e) => fills.extend(fill_reader.end(e.local_name().as_ref())),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        fills
    }

    #[test]
    fn test_solid_gradient_pattern() {
        let fills = read_fills(
            r#"<lst xmlns:a="a">
              <a:solidFill><a:schemeClr val="phClr"><a:shade val="50000"/></a:schemeClr></a:solidFill>
              <a:gradFill><a:gsLst><a:gs pos="0"><a:srgbClr val="FFFFFF"/></a:gs><a:gs pos="100000"><a:srgbClr val="000000"/></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill>
              <a:pattFill prst="dkDnDiag"><a:fgClr><a:srgbClr val="FF0000"/></a:fgClr><a:bgClr><a:schemeClr val="bg1"/></a:bgClr></a:pattFill>
              <a:noFill/>
            </lst>"#,
        );
        assert_eq!(fills.len(), 4);
        assert_eq!(
            fills[0],
            DrawingFill::Solid(ColorRef::Theme {
                slot: ThemeSlot::Placeholder,
                transforms: vec![ColorTransform::Shade(50_000)]
            })
        );
        match &fills[1] {
            DrawingFill::Gradient { angle, stops } => {
                assert_eq!(*angle, 90.0);
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[1], (1.0, ColorRef::Rgb(SolidColor::BLACK)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            fills[2],
            DrawingFill::Pattern {
                preset: "dkDnDiag".into(),
                fg: ColorRef::Rgb(SolidColor::rgb(255, 0, 0)),
                bg: ColorRef::theme(ThemeSlot::Light1),
            }
        );
        assert_eq!(fills[3], DrawingFill::None);
    }

    #[test]
    fn test_written_fill_reads_back() {
        let fill = DrawingFill::Gradient {
            angle: 45.0,
            stops: vec![
                (0.0, ColorRef::theme(ThemeSlot::Accent1)),
                (0.5, ColorRef::Rgb(SolidColor::rgb(1, 2, 3))),
            ],
        };
        let mut out = String::from("<x xmlns:a=\"a\">");
        write_drawing_fill(&mut out, &fill);
        out.push_str("</x>");
        assert_eq!(read_fills(&out), vec![fill]);
    }
}

//! Write path: intern styles, borders and data formats into stylesheet tables.
//!
//! Every intern step is a linear scan for an equal record before appending,
//! so table order depends only on call order.

use crate::color::{ColorRef, ColorValue, SolidColor};
use crate::number_format::{builtin_id, DataFormat};
use crate::parts::styles::{
    AlignmentRecord, BorderRecord, BorderSideRecord, FillRecord, FontRecord, Stylesheet, XfRecord,
};
use crate::style::{Alignment, BorderLine, CellBorders, CellStyle, Font, HorizontalAlignment, VerticalAlignment};
use crate::style_resolver::rotation_to_file;

/// Accumulates the stylesheet of one save call.
#[derive(Debug)]
pub struct StyleWriter {
    sheet: Stylesheet,
}

impl Default for StyleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleWriter {
    /// Start from the mandatory default records.
    pub fn new() -> Self {
        StyleWriter { sheet: Stylesheet::excel_defaults() }
    }

    /// Find or create the xf for a style, border quad and data format.
    pub fn intern_to_format_index(
        &mut self,
        style: Option<&CellStyle>,
        borders: &CellBorders,
        format: &DataFormat,
    ) -> u32 {
        let default_style = CellStyle::default();
        let style = style.unwrap_or(&default_style);

        let xf = XfRecord {
            num_fmt_id: self.intern_number_format(format),
            font_id: self.intern_font(&style.font),
            fill_id: self.intern_fill(style.fill.as_ref()),
            border_id: self.intern_border(borders),
            alignment: alignment_record(&style.alignment),
        };
        intern(&mut self.sheet.cell_xfs, xf)
    }

    pub fn intern_font(&mut self, font: &Font) -> u32 {
        intern(&mut self.sheet.fonts, font_record(font))
    }

    pub fn intern_fill(&mut self, fill: Option<&ColorValue>) -> u32 {
        let record = match fill {
            None => return 0,
            Some(value) if value.is_empty() => return 0,
            Some(ColorValue::Solid(color)) => FillRecord::solid(rgb(*color)),
            Some(ColorValue::HatchPattern { fore, .. }) => FillRecord::Pattern {
                pattern: "darkGray".to_string(),
                fg: Some(rgb(*fore)),
                bg: Some(rgb(SolidColor::WHITE)),
            },
            Some(ColorValue::LinearGradient { angle, stops }) => FillRecord::Gradient {
                degree: *angle,
                stops: stops.iter().map(|s| (s.position, rgb(s.color))).collect(),
            },
        };
        intern(&mut self.sheet.fills, record)
    }

    pub fn intern_border(&mut self, borders: &CellBorders) -> u32 {
        let record = BorderRecord {
            left: borders.left.map(side_record),
            right: borders.right.map(side_record),
            top: borders.top.map(side_record),
            bottom: borders.bottom.map(side_record),
        };
        intern(&mut self.sheet.borders, record)
    }

    /// Built-in ids are used when the code matches one; custom codes get ids
    /// from 164 up.
    pub fn intern_number_format(&mut self, format: &DataFormat) -> u32 {
        let code = format.to_pattern();
        if let Some(id) = builtin_id(&code) {
            return id;
        }
        if let Some((id, _)) = self.sheet.num_fmts.iter().find(|(_, c)| *c == code) {
            return *id;
        }
        let id = self.sheet.next_num_fmt_id();
        self.sheet.num_fmts.push((id, code));
        id
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.sheet
    }

    pub fn into_stylesheet(self) -> Stylesheet {
        self.sheet
    }
}

fn intern<T: PartialEq>(table: &mut Vec<T>, record: T) -> u32 {
    if let Some(index) = table.iter().position(|existing| *existing == record) {
        return index as u32;
    }
    table.push(record);
    (table.len() - 1) as u32
}

fn rgb(color: SolidColor) -> ColorRef {
    ColorRef::Rgb(color)
}

fn font_record(font: &Font) -> FontRecord {
    FontRecord {
        name: Some(font.name.clone()),
        size: Some(font.size),
        bold: font.bold,
        italic: font.italic,
        underline: font.underline,
        strike: font.strike,
        color: font.color.map(rgb),
    }
}

/// Rich-text run properties.
pub fn run_font_record(font: &Font) -> FontRecord {
    font_record(font)
}

fn side_record(line: BorderLine) -> BorderSideRecord {
    BorderSideRecord { style: line.style, color: line.color.map(rgb) }
}

fn alignment_record(alignment: &Alignment) -> Option<AlignmentRecord> {
    if alignment.is_default() {
        return None;
    }
    Some(AlignmentRecord {
        horizontal: match alignment.horizontal {
            HorizontalAlignment::General => None,
            h => Some(h),
        },
        vertical: match alignment.vertical {
            VerticalAlignment::Bottom => None,
            v => Some(v),
        },
        wrap_text: alignment.wrap_text,
        text_rotation: rotation_to_file(alignment.rotation),
        indent: alignment.effective_indent(),
    })
}

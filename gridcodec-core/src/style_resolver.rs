//! Read path: turn a cell-format (xf) index into a concrete style set.
//!
//! Each xf is resolved at most once per load. The memo lives in the resolver,
//! which is owned by a single load call; the parsed stylesheet is never mutated.

use std::sync::Arc;

use crate::color::{ColorRef, ColorResolver, ColorValue, GradientStop, PaletteContext, SolidColor};
use crate::number_format::DataFormat;
use crate::parts::styles::{
    AlignmentRecord, BorderRecord, BorderSideRecord, FillRecord, FontRecord, Stylesheet, XfRecord,
};
use crate::style::{Alignment, BorderLine, CellBorders, CellStyle, Font, HorizontalAlignment};

/// Everything an xf contributes to a cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedXf {
    /// `None` when the merged style equals the default style.
    pub style: Option<Arc<CellStyle>>,
    pub borders: CellBorders,
    pub format: DataFormat,
}

#[derive(Clone, Debug)]
enum Slot {
    Unprocessed,
    Preprocessing,
    Cached(Arc<ResolvedXf>),
}

/// Memoizing resolver for one stylesheet.
pub struct StyleResolver<'a> {
    sheet: &'a Stylesheet,
    colors: ColorResolver<'a>,
    slots: Vec<Slot>,
    root: CellStyle,
    fallback: Arc<ResolvedXf>,
}

impl<'a> StyleResolver<'a> {
    pub fn new(sheet: &'a Stylesheet, palette: PaletteContext<'a>) -> Self {
        let mut colors = ColorResolver::new(palette);
        let root_font = match sheet.fonts.first() {
            Some(record) => merge_font(Font::default(), record, &mut colors),
            None => Font::default(),
        };
        let root = CellStyle { font: root_font, ..CellStyle::default() };
        let fallback = Arc::new(ResolvedXf {
            style: normalized(root.clone()),
            ..ResolvedXf::default()
        });
        StyleResolver {
            sheet,
            colors,
            slots: vec![Slot::Unprocessed; sheet.cell_xfs.len()],
            root,
            fallback,
        }
    }

    /// Resolve an xf index; out-of-range indices resolve to the default style.
    pub fn resolve(&mut self, xf_index: u32) -> Arc<ResolvedXf> {
        let idx = xf_index as usize;
        match self.slots.get(idx) {
            None => return self.fallback.clone(),
            Some(Slot::Cached(resolved)) => return resolved.clone(),
            Some(Slot::Preprocessing) => {
                log::warn!("cell format {} references itself; using the default style", xf_index);
                return self.fallback.clone();
            }
            Some(Slot::Unprocessed) => {}
        }

        self.slots[idx] = Slot::Preprocessing;
        let sheet = self.sheet;
        let resolved = Arc::new(self.build(&sheet.cell_xfs[idx]));
        self.slots[idx] = Slot::Cached(resolved.clone());
        resolved
    }

    /// Number of xfs resolved so far.
    pub fn cached_count(&self) -> usize {
        self.slots.iter().filter(|s| matches!(s, Slot::Cached(_))).count()
    }

    /// Resolve a rich-text run font on top of the root font.
    pub fn run_font(&mut self, record: &FontRecord) -> Font {
        merge_font(self.root.font.clone(), record, &mut self.colors)
    }

    pub fn resolve_color(&mut self, color: &ColorRef) -> SolidColor {
        self.colors.resolve(color)
    }

    fn build(&mut self, xf: &XfRecord) -> ResolvedXf {
        let sheet = self.sheet;
        let mut style = self.root.clone();

        if let Some(font) = sheet.fonts.get(xf.font_id as usize) {
            style.font = merge_font(style.font, font, &mut self.colors);
        }
        if let Some(fill) = sheet.fills.get(xf.fill_id as usize) {
            style.fill = resolve_fill(fill, &mut self.colors);
        }
        if let Some(alignment) = &xf.alignment {
            style.alignment = resolve_alignment(alignment);
        }
        let borders = sheet
            .borders
            .get(xf.border_id as usize)
            .map(|b| resolve_border(b, &mut self.colors))
            .unwrap_or_default();
        let format = match sheet.number_format_code(xf.num_fmt_id) {
            Some(code) => DataFormat::from_pattern(code),
            None => {
                log::warn!("unknown number format id {}; using General", xf.num_fmt_id);
                DataFormat::General
            }
        };

        ResolvedXf { style: normalized(style), borders, format }
    }
}

fn normalized(style: CellStyle) -> Option<Arc<CellStyle>> {
    if style.is_default() {
        None
    } else {
        Some(Arc::new(style))
    }
}

fn merge_font(mut font: Font, record: &FontRecord, colors: &mut ColorResolver<'_>) -> Font {
    if let Some(name) = &record.name {
        font.name = name.clone();
    }
    if let Some(size) = record.size {
        font.size = size;
    }
    font.bold = record.bold;
    font.italic = record.italic;
    font.underline = record.underline;
    font.strike = record.strike;
    font.color = match &record.color {
        // automatic and unset both mean "window text"
        None | Some(ColorRef::Auto) => None,
        Some(c) => Some(colors.resolve(c)),
    };
    font
}

/// `solid` paints the foreground; every other pattern becomes a hatch of the
/// foreground (or background) over white.
fn resolve_fill(fill: &FillRecord, colors: &mut ColorResolver<'_>) -> Option<ColorValue> {
    match fill {
        FillRecord::None => None,
        FillRecord::Pattern { pattern, fg, bg } => match pattern.as_str() {
            "none" | "" => None,
            "solid" => {
                let color = fg.as_ref().or(bg.as_ref())?;
                Some(ColorValue::Solid(colors.resolve(color)))
            }
            _ => {
                let fore = fg
                    .as_ref()
                    .or(bg.as_ref())
                    .map(|c| colors.resolve(c))
                    .unwrap_or(SolidColor::BLACK);
                Some(ColorValue::HatchPattern { fore, back: SolidColor::WHITE })
            }
        },
        FillRecord::Gradient { degree, stops } => Some(ColorValue::LinearGradient {
            angle: *degree,
            stops: stops
                .iter()
                .map(|(position, color)| GradientStop { position: *position, color: colors.resolve(color) })
                .collect(),
        }),
    }
}

fn resolve_side(side: &Option<BorderSideRecord>, colors: &mut ColorResolver<'_>) -> Option<BorderLine> {
    side.as_ref().map(|s| BorderLine {
        style: s.style,
        color: match &s.color {
            None | Some(ColorRef::Auto) => None,
            Some(c) => Some(colors.resolve(c)),
        },
    })
}

/// Pure border resolution; memoized through the owning xf.
pub fn resolve_border(border: &BorderRecord, colors: &mut ColorResolver<'_>) -> CellBorders {
    CellBorders {
        top: resolve_side(&border.top, colors),
        bottom: resolve_side(&border.bottom, colors),
        left: resolve_side(&border.left, colors),
        right: resolve_side(&border.right, colors),
    }
}

/// File rotation to model rotation: 0..=90 counter-clockwise as is, 91..=180
/// clockwise as `90 - angle`.
pub fn rotation_from_file(raw: u32) -> i32 {
    match raw {
        0..=90 => raw as i32,
        91..=180 => 90 - raw as i32,
        _ => {
            log::warn!("text rotation {} (vertical text) is not supported; ignored", raw);
            0
        }
    }
}

/// Inverse of [`rotation_from_file`].
pub fn rotation_to_file(degrees: i32) -> u32 {
    let degrees = degrees.clamp(-90, 90);
    if degrees >= 0 {
        degrees as u32
    } else {
        (90 - degrees) as u32
    }
}

fn resolve_alignment(record: &AlignmentRecord) -> Alignment {
    let horizontal = record.horizontal.unwrap_or_default();
    Alignment {
        horizontal,
        vertical: record.vertical.unwrap_or_default(),
        wrap_text: record.wrap_text,
        rotation: rotation_from_file(record.text_rotation),
        indent: if horizontal == HorizontalAlignment::Left { record.indent } else { 0 },
    }
}

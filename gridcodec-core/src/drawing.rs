//! Floating objects: pictures, shapes and charts anchored to a worksheet.
//!
//! The drawing part stores EMU offsets, relationship ids and theme style
//! references; the model here stores pixels, image bytes and resolved colors.

use crate::color::{ColorRef, ColorResolver, ColorValue, GradientStop, SolidColor};
use crate::error::{CodecError, Result};
use crate::parts::chart::{ChartPart, SeriesRecord};
use crate::parts::drawing::{AnchorPoint, AnchorRecord, DrawingAnchor, DrawingPart, ObjectRecord, StyleRef};
use crate::parts::fill::{DrawingFill, DrawingLine};
use crate::parts::theme::Theme;
use crate::units::{emu_to_pixels, pixels_to_emu};

pub use crate::parts::chart::ChartKind;

const EMU_PER_POINT: f64 = 12_700.0;
/// Hairline outline used when a line has no width of its own.
const DEFAULT_LINE_EMU: i64 = 9525;

/// A cell corner plus a pixel offset into that cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellOffset {
    pub row: u32,
    pub col: u32,
    pub dx: i64,
    pub dy: i64,
}

impl CellOffset {
    pub fn new(row: u32, col: u32) -> Self {
        CellOffset { row, col, dx: 0, dy: 0 }
    }

    pub fn with_offset(mut self, dx: i64, dy: i64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }
}

/// Where an object sits. Sizes and offsets are pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum Anchor {
    /// Moves and resizes with the cells under both corners.
    TwoCell { from: CellOffset, to: CellOffset },
    /// Moves with its top-left cell, fixed size.
    OneCell { from: CellOffset, width: i64, height: i64 },
    /// Fixed position on the sheet.
    Absolute { x: i64, y: i64, width: i64, height: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => crate::package::content_types::PNG,
            ImageFormat::Jpeg => crate::package::content_types::JPEG,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    pub description: Option<String>,
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

/// An outline. `width` is in points.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeLine {
    pub width: f64,
    pub color: Option<SolidColor>,
    /// Preset dash name such as `dash` or `sysDot`.
    pub dash: Option<String>,
}

impl ShapeLine {
    pub fn solid(width: f64, color: SolidColor) -> Self {
        ShapeLine { width, color: Some(color), dash: None }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    /// Preset geometry, e.g. `rect`, `ellipse`.
    pub geometry: String,
    pub fill: Option<ColorValue>,
    pub line: Option<ShapeLine>,
    /// Paragraphs separated by `\n`.
    pub text: Option<String>,
}

impl Shape {
    pub fn new<S: Into<String>>(geometry: S) -> Self {
        Shape { geometry: geometry.into(), fill: None, line: None, text: None }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartSeries {
    pub name: Option<String>,
    /// Reference to the cell holding the name, e.g. `Sheet1!$B$1`.
    pub name_ref: Option<String>,
    pub categories: Option<String>,
    pub values: Option<String>,
    pub color: Option<SolidColor>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawingKind {
    Picture(Picture),
    Shape(Shape),
    Chart(Chart),
}

/// One anchored object.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawingObject {
    pub name: String,
    pub anchor: Anchor,
    pub kind: DrawingKind,
}

/// Parts a drawing points at through its relationships.
pub trait DrawingSource {
    /// Path and bytes of the image part behind `rel_id`, or `None` if it is missing.
    fn image(&mut self, rel_id: &str) -> Result<Option<(String, Vec<u8>)>>;

    /// The parsed chart part behind `rel_id`, or `None` if it is missing.
    fn chart(&mut self, rel_id: &str) -> Result<Option<ChartPart>>;
}

/// A part that has to be added to the package for a written drawing.
pub enum LinkedPart<'a> {
    Image(&'a Picture),
    Chart(ChartPart),
}

/// Translate a parsed drawing into model objects.
///
/// Objects whose target part is missing, or whose image type is unsupported,
/// are dropped with a warning.
pub fn read_drawing<S: DrawingSource>(
    part: &DrawingPart,
    theme: Option<&Theme>,
    colors: &mut ColorResolver<'_>,
    source: &mut S,
) -> Result<Vec<DrawingObject>> {
    let mut objects = Vec::with_capacity(part.anchors.len());
    for item in &part.anchors {
        let anchor = anchor_from_record(&item.anchor);
        let (name, kind) = match &item.object {
            ObjectRecord::Picture { name, description, embed_rel, .. } => {
                let Some((path, data)) = source.image(embed_rel)? else {
                    log::warn!("picture '{}' points at a missing image ({})", name, embed_rel);
                    continue;
                };
                let ext = path.rsplit('.').next().unwrap_or_default();
                let Some(format) = ImageFormat::from_extension(ext) else {
                    log::warn!("skipping picture '{}': unsupported image type '{}'", name, ext);
                    continue;
                };
                let picture = Picture { description: description.clone(), data, format };
                (name.clone(), DrawingKind::Picture(picture))
            }
            ObjectRecord::Shape { name, geometry, fill, line, fill_ref, line_ref, text, .. } => {
                let shape = Shape {
                    geometry: geometry.clone(),
                    fill: shape_fill(fill.as_ref(), fill_ref.as_ref(), theme, colors),
                    line: shape_line(line.as_ref(), line_ref.as_ref(), theme, colors),
                    text: text.clone(),
                };
                (name.clone(), DrawingKind::Shape(shape))
            }
            ObjectRecord::GraphicFrame { name, chart_rel, .. } => {
                let Some(chart) = source.chart(chart_rel)? else {
                    log::warn!("chart frame '{}' points at a missing chart ({})", name, chart_rel);
                    continue;
                };
                (name.clone(), DrawingKind::Chart(chart_from_part(&chart, colors)))
            }
        };
        objects.push(DrawingObject { name, anchor, kind });
    }
    Ok(objects)
}

/// Translate model objects into a drawing part.
///
/// `link` adds each picture or chart part to the package and returns the
/// relationship id the drawing uses for it.
pub fn write_drawing<F>(objects: &[DrawingObject], mut link: F) -> Result<DrawingPart>
where
    F: FnMut(LinkedPart<'_>) -> Result<String>,
{
    let mut part = DrawingPart::default();
    for (i, object) in objects.iter().enumerate() {
        let id = i as u32 + 2;
        let record = match &object.kind {
            DrawingKind::Picture(picture) => {
                if picture.data.is_empty() {
                    return Err(CodecError::UnsupportedOperation(format!(
                        "picture '{}' has no image data",
                        object.name
                    )));
                }
                ObjectRecord::Picture {
                    id,
                    name: object.name.clone(),
                    description: picture.description.clone(),
                    embed_rel: link(LinkedPart::Image(picture))?,
                }
            }
            DrawingKind::Shape(shape) => ObjectRecord::Shape {
                id,
                name: object.name.clone(),
                geometry: shape.geometry.clone(),
                fill: Some(shape.fill.as_ref().map(fill_record).unwrap_or(DrawingFill::None)),
                line: Some(line_record(shape.line.as_ref())),
                fill_ref: None,
                line_ref: None,
                text: shape.text.clone(),
            },
            DrawingKind::Chart(chart) => ObjectRecord::GraphicFrame {
                id,
                name: object.name.clone(),
                chart_rel: link(LinkedPart::Chart(chart_part(chart)))?,
            },
        };
        part.anchors.push(DrawingAnchor { anchor: anchor_record(&object.anchor), object: record });
    }
    Ok(part)
}

fn point_from_record(p: &AnchorPoint) -> CellOffset {
    CellOffset {
        row: p.row,
        col: p.col,
        dx: emu_to_pixels(p.col_offset),
        dy: emu_to_pixels(p.row_offset),
    }
}

fn point_record(p: &CellOffset) -> AnchorPoint {
    AnchorPoint {
        col: p.col,
        col_offset: pixels_to_emu(p.dx),
        row: p.row,
        row_offset: pixels_to_emu(p.dy),
    }
}

fn anchor_from_record(record: &AnchorRecord) -> Anchor {
    match record {
        AnchorRecord::TwoCell { from, to } => Anchor::TwoCell {
            from: point_from_record(from),
            to: point_from_record(to),
        },
        AnchorRecord::OneCell { from, cx, cy } => Anchor::OneCell {
            from: point_from_record(from),
            width: emu_to_pixels(*cx),
            height: emu_to_pixels(*cy),
        },
        AnchorRecord::Absolute { x, y, cx, cy } => Anchor::Absolute {
            x: emu_to_pixels(*x),
            y: emu_to_pixels(*y),
            width: emu_to_pixels(*cx),
            height: emu_to_pixels(*cy),
        },
    }
}

fn anchor_record(anchor: &Anchor) -> AnchorRecord {
    match anchor {
        Anchor::TwoCell { from, to } => AnchorRecord::TwoCell { from: point_record(from), to: point_record(to) },
        Anchor::OneCell { from, width, height } => AnchorRecord::OneCell {
            from: point_record(from),
            cx: pixels_to_emu(*width),
            cy: pixels_to_emu(*height),
        },
        Anchor::Absolute { x, y, width, height } => AnchorRecord::Absolute {
            x: pixels_to_emu(*x),
            y: pixels_to_emu(*y),
            cx: pixels_to_emu(*width),
            cy: pixels_to_emu(*height),
        },
    }
}

/// Resolve a fill; `placeholder` stands in for `phClr` in theme styles.
fn fill_value(
    fill: &DrawingFill,
    placeholder: Option<SolidColor>,
    colors: &mut ColorResolver<'_>,
) -> Option<ColorValue> {
    match fill {
        DrawingFill::None => None,
        DrawingFill::Solid(c) => Some(ColorValue::Solid(colors.resolve_with(c, placeholder))),
        DrawingFill::Gradient { angle, stops } => Some(ColorValue::LinearGradient {
            angle: *angle,
            stops: stops
                .iter()
                .map(|(position, c)| GradientStop {
                    position: *position,
                    color: colors.resolve_with(c, placeholder),
                })
                .collect(),
        }),
        DrawingFill::Pattern { fg, bg, .. } => Some(ColorValue::HatchPattern {
            fore: colors.resolve_with(fg, placeholder),
            back: colors.resolve_with(bg, placeholder),
        }),
    }
}

fn placeholder_of(style_ref: &StyleRef, colors: &mut ColorResolver<'_>) -> Option<SolidColor> {
    style_ref.color.as_ref().map(|c| colors.resolve(c))
}

/// Explicit fill wins; otherwise the theme's fill style for `fillRef`.
fn shape_fill(
    fill: Option<&DrawingFill>,
    fill_ref: Option<&StyleRef>,
    theme: Option<&Theme>,
    colors: &mut ColorResolver<'_>,
) -> Option<ColorValue> {
    if let Some(fill) = fill {
        return fill_value(fill, None, colors);
    }
    let style_ref = fill_ref?;
    let placeholder = placeholder_of(style_ref, colors);
    let style = theme?.fill_style(style_ref.idx)?;
    fill_value(style, placeholder, colors)
}

/// Merge an explicit outline over the theme's line style for `lnRef`.
fn shape_line(
    line: Option<&DrawingLine>,
    line_ref: Option<&StyleRef>,
    theme: Option<&Theme>,
    colors: &mut ColorResolver<'_>,
) -> Option<ShapeLine> {
    let themed = line_ref.and_then(|r| {
        let placeholder = placeholder_of(r, colors);
        theme?.line_style(r.idx).map(|style| (style, placeholder))
    });
    if line.is_none() && themed.is_none() {
        return None;
    }
    if matches!(line.and_then(|l| l.fill.as_ref()), Some(DrawingFill::None)) {
        return None;
    }

    let width_emu = line
        .and_then(|l| l.width_emu)
        .or_else(|| themed.and_then(|(style, _)| style.width_emu))
        .unwrap_or(DEFAULT_LINE_EMU);
    let color = match line.and_then(|l| l.fill.as_ref()) {
        Some(fill) => fill_value(fill, None, colors),
        None => themed.and_then(|(style, placeholder)| {
            style.fill.as_ref().and_then(|f| fill_value(f, placeholder, colors))
        }),
    };
    let dash = line
        .and_then(|l| l.dash.clone())
        .or_else(|| themed.and_then(|(style, _)| style.dash.clone()))
        .filter(|d| d != "solid");

    Some(ShapeLine {
        width: width_emu as f64 / EMU_PER_POINT,
        color: color.map(|c| c.to_solid()),
        dash,
    })
}

fn fill_record(value: &ColorValue) -> DrawingFill {
    match value {
        v if v.is_empty() => DrawingFill::None,
        ColorValue::Solid(c) => DrawingFill::Solid(ColorRef::Rgb(*c)),
        ColorValue::LinearGradient { angle, stops } => DrawingFill::Gradient {
            angle: *angle,
            stops: stops.iter().map(|s| (s.position, ColorRef::Rgb(s.color))).collect(),
        },
        ColorValue::HatchPattern { fore, back } => DrawingFill::Pattern {
            preset: "pct50".to_string(),
            fg: ColorRef::Rgb(*fore),
            bg: ColorRef::Rgb(*back),
        },
    }
}

fn line_record(line: Option<&ShapeLine>) -> DrawingLine {
    match line {
        None => DrawingLine { width_emu: None, fill: Some(DrawingFill::None), dash: None },
        Some(l) => DrawingLine {
            width_emu: Some((l.width * EMU_PER_POINT).round() as i64),
            fill: l.color.map(|c| DrawingFill::Solid(ColorRef::Rgb(c))),
            dash: l.dash.clone(),
        },
    }
}

fn chart_from_part(part: &ChartPart, colors: &mut ColorResolver<'_>) -> Chart {
    Chart {
        kind: part.kind,
        title: part.title.clone(),
        series: part
            .series
            .iter()
            .map(|s| ChartSeries {
                name: s.name.clone(),
                name_ref: s.name_ref.clone(),
                categories: s.categories_ref.clone(),
                values: s.values_ref.clone(),
                color: s.color.as_ref().map(|c| colors.resolve(c)),
            })
            .collect(),
    }
}

fn chart_part(chart: &Chart) -> ChartPart {
    ChartPart {
        kind: chart.kind,
        title: chart.title.clone(),
        series: chart
            .series
            .iter()
            .map(|s| SeriesRecord {
                name_ref: s.name_ref.clone(),
                name: s.name.clone(),
                categories_ref: s.categories.clone(),
                values_ref: s.values.clone(),
                color: s.color.map(ColorRef::Rgb),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PaletteContext;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemorySource {
        images: HashMap<String, (String, Vec<u8>)>,
        charts: HashMap<String, ChartPart>,
    }

    impl DrawingSource for MemorySource {
        fn image(&mut self, rel_id: &str) -> Result<Option<(String, Vec<u8>)>> {
            Ok(self.images.get(rel_id).cloned())
        }

        fn chart(&mut self, rel_id: &str) -> Result<Option<ChartPart>> {
            Ok(self.charts.get(rel_id).cloned())
        }
    }

    fn objects() -> Vec<DrawingObject> {
        vec![
            DrawingObject {
                name: "Logo".to_string(),
                anchor: Anchor::TwoCell {
                    from: CellOffset::new(1, 1).with_offset(10, 0),
                    to: CellOffset::new(5, 3),
                },
                kind: DrawingKind::Picture(Picture {
                    description: Some("company logo".to_string()),
                    data: vec![0x89, b'P', b'N', b'G'],
                    format: ImageFormat::Png,
                }),
            },
            DrawingObject {
                name: "Box".to_string(),
                anchor: Anchor::OneCell { from: CellOffset::new(8, 0), width: 100, height: 50 },
                kind: DrawingKind::Shape(Shape {
                    geometry: "roundRect".to_string(),
                    fill: Some(ColorValue::Solid(SolidColor::rgb(255, 200, 0))),
                    line: Some(ShapeLine::solid(1.5, SolidColor::BLACK)),
                    text: Some("Total\nQ1".to_string()),
                }),
            },
            DrawingObject {
                name: "Sales".to_string(),
                anchor: Anchor::Absolute { x: 400, y: 20, width: 480, height: 288 },
                kind: DrawingKind::Chart(Chart {
                    kind: ChartKind::Line,
                    title: Some("Sales".to_string()),
                    series: vec![ChartSeries {
                        name: Some("2024".to_string()),
                        name_ref: Some("Data!$B$1".to_string()),
                        categories: Some("Data!$A$2:$A$13".to_string()),
                        values: Some("Data!$B$2:$B$13".to_string()),
                        color: Some(SolidColor::rgb(0x44, 0x72, 0xC4)),
                    }],
                }),
            },
        ]
    }

    #[test]
    fn test_objects_survive_part_translation() {
        let original = objects();
        let mut source = MemorySource::default();
        let mut next = 0;
        let part = write_drawing(&original, |linked| {
            next += 1;
            let id = format!("rId{}", next);
            match linked {
                LinkedPart::Image(p) => {
                    source.images.insert(id.clone(), ("xl/media/image1.png".to_string(), p.data.clone()));
                }
                LinkedPart::Chart(c) => {
                    let parsed = ChartPart::parse(c.to_xml().as_bytes(), "chart").unwrap();
                    source.charts.insert(id.clone(), parsed);
                }
            }
            Ok(id)
        })
        .unwrap();

        let reparsed = DrawingPart::parse(part.to_xml().as_bytes(), "drawing").unwrap();
        let mut colors = ColorResolver::new(PaletteContext::default());
        let read = read_drawing(&reparsed, None, &mut colors, &mut source).unwrap();
        assert_eq!(read, original);
    }

    #[test]
    fn test_theme_style_references_resolve_placeholder() {
        let placeholder = SolidColor::rgb(0x12, 0x34, 0x56);
        let part = DrawingPart {
            anchors: vec![DrawingAnchor {
                anchor: AnchorRecord::Absolute { x: 0, y: 0, cx: 952500, cy: 952500 },
                object: ObjectRecord::Shape {
                    id: 2,
                    name: "Styled".to_string(),
                    geometry: "rect".to_string(),
                    fill: None,
                    line: None,
                    fill_ref: Some(StyleRef { idx: 1, color: Some(ColorRef::Rgb(placeholder)) }),
                    line_ref: Some(StyleRef { idx: 2, color: Some(ColorRef::Rgb(placeholder)) }),
                    text: None,
                },
            }],
        };
        let theme = Theme::default();
        let mut colors = ColorResolver::new(PaletteContext::default());
        let read = read_drawing(&part, Some(&theme), &mut colors, &mut MemorySource::default()).unwrap();

        assert_eq!(read[0].anchor, Anchor::Absolute { x: 0, y: 0, width: 100, height: 100 });
        let DrawingKind::Shape(shape) = &read[0].kind else {
            panic!("expected a shape");
        };
        assert_eq!(shape.fill, Some(ColorValue::Solid(placeholder)));
        let line = shape.line.as_ref().unwrap();
        assert_eq!(line.width, 2.0);
        assert_eq!(line.color, Some(placeholder));
        assert_eq!(line.dash, None);
    }

    #[test]
    fn test_missing_targets_are_dropped() {
        let part = DrawingPart {
            anchors: vec![DrawingAnchor {
                anchor: AnchorRecord::Absolute { x: 0, y: 0, cx: 0, cy: 0 },
                object: ObjectRecord::Picture {
                    id: 2,
                    name: "gone".to_string(),
                    description: None,
                    embed_rel: "rId9".to_string(),
                },
            }],
        };
        let mut colors = ColorResolver::new(PaletteContext::default());
        let read = read_drawing(&part, None, &mut colors, &mut MemorySource::default()).unwrap();
        assert!(read.is_empty());
    }
}

//! Cell styling types: Font, Alignment, borders and the resolved CellStyle.
//!
//! These hold concrete values only; color references are resolved against the
//! document palette before they reach this model.

use crate::color::{ColorValue, SolidColor};

/// Font properties for cell styling.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Font family name (e.g., "Calibri", "Arial").
    pub name: String,
    /// Font size in points.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Font color; `None` is automatic.
    pub color: Option<SolidColor>,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            name: "Calibri".to_string(),
            size: 11.0,
            bold: false,
            italic: false,
            underline: false,
            strike: false,
            color: None,
        }
    }
}

impl Font {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    pub fn with_strike(mut self, strike: bool) -> Self {
        self.strike = strike;
        self
    }

    pub fn with_color(mut self, color: SolidColor) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    pub fn from_attr(value: &str) -> Option<Self> {
        Some(match value {
            "general" => HorizontalAlignment::General,
            "left" => HorizontalAlignment::Left,
            "center" => HorizontalAlignment::Center,
            "right" => HorizontalAlignment::Right,
            "fill" => HorizontalAlignment::Fill,
            "justify" => HorizontalAlignment::Justify,
            "centerContinuous" => HorizontalAlignment::CenterContinuous,
            "distributed" => HorizontalAlignment::Distributed,
            _ => return None,
        })
    }

    pub fn as_attr(self) -> &'static str {
        match self {
            HorizontalAlignment::General => "general",
            HorizontalAlignment::Left => "left",
            HorizontalAlignment::Center => "center",
            HorizontalAlignment::Right => "right",
            HorizontalAlignment::Fill => "fill",
            HorizontalAlignment::Justify => "justify",
            HorizontalAlignment::CenterContinuous => "centerContinuous",
            HorizontalAlignment::Distributed => "distributed",
        }
    }
}

/// Vertical alignment. The file format has no "general": absence means bottom.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAlignment {
    Top,
    Center,
    #[default]
    Bottom,
    Justify,
    Distributed,
}

impl VerticalAlignment {
    pub fn from_attr(value: &str) -> Option<Self> {
        Some(match value {
            "top" => VerticalAlignment::Top,
            "center" => VerticalAlignment::Center,
            "bottom" => VerticalAlignment::Bottom,
            "justify" => VerticalAlignment::Justify,
            "distributed" => VerticalAlignment::Distributed,
            _ => return None,
        })
    }

    pub fn as_attr(self) -> &'static str {
        match self {
            VerticalAlignment::Top => "top",
            VerticalAlignment::Center => "center",
            VerticalAlignment::Bottom => "bottom",
            VerticalAlignment::Justify => "justify",
            VerticalAlignment::Distributed => "distributed",
        }
    }
}

/// Text alignment properties.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
    /// Rotation in degrees, -90..=90; positive is counter-clockwise.
    pub rotation: i32,
    /// Indent level; only kept for left-aligned text.
    pub indent: u32,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_horizontal(mut self, align: HorizontalAlignment) -> Self {
        self.horizontal = align;
        self
    }

    pub fn with_vertical(mut self, align: VerticalAlignment) -> Self {
        self.vertical = align;
        self
    }

    pub fn with_wrap_text(mut self, wrap: bool) -> Self {
        self.wrap_text = wrap;
        self
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = degrees.clamp(-90, 90);
        self
    }

    pub fn with_indent(mut self, indent: u32) -> Self {
        self.indent = indent;
        self
    }

    /// Indent that survives a round trip: zero unless left-aligned.
    pub fn effective_indent(&self) -> u32 {
        if self.horizontal == HorizontalAlignment::Left {
            self.indent
        } else {
            0
        }
    }

    pub fn is_default(&self) -> bool {
        self.horizontal == HorizontalAlignment::General
            && self.vertical == VerticalAlignment::Bottom
            && !self.wrap_text
            && self.rotation == 0
            && self.effective_indent() == 0
    }
}

/// Line style of one border edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BorderLineStyle {
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    pub fn from_attr(value: &str) -> Option<Self> {
        Some(match value {
            "thin" => BorderLineStyle::Thin,
            "medium" => BorderLineStyle::Medium,
            "thick" => BorderLineStyle::Thick,
            "dashed" => BorderLineStyle::Dashed,
            "dotted" => BorderLineStyle::Dotted,
            "double" => BorderLineStyle::Double,
            "hair" => BorderLineStyle::Hair,
            "mediumDashed" => BorderLineStyle::MediumDashed,
            "dashDot" => BorderLineStyle::DashDot,
            "mediumDashDot" => BorderLineStyle::MediumDashDot,
            "dashDotDot" => BorderLineStyle::DashDotDot,
            "mediumDashDotDot" => BorderLineStyle::MediumDashDotDot,
            "slantDashDot" => BorderLineStyle::SlantDashDot,
            _ => return None,
        })
    }

    pub fn as_attr(self) -> &'static str {
        match self {
            BorderLineStyle::Thin => "thin",
            BorderLineStyle::Medium => "medium",
            BorderLineStyle::Thick => "thick",
            BorderLineStyle::Dashed => "dashed",
            BorderLineStyle::Dotted => "dotted",
            BorderLineStyle::Double => "double",
            BorderLineStyle::Hair => "hair",
            BorderLineStyle::MediumDashed => "mediumDashed",
            BorderLineStyle::DashDot => "dashDot",
            BorderLineStyle::MediumDashDot => "mediumDashDot",
            BorderLineStyle::DashDotDot => "dashDotDot",
            BorderLineStyle::MediumDashDotDot => "mediumDashDotDot",
            BorderLineStyle::SlantDashDot => "slantDashDot",
        }
    }
}

/// One drawn border edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BorderLine {
    pub style: BorderLineStyle,
    /// `None` is automatic (black).
    pub color: Option<SolidColor>,
}

impl BorderLine {
    pub fn new(style: BorderLineStyle) -> Self {
        BorderLine { style, color: None }
    }

    pub fn thin() -> Self {
        Self::new(BorderLineStyle::Thin)
    }

    pub fn medium() -> Self {
        Self::new(BorderLineStyle::Medium)
    }

    pub fn thick() -> Self {
        Self::new(BorderLineStyle::Thick)
    }

    pub fn with_color(mut self, color: SolidColor) -> Self {
        self.color = Some(color);
        self
    }
}

/// The four edges around one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CellBorders {
    pub top: Option<BorderLine>,
    pub bottom: Option<BorderLine>,
    pub left: Option<BorderLine>,
    pub right: Option<BorderLine>,
}

impl CellBorders {
    pub fn all(line: BorderLine) -> Self {
        CellBorders {
            top: Some(line),
            bottom: Some(line),
            left: Some(line),
            right: Some(line),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none()
    }
}

/// A merged, concrete style set: font, background and alignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellStyle {
    pub font: Font,
    /// Background paint; `None` is no fill.
    pub fill: Option<ColorValue>,
    pub alignment: Alignment,
}

impl CellStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_fill(mut self, fill: ColorValue) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_background(self, color: SolidColor) -> Self {
        self.with_fill(ColorValue::Solid(color))
    }

    pub fn is_default(&self) -> bool {
        self.font == Font::default() && self.fill.is_none() && self.alignment.is_default()
    }
}

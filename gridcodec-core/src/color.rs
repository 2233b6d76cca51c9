//! Color model and resolution.
//!
//! A [`ColorRef`] is what a part stores: a literal RGB, an index into the legacy
//! palette, or a theme slot with modifiers. [`resolve`] turns a reference into a
//! concrete [`SolidColor`] given the document's [`PaletteContext`].

use crate::FastMap;

/// A concrete ARGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SolidColor {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl SolidColor {
    pub const BLACK: SolidColor = SolidColor::rgb(0, 0, 0);
    pub const WHITE: SolidColor = SolidColor::rgb(0xFF, 0xFF, 0xFF);
    pub const TRANSPARENT: SolidColor = SolidColor { a: 0, r: 0, g: 0, b: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        SolidColor { a: 0xFF, r, g, b }
    }

    pub const fn from_argb(argb: u32) -> Self {
        SolidColor {
            a: (argb >> 24) as u8,
            r: (argb >> 16) as u8,
            g: (argb >> 8) as u8,
            b: argb as u8,
        }
    }

    pub fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading `#`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        match hex.len() {
            6 => u32::from_str_radix(hex, 16)
                .ok()
                .map(|rgb| SolidColor::from_argb(0xFF00_0000 | rgb)),
            8 => u32::from_str_radix(hex, 16).ok().map(SolidColor::from_argb),
            _ => None,
        }
    }

    /// `AARRGGBB`, the SpreadsheetML `rgb` attribute form.
    pub fn to_argb_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }

    /// `RRGGBB`, the DrawingML `srgbClr` form.
    pub fn to_rgb_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if max == min {
            return Hsl { h: 0.0, s: 0.0, l };
        }
        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Hsl { h: h / 6.0, s, l }
    }

    pub fn from_hsl(hsl: Hsl, alpha: u8) -> Self {
        let Hsl { h, s, l } = hsl;
        let (r, g, b) = if s == 0.0 {
            (l, l, l)
        } else {
            let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
            let p = 2.0 * l - q;
            (
                hue_to_rgb(p, q, h + 1.0 / 3.0),
                hue_to_rgb(p, q, h),
                hue_to_rgb(p, q, h - 1.0 / 3.0),
            )
        };
        let channel = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        SolidColor { a: alpha, r: channel(r), g: channel(g), b: channel(b) }
    }

    /// HSL lightness in `0.0..=1.0`.
    pub fn luminance(self) -> f64 {
        self.to_hsl().l
    }
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Hue, saturation and lightness, each in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

/// One stop of a linear gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position in `0.0..=1.0`.
    pub position: f64,
    pub color: SolidColor,
}

/// A paint: a solid color, a linear gradient or a two-color hatch.
#[derive(Clone, Debug, PartialEq)]
pub enum ColorValue {
    Solid(SolidColor),
    LinearGradient { angle: f64, stops: Vec<GradientStop> },
    /// Cell fills keep only `fore`: their back color is always written and read as white.
    /// Drawing fills keep both.
    HatchPattern { fore: SolidColor, back: SolidColor },
}

impl ColorValue {
    pub fn is_empty(&self) -> bool {
        match self {
            ColorValue::Solid(c) => c.a == 0,
            ColorValue::LinearGradient { stops, .. } => stops.is_empty(),
            ColorValue::HatchPattern { .. } => false,
        }
    }

    /// The closest single color: the first gradient stop, or the hatch foreground.
    pub fn to_solid(&self) -> SolidColor {
        match self {
            ColorValue::Solid(c) => *c,
            ColorValue::LinearGradient { stops, .. } => stops
                .first()
                .map(|s| s.color)
                .unwrap_or(SolidColor::TRANSPARENT),
            ColorValue::HatchPattern { fore, .. } => *fore,
        }
    }
}

impl Default for ColorValue {
    fn default() -> Self {
        ColorValue::Solid(SolidColor::TRANSPARENT)
    }
}

/// The 12 named slots of a theme color scheme, plus the style placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThemeSlot {
    Dark1,
    Light1,
    Dark2,
    Light2,
    Accent1,
    Accent2,
    Accent3,
    Accent4,
    Accent5,
    Accent6,
    Hyperlink,
    FollowedHyperlink,
    /// `phClr`: replaced by the color supplied with a style reference.
    Placeholder,
}

impl ThemeSlot {
    /// Slots in color-scheme order.
    pub const SCHEME: [ThemeSlot; 12] = [
        ThemeSlot::Dark1,
        ThemeSlot::Light1,
        ThemeSlot::Dark2,
        ThemeSlot::Light2,
        ThemeSlot::Accent1,
        ThemeSlot::Accent2,
        ThemeSlot::Accent3,
        ThemeSlot::Accent4,
        ThemeSlot::Accent5,
        ThemeSlot::Accent6,
        ThemeSlot::Hyperlink,
        ThemeSlot::FollowedHyperlink,
    ];

    /// DrawingML scheme name, accepting the `tx`/`bg` aliases.
    pub fn from_scheme_name(name: &str) -> Option<Self> {
        Some(match name {
            "dk1" | "tx1" => ThemeSlot::Dark1,
            "lt1" | "bg1" => ThemeSlot::Light1,
            "dk2" | "tx2" => ThemeSlot::Dark2,
            "lt2" | "bg2" => ThemeSlot::Light2,
            "accent1" => ThemeSlot::Accent1,
            "accent2" => ThemeSlot::Accent2,
            "accent3" => ThemeSlot::Accent3,
            "accent4" => ThemeSlot::Accent4,
            "accent5" => ThemeSlot::Accent5,
            "accent6" => ThemeSlot::Accent6,
            "hlink" => ThemeSlot::Hyperlink,
            "folHlink" => ThemeSlot::FollowedHyperlink,
            "phClr" => ThemeSlot::Placeholder,
            _ => return None,
        })
    }

    pub fn scheme_name(self) -> &'static str {
        match self {
            ThemeSlot::Dark1 => "dk1",
            ThemeSlot::Light1 => "lt1",
            ThemeSlot::Dark2 => "dk2",
            ThemeSlot::Light2 => "lt2",
            ThemeSlot::Accent1 => "accent1",
            ThemeSlot::Accent2 => "accent2",
            ThemeSlot::Accent3 => "accent3",
            ThemeSlot::Accent4 => "accent4",
            ThemeSlot::Accent5 => "accent5",
            ThemeSlot::Accent6 => "accent6",
            ThemeSlot::Hyperlink => "hlink",
            ThemeSlot::FollowedHyperlink => "folHlink",
            ThemeSlot::Placeholder => "phClr",
        }
    }

    /// SpreadsheetML `theme="n"` index. Light and dark are swapped relative
    /// to the scheme order: 0 is lt1, 1 is dk1, 2 is lt2, 3 is dk2.
    pub fn from_sheet_index(index: u32) -> Option<Self> {
        Some(match index {
            0 => ThemeSlot::Light1,
            1 => ThemeSlot::Dark1,
            2 => ThemeSlot::Light2,
            3 => ThemeSlot::Dark2,
            4..=11 => ThemeSlot::SCHEME[index as usize],
            _ => return None,
        })
    }

    pub fn sheet_index(self) -> Option<u32> {
        Some(match self {
            ThemeSlot::Light1 => 0,
            ThemeSlot::Dark1 => 1,
            ThemeSlot::Light2 => 2,
            ThemeSlot::Dark2 => 3,
            ThemeSlot::Placeholder => return None,
            other => ThemeSlot::SCHEME.iter().position(|s| *s == other)? as u32,
        })
    }

    fn scheme_position(self) -> Option<usize> {
        ThemeSlot::SCHEME.iter().position(|s| *s == self)
    }
}

/// A color modifier. Values are fixed-point fractions of 100000.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorTransform {
    /// Darken: lightness scaled by the value.
    Shade(i32),
    /// Lighten: distance to white scaled by the value.
    Tint(i32),
    LumMod(i32),
    LumOff(i32),
    SatMod(i32),
    /// SpreadsheetML `tint` attribute, in `-100000..=100000`.
    SheetTint(i32),
}

/// A reference to a color as stored in a part.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorRef {
    Rgb(SolidColor),
    Indexed(u32),
    Theme { slot: ThemeSlot, transforms: Vec<ColorTransform> },
    /// `auto="1"`: the system window-text color.
    Auto,
}

impl ColorRef {
    pub fn theme(slot: ThemeSlot) -> Self {
        ColorRef::Theme { slot, transforms: Vec::new() }
    }

    /// SpreadsheetML form: theme index plus a `tint` in `-1.0..=1.0`.
    pub fn sheet_theme(index: u32, tint: f64) -> Option<Self> {
        let slot = ThemeSlot::from_sheet_index(index)?;
        let mut transforms = Vec::new();
        let tint = (tint.clamp(-1.0, 1.0) * 100_000.0).round() as i32;
        if tint != 0 {
            transforms.push(ColorTransform::SheetTint(tint));
        }
        Some(ColorRef::Theme { slot, transforms })
    }
}

impl From<SolidColor> for ColorRef {
    fn from(color: SolidColor) -> Self {
        ColorRef::Rgb(color)
    }
}

/// A theme color scheme: one color per [`ThemeSlot::SCHEME`] entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorScheme {
    pub name: String,
    pub colors: [SolidColor; 12],
}

impl ColorScheme {
    pub fn get(&self, slot: ThemeSlot) -> Option<SolidColor> {
        slot.scheme_position().map(|i| self.colors[i])
    }

    pub fn set(&mut self, slot: ThemeSlot, color: SolidColor) {
        if let Some(i) = slot.scheme_position() {
            self.colors[i] = color;
        }
    }
}

impl Default for ColorScheme {
    /// The Office 2007-2010 scheme.
    fn default() -> Self {
        ColorScheme {
            name: "Office".to_string(),
            colors: [
                SolidColor::from_argb(0xFF000000),
                SolidColor::from_argb(0xFFFFFFFF),
                SolidColor::from_argb(0xFF1F497D),
                SolidColor::from_argb(0xFFEEECE1),
                SolidColor::from_argb(0xFF4F81BD),
                SolidColor::from_argb(0xFFC0504D),
                SolidColor::from_argb(0xFF9BBB59),
                SolidColor::from_argb(0xFF8064A2),
                SolidColor::from_argb(0xFF4BACC6),
                SolidColor::from_argb(0xFFF79646),
                SolidColor::from_argb(0xFF0000FF),
                SolidColor::from_argb(0xFF800080),
            ],
        }
    }
}

/// The fixed 64-entry legacy palette.
pub const INDEXED_PALETTE: [u32; 64] = [
    0xFF000000, 0xFFFFFFFF, 0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFF00, 0xFFFF00FF,
    0xFF00FFFF, 0xFF000000, 0xFFFFFFFF, 0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFF00,
    0xFFFF00FF, 0xFF00FFFF, 0xFF800000, 0xFF008000, 0xFF000080, 0xFF808000, 0xFF800080,
    0xFF008080, 0xFFC0C0C0, 0xFF808080, 0xFF9999FF, 0xFF993366, 0xFFFFFFCC, 0xFFCCFFFF,
    0xFF660066, 0xFFFF8080, 0xFF0066CC, 0xFFCCCCFF, 0xFF000080, 0xFFFF00FF, 0xFFFFFF00,
    0xFF00FFFF, 0xFF800080, 0xFF800000, 0xFF008080, 0xFF0000FF, 0xFF00CCFF, 0xFFCCFFFF,
    0xFFCCFFCC, 0xFFFFFF99, 0xFF99CCFF, 0xFFFF99CC, 0xFFCC99FF, 0xFFFFCC99, 0xFF3366FF,
    0xFF33CCCC, 0xFF99CC00, 0xFFFFCC00, 0xFFFF9900, 0xFFFF6600, 0xFF666699, 0xFF969696,
    0xFF003366, 0xFF339966, 0xFF003300, 0xFF333300, 0xFF993300, 0xFF993366, 0xFF333399,
    0xFF333333,
];

/// Index of the system foreground (window text) color.
pub const INDEXED_FOREGROUND: u32 = 64;
/// Index of the system background (window) color.
pub const INDEXED_BACKGROUND: u32 = 65;

/// Everything a document's colors are resolved against.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaletteContext<'a> {
    pub theme: Option<&'a ColorScheme>,
    /// Custom `<indexedColors>` from the stylesheet; overrides the fixed table.
    pub indexed: Option<&'a [SolidColor]>,
}

/// Resolve a color reference to a concrete color.
///
/// `placeholder` supplies the value of `phClr`. Theme references resolve to
/// black when the document has no theme.
pub fn resolve(
    reference: &ColorRef,
    ctx: &PaletteContext<'_>,
    placeholder: Option<SolidColor>,
) -> SolidColor {
    match reference {
        ColorRef::Rgb(c) => *c,
        ColorRef::Auto => SolidColor::BLACK,
        ColorRef::Indexed(index) => resolve_indexed(*index, ctx.indexed),
        ColorRef::Theme { slot, transforms } => {
            let base = match slot {
                ThemeSlot::Placeholder => placeholder.unwrap_or(SolidColor::BLACK),
                slot => match ctx.theme.and_then(|t| t.get(*slot)) {
                    Some(c) => c,
                    None => return SolidColor::BLACK,
                },
            };
            apply_transforms(base, transforms)
        }
    }
}

fn resolve_indexed(index: u32, custom: Option<&[SolidColor]>) -> SolidColor {
    if let Some(c) = custom.and_then(|table| table.get(index as usize)) {
        return *c;
    }
    match index {
        INDEXED_FOREGROUND => SolidColor::BLACK,
        INDEXED_BACKGROUND => SolidColor::WHITE,
        i if (i as usize) < INDEXED_PALETTE.len() => SolidColor::from_argb(INDEXED_PALETTE[i as usize]),
        _ => SolidColor::BLACK,
    }
}

/// Apply modifiers in order through HSL.
pub fn apply_transforms(color: SolidColor, transforms: &[ColorTransform]) -> SolidColor {
    if transforms.is_empty() {
        return color;
    }
    let mut hsl = color.to_hsl();
    for t in transforms {
        match *t {
            ColorTransform::Shade(v) => hsl.l *= fraction(v),
            ColorTransform::Tint(v) => hsl.l = 1.0 - (1.0 - hsl.l) * fraction(v),
            ColorTransform::LumMod(v) => hsl.l *= fraction(v),
            ColorTransform::LumOff(v) => hsl.l += fraction(v),
            ColorTransform::SatMod(v) => hsl.s *= fraction(v),
            ColorTransform::SheetTint(v) => {
                let tint = fraction(v).clamp(-1.0, 1.0);
                hsl.l = if tint < 0.0 {
                    hsl.l * (1.0 + tint)
                } else {
                    hsl.l * (1.0 - tint) + tint
                };
            }
        }
        hsl.l = hsl.l.clamp(0.0, 1.0);
        hsl.s = hsl.s.clamp(0.0, 1.0);
    }
    SolidColor::from_hsl(hsl, color.a)
}

fn fraction(v: i32) -> f64 {
    v as f64 / 100_000.0
}

/// Memoizing resolver owned by one load or save pass.
pub struct ColorResolver<'a> {
    ctx: PaletteContext<'a>,
    cache: FastMap<(ColorRef, Option<SolidColor>), SolidColor>,
}

impl<'a> ColorResolver<'a> {
    pub fn new(ctx: PaletteContext<'a>) -> Self {
        ColorResolver { ctx, cache: FastMap::default() }
    }

    pub fn context(&self) -> &PaletteContext<'a> {
        &self.ctx
    }

    pub fn resolve(&mut self, reference: &ColorRef) -> SolidColor {
        self.resolve_with(reference, None)
    }

    pub fn resolve_with(&mut self, reference: &ColorRef, placeholder: Option<SolidColor>) -> SolidColor {
        if let ColorRef::Rgb(c) = reference {
            return *c;
        }
        let key = (reference.clone(), placeholder);
        if let Some(c) = self.cache.get(&key) {
            return *c;
        }
        let resolved = resolve(reference, &self.ctx, placeholder);
        self.cache.insert(key, resolved);
        resolved
    }
}

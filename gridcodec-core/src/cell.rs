//! Cell values and the cell record stored in a worksheet.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::number_format::{DataFormat, RenderedValue};
use crate::style::{CellStyle, Font};
use crate::units;

/// One formatted run of a rich text value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Run font; `None` inherits the cell font.
    pub font: Option<Font>,
}

impl TextRun {
    pub fn new<S: Into<String>>(text: S) -> Self {
        TextRun { text: text.into(), font: None }
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.font = Some(font);
        self
    }
}

/// Text made of differently formatted runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichText {
    pub runs: Vec<TextRun>,
}

impl RichText {
    pub fn new(runs: Vec<TextRun>) -> Self {
        RichText { runs }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// The value held by a cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    String(Arc<str>),
    RichText(RichText),
    Boolean(bool),
    DateTime(NaiveDateTime),
    /// An error literal such as `#DIV/0!`.
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Plain text of a string or rich text value.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::String(s) => Some(s.to_string()),
            CellValue::RichText(rt) => Some(rt.text()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::DateTime(dt) => Some(units::datetime_to_serial(*dt)),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Arc::from(s))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(Arc::from(s))
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl From<RichText> for CellValue {
    fn from(rt: RichText) -> Self {
        CellValue::RichText(rt)
    }
}

/// A cell: value, optional formula, style and data format.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    /// Formula text without the leading `=`.
    pub formula: Option<String>,
    /// Shared style; `None` is the sheet default.
    pub style: Option<Arc<CellStyle>>,
    pub format: DataFormat,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: CellValue) -> Self {
        Cell { value, ..Default::default() }
    }

    /// The style in effect, with `None` normalized to the default style.
    pub fn effective_style(&self) -> CellStyle {
        self.style.as_deref().cloned().unwrap_or_default()
    }

    /// True when the cell carries nothing worth storing.
    pub fn is_blank(&self) -> bool {
        self.value.is_empty()
            && self.formula.is_none()
            && self.style.as_deref().map_or(true, CellStyle::is_default)
            && self.format == DataFormat::General
    }

    /// The value as it is displayed through the cell's data format.
    pub fn display_value(&self) -> RenderedValue {
        let plain = |text: String| RenderedValue { text, red: false };
        match &self.value {
            CellValue::Empty => plain(String::new()),
            CellValue::Number(n) => self.format.render_number(*n),
            CellValue::DateTime(dt) => {
                let serial = units::datetime_to_serial(*dt);
                if self.format.is_datetime() {
                    self.format.render_number(serial)
                } else {
                    DataFormat::default_datetime().render_number(serial)
                }
            }
            CellValue::String(s) => plain(s.to_string()),
            CellValue::RichText(rt) => plain(rt.text()),
            CellValue::Boolean(true) => plain("TRUE".to_string()),
            CellValue::Boolean(false) => plain("FALSE".to_string()),
            CellValue::Error(e) => plain(e.clone()),
        }
    }

    /// Structural equality used by round-trip comparisons: an unset style
    /// equals an explicit default style.
    pub fn content_eq(&self, other: &Cell) -> bool {
        self.value == other.value
            && self.formula == other.formula
            && self.format == other.format
            && self.effective_style() == other.effective_style()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number_format::{NegativeStyle, NumberArgs, SymbolPlacement};
    use chrono::NaiveDate;

    #[test]
    fn test_cell_value_from() {
        assert_eq!(CellValue::from("hi").as_text(), Some("hi".to_string()));
        assert_eq!(CellValue::from(2.5), CellValue::Number(2.5));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));
        assert!(CellValue::default().is_empty());
    }

    #[test]
    fn test_rich_text_concatenates_runs() {
        let rt = RichText::new(vec![
            TextRun::new("Hello ").with_font(Font::new().with_bold(true)),
            TextRun::new("World"),
        ]);
        assert_eq!(CellValue::from(rt).as_text(), Some("Hello World".to_string()));
    }

    #[test]
    fn test_display_value_currency_red_brackets() {
        let mut cell = Cell::with_value(CellValue::Number(-5.0));
        cell.format = DataFormat::Currency {
            number: NumberArgs::new(2, true).with_negative(NegativeStyle::RedBrackets),
            symbol: "$".to_string(),
            placement: SymbolPlacement::Prefix,
        };
        let shown = cell.display_value();
        assert_eq!(shown.text, "($5.00)");
        assert!(shown.red);
    }

    #[test]
    fn test_display_value_date() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        let mut cell = Cell::with_value(CellValue::DateTime(dt));
        cell.format = DataFormat::date("yyyy-MM-dd");
        assert_eq!(cell.display_value().text, "2024-03-05");
        let serial = CellValue::DateTime(dt).as_number().unwrap();
        assert!((serial - (45356.0 + 847.0 / 1440.0)).abs() < 1e-9);
    }

    #[test]
    fn test_blank_and_content_eq() {
        let mut a = Cell::new();
        assert!(a.is_blank());
        a.style = Some(Arc::new(CellStyle::default()));
        assert!(a.is_blank());
        assert!(a.content_eq(&Cell::new()));
        a.formula = Some("SUM(A1:A2)".to_string());
        assert!(!a.is_blank());
    }
}

//! `xl/charts/chartN.xml`: chart kind, title and series references.

use std::io::Cursor;

use quick_xml::events::Event;

use crate::color::ColorRef;
use crate::error::{CodecError, Result};
use crate::parts::drawing::NS_CHART;
use crate::parts::fill::{DrawingFill, FillReader};
use crate::parts::{write_drawing_color, NS_DRAWINGML, NS_REL};
use crate::xml::{self, escape_xml, XML_DECLARATION};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Horizontal bars.
    Bar,
    /// Vertical bars.
    #[default]
    Column,
    Line,
    Pie,
    Area,
    Scatter,
}

impl ChartKind {
    fn from_plot_element(name: &[u8]) -> Option<Self> {
        Some(match name {
            b"barChart" | b"bar3DChart" => ChartKind::Column,
            b"lineChart" | b"line3DChart" | b"stockChart" => ChartKind::Line,
            b"pieChart" | b"pie3DChart" | b"doughnutChart" | b"ofPieChart" => ChartKind::Pie,
            b"areaChart" | b"area3DChart" => ChartKind::Area,
            b"scatterChart" | b"bubbleChart" => ChartKind::Scatter,
            _ => return None,
        })
    }

    fn has_axes(self) -> bool {
        self != ChartKind::Pie
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesRecord {
    /// Cell reference of the series name, e.g. `Sheet1!$B$1`.
    pub name_ref: Option<String>,
    /// Literal name, or the cached value of `name_ref`.
    pub name: Option<String>,
    pub categories_ref: Option<String>,
    pub values_ref: Option<String>,
    pub color: Option<ColorRef>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartPart {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub series: Vec<SeriesRecord>,
}

impl ChartPart {
    pub fn parse(data: &[u8], part: &str) -> Result<ChartPart> {
        let mut reader = xml::reader(Cursor::new(data));
        let mut buf = Vec::new();
        let mut chart = ChartPart::default();
        let mut kind: Option<ChartKind> = None;

        // Local names of the open elements.
        let mut path: Vec<Vec<u8>> = Vec::new();
        let mut series: Option<SeriesRecord> = None;
        let mut title = String::new();
        let mut fills = FillReader::default();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| CodecError::parse(part, e))?;
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = e.local_name().as_ref().to_vec();
                    let parent = path.last().map(|p| p.as_slice());
                    match name.as_slice() {
                        n if kind.is_none() && parent == Some(b"plotArea".as_slice()) => {
                            kind = ChartKind::from_plot_element(n);
                        }
                        b"barDir" if kind == Some(ChartKind::Column) => {
                            if xml::attr_str(e, b"val").as_deref() == Some("bar") {
                                kind = Some(ChartKind::Bar);
                            }
                        }
                        b"ser" => series = Some(SeriesRecord::default()),
                        b"autoTitleDeleted" if xml::attr_bool(e, b"val", false) => chart.title = None,
                        n if series.is_some() && in_series_sp_pr(&path) => {
                            if fills.active() || FillReader::is_fill_element(n) {
                                if let Some(fill) = fills.start(e, is_empty) {
                                    set_series_color(series.as_mut(), fill);
                                }
                            }
                        }
                        _ => {}
                    }
                    if !is_empty {
                        path.push(name);
                    }
                }
                Event::Text(e) => {
                    let text = e.unescape().map_err(|err| CodecError::parse(part, err))?;
                    let leaf = path.last().map(|p| p.as_slice());
                    if let Some(s) = series.as_mut() {
                        let parent = path.len().checked_sub(2).map(|i| path[i].as_slice());
                        let container = path.len().checked_sub(3).map(|i| path[i].as_slice());
                        match (container, parent, leaf) {
                            (Some(b"tx"), Some(b"strRef"), Some(b"f")) => s.name_ref = Some(text.into_owned()),
                            (Some(b"ser"), Some(b"tx"), Some(b"v")) => s.name = Some(text.into_owned()),
                            (Some(b"strCache"), Some(b"pt"), Some(b"v")) if path_has(&path, b"tx") => {
                                s.name = Some(text.into_owned())
                            }
                            (Some(b"cat"), _, Some(b"f")) | (Some(b"xVal"), _, Some(b"f")) => {
                                s.categories_ref = Some(text.into_owned())
                            }
                            (Some(b"val"), _, Some(b"f")) | (Some(b"yVal"), _, Some(b"f")) => {
                                s.values_ref = Some(text.into_owned())
                            }
                            _ => {}
                        }
                    } else if leaf == Some(b"t".as_slice()) && path_has(&path, b"title") {
                        title.push_str(&text);
                    }
                }
                Event::End(e) => {
                    let name = e.local_name();
                    let name = name.as_ref();
                    path.pop();
                    match name {
                        b"ser" => {
                            if let Some(s) = series.take() {
                                chart.series.push(s);
                            }
                        }
                        b"title" if path.last().map(|p| p.as_slice()) == Some(b"chart".as_slice()) => {
                            if !title.is_empty() {
                                chart.title = Some(std::mem::take(&mut title));
                            }
                        }
                        _ if fills.active() => {
                            if let Some(fill) = fills.end(name) {
                                set_series_color(series.as_mut(), fill);
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

        chart.kind = kind.unwrap_or_else(|| {
            log::warn!("chart '{}' has no supported plot type; reading as column", part);
            ChartKind::Column
        });
        Ok(chart)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(2048);
        out.push_str(XML_DECLARATION);
        out.push_str(&format!(
            "<c:chartSpace xmlns:c=\"{}\" xmlns:a=\"{}\" xmlns:r=\"{}\"><c:chart>",
            NS_CHART, NS_DRAWINGML, NS_REL
        ));
        match &self.title {
            Some(title) => {
                out.push_str("<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>");
                out.push_str(&escape_xml(title));
                out.push_str("</a:t></a:r></a:p></c:rich></c:tx><c:overlay val=\"0\"/></c:title>");
                out.push_str("<c:autoTitleDeleted val=\"0\"/>");
            }
            None => out.push_str("<c:autoTitleDeleted val=\"1\"/>"),
        }
        out.push_str("<c:plotArea><c:layout/>");

        let (tag, preamble) = match self.kind {
            ChartKind::Bar => ("barChart", "<c:barDir val=\"bar\"/><c:grouping val=\"clustered\"/><c:varyColors val=\"0\"/>"),
            ChartKind::Column => ("barChart", "<c:barDir val=\"col\"/><c:grouping val=\"clustered\"/><c:varyColors val=\"0\"/>"),
            ChartKind::Line => ("lineChart", "<c:grouping val=\"standard\"/><c:varyColors val=\"0\"/>"),
            ChartKind::Pie => ("pieChart", "<c:varyColors val=\"1\"/>"),
            ChartKind::Area => ("areaChart", "<c:grouping val=\"standard\"/><c:varyColors val=\"0\"/>"),
            ChartKind::Scatter => ("scatterChart", "<c:scatterStyle val=\"lineMarker\"/><c:varyColors val=\"0\"/>"),
        };
        out.push_str(&format!("<c:{}>{}", tag, preamble));
        for (i, s) in self.series.iter().enumerate() {
            self.write_series(&mut out, i, s);
        }
        match self.kind {
            ChartKind::Line => out.push_str("<c:marker val=\"1\"/>"),
            ChartKind::Pie => out.push_str("<c:firstSliceAng val=\"0\"/>"),
            _ => {}
        }
        if self.kind.has_axes() {
            out.push_str("<c:axId val=\"100\"/><c:axId val=\"200\"/>");
        }
        out.push_str(&format!("</c:{}>", tag));

        if self.kind.has_axes() {
            let (cat_pos, val_pos) = if self.kind == ChartKind::Bar { ("l", "b") } else { ("b", "l") };
            let first = if self.kind == ChartKind::Scatter { "valAx" } else { "catAx" };
            out.push_str(&format!(
                "<c:{0}><c:axId val=\"100\"/><c:scaling><c:orientation val=\"minMax\"/></c:scaling><c:delete val=\"0\"/><c:axPos val=\"{1}\"/><c:crossAx val=\"200\"/></c:{0}>",
                first, cat_pos
            ));
            out.push_str(&format!(
                "<c:valAx><c:axId val=\"200\"/><c:scaling><c:orientation val=\"minMax\"/></c:scaling><c:delete val=\"0\"/><c:axPos val=\"{}\"/><c:majorGridlines/><c:crossAx val=\"100\"/></c:valAx>",
                val_pos
            ));
        }
        out.push_str("</c:plotArea><c:legend><c:legendPos val=\"r\"/><c:overlay val=\"0\"/></c:legend>");
        out.push_str("<c:plotVisOnly val=\"1\"/></c:chart></c:chartSpace>");
        out
    }

    fn write_series(&self, out: &mut String, index: usize, s: &SeriesRecord) {
        out.push_str(&format!("<c:ser><c:idx val=\"{0}\"/><c:order val=\"{0}\"/>", index));
        match (&s.name_ref, &s.name) {
            (Some(f), name) => {
                out.push_str("<c:tx><c:strRef><c:f>");
                out.push_str(&escape_xml(f));
                out.push_str("</c:f>");
                if let Some(name) = name {
                    out.push_str("<c:strCache><c:ptCount val=\"1\"/><c:pt idx=\"0\"><c:v>");
                    out.push_str(&escape_xml(name));
                    out.push_str("</c:v></c:pt></c:strCache>");
                }
                out.push_str("</c:strRef></c:tx>");
            }
            (None, Some(name)) => {
                out.push_str("<c:tx><c:v>");
                out.push_str(&escape_xml(name));
                out.push_str("</c:v></c:tx>");
            }
            (None, None) => {}
        }
        if let Some(color) = &s.color {
            out.push_str("<c:spPr><a:solidFill>");
            write_drawing_color(out, color);
            out.push_str("</a:solidFill>");
            if self.kind == ChartKind::Line || self.kind == ChartKind::Scatter {
                out.push_str("<a:ln><a:solidFill>");
                write_drawing_color(out, color);
                out.push_str("</a:solidFill></a:ln>");
            }
            out.push_str("</c:spPr>");
        }
        let (cat_tag, val_tag, cat_ref) = if self.kind == ChartKind::Scatter {
            ("xVal", "yVal", "numRef")
        } else {
            ("cat", "val", "strRef")
        };
        if let Some(f) = &s.categories_ref {
            out.push_str(&format!(
                "<c:{0}><c:{1}><c:f>{2}</c:f></c:{1}></c:{0}>",
                cat_tag,
                cat_ref,
                escape_xml(f)
            ));
        }
        if let Some(f) = &s.values_ref {
            out.push_str(&format!(
                "<c:{0}><c:numRef><c:f>{1}</c:f></c:numRef></c:{0}>",
                val_tag,
                escape_xml(f)
            ));
        }
        match self.kind {
            ChartKind::Line | ChartKind::Scatter => out.push_str("<c:smooth val=\"0\"/>"),
            _ => {}
        }
        out.push_str("</c:ser>");
    }
}

fn path_has(path: &[Vec<u8>], name: &[u8]) -> bool {
    path.iter().any(|p| p.as_slice() == name)
}

/// True inside the series' own `<c:spPr>`, not a marker's or data point's.
fn in_series_sp_pr(path: &[Vec<u8>]) -> bool {
    match path.iter().rposition(|p| p.as_slice() == b"spPr") {
        Some(i) if i > 0 => path[i - 1].as_slice() == b"ser",
        _ => false,
    }
}

fn set_series_color(series: Option<&mut SeriesRecord>, fill: DrawingFill) {
    if let (Some(s), DrawingFill::Solid(color)) = (series, fill) {
        s.color = Some(color);
    }
}

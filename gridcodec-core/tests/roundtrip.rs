use std::io::Cursor;
use std::sync::Arc;

use chrono::NaiveDate;
use gridcodec_core::number_format::SymbolPlacement;
use gridcodec_core::package::{content_types, CompressionLevel, PackageReader, PackageWriter};
use gridcodec_core::parts::styles::Stylesheet;
use gridcodec_core::relationships::rel_types;
use gridcodec_core::{
    Alignment, Anchor, BorderLine, BorderLineStyle, BorderSide, CellBorders, CellOffset, CellRange, CellStyle,
    CellValue, Chart, ChartKind, ChartSeries, CodecError, ColorValue, DataFormat, DrawingKind, DrawingObject,
    Font, HorizontalAlignment, ImageFormat, NamedRange, NegativeStyle, NumberArgs, PageMargins, PageSetup,
    Picture, RichText, SaveOptions, Shape, ShapeLine, SolidColor, TextRun, VerticalAlignment, Workbook,
};
use tempfile::NamedTempFile;

fn currency() -> DataFormat {
    DataFormat::Currency {
        number: NumberArgs::new(2, true).with_negative(NegativeStyle::RedBrackets),
        symbol: "$".to_string(),
        placement: SymbolPlacement::Prefix,
    }
}

fn styled_workbook() -> Workbook {
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(Some("Data".to_string())).unwrap();

    let header = Arc::new(
        CellStyle::new()
            .with_font(Font::new().with_bold(true).with_color(SolidColor::rgb(0xFF, 0xFF, 0xFF)))
            .with_background(SolidColor::rgb(0x44, 0x72, 0xC4))
            .with_alignment(
                Alignment::new()
                    .with_horizontal(HorizontalAlignment::Center)
                    .with_vertical(VerticalAlignment::Center)
                    .with_wrap_text(true),
            ),
    );
    for (col, title) in ["Item", "Amount", "Share", "Due"].iter().enumerate() {
        ws.set_cell_value(0, col as u32, CellValue::from(*title));
        ws.set_cell_style_arc(0, col as u32, header.clone());
    }

    let due = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(0, 0, 0).unwrap();
    for row in 1..6u32 {
        ws.set_cell_value(row, 0, CellValue::from(format!("Item {}", row).as_str()));
        ws.set_cell_value(row, 1, CellValue::Number(row as f64 * 12.5 - 30.0));
        ws.set_cell_format(row, 1, currency());
        ws.set_cell_value(row, 2, CellValue::Number(row as f64 / 10.0));
        ws.set_cell_format(row, 2, DataFormat::Percent(NumberArgs::new(1, false)));
        ws.set_cell_value(row, 3, CellValue::DateTime(due));
        ws.set_cell_format(row, 3, DataFormat::date("yyyy-MM-dd"));
    }
    ws.set_cell_formula(6, 1, "SUM(B2:B6)");
    ws.set_cell_format(6, 1, currency());
    ws.set_cell_value(6, 0, CellValue::from("Total"));
    ws.set_cell_format(7, 0, DataFormat::Text);
    ws.set_cell_value(7, 0, CellValue::from("00123"));
    ws.set_cell_value(7, 1, CellValue::Number(1234.5));
    ws.set_cell_format(7, 1, DataFormat::Number(NumberArgs::new(2, true)));

    for col in 0..4 {
        ws.set_cell_border(6, col, BorderSide::Top, Some(BorderLine::medium()));
        ws.set_cell_border(6, col, BorderSide::Bottom, Some(BorderLine::new(BorderLineStyle::Double)));
    }
    ws.set_cell_borders(
        9,
        5,
        CellBorders::all(BorderLine::thin().with_color(SolidColor::rgb(0xC0, 0, 0))),
    );

    ws.merge_cells("A10:C11").unwrap();
    ws.set_cell_value(9, 0, CellValue::from("Notes"));
    ws.set_freeze_panes(1, 1);
    ws.set_column_width(0, 150);
    ws.set_column_width(1, 150);
    ws.set_column_hidden(4, true);
    ws.set_row_height(0, 40);
    ws.set_row_hidden(8, true);
    ws.view.zoom = 125;
    ws.view.show_grid_lines = false;
    ws.page_setup = Some(PageSetup { paper_size: Some(9), ..Default::default() });
    ws.page_margins = Some(PageMargins { top: 1.0, bottom: 1.0, ..Default::default() });

    let summary = wb.create_sheet(Some("Summary Q1".to_string())).unwrap();
    summary.set_cell_value(0, 0, CellValue::Boolean(true));
    summary.set_cell_value(1, 0, CellValue::Error("#N/A".to_string()));

    wb.create_named_range("Amounts".to_string(), "Data!$B$2:$B$6".to_string()).unwrap();
    wb.add_named_range(NamedRange {
        name: "Flag".to_string(),
        sheet: "Summary Q1".to_string(),
        range: CellRange::single(0, 0),
        scope: Some("Summary Q1".to_string()),
    })
    .unwrap();
    wb
}

#[test]
fn test_styled_workbook_roundtrip() {
    let wb = styled_workbook();
    let bytes = wb.save_to_bytes().unwrap();
    assert_eq!(&bytes[0..2], b"PK");

    let loaded = Workbook::load_from_bytes(&bytes).unwrap();
    assert!(loaded.content_eq(&wb));

    let ws = loaded.get_sheet_by_name("Data").unwrap();
    assert_eq!(ws.freeze_panes(), Some((1, 1)));
    assert_eq!(ws.get_cell_formula(6, 1), Some("SUM(B2:B6)"));
    assert_eq!(ws.get_cell_format(1, 1), Some(&currency()));
    assert_eq!(ws.get_cell(1, 1).unwrap().display_value().text, "($17.50)");
    assert_eq!(ws.get_cell(2, 2).unwrap().display_value().text, "20.0%");
    assert!(ws.get_cell_style(0, 0).unwrap().font.bold);
    assert_eq!(ws.get_cell_borders(6, 3).bottom, Some(BorderLine::new(BorderLineStyle::Double)));

    assert_eq!(loaded.get_named_range("Amounts").unwrap().reference(), "Data!$B$2:$B$6");
    assert_eq!(loaded.get_named_range("Flag").unwrap().reference(), "'Summary Q1'!$A$1");
}

#[test]
fn test_roundtrip_through_file() {
    let wb = styled_workbook();
    let temp_file = NamedTempFile::new().unwrap();
    wb.save(temp_file.path()).unwrap();

    let loaded = Workbook::load(temp_file.path()).unwrap();
    assert!(loaded.content_eq(&wb));

    // saving what was loaded changes nothing
    let again = Workbook::load_from_bytes(&loaded.save_to_bytes().unwrap()).unwrap();
    assert!(again.content_eq(&wb));
}

#[test]
fn test_rich_text_keeps_runs() {
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(None).unwrap();
    let rich = RichText::new(vec![
        TextRun::new("Warning: ").with_font(Font::new().with_bold(true).with_color(SolidColor::rgb(0xFF, 0, 0))),
        TextRun::new("check totals"),
    ]);
    ws.set_cell_value(2, 2, CellValue::from(rich));

    let loaded = Workbook::load_from_bytes(&wb.save_to_bytes().unwrap()).unwrap();
    match loaded.get_sheet_by_index(0).unwrap().get_cell_value(2, 2) {
        Some(CellValue::RichText(rt)) => {
            assert_eq!(rt.text(), "Warning: check totals");
            assert!(rt.runs[0].font.as_ref().unwrap().bold);
            assert_eq!(rt.runs[0].font.as_ref().unwrap().color, Some(SolidColor::rgb(0xFF, 0, 0)));
        }
        other => panic!("expected rich text, got {:?}", other),
    }
}

#[test]
fn test_drawings_roundtrip() {
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(Some("Data".to_string())).unwrap();
    ws.set_cell_value(0, 1, CellValue::from("Sales"));
    ws.drawings = vec![
        DrawingObject {
            name: "Logo".to_string(),
            anchor: Anchor::TwoCell { from: CellOffset::new(1, 1).with_offset(10, 4), to: CellOffset::new(5, 3) },
            kind: DrawingKind::Picture(Picture {
                description: Some("logo".to_string()),
                data: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
                format: ImageFormat::Png,
            }),
        },
        DrawingObject {
            name: "Callout".to_string(),
            anchor: Anchor::OneCell { from: CellOffset::new(8, 0), width: 120, height: 40 },
            kind: DrawingKind::Shape(Shape {
                geometry: "ellipse".to_string(),
                fill: Some(ColorValue::Solid(SolidColor::rgb(0xFF, 0xC0, 0))),
                line: Some(ShapeLine::solid(2.0, SolidColor::BLACK)),
                text: Some("Look here".to_string()),
            }),
        },
        DrawingObject {
            name: "Trend".to_string(),
            anchor: Anchor::Absolute { x: 300, y: 10, width: 480, height: 288 },
            kind: DrawingKind::Chart(Chart {
                kind: ChartKind::Bar,
                title: Some("Trend".to_string()),
                series: vec![ChartSeries {
                    name: Some("Sales".to_string()),
                    name_ref: Some("Data!$B$1".to_string()),
                    categories: Some("Data!$A$2:$A$5".to_string()),
                    values: Some("Data!$B$2:$B$5".to_string()),
                    color: Some(SolidColor::rgb(0x70, 0xAD, 0x47)),
                }],
            }),
        },
    ];
    let second = wb.create_sheet(Some("Plain".to_string())).unwrap();
    second.drawings.push(DrawingObject {
        name: "Photo".to_string(),
        anchor: Anchor::Absolute { x: 0, y: 0, width: 64, height: 64 },
        kind: DrawingKind::Picture(Picture { description: None, data: vec![0xFF, 0xD8, 0xFF], format: ImageFormat::Jpeg }),
    });

    let bytes = wb.save_to_bytes().unwrap();
    let pkg = PackageReader::open(Cursor::new(bytes.clone())).unwrap();
    for part in [
        "xl/drawings/drawing1.xml",
        "xl/drawings/drawing2.xml",
        "xl/media/image1.png",
        "xl/media/image2.jpeg",
        "xl/charts/chart1.xml",
    ] {
        assert!(pkg.part_exists(part), "missing {}", part);
    }

    let loaded = Workbook::load_from_bytes(&bytes).unwrap();
    assert!(loaded.content_eq(&wb));
    assert_eq!(loaded.get_sheet_by_name("Plain").unwrap().drawings.len(), 1);
}

#[test]
fn test_style_tables_stay_small() {
    let shared = Arc::new(
        CellStyle::new()
            .with_font(Font::new().with_name("Arial").with_italic(true))
            .with_background(SolidColor::rgb(0xEE, 0xEE, 0xEE)),
    );
    let build = |arc: bool| {
        let mut wb = Workbook::new();
        let ws = wb.create_sheet(None).unwrap();
        for i in 0..1000u32 {
            let (row, col) = (i / 10, i % 10);
            ws.set_cell_value(row, col, CellValue::Number(i as f64));
            if arc {
                ws.set_cell_style_arc(row, col, shared.clone());
            } else {
                ws.set_cell_style(row, col, shared.as_ref().clone());
            }
            ws.set_cell_format(row, col, DataFormat::Number(NumberArgs::new(3, true)));
            ws.set_cell_borders(row, col, CellBorders::all(BorderLine::thin()));
        }
        wb
    };

    let stylesheet = |wb: &Workbook| {
        let bytes = wb.save_to_bytes().unwrap();
        let mut pkg = PackageReader::open(Cursor::new(bytes)).unwrap();
        Stylesheet::parse(&pkg.get_part("xl/styles.xml").unwrap(), "xl/styles.xml").unwrap()
    };

    let first = stylesheet(&build(true));
    // defaults plus exactly one entry for the shared style
    assert_eq!(first.fonts.len(), 2);
    assert_eq!(first.fills.len(), 3);
    assert_eq!(first.num_fmts.len(), 1);
    assert_eq!(first.cell_xfs.len(), 2);

    // equal but separately allocated styles dedupe the same way
    let second = stylesheet(&build(false));
    assert_eq!(first, second);
}

#[test]
fn test_border_runs_compact() {
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(None).unwrap();
    let line = BorderLine::new(BorderLineStyle::Dashed).with_color(SolidColor::rgb(0, 0, 0xFF));
    for col in 0..10 {
        ws.set_cell_border(4, col, BorderSide::Top, Some(line));
    }
    ws.borders.compact();
    assert_eq!(ws.borders.run_count(), 1);
    assert_eq!(ws.borders.run_span(4, 0, BorderSide::Top), Some(10));

    let loaded = Workbook::load_from_bytes(&wb.save_to_bytes().unwrap()).unwrap();
    let ws = loaded.get_sheet_by_index(0).unwrap();
    assert_eq!(ws.borders.run_count(), 1);
    for col in 0..10 {
        assert_eq!(ws.borders.get(4, col, BorderSide::Top), Some(line));
        // a top edge is the bottom edge of the row above
        assert_eq!(ws.borders.get(3, col, BorderSide::Bottom), Some(line));
    }
    assert_eq!(ws.borders.get(4, 10, BorderSide::Top), None);
}

#[test]
fn test_addresses() {
    use gridcodec_core::{format_address, parse_address};

    assert_eq!(parse_address("B3").unwrap(), (2, 1));
    assert_eq!(parse_address("$AA$10").unwrap(), (9, 26));
    for bad in ["3B", "", "B", "12", "B0"] {
        assert!(matches!(parse_address(bad), Err(CodecError::InvalidAddress(_))), "{:?}", bad);
    }
    for (row, col) in [(0, 0), (9, 25), (99, 26), (1_048_575, 16_383), (41, 701), (7, 702)] {
        assert_eq!(parse_address(&format_address(row, col)).unwrap(), (row, col));
    }
}

const SCENARIO_WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Report" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const SCENARIO_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>42</v></c><c r="C1" s="1"><v>-5</v></c></row>
</sheetData></worksheet>"#;

const SCENARIO_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="1" uniqueCount="1"><si><t>Hello</t></si></sst>"#;

const SCENARIO_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="&quot;$&quot;#,##0.00;[Red](&quot;$&quot;#,##0.00)"/></numFmts>
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/><xf numFmtId="164" fontId="0" fillId="0" borderId="0" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;

const CURRENCY_CODE: &str = r##""$"#,##0.00;[Red]("$"#,##0.00)"##;

fn scenario_package() -> Vec<u8> {
    build_package(SCENARIO_SHEET, SCENARIO_STYLES)
}

fn build_package(sheet: &str, styles: &str) -> Vec<u8> {
    let mut pkg = PackageWriter::create(Cursor::new(Vec::new()), CompressionLevel::Default);
    pkg.add_relationship("", rel_types::OFFICE_DOCUMENT, "xl/workbook.xml");
    pkg.add_part("xl/workbook.xml", Some(content_types::WORKBOOK), SCENARIO_WORKBOOK.as_bytes()).unwrap();
    pkg.add_part("xl/worksheets/sheet1.xml", Some(content_types::WORKSHEET), sheet.as_bytes()).unwrap();
    pkg.add_part("xl/sharedStrings.xml", Some(content_types::SHARED_STRINGS), SCENARIO_STRINGS.as_bytes()).unwrap();
    pkg.add_part("xl/styles.xml", Some(content_types::STYLES), styles.as_bytes()).unwrap();
    pkg.add_relationship("xl/workbook.xml", rel_types::WORKSHEET, "worksheets/sheet1.xml");
    pkg.add_relationship("xl/workbook.xml", rel_types::SHARED_STRINGS, "sharedStrings.xml");
    pkg.add_relationship("xl/workbook.xml", rel_types::STYLES, "styles.xml");
    pkg.flush_and_close().unwrap().into_inner()
}

#[test]
fn test_currency_scenario() {
    let wb = Workbook::load_from_bytes(&scenario_package()).unwrap();
    let ws = wb.get_sheet_by_name("Report").unwrap();
    assert_eq!(ws.get_cell_value(0, 0), Some(&CellValue::from("Hello")));
    assert_eq!(ws.get_cell_value(0, 1), Some(&CellValue::Number(42.0)));

    let c1 = ws.get_cell(0, 2).unwrap();
    assert_eq!(c1.format, currency());
    let shown = c1.display_value();
    assert_eq!(shown.text, "($5.00)");
    assert!(shown.red);

    let bytes = wb.save_with_options(Cursor::new(Vec::new()), &SaveOptions::default()).unwrap().into_inner();
    let mut pkg = PackageReader::open(Cursor::new(bytes)).unwrap();
    let styles = Stylesheet::parse(&pkg.get_part("xl/styles.xml").unwrap(), "xl/styles.xml").unwrap();
    assert!(styles.num_fmts.iter().any(|(_, code)| code == CURRENCY_CODE), "{:?}", styles.num_fmts);
}

#[test]
fn test_load_non_ascii_number_format() {
    let styles = SCENARIO_STYLES.replace(
        "&quot;$&quot;#,##0.00;[Red](&quot;$&quot;#,##0.00)",
        "#,##0;&quot;ab\u{20ac}&quot;#,##0",
    );
    let wb = Workbook::load_from_bytes(&build_package(SCENARIO_SHEET, &styles)).unwrap();
    let c1 = wb.get_sheet_by_name("Report").unwrap().get_cell(0, 2).unwrap();
    assert_eq!(c1.value, CellValue::Number(-5.0));
    assert_eq!(
        c1.format,
        DataFormat::Number(
            NumberArgs::new(0, true)
                .with_negative(NegativeStyle::Custom { prefix: "ab\u{20ac}".into(), postfix: String::new() })
        )
    );

    // the same code set from the model survives a save and load
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(None).unwrap();
    ws.set_cell_value(0, 0, CellValue::Number(-3.0));
    ws.set_cell_format(0, 0, DataFormat::Custom("0.00;[Red]\"\u{00e9}\u{00e9}\"0.00".to_string()));
    let loaded = Workbook::load_from_bytes(&wb.save_to_bytes().unwrap()).unwrap();
    let cell = loaded.get_sheet_by_index(0).unwrap().get_cell(0, 0).unwrap();
    assert_eq!(cell.value, CellValue::Number(-3.0));
}

#[test]
fn test_cell_hatch_keeps_foreground_only() {
    let red = SolidColor::rgb(255, 0, 0);
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(None).unwrap();
    ws.set_cell_value(0, 0, CellValue::from("striped"));
    ws.set_cell_style(
        0,
        0,
        CellStyle::new().with_fill(ColorValue::HatchPattern { fore: red, back: SolidColor::rgb(0, 0, 255) }),
    );

    let loaded = Workbook::load_from_bytes(&wb.save_to_bytes().unwrap()).unwrap();
    let style = loaded.get_sheet_by_index(0).unwrap().get_cell_style(0, 0).unwrap();
    assert_eq!(style.fill, Some(ColorValue::HatchPattern { fore: red, back: SolidColor::WHITE }));
}

#[test]
fn test_literal_booleans_survive() {
    let mut wb = Workbook::new();
    let ws = wb.create_sheet(None).unwrap();
    ws.set_cell_value(0, 0, CellValue::Boolean(true));
    ws.set_cell_value(0, 1, CellValue::Boolean(false));
    ws.set_cell_value(1, 0, CellValue::from("HELLO"));
    ws.set_cell_formula(1, 0, "UPPER(\"hello\")");

    let bytes = wb.save_to_bytes().unwrap();
    let mut pkg = PackageReader::open(Cursor::new(bytes.clone())).unwrap();
    let sheet = String::from_utf8(pkg.get_part("xl/worksheets/sheet1.xml").unwrap()).unwrap();
    assert!(sheet.contains("<f>TRUE</f>"));
    assert!(sheet.contains("<f>FALSE</f>"));
    assert!(sheet.contains(r#"t="inlineStr""#));

    let loaded = Workbook::load_from_bytes(&bytes).unwrap();
    assert!(loaded.content_eq(&wb));
    let ws = loaded.get_sheet_by_index(0).unwrap();
    assert_eq!(ws.get_cell_formula(0, 0), None);
    assert_eq!(ws.get_cell_value(1, 0), Some(&CellValue::from("HELLO")));
}

#[test]
fn test_legacy_binary_save_rejected() {
    let wb = styled_workbook();
    let options = SaveOptions { format: gridcodec_core::FileFormat::LegacyBinary, ..Default::default() };
    let result = wb.save_with_options(Cursor::new(Vec::new()), &options);
    assert!(matches!(result, Err(CodecError::UnsupportedOperation(_))));
}

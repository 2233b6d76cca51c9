#![no_main]

//! Fuzz target for the individual part parsers.
//!
//! Every parser gets the same bytes; malformed XML must come back as an error,
//! never a panic.

use std::io::Cursor;

use gridcodec_core::parts::chart::ChartPart;
use gridcodec_core::parts::drawing::DrawingPart;
use gridcodec_core::parts::shared_strings::SharedStringTable;
use gridcodec_core::parts::styles::Stylesheet;
use gridcodec_core::parts::theme::Theme;
use gridcodec_core::parts::workbook::WorkbookPart;
use gridcodec_core::parts::worksheet::parse_worksheet;
use gridcodec_core::relationships::parse_relationships;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 256 * 1024 {
        return;
    }

    let _ = WorkbookPart::parse(data, "xl/workbook.xml");
    let _ = Stylesheet::parse(data, "xl/styles.xml");
    let _ = Theme::parse(data, "xl/theme/theme1.xml");
    let _ = SharedStringTable::parse(Cursor::new(data), "xl/sharedStrings.xml");
    let _ = DrawingPart::parse(data, "xl/drawings/drawing1.xml");
    let _ = ChartPart::parse(data, "xl/charts/chart1.xml");
    let _ = parse_relationships(data, "xl/_rels/workbook.xml.rels");

    let mut rows = 0usize;
    let _ = parse_worksheet(Cursor::new(data), "xl/worksheets/sheet1.xml", |_row| {
        rows += 1;
        Ok(())
    });

    // a part that parses must serialize to something that parses again
    if let Ok(styles) = Stylesheet::parse(data, "xl/styles.xml") {
        let again = Stylesheet::parse(styles.to_xml().as_bytes(), "xl/styles.xml");
        assert!(again.is_ok(), "styles did not reparse: {:?}", again.err());
    }
});

//! Save: workbook model → package.

use std::io::{Seek, Write};

use crate::drawing::{write_drawing, LinkedPart};
use crate::error::{CodecError, Result};
use crate::grid::{write_sheet, SheetWriteContext};
use crate::package::{content_types, PackageWriter};
use crate::parts::shared_strings::SharedStringTable;
use crate::parts::theme::Theme;
use crate::parts::workbook::{DefinedName, SheetRef, WorkbookPart};
use crate::relationships::{rel_types, relative_target};
use crate::style_writer::StyleWriter;
use crate::workbook::{FileFormat, SaveOptions, Workbook};
use crate::worksheet::Worksheet;
use crate::xml::escape_xml;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const APPLICATION: &str = "gridcodec";

/// Running part numbers for media and charts, shared by all drawings.
#[derive(Default)]
struct PartCounters {
    drawings: usize,
    images: usize,
    charts: usize,
}

/// Write `wb` as a package into `writer` and hand the writer back.
pub fn write_stream<W: Write + Seek>(wb: &Workbook, writer: W, options: &SaveOptions) -> Result<W> {
    if options.format == FileFormat::LegacyBinary {
        return Err(CodecError::UnsupportedOperation(
            "saving the legacy binary format".to_string(),
        ));
    }
    if wb.worksheets.is_empty() {
        return Err(CodecError::NoWorksheets);
    }

    let mut pkg = PackageWriter::create(writer, options.compression);
    pkg.add_relationship("", rel_types::OFFICE_DOCUMENT, WORKBOOK_PART);
    pkg.add_relationship("", rel_types::CORE_PROPERTIES, "docProps/core.xml");
    pkg.add_relationship("", rel_types::EXTENDED_PROPERTIES, "docProps/app.xml");
    pkg.add_part("docProps/core.xml", Some(content_types::CORE_PROPERTIES), core_properties().as_bytes())?;
    pkg.add_part("docProps/app.xml", Some(content_types::EXTENDED_PROPERTIES), app_properties(wb).as_bytes())?;

    let mut styles = StyleWriter::new();
    let mut shared_strings = SharedStringTable::new();
    let mut counters = PartCounters::default();
    let mut book = WorkbookPart { active_tab: wb.active_index() as u32, ..Default::default() };

    for (i, ws) in wb.worksheets.iter().enumerate() {
        let n = i + 1;
        let sheet_path = format!("xl/worksheets/sheet{}.xml", n);
        let rel_id = pkg.add_relationship(
            WORKBOOK_PART,
            rel_types::WORKSHEET,
            &relative_target(WORKBOOK_PART, &sheet_path),
        );

        let drawing = if ws.drawings.is_empty() {
            None
        } else {
            counters.drawings += 1;
            let drawing_path = format!("xl/drawings/drawing{}.xml", counters.drawings);
            let id = pkg.add_relationship(
                &sheet_path,
                rel_types::DRAWING,
                &relative_target(&sheet_path, &drawing_path),
            );
            Some((drawing_path, id))
        };

        {
            let out = pkg.start_part(&sheet_path, Some(content_types::WORKSHEET))?;
            let mut ctx = SheetWriteContext { styles: &mut styles, shared_strings: &mut shared_strings };
            let drawing_rel = drawing.as_ref().map(|(_, id)| id.clone());
            write_sheet(out, ws, &mut ctx, drawing_rel, i == wb.active_index())?;
        }
        if let Some((drawing_path, _)) = &drawing {
            write_drawing_parts(&mut pkg, ws, drawing_path, &mut counters)?;
        }

        book.sheets.push(SheetRef {
            name: ws.title().to_string(),
            sheet_id: n as u32,
            rel_id,
            hidden: ws.hidden,
        });
    }

    let stylesheet = styles.into_stylesheet();
    pkg.add_part("xl/styles.xml", Some(content_types::STYLES), stylesheet.to_xml().as_bytes())?;
    pkg.add_relationship(WORKBOOK_PART, rel_types::STYLES, "styles.xml");

    if !shared_strings.is_empty() {
        pkg.add_part(
            "xl/sharedStrings.xml",
            Some(content_types::SHARED_STRINGS),
            shared_strings.to_xml().as_bytes(),
        )?;
        pkg.add_relationship(WORKBOOK_PART, rel_types::SHARED_STRINGS, "sharedStrings.xml");
    }

    if options.write_theme {
        pkg.add_part("xl/theme/theme1.xml", Some(content_types::THEME), Theme::default().to_xml().as_bytes())?;
        pkg.add_relationship(WORKBOOK_PART, rel_types::THEME, "theme/theme1.xml");
    }

    book.defined_names = defined_names(wb);
    pkg.add_part(WORKBOOK_PART, Some(content_types::WORKBOOK), book.to_xml().as_bytes())?;

    log::debug!(
        "saved {} sheets: {} shared strings, {} fonts, {} fills, {} borders, {} number formats, {} cell formats",
        wb.worksheets.len(),
        shared_strings.len(),
        stylesheet.fonts.len(),
        stylesheet.fills.len(),
        stylesheet.borders.len(),
        stylesheet.num_fmts.len(),
        stylesheet.cell_xfs.len()
    );
    pkg.flush_and_close()
}

/// Add the drawing part of `ws` plus the media and chart parts it links to.
fn write_drawing_parts<W: Write + Seek>(
    pkg: &mut PackageWriter<W>,
    ws: &Worksheet,
    drawing_path: &str,
    counters: &mut PartCounters,
) -> Result<()> {
    let part = write_drawing(&ws.drawings, |linked| match linked {
        LinkedPart::Image(picture) => {
            counters.images += 1;
            let ext = picture.format.extension();
            let path = format!("xl/media/image{}.{}", counters.images, ext);
            pkg.add_default_content_type(ext, picture.format.content_type());
            pkg.add_part(&path, None, &picture.data)?;
            Ok(pkg.add_relationship(drawing_path, rel_types::IMAGE, &relative_target(drawing_path, &path)))
        }
        LinkedPart::Chart(chart) => {
            counters.charts += 1;
            let path = format!("xl/charts/chart{}.xml", counters.charts);
            pkg.add_part(&path, Some(content_types::CHART), chart.to_xml().as_bytes())?;
            Ok(pkg.add_relationship(drawing_path, rel_types::CHART, &relative_target(drawing_path, &path)))
        }
    })?;
    pkg.add_part(drawing_path, Some(content_types::DRAWING), part.to_xml().as_bytes())?;
    log::debug!("sheet '{}': wrote {} drawing objects", ws.title(), part.anchors.len());
    Ok(())
}

fn defined_names(wb: &Workbook) -> Vec<DefinedName> {
    let position = |name: &str| wb.worksheets.iter().position(|ws| ws.title() == name);
    let mut names = Vec::with_capacity(wb.named_ranges.len());
    for nr in &wb.named_ranges {
        if position(&nr.sheet).is_none() {
            log::warn!("not writing name '{}': unknown sheet '{}'", nr.name, nr.sheet);
            continue;
        }
        let local_sheet_id = match &nr.scope {
            None => None,
            Some(scope) => match position(scope) {
                Some(i) => Some(i as u32),
                None => {
                    log::warn!("not writing name '{}': unknown scope sheet '{}'", nr.name, scope);
                    continue;
                }
            },
        };
        names.push(DefinedName { name: nr.name.clone(), local_sheet_id, value: nr.reference() });
    }
    names
}

fn core_properties() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">
<dc:creator>{}</dc:creator>
</cp:coreProperties>"#,
        APPLICATION
    )
}

fn app_properties(wb: &Workbook) -> String {
    let mut titles = String::new();
    for ws in &wb.worksheets {
        titles.push_str("<vt:lpstr>");
        titles.push_str(&escape_xml(ws.title()));
        titles.push_str("</vt:lpstr>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>{}</Application>
<TitlesOfParts><vt:vector size="{}" baseType="lpstr">{}</vt:vector></TitlesOfParts>
</Properties>"#,
        APPLICATION,
        wb.worksheets.len(),
        titles
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::package::PackageReader;
    use crate::style::{CellStyle, Font};
    use std::io::Cursor;

    fn sample() -> Workbook {
        let mut wb = Workbook::new();
        let ws = wb.create_sheet(Some("Data".to_string())).unwrap();
        ws.set_cell_value(0, 0, CellValue::from("Hello"));
        ws.set_cell_style(0, 0, CellStyle::new().with_font(Font::new().with_bold(true)));
        ws.set_cell_value(0, 1, CellValue::Number(42.0));
        let _ = wb.create_sheet(Some("Empty".to_string())).unwrap();
        wb
    }

    fn save(wb: &Workbook, options: &SaveOptions) -> Vec<u8> {
        write_stream(wb, Cursor::new(Vec::new()), options).unwrap().into_inner()
    }

    #[test]
    fn test_package_layout() {
        let bytes = save(&sample(), &SaveOptions::default());
        let mut pkg = PackageReader::open(Cursor::new(bytes)).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/styles.xml",
            "xl/sharedStrings.xml",
            "xl/theme/theme1.xml",
            "xl/worksheets/sheet1.xml",
            "xl/worksheets/sheet2.xml",
        ] {
            assert!(pkg.part_exists(part), "missing {}", part);
        }

        let graph = pkg.relationships("xl/workbook.xml").unwrap();
        assert_eq!(
            graph.resolve_by_id("xl/workbook.xml", "rId2").unwrap(),
            "xl/worksheets/sheet2.xml"
        );
        let types = String::from_utf8(pkg.get_part("[Content_Types].xml").unwrap()).unwrap();
        assert!(types.contains(r#"<Override PartName="/xl/worksheets/sheet1.xml""#));
        assert!(types.contains(r#"<Override PartName="/xl/theme/theme1.xml""#));
    }

    #[test]
    fn test_theme_optional() {
        let options = SaveOptions { write_theme: false, ..Default::default() };
        let bytes = save(&sample(), &options);
        let pkg = PackageReader::open(Cursor::new(bytes)).unwrap();
        assert!(!pkg.part_exists("xl/theme/theme1.xml"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let wb = sample();
        assert_eq!(save(&wb, &SaveOptions::default()), save(&wb, &SaveOptions::default()));
    }

    #[test]
    fn test_no_shared_strings_part_without_text() {
        let mut wb = Workbook::new();
        wb.create_sheet(None).unwrap().set_cell_value(0, 0, CellValue::Number(1.0));
        let bytes = save(&wb, &SaveOptions::default());
        let pkg = PackageReader::open(Cursor::new(bytes)).unwrap();
        assert!(!pkg.part_exists("xl/sharedStrings.xml"));
    }
}

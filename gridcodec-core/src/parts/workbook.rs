//! `xl/workbook.xml`: the sheet list and defined names.

use std::io::Cursor;

use quick_xml::events::Event;

use crate::error::{CodecError, Result};
use crate::parts::{NS_MAIN, NS_REL};
use crate::xml::{self, escape_xml, XML_DECLARATION};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetRef {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: String,
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    /// Sheet position for sheet-scoped names.
    pub local_sheet_id: Option<u32>,
    /// The name's formula text, e.g. `Sheet1!$A$1:$B$2`.
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkbookPart {
    pub sheets: Vec<SheetRef>,
    pub defined_names: Vec<DefinedName>,
    pub active_tab: u32,
}

impl WorkbookPart {
    pub fn parse(data: &[u8], part: &str) -> Result<WorkbookPart> {
        let mut reader = xml::reader(Cursor::new(data));
        let mut buf = Vec::new();
        let mut workbook = WorkbookPart::default();
        let mut pending_name: Option<DefinedName> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"sheet" => {
                        let name = xml::attr_str(&e, b"name")
                            .ok_or_else(|| CodecError::parse(part, "sheet without a name"))?;
                        let rel_id = xml::attr_exact(&e, b"r:id")
                            .or_else(|| xml::attr_str(&e, b"id"))
                            .ok_or_else(|| CodecError::parse(part, format!("sheet '{}' has no r:id", name)))?;
                        let hidden = matches!(
                            xml::attr_str(&e, b"state").as_deref(),
                            Some("hidden") | Some("veryHidden")
                        );
                        workbook.sheets.push(SheetRef {
                            name,
                            sheet_id: xml::attr_u32(&e, b"sheetId").unwrap_or(0),
                            rel_id,
                            hidden,
                        });
                    }
                    b"definedName" => {
                        if let Some(name) = xml::attr_str(&e, b"name") {
                            pending_name = Some(DefinedName {
                                name,
                                local_sheet_id: xml::attr_u32(&e, b"localSheetId"),
                                value: String::new(),
                            });
                        }
                    }
                    b"workbookView" => {
                        workbook.active_tab = xml::attr_u32(&e, b"activeTab").unwrap_or(0);
                    }
                    b"workbookPr" => {
                        if xml::attr_bool(&e, b"date1904", false) {
                            log::warn!("'{}' uses the 1904 date system; serials are read as 1900-based", part);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if let Some(name) = pending_name.as_mut() {
                        let text = e.unescape().map_err(|err| CodecError::parse(part, err))?;
                        name.value.push_str(&text);
                    }
                }
                Ok(Event::End(e)) => {
                    if e.local_name().as_ref() == b"definedName" {
                        if let Some(name) = pending_name.take() {
                            workbook.defined_names.push(name);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(CodecError::parse(part, e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(workbook)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(1024);
        out.push_str(XML_DECLARATION);
        out.push_str(&format!("<workbook xmlns=\"{}\" xmlns:r=\"{}\">", NS_MAIN, NS_REL));
        out.push_str("<workbookPr defaultThemeVersion=\"124226\"/>");
        out.push_str(&format!(
            "<bookViews><workbookView xWindow=\"0\" yWindow=\"0\" windowWidth=\"16384\" windowHeight=\"8192\" activeTab=\"{}\"/></bookViews>",
            self.active_tab
        ));
        out.push_str("<sheets>");
        for sheet in &self.sheets {
            out.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\"",
                escape_xml(&sheet.name),
                sheet.sheet_id
            ));
            if sheet.hidden {
                out.push_str(" state=\"hidden\"");
            }
            out.push_str(&format!(" r:id=\"{}\"/>", escape_xml(&sheet.rel_id)));
        }
        out.push_str("</sheets>");
        if !self.defined_names.is_empty() {
            out.push_str("<definedNames>");
            for dn in &self.defined_names {
                out.push_str(&format!("<definedName name=\"{}\"", escape_xml(&dn.name)));
                if let Some(id) = dn.local_sheet_id {
                    out.push_str(&format!(" localSheetId=\"{}\"", id));
                }
                out.push('>');
                out.push_str(&escape_xml(&dn.value));
                out.push_str("</definedName>");
            }
            out.push_str("</definedNames>");
        }
        out.push_str("<calcPr calcId=\"124519\" fullCalcOnLoad=\"1\"/>");
        out.push_str("</workbook>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sheets_and_names() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <bookViews><workbookView activeTab="1"/></bookViews>
  <sheets>
    <sheet name="Data &amp; More" sheetId="1" r:id="rId1"/>
    <sheet name="Hidden" sheetId="4" state="hidden" r:id="rId7"/>
  </sheets>
  <definedNames>
    <definedName name="Totals">'Data &amp; More'!$A$1:$B$3</definedName>
    <definedName name="Local" localSheetId="1">Hidden!$C$2</definedName>
  </definedNames>
</workbook>"#;
        let wb = WorkbookPart::parse(xml.as_bytes(), "xl/workbook.xml").unwrap();
        assert_eq!(wb.active_tab, 1);
        assert_eq!(wb.sheets.len(), 2);
        assert_eq!(wb.sheets[0].name, "Data & More");
        assert_eq!(wb.sheets[1].rel_id, "rId7");
        assert!(wb.sheets[1].hidden);
        assert_eq!(wb.defined_names[0].value, "'Data & More'!$A$1:$B$3");
        assert_eq!(wb.defined_names[1].local_sheet_id, Some(1));

        let again = WorkbookPart::parse(wb.to_xml().as_bytes(), "xl/workbook.xml").unwrap();
        assert_eq!(again, wb);
    }

    #[test]
    fn test_sheet_without_rel_id_is_an_error() {
        let xml = r#"<workbook><sheets><sheet name="A" sheetId="1"/></sheets></workbook>"#;
        let err = WorkbookPart::parse(xml.as_bytes(), "xl/workbook.xml").unwrap_err();
        assert!(matches!(err, CodecError::SchemaParse { .. }));
    }
}

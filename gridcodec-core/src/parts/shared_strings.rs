//! `xl/sharedStrings.xml`: the document-wide string table.

use std::io::BufRead;

use quick_xml::events::Event;

use crate::error::{CodecError, Result};
use crate::parts::styles::{parse_font_child, write_font_props, FontRecord};
use crate::parts::NS_MAIN;
use crate::xml::{self, escape_xml, needs_space_preserve, XML_DECLARATION};
use crate::FastMap;

/// One formatted run of a rich string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SharedRun {
    pub text: String,
    pub font: Option<FontRecord>,
}

/// One `<si>` item.
#[derive(Clone, Debug, PartialEq)]
pub enum SharedString {
    Plain(String),
    Rich(Vec<SharedRun>),
}

impl SharedString {
    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        match self {
            SharedString::Plain(s) => s.clone(),
            SharedString::Rich(runs) => runs.iter().map(|r| r.text.as_str()).collect(),
        }
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<si>");
        match self {
            SharedString::Plain(s) => write_text(out, s),
            SharedString::Rich(runs) => {
                for run in runs {
                    out.push_str("<r>");
                    if let Some(font) = &run.font {
                        out.push_str("<rPr>");
                        write_font_props(out, font, "rFont");
                        out.push_str("</rPr>");
                    }
                    write_text(out, &run.text);
                    out.push_str("</r>");
                }
            }
        }
        out.push_str("</si>");
    }
}

fn write_text(out: &mut String, text: &str) {
    if needs_space_preserve(text) {
        out.push_str("<t xml:space=\"preserve\">");
    } else {
        out.push_str("<t>");
    }
    out.push_str(&escape_xml(text));
    out.push_str("</t>");
}

/// Append-only table with content-equality dedup on insert.
#[derive(Debug, Default)]
pub struct SharedStringTable {
    items: Vec<SharedString>,
    /// Serialized `<si>` body to index.
    lookup: FastMap<String, u32>,
    references: u64,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SharedString> {
        self.items.get(index)
    }

    /// Insert an item, reusing the index of an equal one.
    pub fn insert(&mut self, item: SharedString) -> u32 {
        self.references += 1;
        let mut key = String::new();
        item.write_xml(&mut key);
        if let Some(&index) = self.lookup.get(&key) {
            return index;
        }
        let index = self.items.len() as u32;
        self.items.push(item);
        self.lookup.insert(key, index);
        index
    }

    pub fn insert_text(&mut self, text: &str) -> u32 {
        self.insert(SharedString::Plain(text.to_string()))
    }

    /// Parse the table. Phonetic runs (`rPh`) are skipped.
    pub fn parse<R: BufRead>(source: R, part: &str) -> Result<SharedStringTable> {
        let mut reader = xml::reader(source);
        let mut buf = Vec::new();
        let mut items = Vec::new();

        let mut runs: Vec<SharedRun> = Vec::new();
        let mut plain = String::new();
        let mut run: Option<SharedRun> = None;
        let mut in_rpr = false;
        let mut in_phonetic = false;
        let mut in_t = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        runs.clear();
                        plain.clear();
                    }
                    b"r" if !in_phonetic => run = Some(SharedRun::default()),
                    b"rPr" => in_rpr = true,
                    b"rPh" => in_phonetic = true,
                    b"t" if !in_phonetic => in_t = true,
                    _ if in_rpr => {
                        if let Some(r) = run.as_mut() {
                            parse_font_child(&e, r.font.get_or_insert_with(FontRecord::default));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(e)) => {
                    if in_rpr {
                        if let Some(r) = run.as_mut() {
                            parse_font_child(&e, r.font.get_or_insert_with(FontRecord::default));
                        }
                    } else if e.local_name().as_ref() == b"rPr" {
                        if let Some(r) = run.as_mut() {
                            r.font.get_or_insert_with(FontRecord::default);
                        }
                    }
                }
                Ok(Event::Text(e)) if in_t => {
                    let text = e.unescape().map_err(|err| CodecError::parse(part, err))?;
                    match run.as_mut() {
                        Some(r) => r.text.push_str(&text),
                        None => plain.push_str(&text),
                    }
                }
                Ok(Event::CData(e)) if in_t => {
                    let text = String::from_utf8_lossy(&e);
                    match run.as_mut() {
                        Some(r) => r.text.push_str(&text),
                        None => plain.push_str(&text),
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"t" => in_t = false,
                    b"rPr" => in_rpr = false,
                    b"rPh" => in_phonetic = false,
                    b"r" if !in_phonetic => {
                        if let Some(r) = run.take() {
                            runs.push(r);
                        }
                    }
                    b"si" => {
                        let item = if runs.is_empty() {
                            SharedString::Plain(std::mem::take(&mut plain))
                        } else {
                            SharedString::Rich(std::mem::take(&mut runs))
                        };
                        items.push(item);
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(CodecError::parse(part, e)),
                _ => {}
            }
            buf.clear();
        }

        let mut table = SharedStringTable::new();
        table.items = items;
        log::debug!("shared strings '{}': {} items", part, table.items.len());
        Ok(table)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(64 + self.items.len() * 32);
        out.push_str(XML_DECLARATION);
        out.push_str(&format!(
            "<sst xmlns=\"{}\" count=\"{}\" uniqueCount=\"{}\">",
            NS_MAIN,
            self.references.max(self.items.len() as u64),
            self.items.len()
        ));
        for item in &self.items {
            item.write_xml(&mut out);
        }
        out.push_str("</sst>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorRef, SolidColor};

    #[test]
    fn test_parse_plain_rich_and_phonetic() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Hello</t></si>
  <si><r><t xml:space="preserve">Bold </t></r><r><rPr><b/><sz val="12"/><color rgb="FFFF0000"/><rFont val="Arial"/></rPr><t>red</t></r></si>
  <si><t>漢字</t><rPh sb="0" eb="2"><t>カンジ</t></rPh></si>
  <si><t>a &amp; b</t></si>
</sst>"#;
        let table = SharedStringTable::parse(xml.as_bytes(), "xl/sharedStrings.xml").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0), Some(&SharedString::Plain("Hello".to_string())));
        assert_eq!(table.get(1).unwrap().text(), "Bold red");
        match table.get(1).unwrap() {
            SharedString::Rich(runs) => {
                assert!(runs[0].font.is_none());
                let font = runs[1].font.as_ref().unwrap();
                assert!(font.bold);
                assert_eq!(font.size, Some(12.0));
                assert_eq!(font.name.as_deref(), Some("Arial"));
                assert_eq!(font.color, Some(ColorRef::Rgb(SolidColor::rgb(255, 0, 0))));
            }
            other => panic!("expected rich text, got {:?}", other),
        }
        assert_eq!(table.get(2).unwrap().text(), "漢字");
        assert_eq!(table.get(3).unwrap().text(), "a & b");
    }

    #[test]
    fn test_insert_dedups_by_content() {
        let mut table = SharedStringTable::new();
        assert_eq!(table.insert_text("a"), 0);
        assert_eq!(table.insert_text("b"), 1);
        assert_eq!(table.insert_text("a"), 0);
        let rich = SharedString::Rich(vec![SharedRun { text: "a".into(), font: None }]);
        assert_eq!(table.insert(rich.clone()), 2);
        assert_eq!(table.insert(rich), 2);
        assert_eq!(table.len(), 3);
        let xml = table.to_xml();
        assert!(xml.contains("count=\"5\" uniqueCount=\"3\""));
    }

    #[test]
    fn test_whitespace_preserved() {
        let mut table = SharedStringTable::new();
        table.insert_text("  padded ");
        let xml = table.to_xml();
        assert!(xml.contains("<t xml:space=\"preserve\">  padded </t>"));
        let parsed = SharedStringTable::parse(xml.as_bytes(), "sst").unwrap();
        assert_eq!(parsed.get(0).unwrap().text(), "  padded ");
    }
}

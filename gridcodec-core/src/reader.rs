//! Load: package → workbook model.

use std::io::{Read, Seek};

use crate::color::{ColorResolver, PaletteContext};
use crate::drawing::{read_drawing, DrawingSource};
use crate::error::{CodecError, Result};
use crate::grid::{read_sheet, SheetReadContext};
use crate::package::PackageReader;
use crate::parts::chart::ChartPart;
use crate::parts::drawing::DrawingPart;
use crate::parts::shared_strings::SharedStringTable;
use crate::parts::styles::Stylesheet;
use crate::parts::theme::Theme;
use crate::parts::workbook::WorkbookPart;
use crate::relationships::rel_types;
use crate::style_resolver::StyleResolver;
use crate::workbook::{parse_sheet_reference, NamedRange, Workbook};
use crate::worksheet::Worksheet;

/// Where producers put the workbook part when the root relationship is missing.
const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Read a whole workbook from a package stream.
pub fn read_stream<R: Read + Seek>(source: R) -> Result<Workbook> {
    let mut package = PackageReader::open(source)?;

    let workbook_path = package
        .relationships("")?
        .resolve_by_type("", rel_types::OFFICE_DOCUMENT)
        .unwrap_or_else(|| {
            log::debug!("no officeDocument relationship; trying {}", DEFAULT_WORKBOOK_PART);
            DEFAULT_WORKBOOK_PART.to_string()
        });
    let data = package.get_part(&workbook_path)?;
    let part = WorkbookPart::parse(&data, &workbook_path)?;
    if part.sheets.is_empty() {
        return Err(CodecError::NoWorksheets);
    }

    let graph = package.relationships(&workbook_path)?;
    let styles_path = graph.resolve_by_type(&workbook_path, rel_types::STYLES);
    let strings_path = graph.resolve_by_type(&workbook_path, rel_types::SHARED_STRINGS);
    let theme_path = graph.resolve_by_type(&workbook_path, rel_types::THEME);
    let sheet_paths = part
        .sheets
        .iter()
        .map(|s| graph.resolve_by_id(&workbook_path, &s.rel_id))
        .collect::<Result<Vec<String>>>()?;

    let stylesheet = match styles_path {
        Some(path) => Stylesheet::parse(&package.get_part(&path)?, &path)?,
        None => {
            log::debug!("package has no stylesheet; using defaults");
            Stylesheet::excel_defaults()
        }
    };
    let shared_strings = match strings_path {
        Some(path) => SharedStringTable::parse(package.part_stream(&path)?, &path)?,
        None => SharedStringTable::new(),
    };
    let theme = match theme_path {
        Some(path) => Some(Theme::parse(&package.get_part(&path)?, &path)?),
        None => None,
    };
    if date1904(&data) {
        log::warn!("workbook uses the 1904 date system; dates are read as 1900-based serials");
    }
    log::debug!(
        "workbook '{}': {} sheets, {} shared strings, {} cell formats",
        workbook_path,
        part.sheets.len(),
        shared_strings.len(),
        stylesheet.cell_xfs.len()
    );

    let palette = PaletteContext {
        theme: theme.as_ref().map(|t| &t.colors),
        indexed: (!stylesheet.indexed_colors.is_empty()).then_some(stylesheet.indexed_colors.as_slice()),
    };
    let mut styles = StyleResolver::new(&stylesheet, palette);
    let mut drawing_colors = ColorResolver::new(palette);

    let mut workbook = Workbook::new();
    for (sheet_ref, path) in part.sheets.iter().zip(&sheet_paths) {
        let mut ws = Worksheet::new(sheet_ref.name.clone());
        ws.hidden = sheet_ref.hidden;

        let meta = {
            let stream = package.part_stream(path)?;
            let mut ctx = SheetReadContext { shared_strings: &shared_strings, styles: &mut styles };
            read_sheet(stream, path, &mut ctx, &mut ws)?
        };

        if let Some(rel_id) = meta.drawing_rel {
            let drawing_path = package.relationships(path)?.resolve_by_id(path, &rel_id)?;
            if package.part_exists(&drawing_path) {
                let drawing = DrawingPart::parse(&package.get_part(&drawing_path)?, &drawing_path)?;
                let mut source = PackageDrawingSource { package: &mut package, owner: drawing_path };
                ws.drawings = read_drawing(&drawing, theme.as_ref(), &mut drawing_colors, &mut source)?;
            } else {
                log::warn!("sheet '{}' points at missing drawing '{}'", ws.title(), drawing_path);
            }
        }

        workbook.worksheets.push(ws);
    }
    log::debug!("resolved {} distinct cell formats", styles.cached_count());

    if (part.active_tab as usize) < workbook.worksheets.len() {
        workbook.set_active(part.active_tab as usize)?;
    }
    register_defined_names(&mut workbook, &part);

    Ok(workbook)
}

fn register_defined_names(workbook: &mut Workbook, part: &WorkbookPart) {
    for dn in &part.defined_names {
        let (sheet, range) = match parse_sheet_reference(&dn.value) {
            Ok(target) => target,
            Err(_) => {
                log::warn!("skipping defined name '{}': '{}' is not a cell range", dn.name, dn.value);
                continue;
            }
        };
        if workbook.get_sheet_by_name(&sheet).is_err() {
            log::warn!("skipping defined name '{}': unknown sheet '{}'", dn.name, sheet);
            continue;
        }
        let scope = match dn.local_sheet_id {
            None => None,
            Some(id) => match part.sheets.get(id as usize) {
                Some(s) => Some(s.name.clone()),
                None => {
                    log::warn!("skipping defined name '{}': bad localSheetId {}", dn.name, id);
                    continue;
                }
            },
        };
        let named = NamedRange { name: dn.name.clone(), sheet, range, scope };
        if let Err(e) = workbook.add_named_range(named) {
            log::warn!("skipping defined name '{}': {}", dn.name, e);
        }
    }
}

/// `date1904` lives on `workbookPr`; a byte scan is enough to flag it.
fn date1904(workbook_xml: &[u8]) -> bool {
    let needle: &[u8] = b"date1904=\"1\"";
    let alt: &[u8] = b"date1904=\"true\"";
    workbook_xml.windows(needle.len()).any(|w| w == needle)
        || workbook_xml.windows(alt.len()).any(|w| w == alt)
}

/// Resolves a drawing's picture and chart relationships inside the package.
struct PackageDrawingSource<'p, R: Read + Seek> {
    package: &'p mut PackageReader<R>,
    owner: String,
}

impl<R: Read + Seek> PackageDrawingSource<'_, R> {
    fn target(&mut self, rel_id: &str) -> Result<Option<String>> {
        let path = match self.package.relationships(&self.owner)?.resolve_by_id(&self.owner, rel_id) {
            Ok(path) => path,
            Err(CodecError::RelationNotFound { .. }) => {
                log::warn!("drawing '{}' has no relationship '{}'", self.owner, rel_id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if !self.package.part_exists(&path) {
            log::warn!("drawing '{}' points at missing part '{}'", self.owner, path);
            return Ok(None);
        }
        Ok(Some(path))
    }
}

impl<R: Read + Seek> DrawingSource for PackageDrawingSource<'_, R> {
    fn image(&mut self, rel_id: &str) -> Result<Option<(String, Vec<u8>)>> {
        match self.target(rel_id)? {
            Some(path) => {
                let data = self.package.get_part(&path)?;
                Ok(Some((path, data)))
            }
            None => Ok(None),
        }
    }

    fn chart(&mut self, rel_id: &str) -> Result<Option<ChartPart>> {
        match self.target(rel_id)? {
            Some(path) => Ok(Some(ChartPart::parse(&self.package.get_part(&path)?, &path)?)),
            None => Ok(None),
        }
    }
}

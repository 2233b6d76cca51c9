//! Container access: the zip package, its parts and the content-type manifest.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{CodecError, Result};
use crate::relationships::{
    parse_relationships, rels_path_for, resolve_target, write_relationships, RelationshipGraph,
};
use crate::xml::{self, escape_xml};

/// Well-known content types.
pub mod content_types {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const WORKBOOK: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    pub const SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
    pub const CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";
    pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Signature of the legacy compound-file binary format.
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Compression level for saving workbooks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompressionLevel {
    /// No compression - fastest saves, largest files
    None,
    /// Fast compression (deflate level 1)
    Fast,
    /// Default compression (deflate level 6)
    #[default]
    Default,
    /// Best compression (deflate level 9)
    Best,
}

impl CompressionLevel {
    fn file_options(self) -> SimpleFileOptions {
        match self {
            CompressionLevel::None => SimpleFileOptions::default()
                .large_file(false)
                .compression_method(CompressionMethod::Stored),
            CompressionLevel::Fast => SimpleFileOptions::default()
                .large_file(false)
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(1)),
            CompressionLevel::Default => SimpleFileOptions::default()
                .large_file(false)
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(6)),
            CompressionLevel::Best => SimpleFileOptions::default()
                .large_file(false)
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(9)),
        }
    }
}

/// A package opened for reading.
pub struct PackageReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    relationships: RelationshipGraph,
    loaded_rels: BTreeSet<String>,
}

impl<R: Read + Seek> PackageReader<R> {
    /// Open a zip package.
    pub fn open(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 8];
        let read = read_prefix(&mut reader, &mut magic)?;
        reader.seek(SeekFrom::Start(0))?;
        if read == magic.len() && magic == CFB_SIGNATURE {
            return Err(CodecError::UnsupportedOperation(
                "legacy binary spreadsheet format".to_string(),
            ));
        }

        let archive = ZipArchive::new(reader)
            .map_err(|e| CodecError::PackageOpen(format!("not a zip archive: {}", e)))?;
        log::debug!("opened package with {} entries", archive.len());

        Ok(PackageReader {
            archive,
            relationships: RelationshipGraph::new(),
            loaded_rels: BTreeSet::new(),
        })
    }

    /// Actual entry name for a part, matched ASCII case-insensitively.
    fn entry_name(&self, path: &str) -> Option<String> {
        let path = path.trim_start_matches('/');
        self.archive
            .file_names()
            .find(|n| n.eq_ignore_ascii_case(path))
            .map(str::to_owned)
    }

    pub fn part_exists(&self, path: &str) -> bool {
        self.entry_name(path).is_some()
    }

    /// Read a whole part into memory.
    pub fn get_part(&mut self, path: &str) -> Result<Vec<u8>> {
        let name = self
            .entry_name(path)
            .ok_or_else(|| CodecError::PartNotFound(path.to_string()))?;
        let mut file = self.archive.by_name(&name)?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Stream a part without buffering it whole.
    pub fn part_stream(&mut self, path: &str) -> Result<impl BufRead + '_> {
        let name = self
            .entry_name(path)
            .ok_or_else(|| CodecError::PartNotFound(path.to_string()))?;
        let file = self.archive.by_name(&name)?;
        Ok(BufReader::new(file))
    }

    /// Relationships owned by `owner`, loading its sidecar on first use.
    pub fn relationships(&mut self, owner: &str) -> Result<&RelationshipGraph> {
        if self.loaded_rels.insert(owner.to_string()) {
            let rels_path = rels_path_for(owner);
            if self.part_exists(&rels_path) {
                let data = self.get_part(&rels_path)?;
                let rels = parse_relationships(&data, &rels_path)?;
                self.relationships.insert_all(owner, rels);
            }
        }
        Ok(&self.relationships)
    }
}

fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// The `[Content_Types].xml` manifest.
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn new() -> Self {
        let mut ct = ContentTypes::default();
        ct.add_default("rels", content_types::RELATIONSHIPS);
        ct.add_default("xml", content_types::XML);
        ct
    }

    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .entry(extension.to_ascii_lowercase())
            .or_insert_with(|| content_type.to_string());
    }

    pub fn add_override(&mut self, part: &str, content_type: &str) {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        if !self.overrides.iter().any(|(p, _)| *p == part_name) {
            self.overrides.push((part_name, content_type.to_string()));
        }
    }

    /// Whether the manifest maps `part` to some content type.
    pub fn covers(&self, part: &str) -> bool {
        let part_name = format!("/{}", part.trim_start_matches('/'));
        if self.overrides.iter().any(|(p, _)| *p == part_name) {
            return true;
        }
        part.rsplit_once('.')
            .map(|(_, ext)| self.defaults.contains_key(&ext.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from(xml::XML_DECLARATION);
        out.push_str(
            "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
        );
        for (ext, ct) in &self.defaults {
            out.push_str(&format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                escape_xml(ext),
                escape_xml(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            out.push_str(&format!(
                "<Override PartName=\"{}\" ContentType=\"{}\"/>",
                escape_xml(part),
                escape_xml(ct)
            ));
        }
        out.push_str("</Types>");
        out
    }
}

/// A package being written.
///
/// Parts are streamed into the zip as they are added; the archive layout is
/// only finalized by [`PackageWriter::flush_and_close`], which also writes every
/// `.rels` sidecar and the content-type manifest.
pub struct PackageWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    content_types: ContentTypes,
    relationships: RelationshipGraph,
    parts: BTreeSet<String>,
}

impl<W: Write + Seek> PackageWriter<W> {
    pub fn create(writer: W, compression: CompressionLevel) -> Self {
        PackageWriter {
            zip: ZipWriter::new(writer),
            options: compression.file_options(),
            content_types: ContentTypes::new(),
            relationships: RelationshipGraph::new(),
            parts: BTreeSet::new(),
        }
    }

    pub fn part_exists(&self, path: &str) -> bool {
        self.parts.contains(path)
    }

    /// Add a complete part. `content_type` registers an override for it.
    pub fn add_part(&mut self, path: &str, content_type: Option<&str>, bytes: &[u8]) -> Result<()> {
        self.start_part(path, content_type)?.write_all(bytes)?;
        Ok(())
    }

    /// Begin a part and return a writer for its bytes.
    ///
    /// The returned writer is valid until the next part is started.
    pub fn start_part(&mut self, path: &str, content_type: Option<&str>) -> Result<&mut impl Write> {
        if !self.parts.insert(path.to_string()) {
            return Err(CodecError::UnsupportedOperation(format!(
                "part '{}' added twice",
                path
            )));
        }
        if let Some(ct) = content_type {
            self.content_types.add_override(path, ct);
        }
        self.zip.start_file(path, self.options)?;
        Ok(&mut self.zip)
    }

    pub fn add_default_content_type(&mut self, extension: &str, content_type: &str) {
        self.content_types.add_default(extension, content_type);
    }

    /// Add a relationship from `owner` (`""` for the package root).
    pub fn add_relationship(&mut self, owner: &str, rel_type: &str, target: &str) -> String {
        self.relationships.add_relationship(owner, rel_type, target)
    }

    pub fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }

    /// Write sidecars and the manifest, then finish the archive.
    pub fn flush_and_close(mut self) -> Result<W> {
        let mut sidecars = Vec::new();
        for (owner, rels) in self.relationships.owners() {
            for rel in rels.iter().filter(|r| !r.external) {
                let target = resolve_target(owner, &rel.target);
                if !self.parts.contains(&target) {
                    return Err(CodecError::PartNotFound(target));
                }
            }
            sidecars.push((rels_path_for(owner), write_relationships(rels)));
        }

        for (path, content) in sidecars {
            self.zip.start_file(path.as_str(), self.options)?;
            self.zip.write_all(content.as_bytes())?;
        }

        for part in &self.parts {
            if !self.content_types.covers(part) {
                return Err(CodecError::UnsupportedOperation(format!(
                    "no content type registered for '{}'",
                    part
                )));
            }
        }
        self.zip.start_file("[Content_Types].xml", self.options)?;
        self.zip.write_all(self.content_types.to_xml().as_bytes())?;

        log::debug!("package finalized with {} parts", self.parts.len());
        Ok(self.zip.finish()?)
    }
}

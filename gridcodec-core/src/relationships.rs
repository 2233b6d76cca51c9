//! Relationship graph: per-part `.rels` sidecars mapping ids to target parts.

use quick_xml::events::Event;
use std::collections::BTreeMap;

use crate::error::{CodecError, Result};
use crate::xml::{self, escape_xml};

/// Well-known relationship type URIs.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
}

/// A typed, id-addressed pointer from one part to another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id, unique per owning part (e.g. "rId3").
    pub id: String,
    /// Relationship type URI.
    pub rel_type: String,
    /// Target as stored in the sidecar (relative to the owner's directory).
    pub target: String,
    /// `TargetMode="External"`.
    pub external: bool,
}

/// All relationships of a package, grouped by owning part.
///
/// The package root is the owner `""` (sidecar `_rels/.rels`).
#[derive(Clone, Debug, Default)]
pub struct RelationshipGraph {
    owners: BTreeMap<String, Vec<Relationship>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship and allocate its id.
    ///
    /// Ids have the form `rId<N>`; the search starts at `count + 1` and skips
    /// ids already present on the owner. The owner's sidecar is created on first use.
    pub fn add_relationship(&mut self, owner: &str, rel_type: &str, target: &str) -> String {
        let rels = self.owners.entry(owner.to_string()).or_default();
        let mut n = rels.len() + 1;
        let id = loop {
            let candidate = format!("rId{}", n);
            if !rels.iter().any(|r| r.id == candidate) {
                break candidate;
            }
            n += 1;
        };
        rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Register relationships parsed from an existing sidecar.
    pub fn insert_all(&mut self, owner: &str, rels: Vec<Relationship>) {
        self.owners.entry(owner.to_string()).or_default().extend(rels);
    }

    /// Relationships owned by `owner`, in insertion order.
    pub fn relationships(&self, owner: &str) -> &[Relationship] {
        self.owners.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve a relationship id to an absolute part path.
    pub fn resolve_by_id(&self, owner: &str, id: &str) -> Result<String> {
        self.relationships(owner)
            .iter()
            .find(|r| r.id == id)
            .map(|r| {
                if r.external {
                    r.target.clone()
                } else {
                    resolve_target(owner, &r.target)
                }
            })
            .ok_or_else(|| CodecError::RelationNotFound {
                owner: owner.to_string(),
                id: id.to_string(),
            })
    }

    /// Resolve the first relationship of the given type to an absolute part path.
    pub fn resolve_by_type(&self, owner: &str, rel_type: &str) -> Option<String> {
        self.relationships(owner)
            .iter()
            .find(|r| r.rel_type == rel_type && !r.external)
            .map(|r| resolve_target(owner, &r.target))
    }

    /// Every owner that has at least one relationship, in path order.
    pub fn owners(&self) -> impl Iterator<Item = (&str, &[Relationship])> {
        self.owners
            .iter()
            .filter(|(_, rels)| !rels.is_empty())
            .map(|(owner, rels)| (owner.as_str(), rels.as_slice()))
    }
}

/// Sidecar path for a part: `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    if target.is_empty() {
        return normalize(source_part);
    }
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

/// Express `target_part` relative to the directory of `source_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let base: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_part.split('/').collect();
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = Vec::new();
    for _ in common..base.len() {
        parts.push("..");
    }
    parts.extend_from_slice(&target[common..]);
    parts.join("/")
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}

/// Parse a `.rels` sidecar.
pub fn parse_relationships(data: &[u8], part_name: &str) -> Result<Vec<Relationship>> {
    let mut reader = xml::reader(data);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let id = xml::attr_exact(&e, b"Id");
                    let target = xml::attr_exact(&e, b"Target");
                    if let (Some(id), Some(target)) = (id, target) {
                        rels.push(Relationship {
                            id,
                            rel_type: xml::attr_exact(&e, b"Type").unwrap_or_default(),
                            target,
                            external: xml::attr_exact(&e, b"TargetMode").as_deref()
                                == Some("External"),
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CodecError::parse(part_name, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Serialize a sidecar.
pub fn write_relationships(rels: &[Relationship]) -> String {
    let mut out = String::from(xml::XML_DECLARATION);
    out.push_str(
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    for rel in rels {
        out.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{}/>",
            escape_xml(&rel.id),
            escape_xml(&rel.rel_type),
            escape_xml(&rel.target),
            if rel.external { " TargetMode=\"External\"" } else { "" }
        ));
    }
    out.push_str("</Relationships>");
    out
}

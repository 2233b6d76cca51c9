//! Error types for gridcodec-core.

use thiserror::Error;

/// Errors raised while loading or saving a spreadsheet package.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The stream is not a zip archive, or not a spreadsheet package.
    #[error("cannot open package: {0}")]
    PackageOpen(String),

    /// A part required by the package graph is missing.
    #[error("part not found: {0}")]
    PartNotFound(String),

    /// A relationship id could not be resolved on its owning part.
    #[error("relationship '{id}' not found on part '{owner}'")]
    RelationNotFound { owner: String, id: String },

    /// Malformed XML inside a part.
    #[error("malformed XML in '{part}': {message}")]
    SchemaParse { part: String, message: String },

    /// The workbook declares no sheets.
    #[error("workbook contains no worksheets")]
    NoWorksheets,

    /// A cell or range address does not follow the `<Letters><Digits>` grammar.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The requested operation is not supported by this codec.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Worksheet not found by name or index.
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),

    /// A worksheet with the same name already exists.
    #[error("worksheet already exists: {0}")]
    WorksheetAlreadyExists(String),

    /// A named range with the same name already exists.
    #[error("named range already exists: {0}")]
    NamedRangeAlreadyExists(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
}

impl CodecError {
    /// Wrap an XML failure with the name of the part it came from.
    pub fn parse<P: Into<String>, M: std::fmt::Display>(part: P, message: M) -> Self {
        CodecError::SchemaParse {
            part: part.into(),
            message: message.to_string(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;

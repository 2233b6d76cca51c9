//! gridcodec-core: read and write zip-packaged OOXML spreadsheets.
//!
//! The codec translates between the in-memory [`Workbook`]/[`Worksheet`] model and
//! the multi-part xlsx package: workbook, sheets, shared strings, styles, theme,
//! drawings and charts, tied together by relationship sidecars.
//!
//! ```no_run
//! use gridcodec_core::{CellValue, Workbook};
//!
//! let mut wb = Workbook::new();
//! let ws = wb.create_sheet(Some("Data".to_string()))?;
//! ws.set_cell_value(0, 0, CellValue::from("Hello"));
//! ws.set_cell_value(0, 1, CellValue::Number(42.0));
//! wb.save("out.xlsx")?;
//!
//! let loaded = Workbook::load("out.xlsx")?;
//! assert_eq!(loaded.sheet_names(), vec!["Data"]);
//! # Ok::<(), gridcodec_core::CodecError>(())
//! ```

pub mod cell;
pub mod color;
pub mod drawing;
pub mod error;
pub mod grid;
pub mod number_format;
pub mod package;
pub mod parts;
pub mod reader;
pub mod relationships;
pub mod style;
pub mod style_resolver;
pub mod style_writer;
pub mod units;
pub mod utils;
pub mod workbook;
pub mod worksheet;
pub mod writer;
mod xml;

#[cfg(feature = "fast-hash")]
pub(crate) type FastMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "fast-hash"))]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V>;

pub use cell::{Cell, CellValue, RichText, TextRun};
pub use color::{ColorRef, ColorValue, PaletteContext, SolidColor, ThemeSlot};
pub use drawing::{
    Anchor, CellOffset, Chart, ChartKind, ChartSeries, DrawingKind, DrawingObject, ImageFormat, Picture,
    Shape, ShapeLine,
};
pub use error::{CodecError, Result};
pub use grid::borders::{BorderGrid, BorderSide};
pub use number_format::{DataFormat, NegativeStyle, NumberArgs};
pub use package::CompressionLevel;
pub use style::{
    Alignment, BorderLine, BorderLineStyle, CellBorders, CellStyle, Font, HorizontalAlignment,
    VerticalAlignment,
};
pub use utils::{format_address, format_range, parse_address, parse_range, CellRange};
pub use workbook::{FileFormat, NamedRange, SaveOptions, Workbook};
pub use worksheet::{PageMargins, PageSetup, SheetView, Worksheet};

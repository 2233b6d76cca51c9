//! Grid mapper: worksheet model to and from the flat row/cell lists of a
//! worksheet part.
//!
//! [`read::read_sheet`] consumes rows in file order; [`write::write_sheet`]
//! emits them row by row. Both share one style and string table per load or
//! save call.

pub mod borders;
pub mod read;
pub mod write;

pub use read::{read_sheet, SheetReadContext};
pub use write::{write_sheet, SheetWriteContext};

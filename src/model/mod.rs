//! Data model shared by the workbook reader, the schedule extractor and the
//! renderers.
//!
//! A worksheet is read into a [`CellMatrix`]; the extractor turns it into
//! [`Event`]s.

mod cell;
mod event;

pub use cell::*;
pub use event::*;

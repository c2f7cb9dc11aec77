//! XLSX (Excel) workbook reader.
//!
//! Worksheets are read into [`CellMatrix`](crate::model::CellMatrix) values:
//! strings resolved through the shared string table, numbers with date or
//! time formats converted into native date/time cells.
//!
//! # Example
//!
//! ```no_run
//! use gridcal::xlsx::XlsxParser;
//!
//! let parser = XlsxParser::open("schedule.xlsx")?;
//! for (index, name) in parser.sheet_names().iter().enumerate() {
//!     let matrix = parser.read_sheet(index)?;
//!     println!("{}: {} rows", name, matrix.height());
//! }
//! # Ok::<(), gridcal::Error>(())
//! ```

mod parser;
mod shared_strings;
mod styles;

pub use parser::{parse_cell_ref, XlsxParser, MAX_COLUMNS, MAX_ROWS};
pub use styles::{classify_format_code, serial_to_datetime, serial_to_time, NumberKind};

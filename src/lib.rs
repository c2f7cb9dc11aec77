//! # gridcal
//!
//! Turn weekly timetable spreadsheets into calendar events.
//!
//! A timetable workbook holds one worksheet per calendar week: time slots
//! run down the left, weekdays run across the top and every lesson is a
//! cell, repeated in consecutive slots when it lasts longer than one. This
//! library finds that grid without a fixed layout, merges repeated cells
//! into events and renders them as an iCalendar feed, an HTML page, text or
//! JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gridcal::{parse_file, render, ScheduleOptions};
//!
//! let schedule = parse_file("stundenplan.xlsx", &ScheduleOptions::default())?;
//! println!("{} events", schedule.events.len());
//!
//! let ics = render::to_ics(&schedule.events, &render::RenderOptions::german())?;
//! std::fs::write("stundenplan.ics", ics)?;
//! # Ok::<(), gridcal::Error>(())
//! ```
//!
//! ## Lower-Level APIs
//!
//! ```no_run
//! use gridcal::schedule::{locate_grid, extract_events, ScheduleOptions};
//! use gridcal::xlsx::XlsxParser;
//!
//! let options = ScheduleOptions::default();
//! let parser = XlsxParser::open("stundenplan.xlsx")?;
//! let matrix = parser.read_sheet_by_name("KW 41")?;
//!
//! if let Ok(anchors) = locate_grid(&matrix, &options.locator, &options.locale) {
//!     let events = extract_events(&matrix, &anchors, &options);
//!     println!("{} events in week 41", events.len());
//! }
//! # Ok::<(), gridcal::Error>(())
//! ```

pub mod container;
pub mod detect;
pub mod error;
pub mod model;
pub mod render;
pub mod schedule;
pub mod xlsx;

// Re-exports
pub use container::{Relationships, WorkbookContainer};
pub use detect::{detect_format_from_bytes, FormatType};
pub use error::{Error, LocateError, Result};
pub use model::{CellMatrix, CellValue, Event};
pub use schedule::{
    GridAnchors, RetentionWindow, Schedule, ScheduleOptions, SheetOutcome, SheetReport, SlotEnd,
    WeekdayLocale,
};

use chrono::{DateTime, Utc};
use std::path::Path;

/// Parse a timetable workbook and return the events near the current time.
///
/// Worksheets whose layout is not recognized are skipped and listed in
/// [`Schedule::sheets`]; only an unreadable file is an error.
///
/// # Example
///
/// ```no_run
/// use gridcal::{parse_file, ScheduleOptions};
///
/// let schedule = parse_file("stundenplan.xlsx", &ScheduleOptions::default())?;
/// for event in &schedule.events {
///     println!("{} {}", event.start.format("%a %H:%M"), event.title);
/// }
/// # Ok::<(), gridcal::Error>(())
/// ```
pub fn parse_file(path: impl AsRef<Path>, options: &ScheduleOptions) -> Result<Schedule> {
    parse_file_at(path, options, Utc::now())
}

/// Parse a timetable workbook, applying the retention window around `now`.
pub fn parse_file_at(
    path: impl AsRef<Path>,
    options: &ScheduleOptions,
    now: DateTime<Utc>,
) -> Result<Schedule> {
    let parser = xlsx::XlsxParser::open(path)?;
    schedule::build_schedule(&parser, options, now)
}

/// Parse a timetable workbook from bytes.
///
/// # Example
///
/// ```no_run
/// use gridcal::{parse_bytes, ScheduleOptions};
///
/// let data = std::fs::read("stundenplan.xlsx")?;
/// let schedule = parse_bytes(&data, &ScheduleOptions::default().without_retention())?;
/// # Ok::<(), gridcal::Error>(())
/// ```
pub fn parse_bytes(data: &[u8], options: &ScheduleOptions) -> Result<Schedule> {
    parse_bytes_at(data, options, Utc::now())
}

/// Parse a timetable workbook from bytes, applying the retention window
/// around `now`.
pub fn parse_bytes_at(
    data: &[u8],
    options: &ScheduleOptions,
    now: DateTime<Utc>,
) -> Result<Schedule> {
    let parser = xlsx::XlsxParser::from_bytes(data.to_vec())?;
    schedule::build_schedule(&parser, options, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bytes_rejects_garbage() {
        let err = parse_bytes(b"not a workbook", &ScheduleOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat));
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file("does/not/exist.xlsx", &ScheduleOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}

//! Weekly schedule extraction.
//!
//! Every worksheet whose name ends in a week number is scanned for its grid
//! (see [`locate_grid`]), the grid is turned into events
//! (see [`extract_events`]) and the events of all weeks are deduplicated and
//! narrowed to the retention window. A worksheet whose layout is not
//! recognized is skipped and reported; it never aborts the workbook.
//!
//! # Example
//!
//! ```no_run
//! use gridcal::schedule::{build_schedule, ScheduleOptions};
//! use gridcal::xlsx::XlsxParser;
//!
//! let parser = XlsxParser::open("stundenplan.xlsx")?;
//! let schedule = build_schedule(&parser, &ScheduleOptions::default(), chrono::Utc::now())?;
//! for event in &schedule.events {
//!     println!("{} {}", event.start, event.title);
//! }
//! # Ok::<(), gridcal::Error>(())
//! ```

mod extractor;
mod filter;
mod locator;
mod options;
mod sheets;
mod time;

pub use extractor::{extract_events, split_fields, Fields};
pub use filter::{dedup_events, sort_events, RetentionWindow, MAX_WINDOW_DAYS};
pub use locator::{
    find_day_columns, find_grid_start, find_time_column, locate_grid, DayColumn, GridAnchors,
};
pub use options::{LocatorOptions, ScheduleOptions, SlotEnd, WeekdayLocale, MAX_GRACE_MINUTES};
pub use sheets::{select_week_sheets, week_number, WeekSheet};
pub use time::{find_date, find_date_text, localize, parse_time_of_day, parse_time_text, DateMatch};

use crate::error::{Error, LocateError, Result};
use crate::model::{CellMatrix, Event};
use crate::xlsx::XlsxParser;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Anything that can hand out worksheets as cell matrices.
pub trait WorksheetSource {
    /// Worksheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Materialize the worksheet at `index`.
    fn read_sheet(&self, index: usize) -> Result<CellMatrix>;
}

impl WorksheetSource for XlsxParser {
    fn sheet_names(&self) -> Vec<String> {
        XlsxParser::sheet_names(self)
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn read_sheet(&self, index: usize) -> Result<CellMatrix> {
        XlsxParser::read_sheet(self, index)
    }
}

/// Worksheets held in memory, mostly useful for tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, CellMatrix)>,
}

impl MemoryWorkbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worksheet.
    pub fn with_sheet(mut self, name: impl Into<String>, matrix: CellMatrix) -> Self {
        self.sheets.push((name.into(), matrix));
        self
    }
}

impl WorksheetSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&self, index: usize) -> Result<CellMatrix> {
        self.sheets
            .get(index)
            .map(|(_, matrix)| matrix.clone())
            .ok_or_else(|| Error::MissingComponent(format!("worksheet {}", index)))
    }
}

/// What happened to one worksheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SheetOutcome {
    /// The grid was found and events were extracted.
    Extracted {
        /// Events extracted before workbook-level deduplication
        events: usize,
        /// Where the grid was found
        anchors: GridAnchors,
    },
    /// The layout was not recognized.
    Skipped {
        /// Why the locator gave up
        reason: LocateError,
    },
}

/// Per-worksheet diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub name: String,
    pub week: u32,
    pub outcome: SheetOutcome,
}

impl SheetReport {
    /// Whether the worksheet contributed to the schedule.
    pub fn is_extracted(&self) -> bool {
        matches!(self.outcome, SheetOutcome::Extracted { .. })
    }
}

/// Result of a workbook run: the final events plus a report per worksheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schedule {
    /// Deduplicated, windowed events sorted by start
    pub events: Vec<Event>,
    /// One entry per week worksheet, in processing order
    pub sheets: Vec<SheetReport>,
}

impl Schedule {
    /// Number of worksheets that were skipped.
    pub fn skipped_count(&self) -> usize {
        self.sheets.iter().filter(|s| !s.is_extracted()).count()
    }
}

/// Locate the grid of one worksheet and extract its events.
pub fn extract_sheet(
    matrix: &CellMatrix,
    options: &ScheduleOptions,
) -> std::result::Result<(GridAnchors, Vec<Event>), LocateError> {
    let anchors = locate_grid(matrix, &options.locator, &options.locale)?;
    let events = extract_events(matrix, &anchors, options);
    Ok((anchors, events))
}

/// Extract and deduplicate the events of every week worksheet.
///
/// No retention window is applied. Fails only when a worksheet cannot be
/// read at all.
pub fn extract_workbook<S: WorksheetSource + ?Sized>(
    source: &S,
    options: &ScheduleOptions,
) -> Result<Schedule> {
    let names = source.sheet_names();
    let mut events = Vec::new();
    let mut reports = Vec::new();

    for sheet in select_week_sheets(&names) {
        let matrix = source.read_sheet(sheet.index)?;

        let outcome = match extract_sheet(&matrix, options) {
            Ok((anchors, sheet_events)) => {
                log::debug!(
                    "sheet '{}': time column {}, {} day columns, grid starts at row {}",
                    sheet.name,
                    anchors.time_column,
                    anchors.day_columns.len(),
                    anchors.grid_start_row
                );
                let count = sheet_events.len();
                events.extend(sheet_events);
                SheetOutcome::Extracted {
                    events: count,
                    anchors,
                }
            }
            Err(reason) => {
                log::warn!("skipping sheet '{}': {}", sheet.name, reason);
                SheetOutcome::Skipped { reason }
            }
        };

        reports.push(SheetReport {
            name: sheet.name,
            week: sheet.week,
            outcome,
        });
    }

    let mut events = dedup_events(events);
    sort_events(&mut events);

    Ok(Schedule {
        events,
        sheets: reports,
    })
}

/// Full pipeline: extract, deduplicate, then keep events near `now`.
pub fn build_schedule<S: WorksheetSource + ?Sized>(
    source: &S,
    options: &ScheduleOptions,
    now: DateTime<Utc>,
) -> Result<Schedule> {
    let mut schedule = extract_workbook(source, options)?;
    let extracted = schedule.events.len();

    if let Some(window) = &options.retention {
        schedule.events = window.apply(std::mem::take(&mut schedule.events), now);
    }

    log::info!(
        "{} events from {} week sheets ({} skipped), {} within the window",
        extracted,
        schedule.sheets.len(),
        schedule.skipped_count(),
        schedule.events.len()
    );

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn week_41() -> CellMatrix {
        CellMatrix::from_text_rows(&[
            ["KW 41", "Montag", "Dienstag"],
            ["", "", ""],
            ["", "06.10.2025", "07.10.2025"],
            ["09:00", "Networks | Dr. X | R1", ""],
            ["09:45", "Networks | Dr. X | R1", "Algorithms | Dr. Smith | R204"],
            ["10:30", "", "Algorithms | Dr. Smith | R204"],
            ["11:15", "", ""],
            ["12:00", "", ""],
            ["12:45", "", ""],
        ])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 8, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_build_schedule() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("Info", CellMatrix::from_text_rows(&[["Stundenplan"]]))
            .with_sheet("41", week_41());

        let schedule = build_schedule(&workbook, &ScheduleOptions::default(), now()).unwrap();

        assert_eq!(schedule.sheets.len(), 1);
        assert!(schedule.sheets[0].is_extracted());

        let titles: Vec<&str> = schedule.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Networks", "Algorithms"]);
        assert_eq!(
            schedule.events[0].end.format("%H:%M").to_string(),
            "09:50"
        );
        assert_eq!(
            schedule.events[1].end.format("%d.%m. %H:%M").to_string(),
            "07.10. 10:35"
        );
    }

    #[test]
    fn test_malformed_sheet_is_skipped() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("KW 40", CellMatrix::from_text_rows(&[["nothing here"]]))
            .with_sheet("KW 41", week_41());

        let schedule = build_schedule(&workbook, &ScheduleOptions::default(), now()).unwrap();

        assert_eq!(schedule.skipped_count(), 1);
        assert_eq!(
            schedule.sheets[0].outcome,
            SheetOutcome::Skipped {
                reason: LocateError::NoTimeColumn
            }
        );
        assert_eq!(schedule.events.len(), 2);
    }

    #[test]
    fn test_repeated_weeks_deduplicated() {
        let workbook = MemoryWorkbook::new()
            .with_sheet("41", week_41())
            .with_sheet("Kopie 41", week_41());

        let schedule = extract_workbook(&workbook, &ScheduleOptions::default()).unwrap();
        assert_eq!(schedule.sheets.len(), 2);
        assert_eq!(schedule.events.len(), 2);
    }

    #[test]
    fn test_window_applied_only_in_build() {
        let workbook = MemoryWorkbook::new().with_sheet("41", week_41());
        let far_future = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();

        let windowed =
            build_schedule(&workbook, &ScheduleOptions::default(), far_future).unwrap();
        assert!(windowed.events.is_empty());

        let unwindowed = build_schedule(
            &workbook,
            &ScheduleOptions::default().without_retention(),
            far_future,
        )
        .unwrap();
        assert_eq!(unwindowed.events.len(), 2);
    }

    #[test]
    fn test_report_serializes() {
        let workbook = MemoryWorkbook::new().with_sheet("41", CellMatrix::default());
        let schedule = extract_workbook(&workbook, &ScheduleOptions::default()).unwrap();
        let json = serde_json::to_string(&schedule.sheets).unwrap();
        assert!(json.contains("\"status\":\"skipped\""));
        assert!(json.contains("\"reason\":\"empty_sheet\""));
    }
}

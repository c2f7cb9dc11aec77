//! Grid structure discovery.
//!
//! A schedule sheet has no fixed layout. The locator finds three anchors by
//! scanning content: the column holding time-of-day labels, the columns
//! bound to calendar dates (a weekday header with a date a few rows below
//! it), and the row where the regular time grid begins. All scans are
//! bounded by [`LocatorOptions`] so stray content far away from the grid
//! does not affect the cost.

use crate::error::LocateError;
use crate::model::CellMatrix;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::options::{LocatorOptions, WeekdayLocale};
use super::time::{find_date, parse_time_of_day, DateMatch};

/// A column bound to one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayColumn {
    /// Zero-based column index
    pub column: usize,
    /// Date of every event in this column
    pub date: NaiveDate,
}

/// Structural anchors of one worksheet.
///
/// `day_columns` is non-empty, sorted by column and never contains
/// `time_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridAnchors {
    /// Column with the time-of-day labels
    pub time_column: usize,
    /// Dated day columns, ascending
    pub day_columns: Vec<DayColumn>,
    /// First row of the time grid
    pub grid_start_row: usize,
}

/// Discover the anchors of a worksheet.
pub fn locate_grid(
    matrix: &CellMatrix,
    options: &LocatorOptions,
    locale: &WeekdayLocale,
) -> Result<GridAnchors, LocateError> {
    if matrix.is_empty() {
        return Err(LocateError::EmptySheet);
    }

    let time_column = find_time_column(matrix, options).ok_or(LocateError::NoTimeColumn)?;

    let day_columns: Vec<DayColumn> = find_day_columns(matrix, options, locale)
        .into_iter()
        .filter(|day| day.column != time_column)
        .collect();
    if day_columns.is_empty() {
        return Err(LocateError::NoDayColumns);
    }

    let grid_start_row =
        find_grid_start(matrix, time_column, options).ok_or(LocateError::NoGridStart)?;

    Ok(GridAnchors {
        time_column,
        day_columns,
        grid_start_row,
    })
}

/// First of the leading columns with more than `min_time_cells` time labels
/// among its first `time_scan_rows` rows.
pub fn find_time_column(matrix: &CellMatrix, options: &LocatorOptions) -> Option<usize> {
    let rows = matrix.height().min(options.time_scan_rows);
    (0..matrix.width().min(options.time_scan_columns)).find(|&col| {
        let count = (0..rows)
            .filter(|&row| parse_time_of_day(matrix.get(row, col)).is_some())
            .count();
        count > options.min_time_cells
    })
}

/// Columns whose weekday header has a date within the lookahead below it.
///
/// The first date-like cell below a header decides: a valid date binds the
/// column, an impossible one (31.02.) leaves it unbound. A later header in
/// the same column overrides an earlier binding.
pub fn find_day_columns(
    matrix: &CellMatrix,
    options: &LocatorOptions,
    locale: &WeekdayLocale,
) -> Vec<DayColumn> {
    let mut col_date: BTreeMap<usize, NaiveDate> = BTreeMap::new();

    for row in 0..matrix.height().min(options.header_scan_rows) {
        for col in 0..matrix.width() {
            if !locale.matches(&matrix.get(row, col).display_text()) {
                continue;
            }
            let last = (row + options.date_lookahead).min(matrix.height().saturating_sub(1));
            for look in row + 1..=last {
                match find_date(matrix.get(look, col)) {
                    DateMatch::Absent => continue,
                    DateMatch::Found(date) => {
                        col_date.insert(col, date);
                    }
                    DateMatch::Invalid => {
                        log::debug!("impossible date below weekday at row {}, col {}", look, col);
                    }
                }
                break;
            }
        }
    }

    col_date
        .into_iter()
        .map(|(column, date)| DayColumn { column, date })
        .collect()
}

/// First row whose time label is followed by enough further labels.
///
/// The probe window starts at the candidate row itself and is clipped to
/// the matrix, so an isolated time-like cell above the grid is passed over.
pub fn find_grid_start(
    matrix: &CellMatrix,
    time_column: usize,
    options: &LocatorOptions,
) -> Option<usize> {
    let is_time = |row: usize| parse_time_of_day(matrix.get(row, time_column)).is_some();

    (0..matrix.height()).find(|&row| {
        if !is_time(row) {
            return false;
        }
        let end = (row + options.grid_probe_rows).min(matrix.height());
        (row..end).filter(|&r| is_time(r)).count() >= options.grid_min_times
    })
}

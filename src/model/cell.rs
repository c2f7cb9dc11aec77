//! Raw worksheet content.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single scalar cell value as stored in the workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    /// No value at all.
    #[default]
    Empty,
    /// Text, including shared and inline strings.
    Text(String),
    /// A number without a date/time number format.
    Number(f64),
    /// Boolean cell.
    Bool(bool),
    /// Formula error such as `#REF!`.
    Error(String),
    /// Time-of-day (a serial value below one day with a time format).
    Time(NaiveTime),
    /// Date or date-time (a serial value with a date format).
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Build a text cell; blank strings become [`CellValue::Empty`].
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    /// Whether the cell holds nothing printable.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The cell rendered as text, the way a reader of the sheet would see it.
    pub fn display_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Text(s) | CellValue::Error(s) => Cow::Borrowed(s.as_str()),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Bool(true) => Cow::Borrowed("TRUE"),
            CellValue::Bool(false) => Cow::Borrowed("FALSE"),
            CellValue::Time(t) => Cow::Owned(t.format("%H:%M:%S").to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

static EMPTY: CellValue = CellValue::Empty;

/// Rectangular, read-only grid of cell values for one worksheet.
///
/// Reads outside the populated rectangle yield [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMatrix {
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl CellMatrix {
    /// Build a matrix from rows, padding short rows to the widest one.
    pub fn new(mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Self { rows, width }
    }

    /// Build a matrix from sparse `(row, column, value)` triples.
    pub fn from_cells(cells: impl IntoIterator<Item = (usize, usize, CellValue)>) -> Self {
        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        for (row, col, value) in cells {
            if value.is_empty() {
                continue;
            }
            if rows.len() <= row {
                rows.resize_with(row + 1, Vec::new);
            }
            let line = &mut rows[row];
            if line.len() <= col {
                line.resize(col + 1, CellValue::Empty);
            }
            line[col] = value;
        }
        Self::new(rows)
    }

    /// Convenience constructor from plain strings; `""` becomes empty.
    pub fn from_text_rows<R, S>(rows: &[R]) -> Self
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        Self::new(
            rows.iter()
                .map(|row| row.as_ref().iter().map(|s| CellValue::text(s.as_ref())).collect())
                .collect(),
        )
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the matrix has no cells.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    /// Cell at `(row, col)`, or empty when out of range.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Iterate over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

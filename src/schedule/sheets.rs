//! Worksheet selection by week number.

use serde::Serialize;

/// A worksheet that carries a week number in its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSheet {
    /// Position of the worksheet in the workbook
    pub index: usize,
    /// Worksheet name as shown in the workbook
    pub name: String,
    /// Week number encoded in the name
    pub week: u32,
}

/// Week number encoded in a worksheet name.
///
/// The name must end in two ASCII digits (`"41"`, `"KW 41"`, `"Woche_07"`).
/// A bare single digit (`"7"`) is read as a zero-padded week as well.
pub fn week_number(name: &str) -> Option<u32> {
    let name = name.trim();
    let chars: Vec<char> = name.chars().collect();

    let digits: String = match chars.as_slice() {
        [d] if d.is_ascii_digit() => d.to_string(),
        [.., a, b] if a.is_ascii_digit() && b.is_ascii_digit() => [*a, *b].iter().collect(),
        _ => return None,
    };
    digits.parse().ok()
}

/// Worksheets that take part in extraction, in ascending week order.
///
/// Sheets with the same week keep their workbook order.
pub fn select_week_sheets<S: AsRef<str>>(names: &[S]) -> Vec<WeekSheet> {
    let mut sheets: Vec<WeekSheet> = names
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let name = name.as_ref();
            week_number(name).map(|week| WeekSheet {
                index,
                name: name.to_string(),
                week,
            })
        })
        .collect();
    sheets.sort_by_key(|sheet| sheet.week);
    sheets
}

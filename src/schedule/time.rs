//! Tolerant time-of-day and date recognition for grid cells.

use crate::model::CellValue;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid time pattern"));

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})[.\s](\d{1,2})[.\s](\d{4})").expect("valid date pattern")
});

/// Parse `H:MM` / `HH:MM` with hour in [0,24) and minute in [0,60).
pub fn parse_time_text(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text.trim())?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour < 24 && minute < 60 {
        NaiveTime::from_hms_opt(hour, minute, 0)
    } else {
        None
    }
}

/// Interpret a cell as a time of day.
///
/// Native times are taken as is, native date-times are truncated to hour
/// and minute, text must match [`parse_time_text`]. Anything else is not a
/// time.
pub fn parse_time_of_day(cell: &CellValue) -> Option<NaiveTime> {
    match cell {
        CellValue::Time(t) => Some(*t),
        CellValue::DateTime(dt) => NaiveTime::from_hms_opt(dt.hour(), dt.minute(), 0),
        CellValue::Text(s) => parse_time_text(s),
        _ => None,
    }
}

/// Result of looking for a date in a header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMatch {
    /// The cell does not look like a date.
    Absent,
    /// A valid calendar date.
    Found(NaiveDate),
    /// Looks like a date but names no real day (e.g. 31.02.2025).
    Invalid,
}

/// Find a `D.M.YYYY` date (separators `.` or whitespace) anywhere in `text`.
pub fn find_date_text(text: &str) -> DateMatch {
    let Some(caps) = DATE_RE.captures(text) else {
        return DateMatch::Absent;
    };
    let day = caps[1].parse::<u32>().ok();
    let month = caps[2].parse::<u32>().ok();
    let year = caps[3].parse::<i32>().ok();
    match (year, month, day) {
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d)
            .map(DateMatch::Found)
            .unwrap_or(DateMatch::Invalid),
        _ => DateMatch::Invalid,
    }
}

/// Look for a date in a header cell: a native date value or date text.
pub fn find_date(cell: &CellValue) -> DateMatch {
    match cell {
        CellValue::DateTime(dt) => DateMatch::Found(dt.date()),
        CellValue::Text(s) => find_date_text(s),
        _ => DateMatch::Absent,
    }
}

/// Attach a time zone to a wall-clock time.
///
/// Ambiguous local times (the repeated hour when clocks go back) resolve to
/// the earlier instant; nonexistent ones (skipped when clocks go forward)
/// are moved past the gap.
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn test_parse_time_text_accepts_all_valid() {
        for hour in 0..24 {
            for minute in 0..60 {
                assert_eq!(parse_time_text(&format!("{}:{:02}", hour, minute)), hm(hour, minute));
                assert_eq!(
                    parse_time_text(&format!("{:02}:{:02}", hour, minute)),
                    hm(hour, minute)
                );
            }
        }
    }

    #[test]
    fn test_parse_time_text_rejects() {
        for text in [
            "24:00", "9:60", "7:5", "123:00", "09:000", "9.00", "09:00:00", "ab:cd", "",
            "9:00 Uhr", "-1:00", ":30",
        ] {
            assert_eq!(parse_time_text(text), None, "{:?} should not parse", text);
        }
        assert_eq!(parse_time_text(" 08:15 "), hm(8, 15));
    }

    #[test]
    fn test_parse_time_of_day_native_values() {
        let t = NaiveTime::from_hms_opt(9, 45, 30).unwrap();
        assert_eq!(parse_time_of_day(&CellValue::Time(t)), Some(t));

        let dt = NaiveDate::from_ymd_opt(1899, 12, 30)
            .unwrap()
            .and_hms_opt(10, 30, 59)
            .unwrap();
        assert_eq!(parse_time_of_day(&CellValue::DateTime(dt)), hm(10, 30));

        assert_eq!(parse_time_of_day(&CellValue::Number(0.375)), None);
        assert_eq!(parse_time_of_day(&CellValue::Empty), None);
        assert_eq!(parse_time_of_day(&CellValue::text("12:15")), hm(12, 15));
    }

    #[test]
    fn test_find_date_text() {
        let oct6 = NaiveDate::from_ymd_opt(2025, 10, 6).unwrap();
        assert_eq!(find_date_text("06.10.2025"), DateMatch::Found(oct6));
        assert_eq!(find_date_text("6.10.2025"), DateMatch::Found(oct6));
        assert_eq!(find_date_text("6 10 2025"), DateMatch::Found(oct6));
        assert_eq!(find_date_text("Stand: 06.10.2025 (KW41)"), DateMatch::Found(oct6));
        assert_eq!(find_date_text("31.02.2025"), DateMatch::Invalid);
        assert_eq!(find_date_text("2025-10-06"), DateMatch::Absent);
        assert_eq!(find_date_text("Montag"), DateMatch::Absent);
    }

    #[test]
    fn test_find_date_native() {
        let dt = NaiveDate::from_ymd_opt(2025, 10, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(find_date(&CellValue::DateTime(dt)), DateMatch::Found(dt.date()));
        assert_eq!(find_date(&CellValue::Number(45937.0)), DateMatch::Absent);
    }

    #[test]
    fn test_localize_dst_edges() {
        let tz = chrono_tz::Europe::Vienna;
        // 2025-03-30 02:30 does not exist in Vienna
        let gap = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let moved = localize(&tz, gap).unwrap();
        assert_eq!(moved.naive_local().time(), NaiveTime::from_hms_opt(3, 30, 0).unwrap());

        // 2025-10-26 02:30 happens twice
        let repeated = NaiveDate::from_ymd_opt(2025, 10, 26)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let first = localize(&tz, repeated).unwrap();
        assert_eq!(first.to_rfc3339(), "2025-10-26T02:30:00+02:00");
    }
}

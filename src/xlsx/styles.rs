//! Number formats from `xl/styles.xml`.
//!
//! Excel stores dates and times as plain serial numbers; only the number
//! format attached to the cell style says how they were meant. We need that
//! distinction to hand native time values to the grid locator.

use crate::model::CellValue;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;

/// What a numeric cell represents, according to its number format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// Ordinary number.
    Plain,
    /// Calendar date (possibly with a time part).
    Date,
    /// Time of day only.
    Time,
}

/// Styles information parsed from xl/styles.xml.
#[derive(Debug, Default)]
pub struct Styles {
    /// Custom number formats: numFmtId -> formatCode
    num_fmts: HashMap<u32, String>,
    /// Cell style formats: style index -> numFmtId
    cell_xfs: Vec<u32>,
}

impl Styles {
    /// Parse styles from xl/styles.xml content.
    ///
    /// A malformed styles part only costs us date detection, so parsing
    /// stops at the first error instead of failing the workbook.
    pub fn parse(xml: &str) -> Self {
        let mut styles = Self::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut in_num_fmts = false;
        let mut in_cell_xfs = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = true,
                    b"cellXfs" => in_cell_xfs = true,
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id_of(e)),
                    b"numFmt" if in_num_fmts => styles.push_num_fmt(e),
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"numFmt" if in_num_fmts => styles.push_num_fmt(e),
                    b"xf" if in_cell_xfs => styles.cell_xfs.push(num_fmt_id_of(e)),
                    _ => {}
                },
                Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                    b"numFmts" => in_num_fmts = false,
                    b"cellXfs" => in_cell_xfs = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => {
                    log::warn!("styles.xml is malformed, ignoring the rest: {}", e);
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        styles
    }

    fn push_num_fmt(&mut self, e: &quick_xml::events::BytesStart<'_>) {
        let mut id: Option<u32> = None;
        let mut code = String::new();
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"numFmtId" => id = String::from_utf8_lossy(&attr.value).parse().ok(),
                b"formatCode" => {
                    code = attr
                        .unescape_value()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                }
                _ => {}
            }
        }
        if let Some(id) = id {
            self.num_fmts.insert(id, code);
        }
    }

    /// Classify the number format of a cell style index.
    pub fn kind_of(&self, style_index: usize) -> NumberKind {
        match self.cell_xfs.get(style_index) {
            Some(&id) => self.kind_of_format(id),
            None => NumberKind::Plain,
        }
    }

    /// Classify a numFmtId, built-in or custom.
    pub fn kind_of_format(&self, num_fmt_id: u32) -> NumberKind {
        match num_fmt_id {
            14..=17 | 22 => NumberKind::Date,
            18..=21 | 45..=47 => NumberKind::Time,
            _ => self
                .num_fmts
                .get(&num_fmt_id)
                .map(|code| classify_format_code(code))
                .unwrap_or(NumberKind::Plain),
        }
    }

    /// Convert a raw numeric cell according to its style.
    pub fn convert(&self, serial: f64, style_index: Option<usize>) -> CellValue {
        let kind = style_index
            .map(|idx| self.kind_of(idx))
            .unwrap_or(NumberKind::Plain);
        match kind {
            NumberKind::Plain => CellValue::Number(serial),
            // A time format on a value with a day part is still a timestamp.
            NumberKind::Time if (0.0..1.0).contains(&serial) => serial_to_time(serial)
                .map(CellValue::Time)
                .unwrap_or(CellValue::Number(serial)),
            NumberKind::Time | NumberKind::Date => serial_to_datetime(serial)
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Number(serial)),
        }
    }
}

fn num_fmt_id_of(e: &quick_xml::events::BytesStart<'_>) -> u32 {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"numFmtId")
        .and_then(|attr| String::from_utf8_lossy(&attr.value).parse().ok())
        .unwrap_or(0)
}

/// Classify a custom format code by its unquoted, unbracketed tokens.
///
/// `m` is ambiguous (month or minute); it counts as a date token only when
/// no hour or second token is present.
pub fn classify_format_code(format_code: &str) -> NumberKind {
    let mut in_bracket = false;
    let mut bracket = String::new();
    let mut in_quote = false;
    let mut escaped = false;
    let (mut date, mut time, mut month_or_minute) = (false, false, false);

    for c in format_code.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            '[' if !in_quote => {
                in_bracket = true;
                bracket.clear();
            }
            ']' if !in_quote => {
                in_bracket = false;
                // [h]:mm and friends are elapsed-time tokens, not colors or locales
                if !bracket.is_empty() && bracket.chars().all(|b| matches!(b, 'h' | 'm' | 's')) {
                    time = true;
                }
            }
            _ if in_bracket => bracket.push(c.to_ascii_lowercase()),
            _ if in_quote => {}
            _ => match c.to_ascii_lowercase() {
                'd' | 'y' => date = true,
                'h' | 's' => time = true,
                'm' => month_or_minute = true,
                _ => {}
            },
        }
    }

    if date || (month_or_minute && !time) {
        NumberKind::Date
    } else if time {
        NumberKind::Time
    } else {
        NumberKind::Plain
    }
}

/// Fractional day -> time of day, rounded to the second.
pub fn serial_to_time(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let seconds = (serial.fract() * 86_400.0).round() as u32;
    // 23:59:59.6 rounds up to midnight
    NaiveTime::from_num_seconds_from_midnight_opt(seconds % 86_400, 0)
}

/// First serial past 9999-12-31, the last date Excel can represent.
const MAX_SERIAL: f64 = 2_958_466.0;

/// Excel 1900-system serial -> date-time.
///
/// Serial 60 is the nonexistent 1900-02-29 kept for Lotus 1-2-3
/// compatibility; serials below it are shifted by one day. Serials
/// outside Excel's date range yield `None`.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    let days = serial.floor() as i64;
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    let date = base.checked_add_signed(Duration::try_days(days)?)?;
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::try_seconds(seconds)?)
}

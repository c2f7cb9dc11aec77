//! End-to-end tests: real `.xlsx` archives built in memory, parsed into
//! schedules and rendered.

use chrono::{DateTime, TimeZone, Utc};
use gridcal::render::{self, RenderOptions};
use gridcal::schedule::{dedup_events, extract_workbook};
use gridcal::xlsx::XlsxParser;
use gridcal::{parse_bytes_at, parse_file_at, Error, LocateError, ScheduleOptions, SheetOutcome};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// Style index of the `hh:mm` format in [`STYLES`].
const TIME_STYLE: usize = 1;
/// Style index of the built-in date format in [`STYLES`].
const DATE_STYLE: usize = 2;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="hh:mm"/></numFmts>
  <cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="164" applyNumberFormat="1"/><xf numFmtId="14" applyNumberFormat="1"/></cellXfs>
</styleSheet>"#;

#[derive(Clone)]
enum Cell {
    Blank,
    Text(String),
    /// Serial value with the time style
    Time(f64),
    /// Serial value with the date style
    Date(f64),
}

fn t(s: &str) -> Cell {
    if s.is_empty() {
        Cell::Blank
    } else {
        Cell::Text(s.to_string())
    }
}

/// Minimal workbook writer: shared strings for text, styled serials for
/// dates and times.
#[derive(Default)]
struct WorkbookBuilder {
    sheets: Vec<(String, Vec<Vec<Cell>>)>,
}

impl WorkbookBuilder {
    fn sheet(mut self, name: &str, rows: Vec<Vec<Cell>>) -> Self {
        self.sheets.push((name.to_string(), rows));
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut strings: Vec<String> = Vec::new();
        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".to_string(), CONTENT_TYPES.to_string()),
            ("xl/styles.xml".to_string(), STYLES.to_string()),
        ];

        let mut sheet_entries = String::new();
        let mut rels = String::new();
        for (i, (name, rows)) in self.sheets.iter().enumerate() {
            let n = i + 1;
            sheet_entries.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name),
                n,
                n
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                n, n
            ));
            parts.push((
                format!("xl/worksheets/sheet{}.xml", n),
                sheet_xml(rows, &mut strings),
            ));
        }

        parts.push((
            "xl/workbook.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{}</sheets></workbook>"#,
                sheet_entries
            ),
        ));
        parts.push((
            "xl/_rels/workbook.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
                rels
            ),
        ));

        let sst: String = strings
            .iter()
            .map(|s| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(s)))
            .collect();
        parts.push((
            "xl/sharedStrings.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
                strings.len(),
                sst
            ),
        ));

        let mut buffer = Vec::new();
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        for (name, body) in parts {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        buffer
    }
}

fn sheet_xml(rows: &[Vec<Cell>], strings: &mut Vec<String>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), r + 1);
            match cell {
                Cell::Blank => {}
                Cell::Text(s) => {
                    let idx = strings.iter().position(|x| x == s).unwrap_or_else(|| {
                        strings.push(s.clone());
                        strings.len() - 1
                    });
                    xml.push_str(&format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, idx));
                }
                Cell::Time(v) => xml.push_str(&format!(
                    r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                    reference, TIME_STYLE, v
                )),
                Cell::Date(v) => xml.push_str(&format!(
                    r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                    reference, DATE_STYLE, v
                )),
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn column_name(mut col: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    name
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Week 41 of 2025 with text time labels: Networks on Monday 09:00-09:45,
/// Algorithms on Tuesday 09:45-10:30, a lunch break row without a label.
fn week_41_rows() -> Vec<Vec<Cell>> {
    let rows: Vec<[&str; 3]> = vec![
        ["KW 41", "Montag", "Dienstag"],
        ["", "", ""],
        ["", "06.10.2025", "07.10.2025"],
        ["09:00", "Networks | Dr. X | R1", ""],
        ["09:45", "Networks | Dr. X | R1", "Algorithms\nDr. Smith\nR204"],
        ["10:30", "nan", "Algorithms\nDr. Smith\nR204"],
        ["11:15", "", ""],
        ["Mittag", "", ""],
        ["13:00", "Seminar", ""],
        ["13:45", "", ""],
    ];
    rows.iter()
        .map(|row| row.iter().map(|s| t(s)).collect())
        .collect()
}

/// Week 42 with native time and date cells (serials with number formats).
fn week_42_native_rows() -> Vec<Vec<Cell>> {
    // 2025-10-13 is serial 45943
    let mut rows = vec![
        vec![t(""), t("Montag")],
        vec![t(""), Cell::Date(45943.0)],
    ];
    for (i, minutes) in [480, 525, 570, 615, 660, 705].iter().enumerate() {
        let title = if i < 2 { "Databases | Prof. Y" } else { "" };
        rows.push(vec![Cell::Time(*minutes as f64 / 1440.0), t(title)]);
    }
    rows
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 8, 12, 0, 0).unwrap()
}

fn span(title: &str, start: &str, end: &str) -> (String, String, String) {
    (title.to_string(), start.to_string(), end.to_string())
}

fn iso(dt: &DateTime<chrono_tz::Tz>) -> String {
    dt.format("%Y-%m-%dT%H:%M").to_string()
}

#[test]
fn test_week_sheet_end_to_end() {
    let data = WorkbookBuilder::default()
        .sheet("41", week_41_rows())
        .build();

    let schedule = parse_bytes_at(&data, &ScheduleOptions::default(), now()).unwrap();

    let summary: Vec<(String, String, String)> = schedule
        .events
        .iter()
        .map(|e| (e.title.clone(), iso(&e.start), iso(&e.end)))
        .collect();
    assert_eq!(
        summary,
        vec![
            span("Networks", "2025-10-06T09:00", "2025-10-06T09:50"),
            span("Seminar", "2025-10-06T13:00", "2025-10-06T13:05"),
            span("Algorithms", "2025-10-07T09:45", "2025-10-07T10:35"),
        ]
    );

    let networks = &schedule.events[0];
    assert_eq!(networks.lecturer, "Dr. X");
    assert_eq!(networks.room, "R1");

    let algorithms = &schedule.events[2];
    assert_eq!(algorithms.lecturer, "Dr. Smith");
    assert_eq!(algorithms.room, "R204");

    assert!(schedule.events.iter().all(|e| e.end > e.start));
}

#[test]
fn test_native_time_and_date_cells() {
    let data = WorkbookBuilder::default()
        .sheet("KW 42", week_42_native_rows())
        .build();

    let schedule = parse_bytes_at(&data, &ScheduleOptions::default(), now()).unwrap();

    assert_eq!(schedule.events.len(), 1);
    let event = &schedule.events[0];
    assert_eq!(event.title, "Databases");
    assert_eq!(event.lecturer, "Prof. Y");
    assert_eq!(iso(&event.start), "2025-10-13T08:00");
    assert_eq!(iso(&event.end), "2025-10-13T08:50");
}

#[test]
fn test_malformed_sheet_skipped_not_fatal() {
    let data = WorkbookBuilder::default()
        .sheet("Deckblatt", vec![vec![t("Stundenplan WS 2025")]])
        .sheet("KW 40", vec![vec![t("Montag")], vec![t("29.09.2025")]])
        .sheet("KW 41", week_41_rows())
        .build();

    let schedule = parse_bytes_at(&data, &ScheduleOptions::default(), now()).unwrap();

    assert_eq!(schedule.sheets.len(), 2);
    assert_eq!(schedule.sheets[0].name, "KW 40");
    assert_eq!(
        schedule.sheets[0].outcome,
        SheetOutcome::Skipped {
            reason: LocateError::NoTimeColumn
        }
    );
    assert!(schedule.sheets[1].is_extracted());
    assert_eq!(schedule.events.len(), 3);
}

#[test]
fn test_sheets_processed_in_week_order() {
    let data = WorkbookBuilder::default()
        .sheet("KW 42", week_42_native_rows())
        .sheet("41", week_41_rows())
        .build();

    let schedule = parse_bytes_at(&data, &ScheduleOptions::default(), now()).unwrap();
    let weeks: Vec<u32> = schedule.sheets.iter().map(|s| s.week).collect();
    assert_eq!(weeks, vec![41, 42]);
    assert_eq!(schedule.events.len(), 4);
}

#[test]
fn test_dedup_across_overlapping_exports() {
    let data = WorkbookBuilder::default()
        .sheet("41", week_41_rows())
        .sheet("Export 41", week_41_rows())
        .build();
    let parser = XlsxParser::from_bytes(data).unwrap();
    let options = ScheduleOptions::default();

    let once = extract_workbook(&parser, &options).unwrap().events;
    assert_eq!(once.len(), 3);

    let mut twice = once.clone();
    twice.extend(extract_workbook(&parser, &options).unwrap().events);
    assert_eq!(dedup_events(twice), once);
}

#[test]
fn test_retention_window() {
    let data = WorkbookBuilder::default()
        .sheet("41", week_41_rows())
        .build();

    // Two weeks later everything has ended more than seven days ago
    let later = Utc.with_ymd_and_hms(2025, 10, 22, 12, 0, 0).unwrap();
    let windowed = parse_bytes_at(&data, &ScheduleOptions::default(), later).unwrap();
    assert!(windowed.events.is_empty());

    let unwindowed =
        parse_bytes_at(&data, &ScheduleOptions::default().without_retention(), later).unwrap();
    assert_eq!(unwindowed.events.len(), 3);
}

#[test]
fn test_parse_file_from_disk() {
    let data = WorkbookBuilder::default()
        .sheet("41", week_41_rows())
        .build();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stundenplan.xlsx");
    std::fs::write(&path, data).unwrap();

    let schedule = parse_file_at(&path, &ScheduleOptions::default(), now()).unwrap();
    assert_eq!(schedule.events.len(), 3);
}

#[test]
fn test_unreadable_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.xlsx");
    assert!(matches!(
        parse_file_at(&missing, &ScheduleOptions::default(), now()),
        Err(Error::Io(_))
    ));

    let corrupt = dir.path().join("corrupt.xlsx");
    std::fs::write(&corrupt, b"PK\x03\x04 definitely not a zip").unwrap();
    assert!(parse_file_at(&corrupt, &ScheduleOptions::default(), now()).is_err());
}

#[test]
fn test_workbook_without_week_sheets_yields_nothing() {
    let data = WorkbookBuilder::default()
        .sheet("Deckblatt", vec![vec![t("Stundenplan")]])
        .build();
    let schedule = parse_bytes_at(&data, &ScheduleOptions::default(), now()).unwrap();
    assert!(schedule.events.is_empty());
    assert!(schedule.sheets.is_empty());
}

#[test]
fn test_rendered_outputs() {
    let data = WorkbookBuilder::default()
        .sheet("41", week_41_rows())
        .build();
    let schedule = parse_bytes_at(&data, &ScheduleOptions::default(), now()).unwrap();
    let options = RenderOptions::german()
        .with_feed_link("stundenplan.ics")
        .with_timestamp(now());

    let ics = render::to_ics(&schedule.events, &options).unwrap();
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3);
    assert!(ics.contains("DTSTART:20251006T070000Z"));
    assert!(ics.contains("DESCRIPTION:Dozent: Dr. X\\nRaum: R1"));

    let html = render::to_html(&schedule.events, &options).unwrap();
    assert!(html.contains("Montag, 06.10.2025"));
    assert!(html.contains("09:00\u{2013}09:50 | R1 | Dr. X"));
    assert!(html.find("Montag").unwrap() < html.find("Dienstag").unwrap());

    let text = render::to_text(&schedule.events, &options).unwrap();
    assert!(text.starts_with("Montag, 06.10.2025\n"));

    let json = render::to_json(&schedule, render::JsonFormat::Compact).unwrap();
    assert!(json.contains("\"status\":\"extracted\""));
}

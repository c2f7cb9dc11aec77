//! iCalendar (RFC 5545) feed renderer.

use crate::error::Result;
use crate::model::Event;
use chrono::{DateTime, TimeZone, Utc};

use super::options::RenderOptions;

const PRODID: &str = concat!("-//gridcal//gridcal ", env!("CARGO_PKG_VERSION"), "//EN");

/// Maximum octets per content line before folding.
const LINE_LIMIT: usize = 75;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Render events as a `VCALENDAR` with one `VEVENT` each.
///
/// Times are written in UTC. Lines end in CRLF and are folded at 75 octets.
pub fn to_ics(events: &[Event], options: &RenderOptions) -> Result<String> {
    let stamp = format_utc(&options.timestamp.unwrap_or_else(Utc::now));
    let mut out = String::new();

    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{}", PRODID));
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    if !options.calendar_name.is_empty() {
        push_line(
            &mut out,
            &format!("X-WR-CALNAME:{}", escape_text(&options.calendar_name)),
        );
    }

    for event in events {
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}@gridcal", event_uid(event)));
        push_line(&mut out, &format!("DTSTAMP:{}", stamp));
        push_line(&mut out, &format!("DTSTART:{}", format_utc(&event.start)));
        push_line(&mut out, &format!("DTEND:{}", format_utc(&event.end)));
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&event.title)));

        let description = event.description(&options.lecturer_label, &options.room_label);
        if !description.is_empty() {
            push_line(&mut out, &format!("DESCRIPTION:{}", escape_text(&description)));
        }
        push_line(&mut out, &format!("LOCATION:{}", escape_text(&event.room)));
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    Ok(out)
}

/// Stable identifier derived from the event's identity fields.
///
/// A 64-bit FNV-1a hash over title, lecturer, room and the UTC start and
/// end, rendered as 16 hex digits.
pub fn event_uid(event: &Event) -> String {
    let start = format_utc(&event.start);
    let end = format_utc(&event.end);
    let fields = [
        event.title.as_str(),
        event.lecturer.as_str(),
        event.room.as_str(),
        start.as_str(),
        end.as_str(),
    ];

    let mut hash = FNV_OFFSET;
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hash = fnv1a_step(hash, 0x1f);
        }
        for byte in field.bytes() {
            hash = fnv1a_step(hash, byte);
        }
    }
    format!("{:016x}", hash)
}

fn fnv1a_step(hash: u64, byte: u8) -> u64 {
    (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
}

fn format_utc<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT value: backslash, semicolon, comma and newlines.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Append a content line, folded so no physical line exceeds 75 octets.
///
/// Folds never split a UTF-8 sequence; continuation lines start with a
/// single space.
fn push_line(out: &mut String, line: &str) {
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > LINE_LIMIT {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str("\r\n");
}

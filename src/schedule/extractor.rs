//! Event synthesis from a located grid.
//!
//! Schedules simulate merged cells by repeating the same text in
//! consecutive slots. Each such run in a day column becomes one event
//! spanning from the first row's time label to the last row's label plus
//! the grace period.

use crate::model::{CellMatrix, Event};
use chrono::NaiveTime;
use regex::Regex;
use std::sync::LazyLock;

use super::locator::GridAnchors;
use super::options::{ScheduleOptions, SlotEnd};
use super::time::{localize, parse_time_of_day};

static FIELD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\|\s*|\r?\n").expect("valid separator pattern"));

/// Title, lecturer and room parsed from a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub title: String,
    pub lecturer: String,
    pub room: String,
}

/// Split cell text on `|` or line breaks into title, lecturer and room.
///
/// Empty segments are dropped; segments past the third are ignored. When
/// nothing remains the whole text becomes the title.
pub fn split_fields(raw: &str) -> Fields {
    let mut parts = FIELD_SEPARATOR
        .split(raw)
        .map(str::trim)
        .filter(|part| !part.is_empty());

    let title = parts.next().unwrap_or_else(|| raw.trim()).to_string();
    let lecturer = parts.next().unwrap_or_default().to_string();
    let room = parts.next().unwrap_or_default().to_string();

    Fields {
        title,
        lecturer,
        room,
    }
}

/// Walk the time grid and build one event per run of identical cells.
///
/// Rows without a time label are skipped and end any run crossing them.
/// Events that would not have a positive duration are dropped.
pub fn extract_events(
    matrix: &CellMatrix,
    anchors: &GridAnchors,
    options: &ScheduleOptions,
) -> Vec<Event> {
    let height = matrix.height();
    let times: Vec<Option<NaiveTime>> = (0..height)
        .map(|row| parse_time_of_day(matrix.get(row, anchors.time_column)))
        .collect();

    let mut events = Vec::new();

    for day in &anchors.day_columns {
        let mut row = anchors.grid_start_row;

        while row < height {
            let Some(start_time) = times[row] else {
                row += 1;
                continue;
            };

            let cell = matrix.get(row, day.column).display_text();
            let text = cell.trim();
            if options.is_placeholder(text) {
                row += 1;
                continue;
            }

            let mut last = row;
            while last + 1 < height
                && times[last + 1].is_some()
                && matrix.get(last + 1, day.column).display_text().trim() == text
            {
                last += 1;
            }

            let last_label = times[last].unwrap_or(start_time);
            let end_time = match options.slot_end {
                SlotEnd::NextSlot => times
                    .get(last + 1)
                    .copied()
                    .flatten()
                    .filter(|next| *next > last_label)
                    .unwrap_or(last_label),
                SlotEnd::LastLabel => last_label,
            };

            let start = localize(&options.timezone, day.date.and_time(start_time));
            let end = options
                .grace()
                .and_then(|grace| day.date.and_time(end_time).checked_add_signed(grace))
                .and_then(|end| localize(&options.timezone, end));

            match (start, end) {
                (Some(start), Some(end)) if end > start => {
                    let fields = split_fields(text);
                    events.push(Event {
                        title: fields.title,
                        lecturer: fields.lecturer,
                        room: fields.room,
                        start,
                        end,
                    });
                }
                _ => {
                    log::debug!(
                        "dropping degenerate event in column {} at rows {}..={}",
                        day.column,
                        row,
                        last
                    );
                }
            }

            row = last + 1;
        }
    }

    events
}
